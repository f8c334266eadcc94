//! 文化：选取、定点、分类与扩张

use serde::{Deserialize, Serialize};

use super::colors::get_colors;
use super::emblems::culture_shield_for;
use super::growth::expand;
use super::names::{self, abbreviate, culture_short};
use super::Landscape;
use crate::biomes;
use crate::geometry::{round_to, Bounds};
use crate::ids::CultureId;
use crate::map::FeatureGroup;
use crate::rng::MapRng;
use crate::spatial::GridIndex;

/// 每种文化至少需要的有人单元格数
const CELLS_PER_CULTURE: usize = 25;

/// 生活方式，决定扩张代价；城镇与纹章沿用同一分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CultureType {
    Generic,
    Lake,
    Naval,
    River,
    Nomadic,
    Hunting,
    Highland,
}

impl CultureType {
    fn base_expansionism(self) -> f64 {
        match self {
            Self::Generic => 1.0,
            Self::Lake => 0.8,
            Self::Naval => 1.5,
            Self::River => 0.9,
            Self::Nomadic => 1.5,
            Self::Hunting => 0.7,
            Self::Highland => 1.2,
        }
    }
}

/// 文化
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Culture {
    pub i: CultureId,
    pub name: String,
    /// 名称库下标
    pub base: usize,
    #[serde(rename = "type")]
    pub kind: CultureType,
    /// 荒野没有中心
    pub center: Option<u32>,
    pub expansionism: f64,
    pub color: String,
    pub code: String,
    pub shield: String,
    pub origins: Vec<CultureId>,
}

impl Culture {
    /// 0 号文化：荒野
    pub fn wildlands() -> Self {
        Self {
            i: CultureId::WILDLANDS,
            name: "Wildlands".to_owned(),
            base: names::ENGLISH,
            kind: CultureType::Generic,
            center: None,
            expansionism: 0.0,
            color: String::new(),
            code: "Wi".to_owned(),
            shield: "round".to_owned(),
            origins: Vec::new(),
        }
    }
}

/// 选址时的地形偏好
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SiteBias {
    None,
    /// 远离海岸
    Inland,
    /// 靠近海岸
    Coastal,
    /// 高海拔
    Highland,
}

/// 文化模板
#[derive(Debug, Clone, Copy)]
struct CultureTemplate {
    name: &'static str,
    base: usize,
    /// 被选中的概率
    odds: f64,
    /// 偏好的温度
    temperature: f64,
    /// 偏好的群系，空表示不限
    biomes: &'static [u8],
    /// 只在海岸定居
    sea_coast: bool,
    bias: SiteBias,
}

const fn template(
    name: &'static str,
    base: usize,
    odds: f64,
    temperature: f64,
    biomes: &'static [u8],
    sea_coast: bool,
    bias: SiteBias,
) -> CultureTemplate {
    CultureTemplate {
        name,
        base,
        odds,
        temperature,
        biomes,
        sea_coast,
        bias,
    }
}

const FORESTS: &[u8] = &[biomes::TEMPERATE_DECIDUOUS_FOREST, biomes::TEMPERATE_RAINFOREST];

const WORLD_SET: [CultureTemplate; 16] = [
    template("Shwazen", names::GERMAN, 0.7, 10.0, FORESTS, false, SiteBias::None),
    template("Angshire", names::ENGLISH, 1.0, 10.0, &[], true, SiteBias::None),
    template("Luari", names::FRENCH, 0.6, 12.0, FORESTS, false, SiteBias::None),
    template("Tallian", names::ITALIAN, 0.6, 15.0, &[], false, SiteBias::None),
    template("Astellian", names::CASTILLIAN, 0.6, 16.0, &[], false, SiteBias::None),
    template("Slovan", names::RUTHENIAN, 0.7, 6.0, &[], false, SiteBias::Inland),
    template("Norse", names::NORDIC, 0.7, 5.0, &[], false, SiteBias::None),
    template("Elladan", names::GREEK, 0.7, 18.0, &[], false, SiteBias::Highland),
    template("Romian", names::ITALIAN, 0.7, 15.0, &[], false, SiteBias::Coastal),
    template("Soumi", names::NORDIC, 0.3, 5.0, &[biomes::TAIGA], false, SiteBias::Inland),
    template("Portuzian", names::CASTILLIAN, 0.4, 17.0, &[], true, SiteBias::None),
    template("Koryo", names::CHINESE, 0.1, 12.0, &[], false, SiteBias::Coastal),
    template("Hantzu", names::CHINESE, 0.1, 13.0, &[], false, SiteBias::None),
    template("Yamoto", names::JAPANESE, 0.1, 15.0, &[], false, SiteBias::Coastal),
    template(
        "Arabascus",
        names::ARABIC,
        0.2,
        25.0,
        &[biomes::HOT_DESERT, biomes::COLD_DESERT],
        false,
        SiteBias::None,
    ),
    template("Turchian", names::TURKIC, 0.2, 14.0, &[biomes::GRASSLAND], false, SiteBias::None),
];

const EUROPEAN_SET: [CultureTemplate; 11] = [
    template("Shwazen", names::GERMAN, 1.0, 10.0, FORESTS, false, SiteBias::None),
    template("Angshire", names::ENGLISH, 1.0, 10.0, &[], true, SiteBias::None),
    template("Luari", names::FRENCH, 1.0, 12.0, FORESTS, false, SiteBias::None),
    template("Tallian", names::ITALIAN, 1.0, 15.0, &[], false, SiteBias::None),
    template("Astellian", names::CASTILLIAN, 1.0, 16.0, &[], false, SiteBias::None),
    template("Slovan", names::RUTHENIAN, 1.0, 6.0, &[], false, SiteBias::Inland),
    template("Norse", names::NORDIC, 1.0, 5.0, &[], false, SiteBias::None),
    template("Elladan", names::GREEK, 1.0, 18.0, &[], false, SiteBias::Highland),
    template("Romian", names::ITALIAN, 1.0, 15.0, &[], false, SiteBias::Coastal),
    template("Soumi", names::NORDIC, 1.0, 5.0, &[biomes::TAIGA], false, SiteBias::Inland),
    template("Portuzian", names::CASTILLIAN, 1.0, 17.0, &[], true, SiteBias::None),
];

const ORIENTAL_SET: [CultureTemplate; 8] = [
    template("Koryo", names::CHINESE, 1.0, 12.0, &[], false, SiteBias::Coastal),
    template("Hantzu", names::CHINESE, 1.0, 13.0, &[], false, SiteBias::None),
    template("Yamoto", names::JAPANESE, 1.0, 15.0, &[], false, SiteBias::Coastal),
    template("Tsiwen", names::CHINESE, 1.0, 16.0, &[], false, SiteBias::Inland),
    template(
        "Arabascus",
        names::ARABIC,
        1.0,
        25.0,
        &[biomes::HOT_DESERT, biomes::COLD_DESERT],
        false,
        SiteBias::None,
    ),
    template("Turchian", names::TURKIC, 1.0, 14.0, &[biomes::GRASSLAND], false, SiteBias::None),
    template(
        "Kazakh",
        names::TURKIC,
        0.8,
        8.0,
        &[biomes::COLD_DESERT, biomes::GRASSLAND],
        false,
        SiteBias::Inland,
    ),
    template("Nihonji", names::JAPANESE, 0.5, 11.0, &[], false, SiteBias::Highland),
];

fn culture_set(name: &str) -> &'static [CultureTemplate] {
    match name {
        "european" => &EUROPEAN_SET,
        "oriental" => &ORIENTAL_SET,
        _ => &WORLD_SET,
    }
}

/// 从文化集中按概率挑选 `count` 个模板；集合不够时用随机名称补足
fn select_templates(
    set: &[CultureTemplate],
    count: usize,
    rng: &mut MapRng,
) -> Vec<CultureTemplate> {
    let mut available = set.to_vec();
    let mut selected = Vec::with_capacity(count);
    let mut attempts = 0;

    while selected.len() < count && !available.is_empty() {
        let idx = loop {
            let idx = rng.rand_int(0, available.len() as i32 - 1) as usize;
            attempts += 1;
            if attempts >= 200 || rng.probability(available[idx].odds) {
                break idx;
            }
        };
        selected.push(available.remove(idx));
    }

    while selected.len() < count {
        let Some(&proto) = rng.pick(set) else {
            break;
        };
        selected.push(CultureTemplate {
            odds: 1.0,
            bias: SiteBias::None,
            ..proto
        });
    }
    selected
}

impl CultureTemplate {
    /// 选址得分：宜居度按温度、群系、海岸偏好折减
    fn site_score(&self, land: &Landscape, cell: usize) -> f64 {
        let s = land.population.s[cell] as f64;
        let temp_penalty = ((land.temp(cell) as f64 - self.temperature).abs() + 1.0).max(1.0);
        let biome_penalty = if self.biomes.is_empty() || self.biomes.contains(&land.biomes[cell]) {
            1.0
        } else {
            4.0
        };
        let coast_penalty = if self.sea_coast && !land.is_sea_coast(cell) {
            4.0
        } else {
            1.0
        };
        let base = s / temp_penalty / biome_penalty / coast_penalty;
        let t = land.terrain.t[cell].max(1) as f64;
        match self.bias {
            SiteBias::None => base,
            SiteBias::Inland => base * t,
            SiteBias::Coastal => base / t,
            SiteBias::Highland => base * land.h(cell) as f64 / 50.0,
        }
    }
}

/// 按中心单元格的环境决定文化类型
pub(crate) fn define_type(land: &Landscape, cell: usize, rng: &mut MapRng) -> CultureType {
    let h = land.h(cell);
    let biome = land.biomes[cell];
    if h < 70 && [biomes::HOT_DESERT, biomes::COLD_DESERT, biomes::GRASSLAND].contains(&biome) {
        return CultureType::Nomadic;
    }
    if h > 50 {
        return CultureType::Highland;
    }

    let terrain = land.terrain;
    let haven = terrain.haven_feature(cell);
    if let Some(f) = haven {
        if f.is_lake() && f.cells > 5 {
            return CultureType::Lake;
        }
    }
    let harbor = terrain.harbor[cell];
    let on_sea = haven.is_some_and(|f| !f.is_lake());
    let isle = terrain.feature_of(cell).group == Some(FeatureGroup::Isle);
    if (harbor > 0 && on_sea && rng.probability(0.1))
        || (harbor == 1 && rng.probability(0.6))
        || (isle && rng.probability(0.4))
    {
        return CultureType::Naval;
    }
    if land.hydrology.r[cell].is_some() && land.hydrology.fl[cell] > 100 {
        return CultureType::River;
    }
    let hunting_biomes = [
        biomes::SAVANNA,
        biomes::TROPICAL_RAINFOREST,
        biomes::TEMPERATE_RAINFOREST,
        biomes::TAIGA,
        biomes::TUNDRA,
        biomes::WETLAND,
    ];
    if terrain.t[cell] > 2 && hunting_biomes.contains(&biome) {
        return CultureType::Hunting;
    }
    CultureType::Generic
}

fn define_expansionism(kind: CultureType, size_variety: f64, rng: &mut MapRng) -> f64 {
    let value = (rng.random() * size_variety / 2.0 + 1.0) * kind.base_expansionism();
    round_to(value, 1)
}

/// 放置文化中心，返回文化列表和每个单元格的文化（只有中心被标记）
pub fn generate_cultures(land: &Landscape, rng: &mut MapRng) -> (Vec<Culture>, Vec<CultureId>) {
    let options = land.options;
    let mut cultures = vec![Culture::wildlands()];
    let mut culture = vec![CultureId::WILDLANDS; land.len()];

    let populated: Vec<usize> = land.population.populated().collect();
    let mut count = options.cultures_number as usize;
    if populated.len() < count * CELLS_PER_CULTURE {
        count = populated.len() / (CELLS_PER_CULTURE * 2);
        log::warn!(
            "cultures: only {} populated cells, reducing culture count to {count}",
            populated.len()
        );
    }
    if count == 0 {
        log::warn!("cultures: no populated land, only wildlands remain");
        return (cultures, culture);
    }

    let templates = select_templates(culture_set(&options.cultures_set), count, rng);
    let colors = get_colors(templates.len(), rng);
    let base_spacing = (options.width() + options.height()) / 2.0 / templates.len() as f64;
    let mut centers = GridIndex::new(
        Bounds::from_size(options.width(), options.height()),
        base_spacing.max(1.0),
    );
    let mut codes: Vec<String> = Vec::with_capacity(templates.len());

    for (n, (tpl, color)) in templates.iter().zip(colors).enumerate() {
        let id = CultureId::new(n + 1);

        let mut sorted = populated.clone();
        let scores: Vec<f64> = (0..land.len())
            .map(|i| if land.population.s[i] > 0 { tpl.site_score(land, i) } else { 0.0 })
            .collect();
        sorted.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]).then(a.cmp(&b)));
        let max = (sorted.len() / 2) as i32;

        let mut spacing = base_spacing;
        let mut center = None;
        for _ in 0..100 {
            let cell = sorted[rng.biased(0, max, 5.0) as usize];
            spacing *= 0.9;
            if culture[cell].is_none() && centers.find_within(land.point(cell), spacing).is_none() {
                center = Some(cell);
                break;
            }
        }
        let center = center
            .or_else(|| sorted.iter().copied().find(|&c| culture[c].is_none()))
            .unwrap_or(sorted[0]);
        centers.insert(land.point(center));
        culture[center] = id;

        let name = if !cultures.iter().any(|c| c.name == tpl.name) {
            tpl.name.to_owned()
        } else {
            culture_short(tpl.base, rng)
        };
        let kind = define_type(land, center, rng);
        let expansionism = define_expansionism(kind, options.size_variety, rng);
        let code = abbreviate(&name, &codes);
        codes.push(code.clone());
        let shield = culture_shield_for(&options.emblem_shape, tpl.base, rng);

        cultures.push(Culture {
            i: id,
            name,
            base: tpl.base,
            kind,
            center: Some(center as u32),
            expansionism,
            color,
            code,
            shield,
            origins: vec![CultureId::WILDLANDS],
        });
    }

    log::debug!("cultures: placed {} centers", cultures.len() - 1);
    (cultures, culture)
}

// ==================== 扩张代价 ====================

/// 河流代价，文化与国家共用
pub(crate) fn river_cost(land: &Landscape, cell: usize, kind: CultureType) -> f64 {
    let has_river = land.hydrology.r[cell].is_some();
    if kind == CultureType::River {
        return if has_river { 0.0 } else { 100.0 };
    }
    if !has_river {
        return 0.0;
    }
    (land.hydrology.fl[cell] as f64 / 10.0).clamp(20.0, 100.0)
}

/// 海岸距离代价，文化与国家共用
pub(crate) fn type_cost(t: i8, kind: CultureType) -> f64 {
    let water_folk = matches!(kind, CultureType::Naval | CultureType::Lake);
    match t {
        1 => {
            if water_folk {
                0.0
            } else if kind == CultureType::Nomadic {
                60.0
            } else {
                20.0
            }
        }
        2 => {
            if matches!(kind, CultureType::Naval | CultureType::Nomadic) {
                30.0
            } else {
                0.0
            }
        }
        -1 => 0.0,
        _ => {
            if water_folk {
                100.0
            } else {
                0.0
            }
        }
    }
}

fn biome_cost(land: &Landscape, native: u8, biome: u8, kind: CultureType) -> f64 {
    if biome == native {
        return 10.0;
    }
    let cost = land.biome_table.cost(biome);
    match kind {
        CultureType::Hunting => cost * 5.0,
        CultureType::Nomadic if (5..=9).contains(&biome) => cost * 10.0,
        _ => cost * 2.0,
    }
}

fn height_cost(land: &Landscape, cell: usize, kind: CultureType) -> f64 {
    let terrain = land.terrain;
    let feature = terrain.feature_of(cell);
    let area = terrain.mesh.area[cell] as f64;
    if kind == CultureType::Lake && feature.is_lake() {
        return 10.0;
    }
    let h = land.h(cell);
    if !terrain.is_land(cell) {
        return match kind {
            CultureType::Naval => area * 2.0,
            CultureType::Nomadic => area * 50.0,
            _ => area * 6.0,
        };
    }
    if kind == CultureType::Highland {
        return if h < 44 {
            3000.0
        } else if h < 62 {
            200.0
        } else {
            0.0
        };
    }
    if h >= 67 {
        200.0
    } else if h >= 44 {
        30.0
    } else {
        0.0
    }
}

/// 从各自中心出发扩张文化
pub fn expand_cultures(land: &Landscape, cultures: &[Culture], culture: &mut [CultureId]) {
    let options = land.options;
    let seeds: Vec<(u32, CultureId)> = cultures
        .iter()
        .filter_map(|c| c.center.map(|center| (center, c.i)))
        .collect();
    if seeds.is_empty() {
        return;
    }
    let native: Vec<u8> = cultures
        .iter()
        .map(|c| c.center.map_or(0, |center| land.biomes[center as usize]))
        .collect();

    let max_cost = land.len() as f64 * 0.6 * options.growth_rate * options.cultures_growth_rate;
    let s = &land.population.s;

    expand(
        &land.terrain.mesh.neighbors,
        &seeds,
        max_cost,
        culture,
        |owner, from, to| {
            let c = &cultures[owner.index()];
            let biome = land.biomes[to];
            let biome_change = if biome == land.biomes[from] { 0.0 } else { 20.0 };
            let cost = biome_cost(land, native[owner.index()], biome, c.kind)
                + biome_change
                + height_cost(land, to, c.kind)
                + river_cost(land, to, c.kind)
                + type_cost(land.terrain.t[to], c.kind);
            Some(10.0 + cost / c.expansionism.max(0.1))
        },
        |cell| s[cell] > 0,
    );

    let claimed = culture.iter().filter(|c| c.is_some()).count();
    log::debug!("cultures: expanded over {claimed} cells");
}
