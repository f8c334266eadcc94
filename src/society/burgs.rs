//! 城镇：首都、普通城镇、港口与人口

use serde::{Deserialize, Serialize};

use super::cultures::{Culture, CultureType};
use super::emblems::{self, entity_shield, Emblem};
use super::names::burg_name;
use super::states::State;
use super::Landscape;
use crate::biomes;
use crate::geometry::{round_to, Bounds, Point};
use crate::ids::{BurgId, CultureId, FeatureId, ProvinceId, StateId};
use crate::rng::MapRng;
use crate::spatial::GridIndex;

/// 每个国家至少需要的有人单元格数
const CELLS_PER_STATE: usize = 25;

/// 城镇
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Burg {
    pub i: BurgId,
    pub cell: u32,
    pub x: f64,
    pub y: f64,
    pub name: String,
    pub culture: CultureId,
    pub state: StateId,
    pub province: ProvinceId,
    pub capital: bool,
    /// 港口所在水体，UNMARKED 表示不是港口
    pub port: FeatureId,
    /// 人口（千人）
    pub population: f64,
    #[serde(rename = "type")]
    pub kind: CultureType,
    pub feature: FeatureId,
    pub emblem: Option<Emblem>,
}

impl Burg {
    /// 0 号占位
    pub fn placeholder() -> Self {
        Self {
            i: BurgId::NONE,
            cell: 0,
            x: 0.0,
            y: 0.0,
            name: String::new(),
            culture: CultureId::WILDLANDS,
            state: StateId::NEUTRALS,
            province: ProvinceId::NONE,
            capital: false,
            port: FeatureId::UNMARKED,
            population: 0.0,
            kind: CultureType::Generic,
            feature: FeatureId::UNMARKED,
            emblem: None,
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    fn new(
        i: BurgId,
        cell: usize,
        land: &Landscape,
        culture: &Culture,
        capital: bool,
        rng: &mut MapRng,
    ) -> Self {
        let p = land.point(cell);
        Self {
            i,
            cell: cell as u32,
            x: p.x,
            y: p.y,
            name: burg_name(culture.base, rng),
            culture: culture.i,
            capital,
            feature: land.terrain.f[cell],
            ..Self::placeholder()
        }
    }
}

/// 按城镇编号列出每个单元格的城镇
pub fn burg_index(len: usize, burgs: &[Burg]) -> Vec<BurgId> {
    let mut at = vec![BurgId::NONE; len];
    for b in burgs.iter().skip(1) {
        at[b.cell as usize] = b.i;
    }
    at
}

/// 放置首都
///
/// 首都数量为 `min(statesNumber, 有人单元格数 / 25)`，间距放不下时逐步缩小
pub fn place_capitals(
    land: &Landscape,
    culture: &[CultureId],
    cultures: &[Culture],
    rng: &mut MapRng,
) -> Vec<Burg> {
    let options = land.options;
    let mut burgs = vec![Burg::placeholder()];

    let populated = land.population.populated().count();
    let target = (options.states_number as usize).min(populated / CELLS_PER_STATE);
    let score = |i: usize, rng: &mut MapRng| land.population.s[i] as f64 * rng.rand_float(0.5, 1.5);
    let by_score = |a: &(usize, f64), b: &(usize, f64)| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0));

    let mut scored: Vec<(usize, f64)> = land
        .population
        .populated()
        .filter(|&i| culture[i].is_some())
        .map(|i| (i, score(i, rng)))
        .collect();
    scored.sort_by(by_score);
    // 文化覆盖的土地不够时，用无文化的有人单元格补足候选
    if scored.len() < target {
        let mut wild: Vec<(usize, f64)> = land
            .population
            .populated()
            .filter(|&i| culture[i].is_none())
            .map(|i| (i, score(i, rng)))
            .collect();
        wild.sort_by(by_score);
        log::debug!(
            "burgs: {} cultured capital sites for {target} states, adding unclaimed land",
            scored.len()
        );
        scored.extend(wild);
    }

    let count = target.min(scored.len());
    if count == 0 {
        log::warn!("burgs: not enough populated land for any state");
        return burgs;
    }

    let bounds = Bounds::from_size(options.width(), options.height());
    let mut spacing = (options.width() + options.height()) / 2.0 / count as f64;
    let mut chosen: Vec<usize> = Vec::with_capacity(count);

    for _ in 0..10 {
        chosen.clear();
        let mut index = GridIndex::new(bounds, spacing);
        for &(cell, _) in &scored {
            if chosen.len() == count {
                break;
            }
            let p = land.point(cell);
            if index.find_within(p, spacing).is_none() {
                index.insert(p);
                chosen.push(cell);
            }
        }
        if chosen.len() == count {
            break;
        }
        log::debug!("burgs: capitals do not fit, shrinking spacing {spacing:.1}");
        spacing /= 1.2;
    }
    // 间距始终放不下时按得分补足
    for &(cell, _) in &scored {
        if chosen.len() == count {
            break;
        }
        if !chosen.contains(&cell) {
            chosen.push(cell);
        }
    }

    for cell in chosen {
        let id = BurgId::new(burgs.len());
        let c = match culture[cell].get() {
            Some(c) => &cultures[c.index()],
            None => nearest_culture(land, cultures, cell),
        };
        burgs.push(Burg::new(id, cell, land, c, true, rng));
    }
    log::debug!("burgs: {} capitals", burgs.len() - 1);
    burgs
}

/// 中心离单元格最近的文化，没有任何文化时退回荒野
fn nearest_culture<'a>(land: &Landscape, cultures: &'a [Culture], cell: usize) -> &'a Culture {
    let options = land.options;
    let centered: Vec<&Culture> = cultures.iter().filter(|c| c.center.is_some()).collect();
    let bounds = Bounds::from_size(options.width(), options.height());
    let mut index = GridIndex::new(bounds, options.width().max(options.height()) / 10.0);
    for c in &centered {
        if let Some(center) = c.center {
            index.insert(land.point(center as usize));
        }
    }
    index
        .find_nearest(land.point(cell))
        .map_or(&cultures[0], |k| centered[k as usize])
}

/// 在首都之间放置普通城镇
pub fn place_towns(
    land: &Landscape,
    culture: &[CultureId],
    cultures: &[Culture],
    burgs: &mut Vec<Burg>,
    rng: &mut MapRng,
) {
    let options = land.options;
    let occupied = burg_index(land.len(), burgs);

    let mut scored: Vec<(usize, f64)> = Vec::new();
    for i in 0..land.len() {
        let score = land.population.s[i] as f64 * rng.gauss(1.0, 3.0, 0.0, 20.0, 3);
        if occupied[i].is_none() && culture[i].is_some() && score > 0.0 {
            scored.push((i, score));
        }
    }
    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

    let desired = if options.manors_number == 1000 {
        let density = (options.cells_desired() as f64 / 10_000.0).powf(0.8);
        (scored.len() as f64 / 5.0 / density).round() as usize
    } else {
        options.manors_number as usize
    };
    let desired = desired.min(scored.len());
    if desired == 0 {
        return;
    }

    let bounds = Bounds::from_size(options.width(), options.height());
    let mut spacing =
        (options.width() + options.height()) / 150.0 / ((desired as f64).powf(0.7) / 66.0);
    let mut index = GridIndex::new(bounds, spacing.max(1.0));
    for b in burgs.iter().skip(1) {
        index.insert(b.position());
    }
    let mut taken = occupied;
    let mut added = 0;

    loop {
        for &(cell, _) in &scored {
            if added == desired {
                break;
            }
            if taken[cell].is_some() {
                continue;
            }
            let p = land.point(cell);
            let radius = spacing * rng.gauss(1.0, 0.3, 0.2, 2.0, 2);
            if index.find_within(p, radius).is_some() {
                continue;
            }
            let id = BurgId::new(burgs.len());
            let c = &cultures[culture[cell].index()];
            burgs.push(Burg::new(id, cell, land, c, false, rng));
            index.insert(p);
            taken[cell] = id;
            added += 1;
        }
        if added >= desired || spacing <= 1.0 {
            break;
        }
        spacing *= 0.5;
    }

    if added < desired {
        log::warn!("burgs: placed {added} of {desired} towns");
    }
    log::debug!("burgs: {added} towns");
}

fn define_type(land: &Landscape, burg: &Burg) -> CultureType {
    let cell = burg.cell as usize;
    if burg.port.is_some() {
        return CultureType::Naval;
    }
    if land.terrain.haven_feature(cell).is_some_and(|f| f.is_lake()) {
        return CultureType::Lake;
    }
    if land.h(cell) > 60 {
        return CultureType::Highland;
    }
    if land.hydrology.r[cell].is_some() && land.hydrology.fl[cell] >= 100 {
        return CultureType::River;
    }
    if burg.population <= 5.0 {
        let biome = land.biomes[cell];
        if (biomes::HOT_DESERT..=biomes::GRASSLAND).contains(&biome) {
            return CultureType::Nomadic;
        }
        if (biomes::TROPICAL_SEASONAL_FOREST..=biomes::TAIGA).contains(&biome) {
            return CultureType::Hunting;
        }
    }
    CultureType::Generic
}

/// 港口、人口、类型与纹章
pub fn specify_burgs(
    land: &Landscape,
    burgs: &mut [Burg],
    states: &[State],
    cultures: &[Culture],
    rng: &mut MapRng,
) {
    let terrain = land.terrain;
    let options = land.options;

    for burg in burgs.iter_mut().skip(1) {
        let cell = burg.cell as usize;

        burg.port = FeatureId::UNMARKED;
        let harbor = terrain.harbor[cell];
        if let Some(haven) = terrain.haven[cell] {
            let water = terrain.f[haven as usize];
            let big_enough = terrain.features[water.index()].cells > 1;
            if land.temp(cell) > 0 && big_enough && harbor > 0 && (burg.capital || harbor == 1) {
                burg.port = water;
                // 移到海岸边
                let shore = land.point(cell).midpoint(land.point(haven as usize));
                burg.x = round_to(shore.x, 2);
                burg.y = round_to(shore.y, 2);
            }
        }

        let s = land.population.s[cell] as f64;
        let mut population = round_to(
            (s / 8.0 + burg.i.index() as f64 / 1000.0 + (cell % 100) as f64 / 1000.0).max(0.1),
            3,
        );
        if burg.capital {
            population = round_to(population * 1.3, 3);
        }
        if burg.port.is_some() {
            population = round_to(population * 1.3, 3);
        }
        burg.population = round_to(population * rng.gauss(2.0, 3.0, 0.6, 20.0, 3), 3);

        burg.kind = define_type(land, burg);

        let state = &states[burg.state.index()];
        let culture = &cultures[burg.culture.index()];
        let mut kinship = 0.25;
        if burg.capital {
            kinship += 0.1;
        } else if burg.port.is_some() {
            kinship -= 0.1;
        }
        if burg.culture != state.culture {
            kinship -= 0.25;
        }
        let state_emblem = state.emblem.as_ref();
        let shield = entity_shield(
            &options.emblem_shape,
            &culture.shield,
            state_emblem.map(|e| e.shield.as_str()),
        );
        burg.emblem = Some(emblems::generate(state_emblem, kinship, 0.0, burg.kind, shield, rng));
    }

    let ports = burgs.iter().filter(|b| b.port.is_some()).count();
    log::debug!("burgs: {ports} ports");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::society::tests::{fixture, Fixture};

    #[test]
    fn one_burg_per_cell() {
        let Fixture { society, .. } = fixture("burg-cells");
        let mut cells: Vec<u32> = society.burgs[1..].iter().map(|b| b.cell).collect();
        let total = cells.len();
        cells.sort_unstable();
        cells.dedup();
        assert_eq!(cells.len(), total);
        for (k, b) in society.burgs.iter().enumerate() {
            assert_eq!(b.i.index(), k);
        }
    }

    #[test]
    fn capitals_match_state_count() {
        let Fixture { society, land, .. } = fixture("capitals");
        let land = land.view();
        let populated = land.population.populated().count();
        let expected = (land.options.states_number as usize).min(populated / 25);
        let capitals = society.burgs.iter().filter(|b| b.capital).count();
        assert_eq!(capitals, expected);
        assert_eq!(society.states.len() - 1, expected);
    }

    #[test]
    fn capitals_fall_back_to_unclaimed_land() {
        let Fixture { society, land, .. } = fixture("wild-capitals");
        let land = land.view();
        let populated = land.population.populated().count();
        let expected = (land.options.states_number as usize).min(populated / 25);
        assert!(expected > 0);

        // 只有一个单元格有文化
        let mut culture = vec![CultureId::WILDLANDS; land.len()];
        let cultured = land.population.populated().next().unwrap();
        culture[cultured] = society.cultures[1].i;

        let mut rng = MapRng::new("wild-capitals");
        let burgs = place_capitals(&land, &culture, &society.cultures, &mut rng);
        assert_eq!(burgs.len() - 1, expected);
        for b in &burgs[1..] {
            assert!(b.capital);
            assert!(land.population.s[b.cell as usize] > 0);
            assert!(b.culture.is_some(), "capital {} has no culture", b.name);
        }
    }

    #[test]
    fn ports_sit_on_suitable_water() {
        let Fixture { society, land, .. } = fixture("ports");
        let land = land.view();
        for b in &society.burgs[1..] {
            assert!(b.population >= 0.1, "{}", b.name);
            assert!(land.terrain.is_land(b.cell as usize));
            if b.port.is_some() {
                let cell = b.cell as usize;
                assert!(land.terrain.harbor[cell] > 0);
                assert!(land.terrain.features[b.port.index()].is_water());
                assert_eq!(b.kind, CultureType::Naval);
            }
            assert!(b.emblem.is_some());
        }
    }
}
