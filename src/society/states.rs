//! 国家：建立、扩张、边界修整、统计与政体

use serde::{Deserialize, Serialize};

use super::burgs::Burg;
use super::colors::get_colors;
use super::cultures::{river_cost, type_cost, Culture, CultureType};
use super::emblems::{self, entity_shield, Emblem};
use super::growth::{expand, majority};
use super::names::{self, adjective, culture_short, state_name};
use super::religions::{Expansion, Religion, ReligionType};
use super::Landscape;
use crate::biomes;
use crate::geometry::{median, round_to};
use crate::ids::{BurgId, CultureId, ProvinceId, ReligionId, StateId};
use crate::rng::MapRng;

/// 政体
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateForm {
    Monarchy,
    Republic,
    Union,
    Theocracy,
    Anarchy,
}

/// 国家
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct State {
    pub i: StateId,
    pub name: String,
    pub full_name: String,
    pub form: Option<StateForm>,
    pub form_name: String,
    pub color: String,
    pub capital: BurgId,
    /// 中立地区没有中心
    pub center: Option<u32>,
    pub culture: CultureId,
    #[serde(rename = "type")]
    pub kind: CultureType,
    pub expansionism: f64,
    pub cells: u32,
    pub area: f64,
    pub burgs: u32,
    /// 乡村人口（人）
    pub rural: f64,
    /// 城镇人口（人）
    pub urban: f64,
    pub neighbors: Vec<StateId>,
    pub provinces: Vec<ProvinceId>,
    pub emblem: Option<Emblem>,
}

impl State {
    /// 0 号国家：中立地区
    pub fn neutrals() -> Self {
        Self {
            i: StateId::NEUTRALS,
            name: "Neutrals".to_owned(),
            full_name: "Neutrals".to_owned(),
            form: None,
            form_name: String::new(),
            color: String::new(),
            capital: BurgId::NONE,
            center: None,
            culture: CultureId::WILDLANDS,
            kind: CultureType::Generic,
            expansionism: 0.0,
            cells: 0,
            area: 0.0,
            burgs: 0,
            rural: 0.0,
            urban: 0.0,
            neighbors: Vec::new(),
            provinces: Vec::new(),
            emblem: None,
        }
    }
}

/// 以每个首都为中心建立国家
pub fn create_states(
    land: &Landscape,
    burgs: &mut [Burg],
    cultures: &[Culture],
    rng: &mut MapRng,
) -> Vec<State> {
    let options = land.options;
    let mut states = vec![State::neutrals()];
    let capitals = burgs.iter().filter(|b| b.capital).count();
    let colors = get_colors(capitals, rng);

    for (burg, color) in burgs.iter_mut().filter(|b| b.capital).zip(colors) {
        let id = StateId::new(states.len());
        let culture = &cultures[burg.culture.index()];

        let short = if burg.name.chars().count() < 9 && burg.cell % 5 == 0 {
            burg.name.clone()
        } else {
            culture_short(culture.base, rng)
        };
        let name = state_name(culture.base, &short, rng);
        let expansionism = round_to(rng.random() * options.size_variety + 1.0, 1);
        let shield = entity_shield(&options.emblem_shape, &culture.shield, None);
        let emblem = emblems::generate(None, 0.0, 0.0, culture.kind, shield, rng);

        burg.state = id;
        states.push(State {
            i: id,
            full_name: name.clone(),
            name,
            color,
            capital: burg.i,
            center: Some(burg.cell),
            culture: burg.culture,
            kind: culture.kind,
            expansionism,
            emblem: Some(emblem),
            ..State::neutrals()
        });
    }
    states
}

// ==================== 扩张代价 ====================

fn culture_cost(land_culture: CultureId, state_culture: CultureId) -> f64 {
    if land_culture == state_culture {
        -9.0
    } else {
        100.0
    }
}

fn population_cost(land: &Landscape, cell: usize) -> f64 {
    if !land.terrain.is_land(cell) {
        return 0.0;
    }
    let s = land.population.s[cell];
    if s > 0 {
        (20.0 - s as f64).max(0.0)
    } else {
        5000.0
    }
}

fn biome_cost(land: &Landscape, native: u8, biome: u8, kind: CultureType) -> f64 {
    if biome == native {
        return 10.0;
    }
    let cost = land.biome_table.cost(biome);
    match kind {
        CultureType::Hunting => cost * 2.0,
        CultureType::Nomadic
            if (biomes::TROPICAL_SEASONAL_FOREST..=biomes::TAIGA).contains(&biome) =>
        {
            cost * 3.0
        }
        _ => cost,
    }
}

fn height_cost(land: &Landscape, cell: usize, kind: CultureType) -> f64 {
    let terrain = land.terrain;
    if kind == CultureType::Lake && terrain.feature_of(cell).is_lake() {
        return 10.0;
    }
    if !terrain.is_land(cell) {
        return match kind {
            CultureType::Naval => 300.0,
            CultureType::Nomadic => 10_000.0,
            _ => 1000.0,
        };
    }
    let h = land.h(cell);
    if kind == CultureType::Highland {
        return if h < 62 { 1100.0 } else { 0.0 };
    }
    if h >= 67 {
        2200.0
    } else if h >= 44 {
        300.0
    } else {
        0.0
    }
}

/// 从首都出发扩张国家
pub fn expand_states(
    land: &Landscape,
    states: &[State],
    culture: &[CultureId],
    state: &mut [StateId],
) {
    let options = land.options;
    let seeds: Vec<(u32, StateId)> = states
        .iter()
        .filter_map(|s| s.center.map(|c| (c, s.i)))
        .collect();
    if seeds.is_empty() {
        return;
    }
    let mut center_of = vec![StateId::NEUTRALS; land.len()];
    for &(cell, id) in &seeds {
        center_of[cell as usize] = id;
    }
    let native: Vec<u8> = states
        .iter()
        .map(|s| s.center.map_or(0, |c| land.biomes[c as usize]))
        .collect();

    let max_cost = land.len() as f64 / 2.0 * options.growth_rate * options.states_growth_rate;
    let terrain = land.terrain;

    expand(
        &terrain.mesh.neighbors,
        &seeds,
        max_cost,
        state,
        |owner, _, to| {
            // 不占领别国首都
            if center_of[to].is_some() && center_of[to] != owner {
                return None;
            }
            let s = &states[owner.index()];
            let cost = culture_cost(culture[to], s.culture)
                + population_cost(land, to)
                + biome_cost(land, native[owner.index()], land.biomes[to], s.kind)
                + height_cost(land, to, s.kind)
                + river_cost(land, to, s.kind)
                + type_cost(terrain.t[to], s.kind);
            Some(10.0 + cost.max(0.0) / s.expansionism.max(0.1))
        },
        |cell| terrain.is_land(cell),
    );
}

/// 修整犬牙交错的边界
///
/// 至少两个邻居属于别国、同国邻居不超过两个的单元格改归邻国中最多的那个；
/// 城镇所在和紧邻首都的单元格不动。
pub fn normalize_states(
    land: &Landscape,
    burgs: &[Burg],
    burg_at: &[BurgId],
    state: &mut [StateId],
) {
    let terrain = land.terrain;
    let neighbors = &terrain.mesh.neighbors;
    let mut changed = 0;

    for i in 0..land.len() {
        if !terrain.is_land(i) || burg_at[i].is_some() {
            continue;
        }
        if neighbors[i]
            .iter()
            .any(|&c| burgs[burg_at[c as usize].index()].capital)
        {
            continue;
        }
        let own = state[i];
        let (adversaries, buddies): (Vec<StateId>, Vec<StateId>) = neighbors[i]
            .iter()
            .map(|&c| c as usize)
            .filter(|&c| terrain.is_land(c))
            .map(|c| state[c])
            .partition(|&s| s != own);
        if adversaries.len() < 2 || buddies.len() > 2 {
            continue;
        }
        if let Some((winner, _)) = majority(&adversaries) {
            state[i] = winner;
            changed += 1;
        }
    }
    log::debug!("states: normalized {changed} border cells");
}

/// 面积、人口、城镇数与邻国
///
/// 乡村人口按 `populationRate` 折算，城镇人口（千人）再乘以 `urbanization`
pub fn collect_statistics(
    land: &Landscape,
    states: &mut [State],
    state: &[StateId],
    burgs: &[Burg],
) {
    let terrain = land.terrain;
    let options = land.options;
    let rate = options.population_rate as f64;
    for s in states.iter_mut() {
        s.cells = 0;
        s.area = 0.0;
        s.burgs = 0;
        s.rural = 0.0;
        s.urban = 0.0;
        s.neighbors.clear();
    }

    for i in 0..land.len() {
        if !terrain.is_land(i) {
            continue;
        }
        let own = state[i];
        let s = &mut states[own.index()];
        s.cells += 1;
        s.area += terrain.mesh.area[i] as f64;
        s.rural += land.population.pop[i] as f64 * rate;
        for &c in &terrain.mesh.neighbors[i] {
            let other = state[c as usize];
            if terrain.is_land(c as usize)
                && other != own
                && other.is_some()
                && !s.neighbors.contains(&other)
            {
                s.neighbors.push(other);
            }
        }
    }

    for b in burgs.iter().skip(1) {
        let s = &mut states[b.state.index()];
        s.burgs += 1;
        s.urban += b.population * 1000.0 * options.urbanization;
    }
    for s in states.iter_mut() {
        s.neighbors.sort_unstable();
        s.area = round_to(s.area, 0);
        s.rural = s.rural.round();
        s.urban = s.urban.round();
    }
}

// ==================== 政体 ====================

const MONARCHY_NAMES: [&str; 5] = ["Duchy", "Grand Duchy", "Principality", "Kingdom", "Empire"];

const REPUBLIC_NAMES: [(&str, u32); 9] = [
    ("Republic", 75),
    ("Federation", 4),
    ("Trade Company", 4),
    ("Most Serene Republic", 2),
    ("Oligarchy", 2),
    ("Tetrarchy", 1),
    ("Triumvirate", 1),
    ("Diarchy", 1),
    ("Junta", 1),
];

const UNION_NAMES: [(&str, u32); 8] = [
    ("Union", 3),
    ("League", 4),
    ("Confederation", 1),
    ("United Kingdom", 1),
    ("United Republic", 1),
    ("United Provinces", 2),
    ("Commonwealth", 1),
    ("Heptarchy", 1),
];

const THEOCRACY_NAMES: [(&str, u32); 5] = [
    ("Theocracy", 20),
    ("Brotherhood", 1),
    ("Thearchy", 2),
    ("See", 1),
    ("Holy State", 1),
];

const ANARCHY_NAMES: [(&str, u32); 4] = [
    ("Free Territory", 2),
    ("Council", 3),
    ("Commune", 1),
    ("Community", 1),
];

/// 用 "形容词 + 政体" 而不是 "政体 of 名称" 的政体名
const ADJECTIVE_FORMS: [&str; 17] = [
    "Empire",
    "Sultanate",
    "Khaganate",
    "Shogunate",
    "Caliphate",
    "Despotate",
    "Theocracy",
    "Oligarchy",
    "Union",
    "Confederation",
    "Trade Company",
    "League",
    "Tetrarchy",
    "Triumvirate",
    "Diarchy",
    "Horde",
    "Marches",
];

fn weighted(table: &'static [(&'static str, u32)], rng: &mut MapRng) -> &'static str {
    rng.pick_weighted(table).copied().unwrap_or(table[0].0)
}

fn form_name(
    state: &State,
    form: StateForm,
    tier: usize,
    base: usize,
    capital: Option<&Burg>,
    rng: &mut MapRng,
) -> String {
    let name = match form {
        StateForm::Monarchy => {
            if state.kind == CultureType::Nomadic && tier > 2 {
                if tier == 4 { "Khaganate" } else { "Khanate" }
            } else if base == names::ARABIC && tier > 2 && rng.probability(0.5) {
                if tier == 4 { "Caliphate" } else { "Sultanate" }
            } else if base == names::JAPANESE && tier == 4 {
                "Shogunate"
            } else {
                MONARCHY_NAMES[tier.min(4)]
            }
        }
        StateForm::Republic => {
            let single_city = state.burgs == 1 && tier < 2;
            if single_city && capital.is_some_and(|b| b.name == state.name) {
                "Free City"
            } else if single_city && rng.probability(0.3) {
                "City-state"
            } else {
                weighted(&REPUBLIC_NAMES, rng)
            }
        }
        StateForm::Union => weighted(&UNION_NAMES, rng),
        StateForm::Anarchy => weighted(&ANARCHY_NAMES, rng),
        StateForm::Theocracy => {
            if (base == names::GREEK || base == names::RUTHENIAN) && rng.probability(0.8) {
                if tier > 2 { "Exarchate" } else { "Eparchy" }
            } else if base == names::ARABIC && tier > 2 {
                "Imamah"
            } else if tier > 2 && rng.probability(0.3) {
                "Divine Empire"
            } else {
                weighted(&THEOCRACY_NAMES, rng)
            }
        }
    };
    name.to_owned()
}

/// 完整国名
pub fn full_name(name: &str, form_name: &str) -> String {
    if form_name.is_empty() {
        return name.to_owned();
    }
    if name.is_empty() {
        return format!("The {form_name}");
    }
    let simple = !name.contains(' ') && !name.contains('-');
    if ADJECTIVE_FORMS.contains(&form_name) && simple {
        format!("{} {form_name}", adjective(name))
    } else {
        format!("{form_name} of {name}")
    }
}

/// 按面积等级、文化与国教决定政体和全称
pub fn define_state_forms(
    states: &mut [State],
    burgs: &[Burg],
    cultures: &[Culture],
    religions: &[Religion],
    religion: &[ReligionId],
    rng: &mut MapRng,
) {
    let areas: Vec<f64> = states.iter().skip(1).map(|s| s.area).collect();
    if areas.is_empty() {
        return;
    }
    let median_area = median(&areas).unwrap_or(1.0).max(1.0);
    let mut descending = areas.clone();
    descending.sort_by(|a, b| b.total_cmp(a));
    let empire_idx = ((areas.len() as f64).powf(0.4).ceil() as usize).saturating_sub(2);
    let empire_min = descending[empire_idx.min(descending.len() - 1)];

    let generic: [(StateForm, u32); 3] = [
        (StateForm::Monarchy, 25),
        (StateForm::Republic, 2),
        (StateForm::Union, 1),
    ];
    let naval: [(StateForm, u32); 3] = [
        (StateForm::Monarchy, 25),
        (StateForm::Republic, 8),
        (StateForm::Union, 3),
    ];

    for s in states.iter_mut().skip(1) {
        let Some(center) = s.center else {
            continue;
        };
        let mut tier = ((s.area / median_area) * 2.6).floor().min(4.0) as usize;
        if tier == 4 && s.area < empire_min {
            tier = 3;
        }

        let faith = &religions[religion[center as usize].index()];
        let theocracy = faith.expansion == Expansion::State
            || (rng.probability(0.1)
                && matches!(faith.kind, ReligionType::Organized | ReligionType::Cult));
        let anarchy = rng.probability(0.01 - tier as f64 / 500.0);

        let form = if theocracy {
            StateForm::Theocracy
        } else if anarchy {
            StateForm::Anarchy
        } else {
            let table = if s.kind == CultureType::Naval { &naval } else { &generic };
            rng.pick_weighted(table).copied().unwrap_or(StateForm::Monarchy)
        };

        let base = cultures[s.culture.index()].base;
        let capital = burgs.get(s.capital.index()).filter(|b| b.i.is_some());
        s.form_name = form_name(s, form, tier, base, capital, rng);
        s.form = Some(form);
        s.full_name = full_name(&s.name, &s.form_name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biomes::BiomeTable;
    use crate::geometry::Point;
    use crate::hydrology::Hydrology;
    use crate::ids::FeatureId;
    use crate::map::{Grid, PackMesh, PackTerrain, RawGrid};
    use crate::options::MapOptions;
    use crate::society::tests::{fixture, Fixture, LandFixture};
    use crate::society::Population;

    /// 星形陆地：0 号单元格居中，1..=n 只与中心相邻
    fn star(n: usize) -> LandFixture {
        let len = n + 1;
        let mut neighbors = vec![(1..=n as u32).collect::<Vec<_>>()];
        neighbors.extend((1..=n).map(|_| vec![0]));
        let mesh = PackMesh {
            points: vec![Point::default(); len],
            g: vec![0; len],
            h: vec![40; len],
            neighbors,
            cell_vertices: vec![Vec::new(); len],
            border: vec![false; len],
            vertices: Vec::new(),
            area: vec![1.0; len],
        };
        LandFixture {
            terrain: PackTerrain {
                mesh,
                t: vec![1; len],
                f: vec![FeatureId::UNMARKED; len],
                features: Vec::new(),
                haven: vec![None; len],
                harbor: vec![0; len],
            },
            grid: Grid {
                mesh: RawGrid {
                    width: 0.0,
                    height: 0.0,
                    spacing: 0.0,
                    cells_desired: 0,
                    cells_x: 0,
                    cells_y: 0,
                    points: Vec::new(),
                    boundary: Vec::new(),
                    neighbors: Vec::new(),
                    cell_vertices: Vec::new(),
                    border: Vec::new(),
                    vertices: Vec::new(),
                },
                heights: Vec::new(),
                t: Vec::new(),
                f: Vec::new(),
                features: Vec::new(),
                temp: Vec::new(),
                prec: Vec::new(),
            },
            hydrology: Hydrology {
                fl: Vec::new(),
                conf: Vec::new(),
                r: Vec::new(),
                rivers: Vec::new(),
            },
            biomes: Vec::new(),
            biome_table: BiomeTable::default(),
            population: Population {
                s: Vec::new(),
                pop: Vec::new(),
            },
            options: MapOptions::default(),
        }
    }

    /// 中心单元格属于 `own`，周围依次属于 `around`；周围每格都有城镇，只有中心参与修整
    fn normalized_center(own: u16, around: &[u16], capital_next_door: bool) -> StateId {
        let fixture = star(around.len());
        let mut burgs = vec![Burg::placeholder()];
        let mut burg_at = vec![BurgId::NONE; around.len() + 1];
        for k in 1..=around.len() {
            burgs.push(Burg {
                i: BurgId::new(k),
                cell: k as u32,
                capital: capital_next_door && k == 1,
                ..Burg::placeholder()
            });
            burg_at[k] = BurgId::new(k);
        }
        let mut state: Vec<StateId> = std::iter::once(own)
            .chain(around.iter().copied())
            .map(StateId)
            .collect();
        normalize_states(&fixture.view(), &burgs, &burg_at, &mut state);
        for (k, &s) in around.iter().enumerate() {
            assert_eq!(state[k + 1], StateId(s), "surrounding cells keep their state");
        }
        state[0]
    }

    #[test]
    fn enclave_joins_the_most_common_neighbour() {
        assert_eq!(normalized_center(1, &[2, 3, 3], false), StateId(3));
        assert_eq!(normalized_center(1, &[3, 2, 3, 2], false), StateId(2));
    }

    #[test]
    fn two_foreign_against_two_own_flips() {
        assert_eq!(normalized_center(1, &[4, 4, 1, 1], false), StateId(4));
    }

    #[test]
    fn well_anchored_cells_stay() {
        assert_eq!(normalized_center(1, &[4, 4, 4, 1, 1, 1], false), StateId(1));
        assert_eq!(normalized_center(1, &[2, 1, 1], false), StateId(1));
    }

    #[test]
    fn cells_next_to_a_capital_stay() {
        assert_eq!(normalized_center(1, &[2, 3, 3], true), StateId(1));
    }

    #[test]
    fn full_names() {
        assert_eq!(full_name("Avaria", "Kingdom"), "Kingdom of Avaria");
        assert_eq!(full_name("Avaria", "Empire"), "Avarian Empire");
        assert_eq!(full_name("New Avaria", "Empire"), "Empire of New Avaria");
        assert_eq!(full_name("Avaria", ""), "Avaria");
        assert_eq!(full_name("", "Council"), "The Council");
    }

    #[test]
    fn capitals_stay_with_their_state() {
        let Fixture { society, .. } = fixture("state-capitals");
        for s in &society.states[1..] {
            let center = s.center.unwrap() as usize;
            assert_eq!(society.state[center], s.i, "{}", s.name);
            let capital = &society.burgs[s.capital.index()];
            assert!(capital.capital);
            assert_eq!(capital.state, s.i);
            assert!(s.form.is_some());
            assert!(!s.full_name.is_empty());
        }
    }

    #[test]
    fn water_belongs_to_nobody_and_stats_add_up() {
        let Fixture { society, land, .. } = fixture("state-stats");
        let land = land.view();
        for i in 0..land.len() {
            if !land.terrain.is_land(i) {
                assert!(society.state[i].is_none());
            }
        }
        let land_cells = (0..land.len()).filter(|&i| land.terrain.is_land(i)).count() as u32;
        let counted: u32 = society.states.iter().map(|s| s.cells).sum();
        assert_eq!(counted, land_cells);
        let towns: u32 = society.states.iter().map(|s| s.burgs).sum();
        assert_eq!(towns as usize, society.burgs.len() - 1);
        for s in &society.states[1..] {
            assert!(!s.neighbors.contains(&s.i));
        }
    }
}
