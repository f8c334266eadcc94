// 社会图层
//
// 宜居度 → 文化 → 首都与国家 → 城镇 → 宗教 → 政体 → 省份 → 河流命名
// 所有图层都是精细网格上的逐单元格编号数组加上实体列表，
// 实体列表下标 0 是各自的"空"条目。

pub mod burgs;
pub mod colors;
pub mod cultures;
pub mod emblems;
pub mod growth;
pub mod names;
pub mod population;
pub mod provinces;
pub mod religions;
pub mod states;

use std::time::Instant;

use serde::{Deserialize, Serialize};

pub use burgs::Burg;
pub use cultures::{Culture, CultureType};
pub use emblems::Emblem;
pub use population::{rank_cells, Population};
pub use provinces::Province;
pub use religions::{Expansion, Religion, ReligionType};
pub use states::{State, StateForm};

use crate::biomes::BiomeTable;
use crate::geometry::Point;
use crate::hydrology::{Hydrology, River};
use crate::ids::{BurgId, CultureId, ProvinceId, ReligionId, StateId};
use crate::map::{FeatureType, Grid, PackTerrain};
use crate::options::MapOptions;
use crate::rng::MapRng;

/// 社会图层生成时只读的自然环境
#[derive(Clone, Copy)]
pub struct Landscape<'a> {
    pub terrain: &'a PackTerrain,
    pub grid: &'a Grid,
    pub hydrology: &'a Hydrology,
    pub biomes: &'a [u8],
    pub biome_table: &'a BiomeTable,
    pub population: &'a Population,
    pub options: &'a MapOptions,
}

impl Landscape<'_> {
    pub fn len(&self) -> usize {
        self.terrain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terrain.is_empty()
    }

    pub fn point(&self, cell: usize) -> Point {
        self.terrain.mesh.points[cell]
    }

    pub fn h(&self, cell: usize) -> u8 {
        self.terrain.mesh.h[cell]
    }

    /// 所在粗网格单元格的温度
    pub fn temp(&self, cell: usize) -> i8 {
        self.grid.temp[self.terrain.mesh.g[cell] as usize]
    }

    /// 紧邻海洋（而不是湖泊）的陆地
    pub fn is_sea_coast(&self, cell: usize) -> bool {
        self.terrain.t[cell] == 1
            && self
                .terrain
                .haven_feature(cell)
                .is_some_and(|f| f.kind == FeatureType::Ocean)
    }
}

/// 全部社会图层
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Society {
    pub cultures: Vec<Culture>,
    pub culture: Vec<CultureId>,
    pub burgs: Vec<Burg>,
    pub burg: Vec<BurgId>,
    pub states: Vec<State>,
    pub state: Vec<StateId>,
    pub provinces: Vec<Province>,
    pub province: Vec<ProvinceId>,
    pub religions: Vec<Religion>,
    pub religion: Vec<ReligionId>,
}

/// 依次生成文化、国家、城镇、宗教与省份
pub fn generate_society(land: &Landscape, rng: &mut MapRng) -> Society {
    let start = Instant::now();

    let (cultures, mut culture) = cultures::generate_cultures(land, rng);
    cultures::expand_cultures(land, &cultures, &mut culture);

    let mut burg_list = burgs::place_capitals(land, &culture, &cultures, rng);
    let mut state_list = states::create_states(land, &mut burg_list, &cultures, rng);
    burgs::place_towns(land, &culture, &cultures, &mut burg_list, rng);

    let mut state = vec![StateId::NEUTRALS; land.len()];
    states::expand_states(land, &state_list, &culture, &mut state);
    let burg = burgs::burg_index(land.len(), &burg_list);
    states::normalize_states(land, &burg_list, &burg, &mut state);
    for b in burg_list.iter_mut().skip(1) {
        b.state = state[b.cell as usize];
    }
    burgs::specify_burgs(land, &mut burg_list, &state_list, &cultures, rng);
    states::collect_statistics(land, &mut state_list, &state, &burg_list);

    let (religion_list, religion) = religions::generate_religions(
        land,
        &cultures,
        &culture,
        &state_list,
        &state,
        &burg_list,
        &burg,
        rng,
    );
    states::define_state_forms(
        &mut state_list,
        &burg_list,
        &cultures,
        &religion_list,
        &religion,
        rng,
    );

    let input = provinces::ProvinceInput {
        cultures: &cultures,
        culture: &culture,
        state: &state,
        burg_at: &burg,
    };
    let (province_list, province) =
        provinces::generate_provinces(land, &input, &mut state_list, &mut burg_list, rng);

    log::info!(
        "society: {} cultures, {} states, {} burgs, {} provinces, {} religions in {:?}",
        cultures.len() - 1,
        state_list.len() - 1,
        burg_list.len() - 1,
        province_list.len() - 1,
        religion_list.len() - 1,
        start.elapsed()
    );

    Society {
        cultures,
        culture,
        burgs: burg_list,
        burg,
        states: state_list,
        state,
        provinces: province_list,
        province,
        religions: religion_list,
        religion,
    }
}

const MAIN_BIG: [(&str, u32); 1] = [("River", 1)];
const MAIN_SMALL: [(&str, u32); 4] = [("Creek", 9), ("River", 3), ("Brook", 3), ("Stream", 1)];
const FORK_BIG: [(&str, u32); 1] = [("Fork", 1)];
const FORK_SMALL: [(&str, u32); 1] = [("Branch", 1)];

/// 按河口所在文化为河流命名，按流量与支流关系分类
pub fn specify_rivers(
    rivers: &mut [River],
    culture: &[CultureId],
    cultures: &[Culture],
    rng: &mut MapRng,
) {
    if rivers.is_empty() {
        return;
    }
    let mut discharges: Vec<f32> = rivers.iter().map(|r| r.discharge).collect();
    discharges.sort_by(f32::total_cmp);
    let threshold = ((rivers.len() as f64 * 0.15).ceil() as usize).min(rivers.len() - 1);
    let small_discharge = discharges[threshold];

    for river in rivers.iter_mut() {
        let base = culture
            .get(river.mouth as usize)
            .map_or(names::ENGLISH, |c| cultures[c.index()].base);
        river.name = names::river_name(base, rng);

        let small = river.discharge < small_discharge;
        let fork = river.i.index() % 3 == 0 && river.parent.is_some() && river.parent != river.i;
        let table: &[(&str, u32)] = match (fork, small) {
            (false, false) => &MAIN_BIG,
            (false, true) => &MAIN_SMALL,
            (true, false) => &FORK_BIG,
            (true, true) => &FORK_SMALL,
        };
        river.kind = rng.pick_weighted(table).copied().unwrap_or("River").to_owned();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::biomes::assign_biomes;
    use crate::hydrology::tests::bowl_grid;
    use crate::hydrology::{generate_hydrology, HydrologyConfig};
    use crate::map::repack;
    use crate::delaunay::DelaunatorProvider;
    use crate::terrain::markup_pack;

    /// 自然环境的所有权持有者
    pub struct LandFixture {
        pub terrain: PackTerrain,
        pub grid: Grid,
        pub hydrology: Hydrology,
        pub biomes: Vec<u8>,
        pub biome_table: BiomeTable,
        pub population: Population,
        pub options: MapOptions,
    }

    impl LandFixture {
        pub fn view(&self) -> Landscape<'_> {
            Landscape {
                terrain: &self.terrain,
                grid: &self.grid,
                hydrology: &self.hydrology,
                biomes: &self.biomes,
                biome_table: &self.biome_table,
                population: &self.population,
                options: &self.options,
            }
        }
    }

    pub struct Fixture {
        pub land: LandFixture,
        pub society: Society,
    }

    pub fn society_options() -> MapOptions {
        MapOptions {
            map_width: 600,
            map_height: 600,
            cultures_number: 5,
            states_number: 6,
            religions_number: 3,
            downcut_rivers: false,
            ..Default::default()
        }
    }

    pub fn land(seed: &str) -> LandFixture {
        let options = society_options();
        let grid = bowl_grid(seed);
        let mut terrain = markup_pack(repack(&grid, &DelaunatorProvider).unwrap());
        let hydrology =
            generate_hydrology(&mut terrain, &grid, &HydrologyConfig::from_options(&options));
        let biome_table = BiomeTable::default();
        let biomes = assign_biomes(&biome_table, &terrain, &grid, &hydrology);
        let population = rank_cells(&terrain, &hydrology, &biomes, &biome_table);
        LandFixture {
            terrain,
            grid,
            hydrology,
            biomes,
            biome_table,
            population,
            options,
        }
    }

    /// 碗状小岛上生成的完整社会
    pub fn fixture(seed: &str) -> Fixture {
        let land = land(seed);
        let mut rng = MapRng::new(seed);
        let society = generate_society(&land.view(), &mut rng);
        Fixture { land, society }
    }

    #[test]
    fn population_only_on_land() {
        let land = land("population");
        let view = land.view();
        assert!(view.population.populated().count() > 100);
        for i in 0..view.len() {
            if !view.terrain.is_land(i) {
                assert_eq!(view.population.s[i], 0);
                assert_eq!(view.population.pop[i], 0.0);
            }
            if view.population.s[i] <= 0 {
                assert_eq!(view.population.pop[i], 0.0);
            }
        }
    }

    #[test]
    fn per_cell_layers_cover_the_mesh() {
        let Fixture { land, society } = fixture("layers");
        let n = land.terrain.len();
        assert_eq!(society.culture.len(), n);
        assert_eq!(society.state.len(), n);
        assert_eq!(society.burg.len(), n);
        assert_eq!(society.province.len(), n);
        assert_eq!(society.religion.len(), n);
        for i in 0..n {
            assert!(society.culture[i].index() < society.cultures.len());
            assert!(society.state[i].index() < society.states.len());
            assert!(society.province[i].index() < society.provinces.len());
        }
    }

    #[test]
    fn same_seed_same_society() {
        let a = fixture("repeat").society;
        let b = fixture("repeat").society;
        assert_eq!(a, b);
    }

    #[test]
    fn rivers_get_names_and_types() {
        let Fixture { mut land, society } = fixture("river-names");
        let mut rng = MapRng::new("river-names");
        specify_rivers(&mut land.hydrology.rivers, &society.culture, &society.cultures, &mut rng);
        for r in &land.hydrology.rivers {
            assert!(!r.name.is_empty());
            let kinds = ["River", "Creek", "Brook", "Stream", "Fork", "Branch"];
            assert!(kinds.contains(&r.kind.as_str()));
        }
    }
}
