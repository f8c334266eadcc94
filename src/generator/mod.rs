//! 地图生成流水线
//!
//! ```text
//! 选项 ─▶ 粗网格 ─▶ 高度图 ─▶ 水陆标记 ─▶ 气候
//!                                          │
//!   社会图层 ◀─ 宜居度 ◀─ 群系 ◀─ 水文 ◀─ 精细网格
//! ```
//!
//! 整条流水线只使用一个以种子初始化的 [`MapRng`]，
//! 同样的种子和参数总是得到同样的地图。

pub mod map_data;
pub mod session;

use std::time::Instant;

pub use map_data::{GridCells, GridData, MapData, PackCells, PackData, MAP_DATA_VERSION};
pub use session::{init_generator, Generator, InitConfig};

use crate::biomes::{assign_biomes, BiomeTable};
use crate::delaunay::Triangulator;
use crate::error::Result;
use crate::hydrology::{generate_hydrology, Hydrology, HydrologyConfig};
use crate::map::{repack, Grid, PackTerrain, RawGrid};
use crate::options::MapOptions;
use crate::rng::MapRng;
use crate::society::{generate_society, rank_cells, specify_rivers, Landscape, Population, Society};
use crate::terrain::{
    calculate_climate, generate_heightmap, land_fraction, markup_grid, markup_pack, select_template,
    ClimateConfig,
};

/// 精细网格及其上的全部图层
#[derive(Debug, Clone, PartialEq)]
pub struct Pack {
    pub terrain: PackTerrain,
    pub hydrology: Hydrology,
    pub biome: Vec<u8>,
    pub population: Population,
    pub society: Society,
}

impl Pack {
    pub fn len(&self) -> usize {
        self.terrain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terrain.is_empty()
    }
}

/// 一张生成完成的地图
#[derive(Debug, Clone, PartialEq)]
pub struct WorldMap {
    pub seed: String,
    pub options: MapOptions,
    pub grid: Grid,
    pub pack: Pack,
}

impl WorldMap {
    /// 粗网格上陆地单元格的比例
    pub fn land_fraction(&self) -> f64 {
        land_fraction(&self.grid.heights)
    }
}

/// 按参数生成一张完整地图
///
/// 参数先经过完整校验；任何阶段失败都包装成 `Generation` 错误返回，不会留下半成品。
pub fn generate(options: &MapOptions, triangulator: &dyn Triangulator) -> Result<WorldMap> {
    let start = Instant::now();
    let options = options.validated()?;
    let mut rng = MapRng::new(&options.seed);
    log::info!(
        "generating map `{}`: {}x{}, {} cells, template {}",
        options.seed,
        options.map_width,
        options.map_height,
        options.cells_desired(),
        options.template
    );

    // ==================== 粗网格 ====================

    let mesh = RawGrid::build(
        options.width(),
        options.height(),
        options.cells_desired(),
        &mut rng,
        triangulator,
    )
    .map_err(|e| e.into_generation("grid"))?;

    let template = select_template(&options, &mut rng).map_err(|e| e.into_generation("template"))?;
    let heighted = generate_heightmap(mesh, &template, options.land_percentage, &mut rng);
    let marked = markup_grid(heighted);
    let grid = calculate_climate(marked, &ClimateConfig::from_options(&options), &mut rng);

    // ==================== 精细网格 ====================

    let mesh = repack(&grid, triangulator).map_err(|e| e.into_generation("pack"))?;
    let mut terrain = markup_pack(mesh);
    let mut hydrology =
        generate_hydrology(&mut terrain, &grid, &HydrologyConfig::from_options(&options));

    let biome_table = BiomeTable::default();
    let biome = assign_biomes(&biome_table, &terrain, &grid, &hydrology);
    let population = rank_cells(&terrain, &hydrology, &biome, &biome_table);

    // ==================== 社会图层 ====================

    let society = {
        let land = Landscape {
            terrain: &terrain,
            grid: &grid,
            hydrology: &hydrology,
            biomes: &biome,
            biome_table: &biome_table,
            population: &population,
            options: &options,
        };
        generate_society(&land, &mut rng)
    };
    specify_rivers(&mut hydrology.rivers, &society.culture, &society.cultures, &mut rng);

    let map = WorldMap {
        seed: options.seed.clone(),
        pack: Pack {
            terrain,
            hydrology,
            biome,
            population,
            society,
        },
        grid,
        options,
    };
    log::info!(
        "map `{}` done: {} grid cells, {} pack cells, land {:.1}%, in {:?}",
        map.seed,
        map.grid.len(),
        map.pack.len(),
        map.land_fraction() * 100.0,
        start.elapsed()
    );
    Ok(map)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::delaunay::{DelaunatorProvider, Triangulation};
    use crate::error::MapError;
    use crate::geometry::Point;

    /// 小尺寸、低密度的参数，单元测试用
    pub fn small_options(seed: &str) -> MapOptions {
        MapOptions {
            seed: seed.to_owned(),
            map_width: 640,
            map_height: 480,
            points_number: 1,
            cultures_number: 5,
            states_number: 6,
            religions_number: 3,
            ..Default::default()
        }
    }

    struct BrokenTriangulator;

    impl Triangulator for BrokenTriangulator {
        fn triangulate(&self, _points: &[Point]) -> Result<Triangulation> {
            Ok(Triangulation::default())
        }
    }

    #[test]
    fn pipeline_fills_every_layer() {
        let map = generate(&small_options("pipeline"), &DelaunatorProvider).unwrap();
        let n = map.pack.len();
        assert!(n > 0);
        assert_eq!(map.pack.biome.len(), n);
        assert_eq!(map.pack.population.s.len(), n);
        assert_eq!(map.pack.hydrology.fl.len(), n);
        assert_eq!(map.pack.society.state.len(), n);
        assert_eq!(map.grid.temp.len(), map.grid.len());
        assert_eq!(map.seed, "pipeline");
    }

    #[test]
    fn rivers_are_named_after_generation() {
        let map = generate(&small_options("named-rivers"), &DelaunatorProvider).unwrap();
        for river in &map.pack.hydrology.rivers {
            assert!(!river.name.is_empty());
            assert!(!river.kind.is_empty());
        }
    }

    #[test]
    fn triangulation_failure_is_a_generation_error() {
        let err = generate(&small_options("broken"), &BrokenTriangulator).unwrap_err();
        assert!(matches!(err, MapError::Generation(ref m) if m.contains("triangle")), "{err}");
    }

    #[test]
    fn invalid_options_are_rejected_before_generation() {
        let options = MapOptions {
            template: "no-such-template".to_owned(),
            ..small_options("invalid")
        };
        let err = generate(&options, &DelaunatorProvider).unwrap_err();
        assert!(
            matches!(err, MapError::InvalidOption { ref key, .. } if key == "template"),
            "{err}"
        );
    }
}
