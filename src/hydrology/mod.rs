// 水文模块
//
// 洼地消除 → 湖泊气候 → 汇流成河 → 河流整理 → 下切
// 全部在精细网格上进行，不消耗随机数。

pub mod flood;
pub mod lakes;
pub mod rivers;

use std::time::Instant;

use serde::{Deserialize, Serialize};

pub use flood::{
    drain_order, feature_cells, resolve_depressions, steepest_descent, DrainNode, DrainagePlan,
    Receiver,
};
pub use lakes::evaporation;
pub use rivers::{downcut_rivers, River, MIN_FLUX_TO_FORM_RIVER};

use crate::ids::RiverId;
use crate::map::{Grid, PackTerrain};
use crate::options::MapOptions;
use crate::terrain::specify_features;

/// 水文参数
#[derive(Debug, Clone, Copy)]
pub struct HydrologyConfig {
    pub resolve_depressions: bool,
    pub downcut_rivers: bool,
    pub height_exponent: f64,
    pub cells_desired: usize,
}

impl HydrologyConfig {
    pub fn from_options(options: &MapOptions) -> Self {
        Self {
            resolve_depressions: options.resolve_depressions,
            downcut_rivers: options.downcut_rivers,
            height_exponent: options.height_exponent,
            cells_desired: options.cells_desired(),
        }
    }
}

/// 水文结果（按精细网格单元格索引）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hydrology {
    /// 流量
    pub fl: Vec<u16>,
    /// 是否为汇流点
    pub conf: Vec<u8>,
    /// 所属河流
    pub r: Vec<RiverId>,
    pub rivers: Vec<River>,
}

/// 生成河流与湖泊，并按水文结果修正高度与连通区类别
pub fn generate_hydrology(
    terrain: &mut PackTerrain,
    grid: &Grid,
    config: &HydrologyConfig,
) -> Hydrology {
    let start = Instant::now();

    let lake_cells = feature_cells(terrain);
    let plan = if config.resolve_depressions {
        resolve_depressions(terrain, &lake_cells)
    } else {
        steepest_descent(terrain)
    };
    lakes::define_climate_data(
        terrain,
        grid,
        &lake_cells,
        &plan.lake_elevation,
        config.height_exponent,
    );

    let order = drain_order(terrain, &plan);
    let mut drainer = rivers::Drainer::new(terrain, config.cells_desired);
    drainer.run(grid, &plan, &order);

    let width_scale = 1.0 / (config.cells_desired as f64 / 10_000.0).powf(0.25);
    let (fl, conf, r, river_list) = drainer.define_rivers(width_scale);

    if config.resolve_depressions {
        // 抬升后的工作高度写回陆地
        for i in 0..terrain.len() {
            if terrain.is_land(i) {
                terrain.mesh.h[i] = plan.elevation[i].trunc().min(100.0) as u8;
            }
        }
    }

    if config.downcut_rivers {
        downcut_rivers(&mut terrain.mesh.h, &terrain.mesh.neighbors, &fl);
    }

    specify_features(&mut terrain.features, &terrain.f, grid.len());

    let lakes = terrain.features.iter().filter(|f| f.is_lake()).count();
    log::info!(
        "hydrology: {} rivers, {} lakes in {:?}",
        river_list.len(),
        lakes,
        start.elapsed()
    );

    Hydrology {
        fl,
        conf,
        r,
        rivers: river_list,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::delaunay::DelaunatorProvider;
    use crate::map::{repack, HeightedGrid, RawGrid, SEA_LEVEL};
    use crate::rng::MapRng;
    use crate::terrain::{calculate_climate, markup_grid, markup_pack, ClimateConfig};

    fn test_options() -> MapOptions {
        MapOptions {
            map_width: 600,
            map_height: 600,
            ..Default::default()
        }
    }

    pub fn bowl_grid(seed: &str) -> Grid {
        let mut rng = MapRng::new(seed);
        let mesh = RawGrid::build(600.0, 600.0, 1_500, &mut rng, &DelaunatorProvider).unwrap();
        let heights = mesh
            .points
            .iter()
            .map(|p| {
                let d = ((p.x - 300.0).powi(2) + (p.y - 300.0).powi(2)).sqrt();
                let lake = ((p.x - 180.0).powi(2) + (p.y - 300.0).powi(2)).sqrt();
                let pit = ((p.x - 420.0).powi(2) + (p.y - 300.0).powi(2)).sqrt();
                if d > 250.0 {
                    5
                } else if lake < 35.0 {
                    10
                } else if pit < 40.0 {
                    25
                } else {
                    (75.0 - d / 6.0) as u8
                }
            })
            .collect();
        let marked = markup_grid(HeightedGrid { mesh, heights });
        calculate_climate(marked, &ClimateConfig::from_options(&test_options()), &mut rng)
    }

    /// 四周是海，中间是一座山，西侧有一个湖，东侧有一块洼地
    pub fn bowl_terrain(seed: &str) -> PackTerrain {
        let grid = bowl_grid(seed);
        markup_pack(repack(&grid, &DelaunatorProvider).unwrap())
    }

    fn bowl_hydrology(seed: &str, config: HydrologyConfig) -> (PackTerrain, Hydrology) {
        let grid = bowl_grid(seed);
        let mut terrain = markup_pack(repack(&grid, &DelaunatorProvider).unwrap());
        let hydrology = generate_hydrology(&mut terrain, &grid, &config);
        (terrain, hydrology)
    }

    fn config() -> HydrologyConfig {
        HydrologyConfig {
            downcut_rivers: false,
            ..HydrologyConfig::from_options(&test_options())
        }
    }

    #[test]
    fn per_cell_arrays_match_cell_count() {
        let (terrain, hydrology) = bowl_hydrology("lengths", config());
        assert_eq!(hydrology.fl.len(), terrain.len());
        assert_eq!(hydrology.r.len(), terrain.len());
        assert_eq!(hydrology.conf.len(), terrain.len());
    }

    #[test]
    fn rivers_form_and_flux_grows_downstream() {
        let (terrain, hydrology) = bowl_hydrology("rivers", config());
        assert!(!hydrology.rivers.is_empty());
        for river in &hydrology.rivers {
            assert!(river.cells.len() >= 2, "river {} too short", river.i);
            let land: Vec<u32> = river
                .cells
                .iter()
                .copied()
                .filter(|&c| terrain.is_land(c as usize))
                .collect();
            for pair in land.windows(2) {
                assert!(
                    hydrology.fl[pair[0] as usize] <= hydrology.fl[pair[1] as usize],
                    "river {} loses flux",
                    river.i
                );
            }
            assert!(river.width > 0.0);
            assert!(river.length > 0.0);
        }
    }

    #[test]
    fn river_ids_point_to_kept_rivers() {
        let (_, hydrology) = bowl_hydrology("ids", config());
        for &r in &hydrology.r {
            if r.is_some() {
                assert!(hydrology.rivers.iter().any(|river| river.i == r));
            }
        }
        for river in &hydrology.rivers {
            if river.parent.is_some() {
                assert!(hydrology.rivers.iter().any(|p| p.i == river.parent));
            }
            assert!(hydrology.rivers.iter().any(|b| b.i == river.basin && b.parent.is_none()));
        }
    }

    #[test]
    fn depressions_only_raise_land() {
        let before = bowl_terrain("raise");
        let (after, _) = bowl_hydrology("raise", config());
        for i in 0..before.len() {
            assert!(after.mesh.h[i] >= before.mesh.h[i]);
            assert_eq!(after.is_land(i), before.is_land(i));
        }
    }

    #[test]
    fn lakes_get_climate_and_group() {
        let (terrain, _) = bowl_hydrology("lake", config());
        let lakes: Vec<_> = terrain.features.iter().filter(|f| f.is_lake()).collect();
        assert!(!lakes.is_empty());
        for lake in lakes {
            let data = lake.lake.as_ref().unwrap();
            assert!(data.flux > 0.0);
            assert!(data.height >= 0.0);
            assert!(lake.group.is_some());
            if data.outlet.is_some() {
                assert!(data.outlet_cell.is_some());
            }
        }
        assert!(terrain.features[1..].iter().all(|f| f.group.is_some()));
    }

    #[test]
    fn downcut_never_floods_land() {
        let cfg = HydrologyConfig {
            downcut_rivers: true,
            ..config()
        };
        let (terrain, _) = bowl_hydrology("downcut", cfg);
        for i in 0..terrain.len() {
            if terrain.t[i] > 0 {
                assert!(terrain.mesh.h[i] >= SEA_LEVEL);
            }
        }
    }

    #[test]
    fn without_resolution_heights_stay() {
        let cfg = HydrologyConfig {
            resolve_depressions: false,
            ..config()
        };
        let before = bowl_terrain("steepest");
        let (after, hydrology) = bowl_hydrology("steepest", cfg);
        assert_eq!(before.mesh.h, after.mesh.h);
        assert_eq!(hydrology.fl.len(), after.len());
    }

    #[test]
    fn same_input_same_rivers() {
        let (_, a) = bowl_hydrology("twice", config());
        let (_, b) = bowl_hydrology("twice", config());
        assert_eq!(a, b);
    }
}
