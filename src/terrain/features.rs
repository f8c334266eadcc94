// 水陆连通区标记
//
// 参考 Azgaar Fantasy Map Generator 的 features.ts
// 洪泛填充把同类型（陆地/水体）的相邻单元格归为一个连通区，
// 同时在水陆交界处标记海岸距离 ±1，再逐圈向外扩展。

use std::collections::BTreeSet;

use crate::ids::FeatureId;
use crate::map::{
    Feature, FeatureGroup, FeatureType, HeightedGrid, LakeData, MarkedGrid, PackMesh,
    PackTerrain, SEA_LEVEL,
};

/// 陆地海岸
pub const LAND_COAST: i8 = 1;
/// 内陆第一圈
pub const LANDLOCKED: i8 = 2;
/// 近岸水域
pub const WATER_COAST: i8 = -1;
/// 深水第一圈
pub const DEEPER_WATER: i8 = -2;

const UNMARKED: i8 = 0;

/// 湖面相对最低湖岸的高度差
const LAKE_ELEVATION_DELTA: f64 = 0.1;

/// 从值为 `start - increment` 的单元格开始，逐圈给未标记的邻居赋值
///
/// 到达 `limit` 或某一圈没有新单元格时停止
pub fn markup_distance(t: &mut [i8], neighbors: &[Vec<u32>], start: i8, increment: i8, limit: i8) {
    let mut distance = start;
    loop {
        if distance == limit {
            break;
        }
        let prev = distance - increment;
        let mut marked = 0usize;
        for cell in 0..neighbors.len() {
            if t[cell] != prev {
                continue;
            }
            for &n in &neighbors[cell] {
                let n = n as usize;
                if t[n] != UNMARKED {
                    continue;
                }
                t[n] = distance;
                marked += 1;
            }
        }
        if marked == 0 {
            break;
        }
        match distance.checked_add(increment) {
            Some(next) => distance = next,
            None => break,
        }
    }
}

/// 下一个未标记单元格
fn next_unmarked(f: &[FeatureId], from: usize) -> Option<usize> {
    f[from..].iter().position(|id| id.is_none()).map(|p| p + from)
}

/// 粗网格标记
pub fn markup_grid(heighted: HeightedGrid) -> MarkedGrid {
    let HeightedGrid { mesh, heights } = heighted;
    let n = mesh.len();
    let mut t = vec![UNMARKED; n];
    let mut f = vec![FeatureId::UNMARKED; n];
    let mut features = vec![Feature::placeholder()];

    let mut search_from = 0;
    while let Some(first) = next_unmarked(&f, search_from) {
        search_from = first + 1;
        let id = FeatureId::new(features.len());
        f[first] = id;
        let land = heights[first] >= SEA_LEVEL;
        let mut border = false;
        let mut cells = 1u32;

        let mut stack = vec![first];
        while let Some(cell) = stack.pop() {
            if mesh.border[cell] {
                border = true;
            }
            for &nb in &mesh.neighbors[cell] {
                let nb = nb as usize;
                let nb_land = heights[nb] >= SEA_LEVEL;
                if land == nb_land && f[nb].is_none() {
                    f[nb] = id;
                    cells += 1;
                    stack.push(nb);
                } else if land && !nb_land {
                    t[cell] = LAND_COAST;
                    t[nb] = WATER_COAST;
                }
            }
        }

        let mut feature = Feature::new(id, land, border, first as u32);
        feature.cells = cells;
        features.push(feature);
    }

    markup_distance(&mut t, &mesh.neighbors, DEEPER_WATER, -1, -10);

    log::debug!("grid markup: {} features", features.len() - 1);

    MarkedGrid {
        mesh,
        heights,
        t,
        f,
        features,
    }
}

/// 精细网格标记：连通区、海岸距离、港口
pub fn markup_pack(mesh: PackMesh) -> PackTerrain {
    let n = mesh.len();
    let is_land = |c: usize| mesh.h[c] >= SEA_LEVEL;

    let mut t = vec![UNMARKED; n];
    let mut f = vec![FeatureId::UNMARKED; n];
    let mut haven: Vec<Option<u32>> = vec![None; n];
    let mut harbor = vec![0u8; n];
    let mut features = vec![Feature::placeholder()];

    let mut search_from = 0;
    while let Some(first) = next_unmarked(&f, search_from) {
        search_from = first + 1;
        let id = FeatureId::new(features.len());
        f[first] = id;
        let land = is_land(first);
        let mut border = mesh.border[first];
        let mut cells = vec![first as u32];

        let mut stack = vec![first];
        while let Some(cell) = stack.pop() {
            if mesh.border[cell] {
                border = true;
            }
            for &nb in &mesh.neighbors[cell] {
                let nb = nb as usize;
                let nb_land = is_land(nb);
                if land && !nb_land {
                    t[cell] = LAND_COAST;
                    t[nb] = WATER_COAST;
                    if haven[cell].is_none() {
                        let (closest, count) = define_haven(&mesh, cell);
                        haven[cell] = closest;
                        harbor[cell] = count;
                    }
                } else if land && nb_land {
                    if t[nb] == UNMARKED && t[cell] == LAND_COAST {
                        t[nb] = LANDLOCKED;
                    } else if t[cell] == UNMARKED && t[nb] == LAND_COAST {
                        t[cell] = LANDLOCKED;
                    }
                }

                if f[nb].is_none() && land == nb_land {
                    f[nb] = id;
                    cells.push(nb as u32);
                    stack.push(nb);
                }
            }
        }

        features.push(pack_feature(&mesh, id, land, border, first, &cells, &f));
    }

    markup_distance(&mut t, &mesh.neighbors, LANDLOCKED + 1, 1, i8::MAX);
    markup_distance(&mut t, &mesh.neighbors, DEEPER_WATER, -1, -10);

    log::debug!("pack markup: {} features", features.len() - 1);

    PackTerrain {
        mesh,
        t,
        f,
        features,
        haven,
        harbor,
    }
}

/// 最近的相邻水域单元格与相邻水域数量
fn define_haven(mesh: &PackMesh, cell: usize) -> (Option<u32>, u8) {
    let p = mesh.points[cell];
    let water: Vec<u32> = mesh.neighbors[cell]
        .iter()
        .copied()
        .filter(|&c| mesh.h[c as usize] < SEA_LEVEL)
        .collect();
    let closest = water.iter().copied().min_by(|&a, &b| {
        let da = p.distance_sq(mesh.points[a as usize]);
        let db = p.distance_sq(mesh.points[b as usize]);
        da.total_cmp(&db)
    });
    (closest, water.len().min(u8::MAX as usize) as u8)
}

fn pack_feature(
    mesh: &PackMesh,
    id: FeatureId,
    land: bool,
    border: bool,
    first: usize,
    cells: &[u32],
    f: &[FeatureId],
) -> Feature {
    let mut feature = Feature::new(id, land, border, first as u32);
    feature.cells = cells.len() as u32;
    feature.area = cells.iter().map(|&c| mesh.area[c as usize]).sum();

    if feature.kind == FeatureType::Lake {
        // 湖岸：与湖相邻的陆地单元格
        let shoreline: BTreeSet<u32> = cells
            .iter()
            .flat_map(|&c| mesh.neighbors[c as usize].iter().copied())
            .filter(|&nb| mesh.h[nb as usize] >= SEA_LEVEL && f[nb as usize] != id)
            .collect();
        let min_shore = shoreline
            .iter()
            .map(|&c| mesh.h[c as usize])
            .min()
            .unwrap_or(SEA_LEVEL) as f64;
        feature.lake = Some(LakeData {
            height: crate::geometry::round_to(min_shore - LAKE_ELEVATION_DELTA, 2) as f32,
            shoreline: shoreline.into_iter().collect(),
            ..LakeData::default()
        });
    }
    feature
}

/// 按面积与气候细分连通区类别（需要在水文之后调用）
pub fn specify_features(features: &mut [Feature], f: &[FeatureId], grid_cells: usize) {
    let grid_cells = grid_cells as f64;
    for idx in 1..features.len() {
        let group = {
            let feature = &features[idx];
            let cells = feature.cells as f64;
            match feature.kind {
                FeatureType::Ocean => {
                    if cells > grid_cells / 25.0 {
                        FeatureGroup::Ocean
                    } else if cells > grid_cells / 1000.0 {
                        FeatureGroup::Sea
                    } else {
                        FeatureGroup::Gulf
                    }
                }
                FeatureType::Island => {
                    // 首个单元格的前一个单元格属于湖泊时视为湖中岛
                    let first = feature.first_cell as usize;
                    let prev_is_lake = first
                        .checked_sub(1)
                        .and_then(|p| f.get(p))
                        .map(|id| features[id.index()].kind == FeatureType::Lake)
                        .unwrap_or(false);
                    if prev_is_lake {
                        FeatureGroup::LakeIsland
                    } else if cells > grid_cells / 10.0 {
                        FeatureGroup::Continent
                    } else if cells > grid_cells / 1000.0 {
                        FeatureGroup::Island
                    } else {
                        FeatureGroup::Isle
                    }
                }
                FeatureType::Lake => lake_group(feature),
            }
        };
        features[idx].group = Some(group);
    }
}

fn lake_group(feature: &Feature) -> FeatureGroup {
    let Some(lake) = &feature.lake else {
        return FeatureGroup::Freshwater;
    };
    let odd_cell = feature.first_cell % 10 == 0;

    if lake.temp < -3.0 {
        return FeatureGroup::Frozen;
    }
    if lake.height > 60.0 && feature.cells < 10 && odd_cell {
        return FeatureGroup::Lava;
    }
    if lake.inlets.is_empty() && lake.outlet.is_none() {
        if lake.evaporation > lake.flux * 4.0 {
            return FeatureGroup::Dry;
        }
        if feature.cells < 3 && odd_cell {
            return FeatureGroup::Sinkhole;
        }
    }
    if lake.outlet.is_none() && lake.evaporation > lake.flux {
        return FeatureGroup::Salt;
    }
    FeatureGroup::Freshwater
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delaunay::DelaunatorProvider;
    use crate::map::RawGrid;
    use crate::rng::MapRng;

    /// 中间一块陆地，其中挖一个湖
    fn island_grid() -> HeightedGrid {
        let mut rng = MapRng::new("markup");
        let mesh = RawGrid::build(500.0, 500.0, 1_000, &mut rng, &DelaunatorProvider).unwrap();
        let heights = mesh
            .points
            .iter()
            .map(|p| {
                let d = ((p.x - 250.0).powi(2) + (p.y - 250.0).powi(2)).sqrt();
                if d < 40.0 {
                    10
                } else if d < 180.0 {
                    50
                } else {
                    5
                }
            })
            .collect();
        HeightedGrid { mesh, heights }
    }

    #[test]
    fn test_markup_distance() {
        // 一条链 0-1-2-3-4
        let neighbors: Vec<Vec<u32>> = (0..5u32)
            .map(|i| {
                let mut v = Vec::new();
                if i > 0 {
                    v.push(i - 1);
                }
                if i < 4 {
                    v.push(i + 1);
                }
                v
            })
            .collect();
        let mut t = vec![-1, 0, 0, 0, 0];
        markup_distance(&mut t, &neighbors, -2, -1, -4);
        assert_eq!(t, vec![-1, -2, -3, 0, 0]);
    }

    #[test]
    fn grid_features_split_ocean_land_and_lake() {
        let marked = markup_grid(island_grid());
        assert!(marked.f.iter().all(|f| f.is_some()));
        let kinds: Vec<FeatureType> = marked.features[1..].iter().map(|f| f.kind).collect();
        assert!(kinds.contains(&FeatureType::Ocean));
        assert!(kinds.contains(&FeatureType::Island));
        assert!(kinds.contains(&FeatureType::Lake));

        let total: u32 = marked.features.iter().map(|f| f.cells).sum();
        assert_eq!(total as usize, marked.heights.len());
    }

    #[test]
    fn coast_marks_sit_on_the_shore() {
        let marked = markup_grid(island_grid());
        for (i, &t) in marked.t.iter().enumerate() {
            let land = marked.heights[i] >= SEA_LEVEL;
            let touches_other = marked.mesh.neighbors[i]
                .iter()
                .any(|&n| (marked.heights[n as usize] >= SEA_LEVEL) != land);
            match t {
                LAND_COAST => assert!(land && touches_other),
                WATER_COAST => assert!(!land && touches_other),
                d if d < 0 => assert!(!land),
                _ => {}
            }
        }
    }

    #[test]
    fn groups_follow_size_bands() {
        let mut features = vec![
            Feature::placeholder(),
            Feature::new(FeatureId::new(1), false, true, 0),
            Feature::new(FeatureId::new(2), true, false, 5),
            Feature::new(FeatureId::new(3), true, false, 9),
        ];
        features[1].cells = 900;
        features[2].cells = 200;
        features[3].cells = 1;
        let f = vec![FeatureId::new(1); 10];
        specify_features(&mut features, &f, 1_000);
        assert_eq!(features[1].group, Some(FeatureGroup::Ocean));
        assert_eq!(features[2].group, Some(FeatureGroup::Continent));
        assert_eq!(features[3].group, Some(FeatureGroup::Isle));
    }

    #[test]
    fn lake_groups_follow_climate() {
        let mut lake = Feature::new(FeatureId::new(1), false, false, 11);
        lake.cells = 5;
        lake.lake = Some(LakeData {
            temp: -5.0,
            ..LakeData::default()
        });
        assert_eq!(lake_group(&lake), FeatureGroup::Frozen);

        lake.lake = Some(LakeData {
            temp: 10.0,
            flux: 10.0,
            evaporation: 50.0,
            ..LakeData::default()
        });
        assert_eq!(lake_group(&lake), FeatureGroup::Dry);

        lake.lake = Some(LakeData {
            temp: 10.0,
            flux: 10.0,
            evaporation: 20.0,
            inlets: vec![crate::ids::RiverId::new(1)],
            ..LakeData::default()
        });
        assert_eq!(lake_group(&lake), FeatureGroup::Salt);

        lake.lake = Some(LakeData {
            temp: 10.0,
            flux: 100.0,
            evaporation: 20.0,
            outlet: crate::ids::RiverId::new(2),
            ..LakeData::default()
        });
        assert_eq!(lake_group(&lake), FeatureGroup::Freshwater);
    }
}
