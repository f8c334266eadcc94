//! 湖泊的气候数据：温度、降水汇入、蒸发

use crate::geometry::round_to;
use crate::map::{Grid, PackTerrain};

/// 湖面蒸发量（随温度升高、随海拔降低）
pub fn evaporation(height: f64, temp: f64, cells: u32, height_exponent: f64) -> f64 {
    let height_in_meters = (height - 18.0).max(0.0).powf(height_exponent);
    let per_cell = (700.0 * (temp + 0.006 * height_in_meters) / 50.0 + 75.0) / (80.0 - temp);
    round_to((per_cell * cells as f64).max(0.0), 0)
}

/// 填写湖泊的温度、自身降水与蒸发
///
/// `lake_cells` 按连通区编号索引；`lake_elevation` 为排水方案中的湖面高度
pub fn define_climate_data(
    terrain: &mut PackTerrain,
    grid: &Grid,
    lake_cells: &[Vec<u32>],
    lake_elevation: &[f64],
    height_exponent: f64,
) {
    let g = &terrain.mesh.g;
    for (i, feature) in terrain.features.iter_mut().enumerate() {
        let Some(lake) = feature.lake.as_mut() else {
            continue;
        };
        let cells = &lake_cells[i];
        if cells.is_empty() {
            continue;
        }

        lake.height = round_to(lake_elevation[i], 2) as f32;
        let temp = cells
            .iter()
            .map(|&c| grid.temp[g[c as usize] as usize] as f64)
            .sum::<f64>()
            / cells.len() as f64;
        lake.temp = round_to(temp, 1) as f32;
        lake.flux = cells
            .iter()
            .map(|&c| grid.prec[g[c as usize] as usize] as f32)
            .sum();
        lake.evaporation = evaporation(
            lake.height as f64,
            lake.temp as f64,
            feature.cells,
            height_exponent,
        ) as f32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warm_lakes_evaporate_more() {
        let cold = evaporation(19.9, 0.0, 10, 2.0);
        let warm = evaporation(19.9, 25.0, 10, 2.0);
        assert!(warm > cold);
        assert!(evaporation(19.9, 10.0, 20, 2.0) > evaporation(19.9, 10.0, 10, 2.0));
    }

    #[test]
    fn evaporation_is_never_negative() {
        assert_eq!(evaporation(19.9, -60.0, 5, 2.0), 0.0);
    }
}
