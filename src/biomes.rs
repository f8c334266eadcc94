//! 生物群系
//!
//! 由湿度、温度、高度和是否有河流决定。大部分陆地按 5×26 的
//! 湿度带 × 温度带矩阵查表，海洋、冰川、炎热沙漠和湿地单独判断。

use rayon::prelude::*;

use crate::hydrology::Hydrology;
use crate::map::{Grid, PackTerrain, SEA_LEVEL};

pub const MARINE: u8 = 0;
pub const HOT_DESERT: u8 = 1;
pub const COLD_DESERT: u8 = 2;
pub const SAVANNA: u8 = 3;
pub const GRASSLAND: u8 = 4;
pub const TROPICAL_SEASONAL_FOREST: u8 = 5;
pub const TEMPERATE_DECIDUOUS_FOREST: u8 = 6;
pub const TROPICAL_RAINFOREST: u8 = 7;
pub const TEMPERATE_RAINFOREST: u8 = 8;
pub const TAIGA: u8 = 9;
pub const TUNDRA: u8 = 10;
pub const GLACIER: u8 = 11;
pub const WETLAND: u8 = 12;

/// 群系数量
pub const BIOME_COUNT: usize = 13;

/// 群系静态数据
#[derive(Debug, Clone, PartialEq)]
pub struct BiomeTable {
    pub names: [&'static str; BIOME_COUNT],
    pub colors: [&'static str; BIOME_COUNT],
    /// 宜居度 0..=100
    pub habitability: [u8; BIOME_COUNT],
    /// 扩张时穿越的代价
    pub cost: [u16; BIOME_COUNT],
    /// 湿度带 × 温度带（热 → 冷）
    pub matrix: [[u8; 26]; 5],
}

impl Default for BiomeTable {
    fn default() -> Self {
        Self {
            names: [
                "Marine",
                "Hot desert",
                "Cold desert",
                "Savanna",
                "Grassland",
                "Tropical seasonal forest",
                "Temperate deciduous forest",
                "Tropical rainforest",
                "Temperate rainforest",
                "Taiga",
                "Tundra",
                "Glacier",
                "Wetland",
            ],
            colors: [
                "#466eab", "#fbe79f", "#b5b887", "#d2d082", "#c8d68f", "#b6d95d", "#29bc56",
                "#7dcb35", "#409c43", "#4b6b32", "#96784b", "#d5e7eb", "#0b9131",
            ],
            habitability: [0, 4, 10, 22, 30, 50, 100, 80, 90, 12, 4, 0, 12],
            cost: [10, 200, 150, 60, 50, 70, 70, 80, 90, 200, 1000, 5000, 150],
            matrix: [
                [
                    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 2, 2, 2, 2, 2, 2, 2, 2, 2, 10, 10,
                ],
                [
                    3, 3, 3, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 9, 9, 9, 9, 10, 10, 10, 10, 10, 10,
                    10,
                ],
                [
                    5, 6, 6, 6, 6, 6, 6, 8, 8, 8, 8, 8, 8, 8, 8, 9, 9, 9, 9, 9, 10, 10, 10, 10, 10,
                    10,
                ],
                [
                    5, 6, 6, 6, 6, 6, 6, 8, 8, 8, 8, 8, 8, 8, 8, 9, 9, 9, 9, 9, 9, 10, 10, 10, 10,
                    10,
                ],
                [
                    7, 7, 7, 7, 7, 7, 7, 7, 8, 8, 8, 8, 8, 8, 8, 9, 9, 9, 9, 9, 9, 9, 10, 10, 10,
                    10,
                ],
            ],
        }
    }
}

impl BiomeTable {
    pub fn name(&self, biome: u8) -> &'static str {
        self.names[biome as usize]
    }

    pub fn habitability(&self, biome: u8) -> u8 {
        self.habitability[biome as usize]
    }

    pub fn cost(&self, biome: u8) -> f64 {
        self.cost[biome as usize] as f64
    }

    /// 单元格的群系
    pub fn classify(&self, moisture: f64, temperature: f64, height: u8, has_river: bool) -> u8 {
        if height < SEA_LEVEL {
            return MARINE;
        }
        if temperature < -5.0 {
            return GLACIER;
        }
        if temperature >= 25.0 && !has_river && moisture < 8.0 {
            return HOT_DESERT;
        }
        if is_wetland(moisture, temperature, height) {
            return WETLAND;
        }

        let moisture_band = ((moisture / 5.0).floor().max(0.0) as usize).min(4);
        let temperature_band = (20.0 - temperature).clamp(0.0, 25.0) as usize;
        self.matrix[moisture_band][temperature_band]
    }
}

fn is_wetland(moisture: f64, temperature: f64, height: u8) -> bool {
    if temperature <= -2.0 {
        return false;
    }
    // 近海沼泽 / 内陆湿地
    (moisture > 40.0 && height < 25) || (moisture > 24.0 && height > 24 && height < 60)
}

/// 湿度：自身降水（有河流时加上流量）与陆地邻居降水的均值
fn moisture(terrain: &PackTerrain, grid: &Grid, hydrology: &Hydrology, cell: usize) -> f64 {
    let g = &terrain.mesh.g;
    let mut own = grid.prec[g[cell] as usize] as f64;
    if hydrology.r[cell].is_some() {
        own += (hydrology.fl[cell] as f64 / 10.0).max(2.0);
    }

    let (sum, count) = terrain.mesh.neighbors[cell]
        .iter()
        .map(|&c| c as usize)
        .filter(|&c| terrain.is_land(c))
        .fold((own, 1usize), |(sum, count), c| {
            (sum + grid.prec[g[c] as usize] as f64, count + 1)
        });
    (4.0 + sum / count as f64).round()
}

/// 为精细网格的每个单元格分配群系
pub fn assign_biomes(
    table: &BiomeTable,
    terrain: &PackTerrain,
    grid: &Grid,
    hydrology: &Hydrology,
) -> Vec<u8> {
    (0..terrain.len())
        .into_par_iter()
        .map(|i| {
            let h = terrain.mesh.h[i];
            if h < SEA_LEVEL {
                return MARINE;
            }
            let temperature = grid.temp[terrain.mesh.g[i] as usize] as f64;
            let m = moisture(terrain, grid, hydrology, i);
            table.classify(m, temperature, h, hydrology.r[i].is_some())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_rows_cover_every_band() {
        let table = BiomeTable::default();
        for row in &table.matrix {
            assert!(row.iter().all(|&b| (b as usize) < BIOME_COUNT));
        }
        assert_eq!(table.name(WETLAND), "Wetland");
    }

    #[test]
    fn special_cases_come_first() {
        let table = BiomeTable::default();
        assert_eq!(table.classify(50.0, 15.0, 10, false), MARINE);
        assert_eq!(table.classify(50.0, -10.0, 40, false), GLACIER);
        assert_eq!(table.classify(5.0, 30.0, 40, false), HOT_DESERT);
        // 有河流的炎热干旱地区不是沙漠
        assert_ne!(table.classify(5.0, 30.0, 40, true), HOT_DESERT);
        assert_eq!(table.classify(45.0, 10.0, 22, false), WETLAND);
        assert_eq!(table.classify(30.0, 10.0, 40, false), WETLAND);
    }

    #[test]
    fn matrix_lookup() {
        let table = BiomeTable::default();
        // 温和湿润：温带落叶林
        assert_eq!(table.classify(12.0, 18.0, 30, false), TEMPERATE_DECIDUOUS_FOREST);
        // 寒冷：苔原
        assert_eq!(table.classify(12.0, -4.0, 30, false), TUNDRA);
        // 湿热：热带雨林
        assert_eq!(table.classify(22.0, 24.0, 62, false), TROPICAL_RAINFOREST);
        // 温暖干燥：草原
        assert_eq!(table.classify(6.0, 10.0, 30, false), GRASSLAND);
    }

    #[test]
    fn uninhabitable_biomes() {
        let table = BiomeTable::default();
        assert_eq!(table.habitability(MARINE), 0);
        assert_eq!(table.habitability(GLACIER), 0);
        assert!(table.habitability(TEMPERATE_DECIDUOUS_FOREST) > table.habitability(TAIGA));
    }
}
