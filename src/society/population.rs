//! 宜居度与人口

use serde::{Deserialize, Serialize};

use crate::biomes::BiomeTable;
use crate::geometry::{median, normalize};
use crate::hydrology::Hydrology;
use crate::map::{FeatureGroup, FeatureType, PackTerrain, SEA_LEVEL};

/// 每个单元格的宜居度与乡村人口
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Population {
    /// 宜居度，0 表示无人居住
    pub s: Vec<i16>,
    /// 乡村人口（千人）
    pub pop: Vec<f32>,
}

impl Population {
    /// 有人居住的陆地单元格
    pub fn populated(&self) -> impl Iterator<Item = usize> + '_ {
        self.s.iter().enumerate().filter(|(_, &s)| s > 0).map(|(i, _)| i)
    }
}

fn coast_bonus(terrain: &PackTerrain, hydrology: &Hydrology, cell: usize) -> f64 {
    let mut bonus = 0.0;
    if hydrology.r[cell].is_some() {
        // 河口
        bonus += 15.0;
    }
    let Some(feature) = terrain.haven_feature(cell) else {
        return bonus;
    };
    if feature.kind == FeatureType::Lake {
        bonus += match feature.group {
            Some(FeatureGroup::Freshwater) => 30.0,
            Some(FeatureGroup::Salt) => 10.0,
            Some(FeatureGroup::Frozen) => 1.0,
            Some(FeatureGroup::Dry) | Some(FeatureGroup::Sinkhole) => -5.0,
            Some(FeatureGroup::Lava) => -30.0,
            _ => 0.0,
        };
    } else {
        bonus += 5.0;
        if terrain.harbor[cell] == 1 {
            // 避风港
            bonus += 20.0;
        }
    }
    bonus
}

/// 按群系、河流、海拔和海岸条件为单元格打分
pub fn rank_cells(
    terrain: &PackTerrain,
    hydrology: &Hydrology,
    biomes: &[u8],
    table: &BiomeTable,
) -> Population {
    let n = terrain.len();
    let mut s = vec![0i16; n];
    let mut pop = vec![0f32; n];

    let flux: Vec<f64> = hydrology
        .fl
        .iter()
        .filter(|&&f| f > 0)
        .map(|&f| f as f64)
        .collect();
    let fl_mean = median(&flux).unwrap_or(0.0);
    let fl_max = hydrology.fl.iter().copied().max().unwrap_or(0) as f64
        + hydrology.conf.iter().copied().max().unwrap_or(0) as f64;
    let area_mean = if n == 0 {
        1.0
    } else {
        terrain.mesh.area.iter().map(|&a| a as f64).sum::<f64>() / n as f64
    };

    for i in 0..n {
        if terrain.mesh.h[i] < SEA_LEVEL {
            continue;
        }
        let habitability = table.habitability(biomes[i]) as f64;
        if habitability == 0.0 {
            continue;
        }

        let mut score = habitability;
        if fl_mean > 0.0 {
            let fl = hydrology.fl[i] as f64 + hydrology.conf[i] as f64;
            score += normalize(fl, fl_mean, fl_max) * 250.0;
        }
        score -= (terrain.mesh.h[i] as f64 - 50.0) / 5.0;
        if terrain.t[i] == 1 {
            score += coast_bonus(terrain, hydrology, i);
        }

        s[i] = (score / 5.0).trunc() as i16;
        if s[i] > 0 && area_mean > 0.0 {
            pop[i] = (s[i] as f64 * terrain.mesh.area[i] as f64 / area_mean) as f32;
        }
    }

    let populated = s.iter().filter(|&&v| v > 0).count();
    log::debug!("population: {populated} populated cells");

    Population { s, pop }
}
