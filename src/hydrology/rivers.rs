//! 河流：汇流、合并、宽度与下切

use serde::{Deserialize, Serialize};

use super::flood::{DrainNode, DrainagePlan, Receiver};
use crate::geometry::{round_to, Point};
use crate::ids::RiverId;
use crate::map::{Grid, PackTerrain};

/// 形成河流所需的最小流量
pub const MIN_FLUX_TO_FORM_RIVER: u16 = 30;
/// 少于这么多个点的河流被丢弃
const MIN_RIVER_POINTS: usize = 3;
const FLUX_FACTOR: f64 = 500.0;
const MAX_FLUX_WIDTH: f64 = 1.0;
const LENGTH_FACTOR: f64 = 200.0;
const LENGTH_PROGRESSION: [f64; 9] = [1.0, 1.0, 2.0, 3.0, 5.0, 8.0, 13.0, 21.0, 34.0];
/// 单次下切的最大深度
const MAX_DOWNCUT: u8 = 5;
const MIN_DOWNCUT_HEIGHT: u8 = 35;

/// 河流
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct River {
    pub i: RiverId,
    pub source: u32,
    pub mouth: u32,
    /// 河口流量
    pub discharge: f32,
    /// 沿单元格中心的折线长度
    pub length: f32,
    /// 河口宽度
    pub width: f32,
    pub width_factor: f32,
    pub source_width: f32,
    /// 汇入的河流，干流为 NONE
    pub parent: RiverId,
    /// 所在流域的干流
    pub basin: RiverId,
    /// 流经的单元格（从源头到河口之后的水体）
    pub cells: Vec<u32>,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// 源头宽度
pub fn source_width(flux: f64) -> f64 {
    round_to((flux.powf(0.9) / FLUX_FACTOR).min(1.0), 2)
}

/// 沿河累积的宽度偏移
pub fn width_offset(flux: f64, point_index: usize, width_factor: f64, starting_width: f64) -> f64 {
    if point_index == 0 {
        return starting_width;
    }
    let flux_width = (flux.powf(0.7) / FLUX_FACTOR).min(MAX_FLUX_WIDTH);
    let progression = LENGTH_PROGRESSION[point_index.min(LENGTH_PROGRESSION.len() - 1)];
    let length_width = point_index as f64 / LENGTH_FACTOR + progression / LENGTH_FACTOR;
    width_factor * (length_width + flux_width) + starting_width
}

/// 河口宽度
pub fn river_width(offset: f64) -> f64 {
    round_to((offset / 1.5).powf(1.8), 2)
}

/// 汇流过程的工作状态
pub(crate) struct Drainer<'a> {
    terrain: &'a mut PackTerrain,
    pub fl: Vec<u16>,
    conf: Vec<u16>,
    pub r: Vec<RiverId>,
    /// 按河流编号索引，None 表示流出地图
    river_cells: Vec<Vec<Option<u32>>>,
    parents: Vec<RiverId>,
    /// 每个湖泊当前主要入湖河的流量
    entering_flux: Vec<f64>,
    cells_modifier: f64,
}

impl<'a> Drainer<'a> {
    pub fn new(terrain: &'a mut PackTerrain, cells_desired: usize) -> Self {
        let n = terrain.len();
        let features = terrain.features.len();
        Self {
            terrain,
            fl: vec![0; n],
            conf: vec![0; n],
            r: vec![RiverId::NONE; n],
            river_cells: vec![Vec::new()],
            parents: vec![RiverId::NONE],
            entering_flux: vec![0.0; features],
            cells_modifier: (cells_desired as f64 / 10_000.0).powf(0.25),
        }
    }

    fn add_flux(&mut self, cell: usize, amount: f64) {
        let v = self.fl[cell] as f64 + amount;
        self.fl[cell] = v.clamp(0.0, u16::MAX as f64) as u16;
    }

    fn new_river(&mut self) -> Option<RiverId> {
        let next = self.river_cells.len();
        if next > u16::MAX as usize {
            return None;
        }
        self.river_cells.push(Vec::new());
        self.parents.push(RiverId::NONE);
        Some(RiverId::new(next))
    }

    fn add_cell_to_river(&mut self, cell: Option<u32>, river: RiverId) {
        if let Some(cells) = self.river_cells.get_mut(river.index()) {
            cells.push(cell);
        }
    }

    fn set_parent(&mut self, river: RiverId, parent: RiverId) {
        if river != parent {
            if let Some(p) = self.parents.get_mut(river.index()) {
                *p = parent;
            }
        }
    }

    /// 按顺序处理每个陆地单元格和湖泊
    pub fn run(&mut self, grid: &Grid, plan: &DrainagePlan, order: &[DrainNode]) {
        for node in order {
            match *node {
                DrainNode::Cell(c) => self.drain_cell(c as usize, grid, plan),
                DrainNode::Lake(l) => self.drain_lake(l as usize, plan),
            }
        }
    }

    fn drain_cell(&mut self, cell: usize, grid: &Grid, plan: &DrainagePlan) {
        let g = self.terrain.mesh.g[cell] as usize;
        self.add_flux(cell, grid.prec[g] as f64 / self.cells_modifier);

        let to = match plan.receiver[cell] {
            Receiver::Cell(to) => to as usize,
            Receiver::OffMap => {
                // 边缘单元格：河水流出地图
                if self.r[cell].is_some() {
                    self.add_cell_to_river(None, self.r[cell]);
                }
                return;
            }
            Receiver::Sink => return,
        };

        if self.fl[cell] < MIN_FLUX_TO_FORM_RIVER {
            // 流量太小，只是渗流
            if self.terrain.is_land(to) {
                let flux = self.fl[cell] as f64;
                self.add_flux(to, flux);
            }
            return;
        }

        if self.r[cell].is_none() {
            let Some(river) = self.new_river() else {
                return;
            };
            self.r[cell] = river;
            self.add_cell_to_river(Some(cell as u32), river);
        }
        let flux = self.fl[cell] as f64;
        self.flow_down(to, flux, self.r[cell]);
    }

    fn drain_lake(&mut self, feature: usize, plan: &DrainagePlan) {
        let Some(outlet) = plan.lake_outlet[feature] else {
            return;
        };
        let Some(lake) = self.terrain.features[feature].lake.clone() else {
            return;
        };
        if lake.flux <= lake.evaporation {
            return;
        }

        let lake_cell = outlet.lake_cell as usize;
        self.add_flux(lake_cell, (lake.flux - lake.evaporation) as f64);

        // 入湖的主要河流穿湖而过
        if self.r[lake_cell] != lake.river || lake.river.is_none() {
            let same_river = lake.river.is_some()
                && self.terrain.mesh.neighbors[lake_cell]
                    .iter()
                    .any(|&c| self.r[c as usize] == lake.river);
            let river = if same_river {
                lake.river
            } else {
                match self.new_river() {
                    Some(river) => river,
                    None => return,
                }
            };
            self.r[lake_cell] = river;
            self.add_cell_to_river(Some(lake_cell as u32), river);
        }

        let outlet_river = self.r[lake_cell];
        for &inlet in &lake.inlets {
            self.set_parent(inlet, outlet_river);
        }
        if let Some(data) = self.terrain.features[feature].lake.as_mut() {
            data.outlet = outlet_river;
            data.outlet_cell = Some(outlet.shore);
        }

        let flux = self.fl[lake_cell] as f64;
        self.flow_down(outlet.shore as usize, flux, outlet_river);
    }

    /// 把流量交给下游单元格，遇到已有河流时流量大的一方延续编号
    fn flow_down(&mut self, to: usize, from_flux: f64, river: RiverId) {
        let to_flux = self.fl[to] as f64 - self.conf[to] as f64;
        let to_river = self.r[to];
        let to_land = self.terrain.is_land(to);

        if to_river.is_some() {
            if from_flux > to_flux {
                self.conf[to] = self.conf[to].saturating_add(self.fl[to]);
                if to_land {
                    self.set_parent(to_river, river);
                }
                self.r[to] = river;
            } else {
                self.conf[to] = self.conf[to].saturating_add(from_flux as u16);
                if to_land {
                    self.set_parent(river, to_river);
                }
            }
        } else {
            self.r[to] = river;
        }

        if to_land {
            self.add_flux(to, from_flux);
        } else {
            let feature = self.terrain.f[to].index();
            if let Some(lake) = self.terrain.features[feature].lake.as_mut() {
                if lake.river.is_none() || from_flux > self.entering_flux[feature] {
                    lake.river = river;
                    self.entering_flux[feature] = from_flux;
                }
                lake.flux += from_flux as f32;
                lake.inlets.push(river);
            }
        }
        self.add_cell_to_river(Some(to as u32), river);
    }

    /// 整理河流：丢弃过短的，计算长度、宽度与流域
    pub fn define_rivers(self, width_scale: f64) -> (Vec<u16>, Vec<u8>, Vec<RiverId>, Vec<River>) {
        let terrain = &*self.terrain;
        let n = terrain.len();
        let mut r = vec![RiverId::NONE; n];
        let mut conf = vec![0u8; n];
        let mut rivers = Vec::new();

        let default_factor = round_to(width_scale, 2);
        let main_stem_factor = default_factor * 1.2;

        for (idx, entries) in self.river_cells.iter().enumerate().skip(1) {
            if entries.len() < MIN_RIVER_POINTS {
                continue;
            }
            let id = RiverId::new(idx);
            let cells: Vec<u32> = entries.iter().flatten().copied().collect();
            if cells.is_empty() {
                continue;
            }

            for &cell in &cells {
                let cell = cell as usize;
                if !terrain.is_land(cell) {
                    continue;
                }
                if r[cell].is_some() {
                    conf[cell] = 1;
                } else {
                    r[cell] = id;
                }
            }

            let source = cells[0];
            let mouth = entries[entries.len() - 2].unwrap_or(cells[cells.len() - 1]);
            let parent = self.parents[idx];
            let width_factor = if parent.is_none() || parent == id {
                main_stem_factor
            } else {
                default_factor
            };

            let discharge = self.fl[mouth as usize] as f64;
            let points: Vec<Point> = cells
                .iter()
                .map(|&c| terrain.mesh.points[c as usize])
                .collect();
            let length: f64 = points.windows(2).map(|w| w[0].distance(w[1])).sum();
            let start_width = source_width(self.fl[source as usize] as f64);
            let offset = width_offset(discharge, entries.len(), width_factor, start_width);

            rivers.push(River {
                i: id,
                source,
                mouth,
                discharge: discharge as f32,
                length: round_to(length, 2) as f32,
                width: river_width(offset) as f32,
                width_factor: width_factor as f32,
                source_width: start_width as f32,
                parent,
                basin: id,
                cells,
                name: String::new(),
                kind: String::new(),
            });
        }

        // 保留下来的河流中找出每条河的干流
        let kept: std::collections::HashMap<RiverId, RiverId> =
            rivers.iter().map(|river| (river.i, river.parent)).collect();
        for river in rivers.iter_mut() {
            let mut basin = river.i;
            for _ in 0..kept.len() {
                match kept.get(&basin) {
                    Some(&parent)
                        if parent.is_some() && parent != basin && kept.contains_key(&parent) =>
                    {
                        basin = parent;
                    }
                    _ => break,
                }
            }
            river.basin = basin;
            if !kept.contains_key(&river.parent) {
                river.parent = RiverId::NONE;
            }
        }

        (self.fl, conf, r, rivers)
    }
}

/// 河流下切：流量远大于上游邻居的单元格被降低
pub fn downcut_rivers(heights: &mut [u8], neighbors: &[Vec<u32>], fl: &[u16]) {
    for i in 0..heights.len() {
        if heights[i] < MIN_DOWNCUT_HEIGHT || fl[i] == 0 {
            continue;
        }
        let higher: Vec<usize> = neighbors[i]
            .iter()
            .map(|&c| c as usize)
            .filter(|&c| heights[c] > heights[i])
            .collect();
        if higher.is_empty() {
            continue;
        }
        let higher_flux = higher.iter().map(|&c| fl[c] as f64).sum::<f64>() / higher.len() as f64;
        if higher_flux == 0.0 {
            continue;
        }
        let downcut = (fl[i] as f64 / higher_flux).floor();
        if downcut >= 1.0 {
            heights[i] -= (downcut as u8).min(MAX_DOWNCUT).min(heights[i]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wider_downstream() {
        let narrow = river_width(width_offset(50.0, 3, 1.0, 0.1));
        let wide = river_width(width_offset(2_000.0, 30, 1.0, 0.1));
        assert!(wide > narrow);
    }

    #[test]
    fn main_stem_is_wider() {
        let tributary = river_width(width_offset(500.0, 10, 1.0, 0.2));
        let main = river_width(width_offset(500.0, 10, 1.2, 0.2));
        assert!(main > tributary);
    }

    #[test]
    fn source_width_is_capped() {
        assert_eq!(source_width(1e9), 1.0);
        assert!(source_width(30.0) < 0.2);
    }

    #[test]
    fn test_downcut() {
        // 中间单元格流量是上游的 3 倍
        let neighbors = vec![vec![1], vec![0, 2], vec![1]];
        let mut heights = vec![60, 50, 40];
        let fl = vec![10, 30, 5];
        downcut_rivers(&mut heights, &neighbors, &fl);
        assert_eq!(heights[1], 47);
        // 源头没有更高的邻居
        assert_eq!(heights[0], 60);
    }
}
