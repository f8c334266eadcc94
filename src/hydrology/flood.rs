//! 洼地消除（priority-flood）
//!
//! 从海洋和地图边缘出发，按工作高度从低到高向内淹没。每个单元格被淹没时
//! 至少比淹没它的单元格高 `EPSILON`，因此任何陆地都有一条严格下降的路径通向
//! 海洋或地图边缘。湖泊作为一个整体节点参与淹没，第一个淹到湖岸的单元格就是
//! 湖泊的溢出口。

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::map::{FeatureType, PackTerrain, SEA_LEVEL};

/// 每一步至少抬升的高度
pub const EPSILON: f64 = 0.1;

/// 陆地单元格的水流去向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Receiver {
    /// 流向相邻单元格（陆地、海洋或湖泊）
    Cell(u32),
    /// 从地图边缘流出
    OffMap,
    /// 洼地，水流就此停止
    Sink,
}

/// 湖泊溢出口：湖岸陆地单元格与它相邻的湖面单元格
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LakeOutlet {
    pub shore: u32,
    pub lake_cell: u32,
}

/// 排水方案
#[derive(Debug, Clone)]
pub struct DrainagePlan {
    /// 每个单元格的工作高度
    pub elevation: Vec<f64>,
    /// 每个连通区的水面高度（只对湖泊有意义）
    pub lake_elevation: Vec<f64>,
    pub receiver: Vec<Receiver>,
    pub lake_outlet: Vec<Option<LakeOutlet>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Node {
    Cell(usize),
    Lake(usize),
}

/// 最小堆条目：高度相同时先入先出
struct FloodEntry {
    elevation: f64,
    seq: u64,
    node: Node,
}

impl PartialEq for FloodEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FloodEntry {}

impl PartialOrd for FloodEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloodEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap 是最大堆，反转后得到最小堆
        other
            .elevation
            .total_cmp(&self.elevation)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// 排水用的工作高度：陆地按离岸距离略微抬高，让平地上的水流向海岸
pub fn alter_heights(terrain: &PackTerrain) -> Vec<f64> {
    let mesh = &terrain.mesh;
    (0..terrain.len())
        .map(|i| {
            let h = mesh.h[i] as f64;
            if mesh.h[i] < SEA_LEVEL || terrain.t[i] < 1 {
                return h;
            }
            let neighbors = &mesh.neighbors[i];
            let mean_t = if neighbors.is_empty() {
                0.0
            } else {
                neighbors.iter().map(|&c| terrain.t[c as usize] as f64).sum::<f64>()
                    / neighbors.len() as f64
            };
            h + terrain.t[i] as f64 / 100.0 + mean_t / 10_000.0
        })
        .collect()
}

/// 每个连通区的单元格列表
pub fn feature_cells(terrain: &PackTerrain) -> Vec<Vec<u32>> {
    let mut cells = vec![Vec::new(); terrain.features.len()];
    for (i, f) in terrain.f.iter().enumerate() {
        cells[f.index()].push(i as u32);
    }
    cells
}

fn initial_lake_elevation(terrain: &PackTerrain) -> Vec<f64> {
    terrain
        .features
        .iter()
        .map(|f| f.lake.as_ref().map(|l| l.height as f64).unwrap_or(0.0))
        .collect()
}

/// priority-flood 消除洼地
pub fn resolve_depressions(terrain: &PackTerrain, lake_cells: &[Vec<u32>]) -> DrainagePlan {
    let n = terrain.len();
    let mesh = &terrain.mesh;
    let mut elevation = alter_heights(terrain);
    let mut lake_elevation = initial_lake_elevation(terrain);
    let mut receiver = vec![Receiver::Sink; n];
    let mut lake_outlet = vec![None; terrain.features.len()];

    let mut resolved = vec![false; n];
    let mut lake_resolved = vec![false; terrain.features.len()];
    let mut heap = BinaryHeap::new();
    let mut seq = 0u64;
    let mut push = |heap: &mut BinaryHeap<FloodEntry>, elevation: f64, node: Node| {
        heap.push(FloodEntry {
            elevation,
            seq,
            node,
        });
        seq += 1;
    };

    // 种子：海洋单元格与边缘陆地
    for i in 0..n {
        let land = terrain.is_land(i);
        if !land && terrain.feature_of(i).kind == FeatureType::Ocean {
            resolved[i] = true;
            push(&mut heap, elevation[i], Node::Cell(i));
        } else if land && mesh.border[i] {
            resolved[i] = true;
            receiver[i] = Receiver::OffMap;
            push(&mut heap, elevation[i], Node::Cell(i));
        }
    }

    while let Some(FloodEntry { node, .. }) = heap.pop() {
        match node {
            Node::Cell(c) => {
                let level = elevation[c];
                for &nb in &mesh.neighbors[c] {
                    let nb = nb as usize;
                    if terrain.is_land(nb) {
                        if resolved[nb] {
                            continue;
                        }
                        resolved[nb] = true;
                        elevation[nb] = elevation[nb].max(level + EPSILON);
                        receiver[nb] = Receiver::Cell(c as u32);
                        push(&mut heap, elevation[nb], Node::Cell(nb));
                        continue;
                    }

                    let feature = terrain.f[nb].index();
                    if terrain.features[feature].kind != FeatureType::Lake
                        || lake_resolved[feature]
                    {
                        continue;
                    }
                    // 只有陆地能给湖泊提供溢出口
                    if !terrain.is_land(c) {
                        continue;
                    }
                    lake_resolved[feature] = true;
                    lake_elevation[feature] = lake_elevation[feature].max(level + EPSILON);
                    lake_outlet[feature] = Some(LakeOutlet {
                        shore: c as u32,
                        lake_cell: nb as u32,
                    });
                    push(&mut heap, lake_elevation[feature], Node::Lake(feature));
                }
            }
            Node::Lake(feature) => {
                let level = lake_elevation[feature];
                for &lc in &lake_cells[feature] {
                    let lc = lc as usize;
                    resolved[lc] = true;
                    elevation[lc] = elevation[lc].max(level);
                    for &nb in &mesh.neighbors[lc] {
                        let nb = nb as usize;
                        if resolved[nb] || !terrain.is_land(nb) {
                            continue;
                        }
                        resolved[nb] = true;
                        elevation[nb] = elevation[nb].max(level + EPSILON);
                        receiver[nb] = Receiver::Cell(lc as u32);
                        push(&mut heap, elevation[nb], Node::Cell(nb));
                    }
                }
            }
        }
    }

    prefer_haven(terrain, &mut receiver);

    DrainagePlan {
        elevation,
        lake_elevation,
        receiver,
        lake_outlet,
    }
}

/// 不消除洼地：陆地流向最低的邻居，湖泊不外流
pub fn steepest_descent(terrain: &PackTerrain) -> DrainagePlan {
    let mesh = &terrain.mesh;
    let elevation = alter_heights(terrain);
    let lake_elevation = initial_lake_elevation(terrain);

    let mut receiver: Vec<Receiver> = (0..terrain.len())
        .map(|i| {
            if !terrain.is_land(i) {
                return Receiver::Sink;
            }
            let lowest = mesh.neighbors[i]
                .iter()
                .copied()
                .min_by(|&a, &b| elevation[a as usize].total_cmp(&elevation[b as usize]));
            match lowest {
                Some(l) if elevation[l as usize] < elevation[i] => Receiver::Cell(l),
                _ if mesh.border[i] => Receiver::OffMap,
                _ => Receiver::Sink,
            }
        })
        .collect();

    prefer_haven(terrain, &mut receiver);

    DrainagePlan {
        elevation,
        lake_elevation,
        receiver,
        lake_outlet: vec![None; terrain.features.len()],
    }
}

/// 海岸单元格直接流入最近的同一水体
fn prefer_haven(terrain: &PackTerrain, receiver: &mut [Receiver]) {
    for (i, r) in receiver.iter_mut().enumerate() {
        let (Receiver::Cell(to), Some(haven)) = (*r, terrain.haven[i]) else {
            continue;
        };
        let to = to as usize;
        if !terrain.is_land(to) && terrain.f[to] == terrain.f[haven as usize] {
            *r = Receiver::Cell(haven);
        }
    }
}

/// 处理顺序：按工作高度从高到低
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainNode {
    Cell(u32),
    Lake(u32),
}

pub fn drain_order(terrain: &PackTerrain, plan: &DrainagePlan) -> Vec<DrainNode> {
    let mut nodes: Vec<(f64, DrainNode)> = (0..terrain.len())
        .filter(|&i| terrain.is_land(i))
        .map(|i| (plan.elevation[i], DrainNode::Cell(i as u32)))
        .collect();
    for (i, feature) in terrain.features.iter().enumerate().skip(1) {
        if feature.kind == FeatureType::Lake {
            nodes.push((plan.lake_elevation[i], DrainNode::Lake(i as u32)));
        }
    }
    nodes.sort_by(|a, b| {
        b.0.total_cmp(&a.0).then_with(|| {
            let key = |n: &DrainNode| match *n {
                DrainNode::Cell(c) => (0, c),
                DrainNode::Lake(l) => (1, l),
            };
            key(&a.1).cmp(&key(&b.1))
        })
    });
    nodes.into_iter().map(|(_, node)| node).collect()
}
