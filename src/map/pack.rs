//! 精细网格 (Pack)
//!
//! 在粗网格完成水陆标记之后重新取点：丢弃远海单元格和一部分湖心单元格，
//! 沿海岸线在相邻同类海岸单元格之间加密，然后重新三角剖分。
//! 之后所有的水文与人文图层都建立在精细网格上。

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::grid::Grid;
use crate::delaunay::{Triangulator, VoronoiGraph};
use crate::error::{MapError, Result};
use crate::geometry::{polygon_area, round_to, Point};

/// 精细网格几何
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackMesh {
    pub points: Vec<Point>,
    /// 来源粗网格单元格 `g`
    pub g: Vec<u32>,
    /// 高度，继承自来源单元格
    pub h: Vec<u8>,
    pub neighbors: Vec<Vec<u32>>,
    pub cell_vertices: Vec<Vec<u32>>,
    pub border: Vec<bool>,
    /// Voronoi 顶点坐标 `vCoords`
    pub vertices: Vec<Point>,
    /// 单元格面积
    pub area: Vec<f32>,
}

impl PackMesh {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn polygon(&self, cell: usize) -> Vec<Point> {
        self.cell_vertices[cell]
            .iter()
            .map(|&v| self.vertices[v as usize])
            .collect()
    }
}

/// 从粗网格重建精细网格
pub fn repack(grid: &Grid, triangulator: &dyn Triangulator) -> Result<PackMesh> {
    let mesh = &grid.mesh;
    let spacing_sq = mesh.spacing * mesh.spacing;

    let mut points = Vec::with_capacity(grid.len());
    let mut g = Vec::with_capacity(grid.len());
    let mut h = Vec::with_capacity(grid.len());

    for i in 0..grid.len() {
        let height = grid.heights[i];
        let t = grid.t[i];
        // 远海
        if height < super::SEA_LEVEL && t != -1 && t != -2 {
            continue;
        }
        // 非近岸的湖面只保留一部分
        let feature = &grid.features[grid.f[i].index()];
        if t == -2 && (i % 4 == 0 || feature.is_lake()) {
            continue;
        }

        let p = mesh.points[i];
        points.push(p);
        g.push(i as u32);
        h.push(height);

        // 海岸线加密
        if (t == 1 || t == -1) && !mesh.border[i] {
            for &e in &mesh.neighbors[i] {
                let e = e as usize;
                if i > e || grid.t[e] != t {
                    continue;
                }
                let q = mesh.points[e];
                if p.distance_sq(q) < spacing_sq {
                    continue;
                }
                points.push(Point::new(
                    round_to((p.x + q.x) / 2.0, 1),
                    round_to((p.y + q.y) / 2.0, 1),
                ));
                g.push(i as u32);
                h.push(height);
            }
        }
    }

    if points.len() < 3 {
        return Err(MapError::generation(
            "not enough cells left to build the pack mesh",
        ));
    }

    let interior = points.len();
    let mut all_points = points.clone();
    all_points.extend_from_slice(&mesh.boundary);

    let tri = triangulator.triangulate(&all_points)?;
    tri.validate(all_points.len())?;
    let graph = VoronoiGraph::build(&tri, &all_points, interior);

    let area: Vec<f32> = (0..interior)
        .into_par_iter()
        .map(|i| polygon_area(&graph.cell_polygon(i)).abs() as f32)
        .collect();

    log::debug!("pack: {interior} cells from {} grid cells", grid.len());

    Ok(PackMesh {
        points,
        g,
        h,
        neighbors: graph.cells.neighbors,
        cell_vertices: graph.cells.vertices,
        border: graph.cells.border,
        vertices: graph.vertices.points,
        area,
    })
}

/// 完成水陆标记的精细网格
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackTerrain {
    pub mesh: PackMesh,
    /// 海岸距离：陆地 1, 2, 3..；水域 -1, -2..
    pub t: Vec<i8>,
    pub f: Vec<crate::ids::FeatureId>,
    /// 下标 0 为占位
    pub features: Vec<super::Feature>,
    /// 海岸陆地单元格最近的相邻水域单元格
    pub haven: Vec<Option<u32>>,
    /// 相邻水域单元格数量
    pub harbor: Vec<u8>,
}

impl PackTerrain {
    pub fn len(&self) -> usize {
        self.mesh.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mesh.is_empty()
    }

    pub fn is_land(&self, cell: usize) -> bool {
        self.mesh.h[cell] >= super::SEA_LEVEL
    }

    pub fn feature_of(&self, cell: usize) -> &super::Feature {
        &self.features[self.f[cell].index()]
    }

    /// 海岸单元格所临水体
    pub fn haven_feature(&self, cell: usize) -> Option<&super::Feature> {
        self.haven[cell].map(|w| self.feature_of(w as usize))
    }
}
