//! 粗网格 (Grid)
//!
//! 抖动方格点 + 地图外的一圈边界点，三角剖分后推导出单元格邻接。
//! 后续阶段在此基础上逐步补充字段，每个阶段都是一个独立的类型：
//!
//! ```text
//! RawGrid ──heightmap──▶ HeightedGrid ──markup──▶ MarkedGrid ──climate──▶ Grid
//! ```

use serde::{Deserialize, Serialize};

use super::feature::Feature;
use crate::delaunay::{Triangulator, VoronoiGraph};
use crate::error::{MapError, Result};
use crate::geometry::{round_to, Point};
use crate::ids::FeatureId;
use crate::rng::MapRng;

/// 网格几何与拓扑
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawGrid {
    pub width: f64,
    pub height: f64,
    pub spacing: f64,
    pub cells_desired: usize,
    pub cells_x: usize,
    pub cells_y: usize,
    /// 内部点，按行优先排列
    pub points: Vec<Point>,
    /// 地图外的边界点
    pub boundary: Vec<Point>,
    /// 单元格邻接表 `c`
    pub neighbors: Vec<Vec<u32>>,
    /// 单元格多边形顶点 `v`
    pub cell_vertices: Vec<Vec<u32>>,
    /// 是否与边界点相邻 `b`
    pub border: Vec<bool>,
    /// Voronoi 顶点坐标
    pub vertices: Vec<Point>,
}

impl RawGrid {
    /// 放置点并三角剖分
    pub fn build(
        width: f64,
        height: f64,
        cells_desired: usize,
        rng: &mut MapRng,
        triangulator: &dyn Triangulator,
    ) -> Result<Self> {
        if cells_desired == 0 || width <= 0.0 || height <= 0.0 {
            return Err(MapError::generation("grid needs a positive size and cell count"));
        }

        let spacing = round_to((width * height / cells_desired as f64).sqrt(), 2);
        let cells_x = ((width + 0.5 * spacing - 1e-10) / spacing).floor() as usize;
        let cells_y = ((height + 0.5 * spacing - 1e-10) / spacing).floor() as usize;

        let boundary = boundary_points(width, height, spacing);
        let points = jittered_grid(width, height, spacing, cells_x, cells_y, rng);

        let mut all_points = points.clone();
        all_points.extend_from_slice(&boundary);

        let tri = triangulator.triangulate(&all_points)?;
        tri.validate(all_points.len())?;
        let graph = VoronoiGraph::build(&tri, &all_points, points.len());

        log::debug!(
            "grid: {} cells ({}x{}), spacing {spacing}",
            points.len(),
            cells_x,
            cells_y
        );

        Ok(Self {
            width,
            height,
            spacing,
            cells_desired,
            cells_x,
            cells_y,
            points,
            boundary,
            neighbors: graph.cells.neighbors,
            cell_vertices: graph.cells.vertices,
            border: graph.cells.border,
            vertices: graph.vertices.points,
        })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// 坐标所在的网格单元（依赖行优先的点顺序）
    pub fn find_grid_cell(&self, x: f64, y: f64) -> usize {
        let col = (x / self.spacing).min((self.cells_x - 1) as f64).max(0.0).floor() as usize;
        let row = (y / self.spacing).min((self.cells_y - 1) as f64).max(0.0).floor() as usize;
        (row * self.cells_x + col).min(self.points.len().saturating_sub(1))
    }
}

/// 抖动方格点
///
/// 每个点在格子中心附近偏移至多 `0.45 * spacing`，行优先生成
fn jittered_grid(
    width: f64,
    height: f64,
    spacing: f64,
    cells_x: usize,
    cells_y: usize,
    rng: &mut MapRng,
) -> Vec<Point> {
    let radius = spacing / 2.0;
    let jittering = radius * 0.9;
    let double_jittering = jittering * 2.0;

    let mut points = Vec::with_capacity(cells_x * cells_y);
    for row in 0..cells_y {
        let y = radius + row as f64 * spacing;
        for col in 0..cells_x {
            let x = radius + col as f64 * spacing;
            let xj = round_to(x + rng.random() * double_jittering - jittering, 2).min(width);
            let yj = round_to(y + rng.random() * double_jittering - jittering, 2).min(height);
            points.push(Point::new(xj, yj));
        }
    }
    points
}

/// 边界点，用于限制 Voronoi 图的范围
fn boundary_points(width: f64, height: f64, spacing: f64) -> Vec<Point> {
    let offset = round_to(-spacing, 0);
    let b_spacing = spacing * 2.0;
    let w = width - offset * 2.0;
    let h = height - offset * 2.0;
    let number_x = ((w / b_spacing).ceil() - 1.0).max(1.0);
    let number_y = ((h / b_spacing).ceil() - 1.0).max(1.0);

    let mut points = Vec::new();
    let mut i = 0.5;
    while i < number_x {
        let x = (w * i / number_x + offset).ceil();
        // 上边界 / 下边界
        points.push(Point::new(x, offset));
        points.push(Point::new(x, h + offset));
        i += 1.0;
    }
    let mut i = 0.5;
    while i < number_y {
        let y = (h * i / number_y + offset).ceil();
        // 左边界 / 右边界
        points.push(Point::new(offset, y));
        points.push(Point::new(w + offset, y));
        i += 1.0;
    }
    points
}

/// 已绘制高度的网格
#[derive(Debug, Clone, PartialEq)]
pub struct HeightedGrid {
    pub mesh: RawGrid,
    /// 高度 0..=100，20 为海平面
    pub heights: Vec<u8>,
}

/// 已完成水陆标记的网格
#[derive(Debug, Clone, PartialEq)]
pub struct MarkedGrid {
    pub mesh: RawGrid,
    pub heights: Vec<u8>,
    /// 海岸距离：1 陆地海岸，-1 近岸水域，-2.. 深水
    pub t: Vec<i8>,
    pub f: Vec<FeatureId>,
    /// 下标 0 为占位
    pub features: Vec<Feature>,
}

/// 完整的粗网格（含气候）
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    pub mesh: RawGrid,
    pub heights: Vec<u8>,
    pub t: Vec<i8>,
    pub f: Vec<FeatureId>,
    pub features: Vec<Feature>,
    /// 摄氏温度
    pub temp: Vec<i8>,
    /// 降水量
    pub prec: Vec<u8>,
}

impl Grid {
    pub fn len(&self) -> usize {
        self.mesh.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mesh.is_empty()
    }

    pub fn is_land(&self, cell: usize) -> bool {
        self.heights[cell] >= super::SEA_LEVEL
    }
}
