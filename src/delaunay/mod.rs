//! Delaunay 三角剖分与 Voronoi 图
//!
//! 三角剖分本身由可替换的 [`Triangulator`] 提供，默认实现基于 `delaunator`。
//! 本模块负责在三角剖分之上推导网格拓扑：
//!
//! ```text
//! 点集 (内部点 ++ 边界点)
//!        │
//!        ▼
//! ┌──────────────────┐
//! │  Triangulator    │  ── triangles / halfedges / hull
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │  VoronoiGraph    │  ── 单元格邻接 c、顶点 v、边界标记 b、顶点坐标
//! └──────────────────┘
//! ```

mod half_edge;
pub mod voronoi;

pub use half_edge::{next_halfedge, prev_halfedge, triangle_of_edge, HalfEdges, EMPTY};
pub use voronoi::{VoronoiCells, VoronoiGraph, VoronoiVertices};

use crate::error::{MapError, Result};
use crate::geometry::Point;

/// 三角剖分结果
///
/// - `triangles[e]` 是半边 e 的起点
/// - `halfedges[e]` 是半边 e 的对偶半边，凸包上的半边为 [`EMPTY`]
/// - 三角形 t 的三条半边为 `3t`, `3t+1`, `3t+2`
#[derive(Debug, Clone, Default)]
pub struct Triangulation {
    pub triangles: Vec<u32>,
    pub halfedges: Vec<u32>,
    pub hull: Vec<u32>,
}

impl Triangulation {
    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }

    /// 检查结构是否自洽，外部实现返回的结果在使用前都要过一遍
    pub fn validate(&self, point_count: usize) -> Result<()> {
        if self.triangles.is_empty() {
            return Err(MapError::generation("triangulation produced no triangles"));
        }
        if self.triangles.len() % 3 != 0 {
            return Err(MapError::generation(
                "triangle index count is not a multiple of 3",
            ));
        }
        if self.halfedges.len() != self.triangles.len() {
            return Err(MapError::generation(format!(
                "halfedge count {} does not match triangle index count {}",
                self.halfedges.len(),
                self.triangles.len()
            )));
        }
        if let Some(&bad) = self.triangles.iter().find(|&&p| p as usize >= point_count) {
            return Err(MapError::generation(format!(
                "triangle references point {bad} but only {point_count} points exist"
            )));
        }
        for (e, &twin) in self.halfedges.iter().enumerate() {
            if twin == EMPTY {
                continue;
            }
            let back = self.halfedges.get(twin as usize).copied();
            if back != Some(e as u32) {
                return Err(MapError::generation(format!(
                    "halfedge {e} and its twin {twin} are not paired"
                )));
            }
        }
        Ok(())
    }
}

/// 可替换的三角剖分实现
///
/// 任何满足 Delaunay 性质、输出 delaunator 兼容半边结构的实现都可以接入。
pub trait Triangulator {
    fn triangulate(&self, points: &[Point]) -> Result<Triangulation>;
}

/// 基于 `delaunator` 的默认实现
#[derive(Debug, Clone, Copy, Default)]
pub struct DelaunatorProvider;

impl Triangulator for DelaunatorProvider {
    fn triangulate(&self, points: &[Point]) -> Result<Triangulation> {
        let input: Vec<delaunator::Point> = points
            .iter()
            .map(|p| delaunator::Point { x: p.x, y: p.y })
            .collect();
        let result = delaunator::triangulate(&input);

        let convert = |i: usize| {
            if i == delaunator::EMPTY {
                EMPTY
            } else {
                i as u32
            }
        };

        Ok(Triangulation {
            triangles: result.triangles.iter().map(|&i| i as u32).collect(),
            halfedges: result.halfedges.iter().map(|&i| convert(i)).collect(),
            hull: result.hull.iter().map(|&i| i as u32).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn random_points(n: usize, seed: u64) -> Vec<Point> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (0..n)
            .map(|_| Point::new(rng.random_range(0.0..100.0), rng.random_range(0.0..100.0)))
            .collect()
    }

    #[test]
    fn delaunator_output_is_consistent() {
        let points = random_points(200, 7);
        let tri = DelaunatorProvider.triangulate(&points).unwrap();
        tri.validate(points.len()).unwrap();
        assert!(tri.triangle_count() > 0);
        assert!(!tri.hull.is_empty());
    }

    #[test]
    fn validation_rejects_unpaired_halfedges() {
        let tri = Triangulation {
            triangles: vec![0, 1, 2],
            halfedges: vec![1, EMPTY, EMPTY],
            hull: vec![0, 1, 2],
        };
        assert!(tri.validate(3).is_err());
    }

    #[test]
    fn validation_rejects_out_of_range_points() {
        let tri = Triangulation {
            triangles: vec![0, 1, 5],
            halfedges: vec![EMPTY, EMPTY, EMPTY],
            hull: vec![],
        };
        assert!(tri.validate(3).is_err());
    }
}
