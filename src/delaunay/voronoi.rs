//! Voronoi 图推导
//!
//! Voronoi 图是 Delaunay 三角剖分的对偶：每个三角形的外心成为一个
//! Voronoi 顶点，每个输入点成为一个单元格。只为前 `points_n` 个点
//! （内部点）生成单元格；其后的边界点只用来让边缘单元格闭合。
//!
//! 所有索引均使用 `u32`。

use rayon::prelude::*;

use super::half_edge::{next_halfedge, triangle_of_edge, HalfEdges};
use super::Triangulation;
use crate::geometry::{circumcenter, Point};

/// 单元格拓扑
#[derive(Debug, Clone, Default)]
pub struct VoronoiCells {
    /// 相邻的内部单元格
    pub neighbors: Vec<Vec<u32>>,
    /// 单元格多边形顶点（三角形编号，逆时针）
    pub vertices: Vec<Vec<u32>>,
    /// 是否与边界点相邻
    pub border: Vec<bool>,
}

/// 顶点拓扑与坐标
#[derive(Debug, Clone, Default)]
pub struct VoronoiVertices {
    /// 外心坐标
    pub points: Vec<Point>,
    /// 相邻顶点，凸包方向为 EMPTY
    pub neighbors: Vec<[u32; 3]>,
    /// 共享该顶点的三个点（可能包含边界点）
    pub cells: Vec<[u32; 3]>,
}

#[derive(Debug, Clone, Default)]
pub struct VoronoiGraph {
    pub cells: VoronoiCells,
    pub vertices: VoronoiVertices,
}

impl VoronoiGraph {
    /// 从三角剖分推导单元格与顶点
    ///
    /// - `all_points`: 参与三角剖分的全部点（内部点在前）
    /// - `points_n`: 内部点数量
    pub fn build(tri: &Triangulation, all_points: &[Point], points_n: usize) -> Self {
        let mesh = HalfEdges::new(tri);

        let mut neighbors: Vec<Option<Vec<u32>>> = vec![None; points_n];
        let mut vertices: Vec<Vec<u32>> = vec![Vec::new(); points_n];
        let mut border = vec![false; points_n];

        for e in 0..tri.triangles.len() as u32 {
            let p = tri.triangles[next_halfedge(e) as usize] as usize;
            if p >= points_n || neighbors[p].is_some() {
                continue;
            }

            let edges = mesh.edges_around_point(e);
            vertices[p] = edges.iter().map(|&e| triangle_of_edge(e)).collect();
            let adjacent: Vec<u32> = edges
                .iter()
                .map(|&e| mesh.start(e))
                .filter(|&c| (c as usize) < points_n)
                .collect();
            border[p] = edges.len() > adjacent.len();
            neighbors[p] = Some(adjacent);
        }

        let triangle_count = tri.triangle_count() as u32;
        let vertex_points: Vec<Point> = (0..triangle_count)
            .into_par_iter()
            .map(|t| {
                let [a, b, c] = mesh.points_of_triangle(t);
                circumcenter(
                    all_points[a as usize],
                    all_points[b as usize],
                    all_points[c as usize],
                )
            })
            .collect();
        let vertex_neighbors = (0..triangle_count)
            .map(|t| mesh.triangles_adjacent_to_triangle(t))
            .collect();
        let vertex_cells = (0..triangle_count)
            .map(|t| mesh.points_of_triangle(t))
            .collect();

        Self {
            cells: VoronoiCells {
                neighbors: neighbors.into_iter().map(Option::unwrap_or_default).collect(),
                vertices,
                border,
            },
            vertices: VoronoiVertices {
                points: vertex_points,
                neighbors: vertex_neighbors,
                cells: vertex_cells,
            },
        }
    }

    /// 单元格多边形坐标
    pub fn cell_polygon(&self, cell: usize) -> Vec<Point> {
        self.cells.vertices[cell]
            .iter()
            .map(|&v| self.vertices.points[v as usize])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delaunay::{DelaunatorProvider, Triangulator};

    /// 3x3 内部点外加一圈边界点
    fn fixture() -> (Vec<Point>, usize) {
        let mut points = Vec::new();
        for y in 0..3 {
            for x in 0..3 {
                points.push(Point::new(
                    10.0 + x as f64 * 10.0,
                    10.0 + y as f64 * 10.0 + x as f64 * 0.3,
                ));
            }
        }
        let interior = points.len();
        for i in 0..5 {
            let t = i as f64 * 10.0;
            points.push(Point::new(t, -5.0));
            points.push(Point::new(t + 5.0, 45.0));
            points.push(Point::new(-5.0, t + 5.0));
            points.push(Point::new(45.0, t));
        }
        (points, interior)
    }

    #[test]
    fn neighbors_are_symmetric() {
        let (points, n) = fixture();
        let tri = DelaunatorProvider.triangulate(&points).unwrap();
        let graph = VoronoiGraph::build(&tri, &points, n);
        for (i, list) in graph.cells.neighbors.iter().enumerate() {
            for &j in list {
                assert!(
                    graph.cells.neighbors[j as usize].contains(&(i as u32)),
                    "{i} -> {j} is not mirrored"
                );
            }
        }
    }

    #[test]
    fn only_the_centre_is_interior() {
        let (points, n) = fixture();
        let tri = DelaunatorProvider.triangulate(&points).unwrap();
        let graph = VoronoiGraph::build(&tri, &points, n);
        assert!(!graph.cells.border[4]);
        assert_eq!(graph.cells.neighbors[4].len(), graph.cells.vertices[4].len());
        assert!(graph.cells.border[0]);
    }

    #[test]
    fn centre_polygon_has_positive_area() {
        let (points, n) = fixture();
        let tri = DelaunatorProvider.triangulate(&points).unwrap();
        let graph = VoronoiGraph::build(&tri, &points, n);
        let area = crate::geometry::polygon_area(&graph.cell_polygon(4)).abs();
        assert!(area > 50.0 && area < 150.0, "area {area}");
    }
}
