//! 半边遍历
//!
//! 直接在 delaunator 风格的数组上做拓扑查询：
//!
//! ```text
//!        传统边                    半边表示
//!
//!     A ←──────→ B           A ─────→ B   (半边 e1)
//!                            A ←───── B   (半边 e2，e1 的 twin)
//! ```

use super::Triangulation;

/// 无效索引标记（对应 delaunator::EMPTY）
pub const EMPTY: u32 = u32::MAX;

/// 围绕一个点遍历时的最大扇形边数，防止坏数据导致死循环
const MAX_FAN: usize = 20;

/// 同一三角形内的下一条半边（逆时针）
#[inline]
pub fn next_halfedge(e: u32) -> u32 {
    if e % 3 == 2 {
        e - 2
    } else {
        e + 1
    }
}

/// 同一三角形内的上一条半边（顺时针）
#[inline]
pub fn prev_halfedge(e: u32) -> u32 {
    if e % 3 == 0 {
        e + 2
    } else {
        e - 1
    }
}

/// 半边所属的三角形
#[inline]
pub fn triangle_of_edge(e: u32) -> u32 {
    e / 3
}

/// 三角剖分上的只读拓扑视图
#[derive(Debug, Clone, Copy)]
pub struct HalfEdges<'a> {
    tri: &'a Triangulation,
}

impl<'a> HalfEdges<'a> {
    pub fn new(tri: &'a Triangulation) -> Self {
        Self { tri }
    }

    /// 半边起点
    #[inline]
    pub fn start(&self, e: u32) -> u32 {
        self.tri.triangles[e as usize]
    }

    /// 半边终点
    #[inline]
    pub fn end(&self, e: u32) -> u32 {
        self.tri.triangles[next_halfedge(e) as usize]
    }

    #[inline]
    pub fn twin(&self, e: u32) -> u32 {
        self.tri.halfedges[e as usize]
    }

    /// 三角形的三个顶点
    pub fn points_of_triangle(&self, t: u32) -> [u32; 3] {
        let base = (t * 3) as usize;
        [
            self.tri.triangles[base],
            self.tri.triangles[base + 1],
            self.tri.triangles[base + 2],
        ]
    }

    /// 与三角形共边的三个三角形，凸包一侧为 [`EMPTY`]
    pub fn triangles_adjacent_to_triangle(&self, t: u32) -> [u32; 3] {
        let base = t * 3;
        let mut out = [EMPTY; 3];
        for (k, slot) in out.iter_mut().enumerate() {
            let twin = self.twin(base + k as u32);
            if twin != EMPTY {
                *slot = triangle_of_edge(twin);
            }
        }
        out
    }

    /// 以 `incoming`（终点为 p 的半边）为起点，绕 p 逆时针收集所有入边
    ///
    /// 遇到凸包或回到起点时停止。
    pub fn edges_around_point(&self, incoming: u32) -> Vec<u32> {
        let mut result = Vec::with_capacity(8);
        let mut current = incoming;
        loop {
            result.push(current);
            let outgoing = next_halfedge(current);
            current = self.twin(outgoing);
            if current == EMPTY || current == incoming || result.len() >= MAX_FAN {
                break;
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 正方形切成两个三角形：0-1-2 与 0-2-3
    fn square() -> Triangulation {
        Triangulation {
            triangles: vec![0, 1, 2, 0, 2, 3],
            halfedges: vec![EMPTY, EMPTY, 3, 2, EMPTY, EMPTY],
            hull: vec![0, 1, 2, 3],
        }
    }

    #[test]
    fn next_and_prev_wrap_inside_triangle() {
        assert_eq!(next_halfedge(2), 0);
        assert_eq!(next_halfedge(4), 5);
        assert_eq!(prev_halfedge(3), 5);
        assert_eq!(prev_halfedge(1), 0);
        assert_eq!(triangle_of_edge(5), 1);
    }

    #[test]
    fn adjacent_triangles_follow_twins() {
        let tri = square();
        let mesh = HalfEdges::new(&tri);
        assert_eq!(mesh.triangles_adjacent_to_triangle(0), [EMPTY, EMPTY, 1]);
        assert_eq!(mesh.triangles_adjacent_to_triangle(1), [0, EMPTY, EMPTY]);
    }

    #[test]
    fn endpoints_of_shared_edge() {
        let tri = square();
        let mesh = HalfEdges::new(&tri);
        // 半边 2 是 2→0，twin 3 是 0→2
        assert_eq!((mesh.start(2), mesh.end(2)), (2, 0));
        assert_eq!((mesh.start(3), mesh.end(3)), (0, 2));
    }
}
