//! 网格空间索引
//!
//! 将空间划分为均匀的格子，快速查询点的空间关系。

use crate::geometry::{Bounds, Point};

/// 网格空间索引
///
/// 将二维空间划分为均匀的格子，每个格子记录其中包含的点索引。
/// 点可以逐个插入，用于：
/// - 间距约束采样：新的首都/城镇/宗教中心离已有点太近就放弃
/// - 最近点查询：找到离某个位置最近的已放置点
///
/// # 示例
/// ```ignore
/// let mut index = GridIndex::new(bounds, spacing);
/// if index.find_within(p, spacing).is_none() {
///     index.insert(p);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct GridIndex {
    /// 每个格子的尺寸
    cell_size: f64,
    /// 网格列数
    grid_width: usize,
    /// 网格行数
    grid_height: usize,
    /// 边界框
    bounds: Bounds,
    /// 已插入的点
    points: Vec<Point>,
    /// cells[y * grid_width + x] = 该格子内的点索引列表
    cells: Vec<Vec<u32>>,
}

impl GridIndex {
    /// 创建空索引
    ///
    /// `cell_size` 推荐取典型查询半径附近的值
    pub fn new(bounds: Bounds, cell_size: f64) -> Self {
        let cell_size = cell_size.max(1.0);
        let grid_width = ((bounds.width() / cell_size).ceil() as usize).max(1);
        let grid_height = ((bounds.height() / cell_size).ceil() as usize).max(1);

        Self {
            cell_size,
            grid_width,
            grid_height,
            bounds,
            points: Vec::new(),
            cells: vec![Vec::new(); grid_width * grid_height],
        }
    }

    /// 插入一个点，返回它的索引
    pub fn insert(&mut self, p: Point) -> u32 {
        let idx = self.points.len() as u32;
        let (gx, gy) = self.point_to_grid_coords(p);
        self.cells[gy * self.grid_width + gx].push(idx);
        self.points.push(p);
        idx
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// 查找 `radius` 范围内离 `pos` 最近的点
    pub fn find_within(&self, pos: Point, radius: f64) -> Option<u32> {
        let radius_sq = radius * radius;
        self.candidates(pos, radius)
            .filter_map(|idx| {
                let d = self.points[idx as usize].distance_sq(pos);
                (d <= radius_sq).then_some((idx, d))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
            .map(|(idx, _)| idx)
    }

    /// 查找最近的点，不限距离
    pub fn find_nearest(&self, pos: Point) -> Option<u32> {
        if self.points.is_empty() {
            return None;
        }
        let max_ring = self.grid_width.max(self.grid_height) as f64 * self.cell_size;
        let mut radius = self.cell_size;
        while radius <= max_ring * 2.0 {
            if let Some(idx) = self.find_within(pos, radius) {
                return Some(idx);
            }
            radius *= 2.0;
        }
        // 点在边界框之外很远时退回全量扫描
        self.points
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.distance_sq(pos).total_cmp(&b.distance_sq(pos)))
            .map(|(idx, _)| idx as u32)
    }

    // ========================================================================
    // 内部方法
    // ========================================================================

    /// 覆盖查询圆的所有格子中的点
    fn candidates(&self, pos: Point, radius: f64) -> impl Iterator<Item = u32> + '_ {
        let (gx, gy) = self.point_to_grid_coords(pos);
        let ring = (radius / self.cell_size).ceil() as usize;

        let x0 = gx.saturating_sub(ring);
        let y0 = gy.saturating_sub(ring);
        let x1 = (gx + ring).min(self.grid_width - 1);
        let y1 = (gy + ring).min(self.grid_height - 1);

        (y0..=y1).flat_map(move |y| {
            (x0..=x1).flat_map(move |x| self.cells[y * self.grid_width + x].iter().copied())
        })
    }

    /// 将点坐标转换为网格坐标，边界外的点归入最近的格子
    fn point_to_grid_coords(&self, pos: Point) -> (usize, usize) {
        let x = ((pos.x - self.bounds.min.x) / self.cell_size)
            .floor()
            .clamp(0.0, (self.grid_width - 1) as f64) as usize;
        let y = ((pos.y - self.bounds.min.y) / self.cell_size)
            .floor()
            .clamp(0.0, (self.grid_height - 1) as f64) as usize;
        (x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn bounds() -> Bounds {
        Bounds::from_size(100.0, 100.0)
    }

    #[test]
    fn test_find_within() {
        let mut index = GridIndex::new(bounds(), 10.0);
        index.insert(Point::new(10.0, 10.0));
        index.insert(Point::new(90.0, 90.0));

        assert_eq!(index.find_within(Point::new(12.0, 12.0), 5.0), Some(0));
        assert_eq!(index.find_within(Point::new(50.0, 50.0), 5.0), None);
        // 半径大于格子尺寸时也要找到
        assert_eq!(index.find_within(Point::new(60.0, 60.0), 45.0), Some(1));
    }

    #[test]
    fn test_out_of_bounds_points_are_kept() {
        let mut index = GridIndex::new(bounds(), 10.0);
        index.insert(Point::new(-20.0, 130.0));
        assert_eq!(index.find_nearest(Point::new(0.0, 100.0)), Some(0));
    }

    #[test]
    fn nearest_matches_brute_force() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let points: Vec<Point> = (0..500)
            .map(|_| Point::new(rng.random_range(0.0..100.0), rng.random_range(0.0..100.0)))
            .collect();
        let mut index = GridIndex::new(bounds(), 7.0);
        for &p in &points {
            assert_eq!(index.insert(p) as usize, index.len() - 1);
        }

        for _ in 0..100 {
            let q = Point::new(rng.random_range(0.0..100.0), rng.random_range(0.0..100.0));
            let expected = points
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| a.distance_sq(q).total_cmp(&b.distance_sq(q)))
                .map(|(i, _)| i as u32)
                .unwrap();
            let found = index.find_nearest(q).unwrap();
            assert_eq!(
                points[found as usize].distance_sq(q),
                points[expected as usize].distance_sq(q)
            );
        }
    }
}
