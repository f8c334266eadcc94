// BFS 扩散式地形工具
//
// 参考 Azgaar Fantasy Map Generator 的算法
// 从种子单元格向外传播高度变化：丘陵/坑洞按指数衰减，山脉/海沟沿路径逐圈衰减。
// 高度按 0..=100 的整数存储，每次写入都截断取整。

use std::collections::VecDeque;

use super::template::{HeightSelector, InvertAxes, NumberArg, PercentRange, StraitDirection};
use crate::map::RawGrid;
use crate::rng::MapRng;

/// 种子单元格的最大重试次数
const MAX_ATTEMPTS: u32 = 50;

/// Blob 衰减配置
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlobConfig {
    /// 衰减因子 (0.93 ~ 0.9973)
    /// 值越高，blob 越大
    pub blob_power: f64,
    /// 线性衰减因子（用于山脉和海沟）
    pub line_power: f64,
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self::from_cell_count(10_000)
    }
}

impl BlobConfig {
    /// 根据目标单元格数量查表
    pub fn from_cell_count(cells: usize) -> Self {
        let blob_power = match cells {
            0..=1000 => 0.93,
            1001..=2000 => 0.95,
            2001..=5000 => 0.97,
            5001..=10000 => 0.98,
            10001..=20000 => 0.99,
            20001..=30000 => 0.991,
            30001..=40000 => 0.993,
            40001..=50000 => 0.994,
            50001..=60000 => 0.995,
            60001..=70000 => 0.9955,
            70001..=80000 => 0.996,
            80001..=90000 => 0.9964,
            _ => 0.9973,
        };

        let line_power = match cells {
            0..=1000 => 0.75,
            1001..=2000 => 0.77,
            2001..=5000 => 0.79,
            5001..=10000 => 0.81,
            10001..=20000 => 0.82,
            20001..=30000 => 0.83,
            30001..=40000 => 0.84,
            40001..=50000 => 0.86,
            50001..=60000 => 0.87,
            60001..=70000 => 0.88,
            70001..=80000 => 0.91,
            80001..=90000 => 0.92,
            _ => 0.93,
        };

        Self {
            blob_power,
            line_power,
        }
    }
}

/// 截断到 0..=100 并取整
pub fn lim(v: f64) -> u8 {
    if v.is_nan() {
        return 0;
    }
    v.clamp(0.0, 100.0) as u8
}

/// 高度画布：模板中的每个工具都作用在这里
pub struct HeightCanvas<'a> {
    mesh: &'a RawGrid,
    config: BlobConfig,
    pub heights: Vec<u8>,
}

impl<'a> HeightCanvas<'a> {
    pub fn new(mesh: &'a RawGrid) -> Self {
        Self {
            mesh,
            config: BlobConfig::from_cell_count(mesh.cells_desired),
            heights: vec![0; mesh.len()],
        }
    }

    pub fn config(&self) -> BlobConfig {
        self.config
    }

    pub fn mesh(&self) -> &RawGrid {
        self.mesh
    }

    pub fn into_heights(self) -> Vec<u8> {
        self.heights
    }

    fn random_cell(&self, x: &PercentRange, y: &PercentRange, rng: &mut MapRng) -> usize {
        let px = x.sample(self.mesh.width, rng);
        let py = y.sample(self.mesh.height, rng);
        self.mesh.find_grid_cell(px, py)
    }

    // ========================================================================
    // 丘陵与坑洞
    // ========================================================================

    /// 添加丘陵
    pub fn add_hill(
        &mut self,
        count: i32,
        height: NumberArg,
        x: &PercentRange,
        y: &PercentRange,
        rng: &mut MapRng,
    ) {
        for _ in 0..count.max(0) {
            self.add_one_hill(height, x, y, rng);
        }
    }

    fn add_one_hill(
        &mut self,
        height: NumberArg,
        x: &PercentRange,
        y: &PercentRange,
        rng: &mut MapRng,
    ) {
        let n = self.heights.len();
        let mut change = vec![0u8; n];
        let h = lim(height.sample(rng) as f64);

        // 避开已经很高的地方
        let mut start;
        let mut attempts = 0;
        loop {
            start = self.random_cell(x, y, rng);
            attempts += 1;
            if self.heights[start] as u32 + h as u32 <= 90 || attempts >= MAX_ATTEMPTS {
                break;
            }
        }

        change[start] = h;
        let mut queue = VecDeque::from([start]);
        while let Some(q) = queue.pop_front() {
            for &c in &self.mesh.neighbors[q] {
                let c = c as usize;
                if change[c] != 0 {
                    continue;
                }
                let v =
                    (change[q] as f64).powf(self.config.blob_power) * (rng.random() * 0.2 + 0.9);
                change[c] = lim(v);
                if v > 1.0 {
                    queue.push_back(c);
                }
            }
        }

        for (h, c) in self.heights.iter_mut().zip(&change) {
            *h = lim(*h as f64 + *c as f64);
        }
    }

    /// 添加坑洞
    pub fn add_pit(
        &mut self,
        count: i32,
        height: NumberArg,
        x: &PercentRange,
        y: &PercentRange,
        rng: &mut MapRng,
    ) {
        for _ in 0..count.max(0) {
            self.add_one_pit(height, x, y, rng);
        }
    }

    fn add_one_pit(
        &mut self,
        height: NumberArg,
        x: &PercentRange,
        y: &PercentRange,
        rng: &mut MapRng,
    ) {
        let mut used = vec![false; self.heights.len()];
        let mut h = lim(height.sample(rng) as f64) as f64;

        // 坑洞只挖在陆地上
        let mut start;
        let mut attempts = 0;
        loop {
            start = self.random_cell(x, y, rng);
            attempts += 1;
            if self.heights[start] >= 20 || attempts >= MAX_ATTEMPTS {
                break;
            }
        }

        let mut queue = VecDeque::from([start]);
        while let Some(q) = queue.pop_front() {
            h = h.powf(self.config.blob_power) * (rng.random() * 0.2 + 0.9);
            if h < 1.0 {
                return;
            }
            for &c in &self.mesh.neighbors[q] {
                let c = c as usize;
                if used[c] {
                    continue;
                }
                let depth = h * (rng.random() * 0.2 + 0.9);
                self.heights[c] = lim(self.heights[c] as f64 - depth);
                used[c] = true;
                queue.push_back(c);
            }
        }
    }

    // ========================================================================
    // 山脉与海沟
    // ========================================================================

    /// 添加山脉
    pub fn add_range(
        &mut self,
        count: i32,
        height: NumberArg,
        x: &PercentRange,
        y: &PercentRange,
        rng: &mut MapRng,
    ) {
        for _ in 0..count.max(0) {
            self.add_one_line(height, x, y, true, rng);
        }
    }

    /// 添加海沟
    pub fn add_trough(
        &mut self,
        count: i32,
        height: NumberArg,
        x: &PercentRange,
        y: &PercentRange,
        rng: &mut MapRng,
    ) {
        for _ in 0..count.max(0) {
            self.add_one_line(height, x, y, false, rng);
        }
    }

    /// 山脉 (`raise = true`) 或海沟
    fn add_one_line(
        &mut self,
        height: NumberArg,
        x: &PercentRange,
        y: &PercentRange,
        raise: bool,
        rng: &mut MapRng,
    ) {
        let width = self.mesh.width;
        let map_height = self.mesh.height;
        let mut used = vec![false; self.heights.len()];
        let mut h = lim(height.sample(rng) as f64) as f64;

        // 1. 起点：海沟从陆地上开始
        let (start_x, start_y, start) = if raise {
            let sx = x.sample(width, rng);
            let sy = y.sample(map_height, rng);
            (sx, sy, None)
        } else {
            let mut attempts = 0;
            loop {
                let sx = x.sample(width, rng);
                let sy = y.sample(map_height, rng);
                let cell = self.mesh.find_grid_cell(sx, sy);
                attempts += 1;
                if self.heights[cell] >= 20 || attempts >= MAX_ATTEMPTS {
                    break (sx, sy, Some(cell));
                }
            }
        };

        // 2. 终点：与起点的曼哈顿距离受限
        let max_dist = if raise { width / 3.0 } else { width / 2.0 };
        let (mut end_x, mut end_y);
        let mut attempts = 0;
        loop {
            end_x = rng.random() * width * 0.8 + width * 0.1;
            end_y = rng.random() * map_height * 0.7 + map_height * 0.15;
            let dist = (end_y - start_y).abs() + (end_x - start_x).abs();
            attempts += 1;
            if (dist >= width / 8.0 && dist <= max_dist) || attempts >= MAX_ATTEMPTS {
                break;
            }
        }

        let start = start.unwrap_or_else(|| self.mesh.find_grid_cell(start_x, start_y));
        let end = self.mesh.find_grid_cell(end_x, end_y);
        let range = self.find_path(start, end, &mut used, rng);

        // 3. 从路径向两侧逐圈扩散
        let mut queue = range.clone();
        let mut rings = 0;
        while !queue.is_empty() {
            let frontier = std::mem::take(&mut queue);
            rings += 1;

            for &c in &frontier {
                let delta = h * (rng.random() * 0.3 + 0.85);
                let v = self.heights[c] as f64;
                self.heights[c] = lim(if raise { v + delta } else { v - delta });
            }

            h = h.powf(self.config.line_power) - 1.0;
            if h < 2.0 {
                break;
            }

            for &f in &frontier {
                for &c in &self.mesh.neighbors[f] {
                    let c = c as usize;
                    if !used[c] {
                        queue.push(c);
                        used[c] = true;
                    }
                }
            }
        }

        // 4. 山脊突出点：每隔 6 个点向最低的邻居延伸
        for (d, &cell) in range.iter().enumerate() {
            if d % 6 != 0 {
                continue;
            }
            let mut cur = cell;
            for _ in 0..rings {
                let Some(&min) = self.mesh.neighbors[cur]
                    .iter()
                    .min_by_key(|&&c| self.heights[c as usize])
                else {
                    break;
                };
                let min = min as usize;
                let blended = (self.heights[cur] as f64 * 2.0 + self.heights[min] as f64) / 3.0;
                self.heights[min] = lim(blended);
                cur = min;
            }
        }
    }

    /// 贪心路径：每一步选择距离终点最近的未访问邻居
    ///
    /// 15% 的概率将距离减半，使路径不完全直线
    fn find_path(
        &self,
        start: usize,
        end: usize,
        used: &mut [bool],
        rng: &mut MapRng,
    ) -> Vec<usize> {
        let points = &self.mesh.points;
        let target = points[end];
        let mut path = vec![start];
        used[start] = true;

        let mut cur = start;
        while cur != end {
            let mut best = None;
            let mut min = f64::INFINITY;
            for &e in &self.mesh.neighbors[cur] {
                let e = e as usize;
                if used[e] {
                    continue;
                }
                let mut diff = points[e].distance_sq(target);
                if rng.random() > 0.85 {
                    diff /= 2.0;
                }
                if diff < min {
                    min = diff;
                    best = Some(e);
                }
            }
            // 死路
            let Some(next) = best else { break };
            path.push(next);
            used[next] = true;
            cur = next;
        }
        path
    }

    // ========================================================================
    // 海峡
    // ========================================================================

    /// 横穿地图的海峡
    pub fn add_strait(&mut self, width: NumberArg, direction: StraitDirection, rng: &mut MapRng) {
        let mut width = (width.sample(rng) as f64).min(self.mesh.cells_x as f64 / 3.0);
        if width < 1.0 {
            return;
        }

        let w = self.mesh.width;
        let h = self.mesh.height;
        let vertical = direction == StraitDirection::Vertical;

        let start_x = if vertical {
            (rng.random() * w * 0.4 + w * 0.3).floor()
        } else {
            5.0
        };
        let start_y = if vertical {
            5.0
        } else {
            (rng.random() * h * 0.4 + h * 0.3).floor()
        };
        let end_x = if vertical {
            (w - start_x - w * 0.1 + rng.random() * w * 0.2).floor()
        } else {
            w - 5.0
        };
        let end_y = if vertical {
            h - 5.0
        } else {
            (h - start_y - h * 0.1 + rng.random() * h * 0.2).floor()
        };

        let start = self.mesh.find_grid_cell(start_x, start_y);
        let end = self.mesh.find_grid_cell(end_x, end_y);

        // 海峡路径允许回头，但步数不超过单元格总数
        let points = &self.mesh.points;
        let target = points[end];
        let mut range = Vec::new();
        let mut cur = start;
        while cur != end && range.len() < self.heights.len() {
            let mut min = f64::INFINITY;
            let mut next = cur;
            for &e in &self.mesh.neighbors[cur] {
                let e = e as usize;
                let mut diff = points[e].distance_sq(target);
                if rng.random() > 0.8 {
                    diff /= 2.0;
                }
                if diff < min {
                    min = diff;
                    next = e;
                }
            }
            cur = next;
            range.push(cur);
        }

        let mut used = vec![false; self.heights.len()];
        let mut query = Vec::new();
        let step = 0.1 / width;
        while width > 0.0 {
            let exp = 0.9 - step * width;
            for &r in &range {
                for &e in &self.mesh.neighbors[r] {
                    let e = e as usize;
                    if used[e] {
                        continue;
                    }
                    used[e] = true;
                    query.push(e);
                    let v = (self.heights[e] as f64).powf(exp);
                    self.heights[e] = if v > 100.0 { 5 } else { lim(v) };
                }
            }
            range = query.clone();
            width -= 1.0;
        }
    }

    // ========================================================================
    // 整体修改
    // ========================================================================

    /// 加减或缩放一个高度区间
    ///
    /// 下限为 20（陆地）时，改动相对海平面进行
    pub fn modify(&mut self, selector: HeightSelector, add: f64, mult: f64) {
        let (min, max) = selector.bounds();
        let is_land = min == 20.0;

        for h in self.heights.iter_mut() {
            let mut v = *h as f64;
            if v < min || v > max {
                continue;
            }
            if add != 0.0 {
                v = if is_land { (v + add).max(20.0) } else { v + add };
            }
            if mult != 1.0 {
                v = if is_land { (v - 20.0) * mult + 20.0 } else { v * mult };
            }
            *h = lim(v);
        }
    }

    /// 与邻居均值混合
    pub fn smooth(&mut self, factor: f64) {
        let old = &self.heights;
        let smoothed: Vec<u8> = (0..old.len())
            .map(|i| {
                let neighbors = &self.mesh.neighbors[i];
                let sum: f64 = old[i] as f64
                    + neighbors.iter().map(|&c| old[c as usize] as f64).sum::<f64>();
                let mean = sum / (neighbors.len() + 1) as f64;
                if factor == 1.0 {
                    lim(mean)
                } else {
                    lim((old[i] as f64 * (factor - 1.0) + mean) / factor)
                }
            })
            .collect();
        self.heights = smoothed;
    }

    /// 径向遮罩：正值压低地图边缘，负值压低中心
    pub fn mask(&mut self, power: f64) {
        let fr = if power != 0.0 { power.abs() } else { 1.0 };
        let w = self.mesh.width;
        let h = self.mesh.height;

        for (i, height) in self.heights.iter_mut().enumerate() {
            let p = self.mesh.points[i];
            let nx = 2.0 * p.x / w - 1.0;
            let ny = 2.0 * p.y / h - 1.0;
            let mut distance = (1.0 - nx * nx) * (1.0 - ny * ny);
            if power < 0.0 {
                distance = 1.0 - distance;
            }
            let v = *height as f64;
            let masked = v * distance;
            *height = lim((v * (fr - 1.0) + masked) / fr);
        }
    }

    /// 按概率镜像翻转高度图
    pub fn invert(&mut self, probability: f64, axes: InvertAxes, rng: &mut MapRng) {
        if !rng.probability(probability) {
            return;
        }
        let invert_x = axes != InvertAxes::Y;
        let invert_y = axes != InvertAxes::X;
        let cells_x = self.mesh.cells_x;
        let cells_y = self.mesh.cells_y;

        let old = &self.heights;
        let inverted: Vec<u8> = (0..old.len())
            .map(|i| {
                let x = i % cells_x;
                let y = i / cells_x;
                let nx = if invert_x { cells_x - x - 1 } else { x };
                let ny = if invert_y { cells_y - y - 1 } else { y };
                old.get(nx + ny * cells_x).copied().unwrap_or(old[i])
            })
            .collect();
        self.heights = inverted;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delaunay::DelaunatorProvider;

    fn mesh(seed: &str) -> RawGrid {
        let mut rng = MapRng::new(seed);
        RawGrid::build(600.0, 400.0, 2_000, &mut rng, &DelaunatorProvider).unwrap()
    }

    fn center() -> PercentRange {
        PercentRange::new(45.0, 55.0)
    }

    #[test]
    fn test_blob_config_from_cell_count() {
        let config = BlobConfig::from_cell_count(10000);
        assert!((config.blob_power - 0.98).abs() < 1e-9);
        assert!((config.line_power - 0.81).abs() < 1e-9);
        let fine = BlobConfig::from_cell_count(100_000);
        assert!(fine.blob_power > config.blob_power);
    }

    #[test]
    fn test_lim() {
        assert_eq!(lim(-5.0), 0);
        assert_eq!(lim(55.9), 55);
        assert_eq!(lim(250.0), 100);
        assert_eq!(lim(f64::NAN), 0);
    }

    #[test]
    fn hill_raises_center_most() {
        let grid = mesh("hill");
        let mut canvas = HeightCanvas::new(&grid);
        let mut rng = MapRng::new("hill");
        canvas.add_hill(1, NumberArg::Exact(80.0), &center(), &center(), &mut rng);

        let peak = *canvas.heights.iter().max().unwrap();
        assert!(peak >= 80);
        let raised = canvas.heights.iter().filter(|&&h| h > 10).count();
        assert!(raised > 10, "{raised} raised cells");
        let middle = canvas.heights[grid.find_grid_cell(300.0, 200.0)];
        assert!(middle > canvas.heights[0]);
    }

    #[test]
    fn pit_lowers_land() {
        let grid = mesh("pit");
        let mut canvas = HeightCanvas::new(&grid);
        canvas.heights.iter_mut().for_each(|h| *h = 50);
        let mut rng = MapRng::new("pit");
        canvas.add_pit(1, NumberArg::Exact(30.0), &center(), &center(), &mut rng);
        assert!(canvas.heights.iter().any(|&h| h < 50));
        assert!(canvas.heights.iter().all(|&h| h <= 50));
    }

    #[test]
    fn range_and_trough_move_heights_in_opposite_directions() {
        let grid = mesh("range");
        let mut canvas = HeightCanvas::new(&grid);
        canvas.heights.iter_mut().for_each(|h| *h = 40);
        let mut rng = MapRng::new("range");
        canvas.add_range(1, NumberArg::Exact(40.0), &center(), &center(), &mut rng);
        assert!(canvas.heights.iter().any(|&h| h > 60));

        let mut canvas = HeightCanvas::new(&grid);
        canvas.heights.iter_mut().for_each(|h| *h = 40);
        canvas.add_trough(1, NumberArg::Exact(30.0), &center(), &center(), &mut rng);
        assert!(canvas.heights.iter().any(|&h| h < 20));
    }

    #[test]
    fn strait_cuts_through_land() {
        let grid = mesh("strait");
        let mut canvas = HeightCanvas::new(&grid);
        canvas.heights.iter_mut().for_each(|h| *h = 60);
        let mut rng = MapRng::new("strait");
        canvas.add_strait(NumberArg::Exact(2.0), StraitDirection::Vertical, &mut rng);
        assert!(canvas.heights.iter().any(|&h| h < 60));
    }

    #[test]
    fn modify_land_is_relative_to_sea_level() {
        let grid = mesh("modify");
        let mut canvas = HeightCanvas::new(&grid);
        canvas.heights[0] = 10;
        canvas.heights[1] = 60;
        canvas.modify(HeightSelector::Land, 0.0, 0.5);
        assert_eq!(canvas.heights[0], 10);
        assert_eq!(canvas.heights[1], 40);

        canvas.modify(HeightSelector::All, 5.0, 1.0);
        assert_eq!(canvas.heights[0], 15);
        assert_eq!(canvas.heights[1], 45);

        canvas.modify(HeightSelector::Land, -50.0, 1.0);
        assert_eq!(canvas.heights[1], 20);
    }

    #[test]
    fn smooth_flattens_spikes() {
        let grid = mesh("smooth");
        let mut canvas = HeightCanvas::new(&grid);
        let spike = grid.len() / 2;
        canvas.heights[spike] = 100;
        canvas.smooth(2.0);
        assert!(canvas.heights[spike] < 100);
        assert!(canvas.heights[spike] > 0);
    }

    #[test]
    fn mask_lowers_edges() {
        let grid = mesh("mask");
        let mut canvas = HeightCanvas::new(&grid);
        canvas.heights.iter_mut().for_each(|h| *h = 80);
        canvas.mask(1.0);
        let corner = canvas.heights[0];
        let middle = canvas.heights[grid.find_grid_cell(300.0, 200.0)];
        assert!(corner < middle, "{corner} vs {middle}");
    }

    #[test]
    fn invert_mirrors_rows_and_columns() {
        let grid = mesh("invert");
        let mut canvas = HeightCanvas::new(&grid);
        canvas.heights[0] = 77;
        let mut rng = MapRng::new("invert");
        canvas.invert(1.0, InvertAxes::Both, &mut rng);
        assert_eq!(canvas.heights[grid.len() - 1], 77);
        assert_eq!(canvas.heights[0], 0);
    }
}
