//! 平面几何与数值小工具

use serde::{Deserialize, Serialize};

/// 地图坐标系中的点（像素单位，原点在左上角）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_sq(self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn distance(self, other: Point) -> f64 {
        self.distance_sq(other).sqrt()
    }

    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

/// 轴对齐包围盒
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    pub fn from_size(width: f64, height: f64) -> Self {
        Self::new(Point::new(0.0, 0.0), Point::new(width, height))
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// 多边形有向面积（鞋带公式），顶点顺序决定符号
pub fn polygon_area(polygon: &[Point]) -> f64 {
    if polygon.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    let mut prev = polygon[polygon.len() - 1];
    for &p in polygon {
        sum += prev.y * p.x - prev.x * p.y;
        prev = p;
    }
    sum / 2.0
}

/// 三角形外接圆圆心
pub fn circumcenter(a: Point, b: Point, c: Point) -> Point {
    let ad = a.x * a.x + a.y * a.y;
    let bd = b.x * b.x + b.y * b.y;
    let cd = c.x * c.x + c.y * c.y;
    let d = 2.0 * (a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y));
    if d.abs() < f64::EPSILON {
        // 退化三角形，取重心
        return Point::new((a.x + b.x + c.x) / 3.0, (a.y + b.y + c.y) / 3.0);
    }
    Point::new(
        (ad * (b.y - c.y) + bd * (c.y - a.y) + cd * (a.y - b.y)) / d,
        (ad * (c.x - b.x) + bd * (a.x - c.x) + cd * (b.x - a.x)) / d,
    )
}

/// 四舍五入到 `decimals` 位小数（.5 向正无穷进位）
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let m = 10f64.powi(decimals as i32);
    (value * m + 0.5).floor() / m
}

/// 把 `value` 从 `[min, max]` 线性映射到 `[0, 1]` 并截断
pub fn normalize(value: f64, min: f64, max: f64) -> f64 {
    if max <= min {
        return 0.0;
    }
    ((value - min) / (max - min)).clamp(0.0, 1.0)
}

/// 中位数，空切片返回 None
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    Some(if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_area() {
        let square = [
            Point::new(0.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(2.0, 2.0),
            Point::new(0.0, 2.0),
        ];
        assert!((polygon_area(&square).abs() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn circumcenter_of_right_triangle_is_hypotenuse_midpoint() {
        let c = circumcenter(
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(0.0, 2.0),
        );
        assert!((c.x - 2.0).abs() < 1e-9);
        assert!((c.y - 1.0).abs() < 1e-9);
    }

    #[test]
    fn rounding_matches_half_up() {
        assert_eq!(round_to(2.346, 2), 2.35);
        assert_eq!(round_to(0.5, 0), 1.0);
        assert_eq!(round_to(-1.5, 0), -1.0);
        assert_eq!(round_to(7.0, 1), 7.0);
    }

    #[test]
    fn median_of_even_and_odd() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), Some(2.5));
        assert_eq!(median(&[]), None);
    }
}
