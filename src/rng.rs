//! Alea 伪随机数生成器
//!
//! 整条流水线只从这一个随机源取数。同一个种子字符串配合相同的调用顺序，
//! 每次都会得到逐位相同的结果，地图因此可以由种子完全复现。
//!
//! 状态推进使用三个 `[0, 1)` 浮点寄存器加一个进位，种子经 Mash 散列
//! 后写入寄存器。除了 `random()` 之外的所有采样方法都建立在它之上。

use rand::rand_core::{impls, RngCore};

/// 2^-32
const NORM_32: f64 = 2.328_306_436_538_696_3e-10;
const TWO_32: f64 = 4_294_967_296.0;

/// Mash 字符串散列，内部状态在多次调用之间保留
struct Mash {
    n: f64,
}

impl Mash {
    fn new() -> Self {
        Self { n: 4_022_871_197.0 } // 0xefc8249d
    }

    fn hash(&mut self, data: &str) -> f64 {
        for unit in data.encode_utf16() {
            self.n += unit as f64;
            let mut h = 0.025_196_032_824_169_38 * self.n;
            self.n = to_uint32(h);
            h -= self.n;
            h *= self.n;
            self.n = to_uint32(h);
            h -= self.n;
            self.n += h * TWO_32;
        }
        to_uint32(self.n) * NORM_32
    }
}

fn to_uint32(v: f64) -> f64 {
    v.trunc().rem_euclid(TWO_32)
}

/// 带种子的确定性随机数生成器
///
/// 不是线程安全的共享对象：每个会话持有自己的实例，按 `&mut` 依次传给各个阶段。
#[derive(Debug, Clone)]
pub struct MapRng {
    s0: f64,
    s1: f64,
    s2: f64,
    c: f64,
}

impl MapRng {
    pub fn new(seed: &str) -> Self {
        let mut mash = Mash::new();
        let mut s0 = mash.hash(" ");
        let mut s1 = mash.hash(" ");
        let mut s2 = mash.hash(" ");

        s0 -= mash.hash(seed);
        if s0 < 0.0 {
            s0 += 1.0;
        }
        s1 -= mash.hash(seed);
        if s1 < 0.0 {
            s1 += 1.0;
        }
        s2 -= mash.hash(seed);
        if s2 < 0.0 {
            s2 += 1.0;
        }

        Self { s0, s1, s2, c: 1.0 }
    }

    /// `[0, 1)` 均匀分布
    pub fn random(&mut self) -> f64 {
        let t = 2_091_639.0 * self.s0 + self.c * NORM_32;
        self.s0 = self.s1;
        self.s1 = self.s2;
        self.c = t.trunc();
        self.s2 = t - self.c;
        self.s2
    }

    /// `[min, max]` 闭区间内的整数
    pub fn rand_int(&mut self, min: i32, max: i32) -> i32 {
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        let span = (hi as f64 - lo as f64) + 1.0;
        (self.random() * span).floor() as i32 + lo
    }

    /// `[min, max)` 区间内的浮点数
    pub fn rand_float(&mut self, min: f64, max: f64) -> f64 {
        min + self.random() * (max - min)
    }

    /// 以概率 `p` 返回 true，`p >= 1` 时不消耗随机数
    pub fn probability(&mut self, p: f64) -> bool {
        if p >= 1.0 {
            return true;
        }
        if p <= 0.0 {
            return false;
        }
        self.random() < p
    }

    /// 均匀挑选一个元素
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let idx = (self.random() * items.len() as f64).floor() as usize;
        items.get(idx.min(items.len() - 1))
    }

    /// 按整数权重挑选，权重为 0 的条目永远不会被选中
    pub fn pick_weighted<'a, T>(&mut self, items: &'a [(T, u32)]) -> Option<&'a T> {
        let total: u32 = items.iter().map(|(_, w)| *w).sum();
        if total == 0 {
            return None;
        }
        let mut roll = (self.random() * total as f64).floor() as u32;
        for (item, weight) in items {
            if roll < *weight {
                return Some(item);
            }
            roll -= weight;
        }
        items.iter().rev().find(|(_, w)| *w > 0).map(|(item, _)| item)
    }

    /// 偏向 `min` 的整数采样，指数越大越集中在 `min` 附近
    pub fn biased(&mut self, min: i32, max: i32, exponent: f64) -> i32 {
        let r = self.random().powf(exponent);
        (min as f64 + (max - min) as f64 * r + 0.5).floor() as i32
    }

    /// 截断正态分布，结果保留 `round` 位小数
    pub fn gauss(&mut self, expected: f64, deviation: f64, min: f64, max: f64, round: u32) -> f64 {
        let sample = loop {
            let x = self.random() * 2.0 - 1.0;
            let y = self.random() * 2.0 - 1.0;
            let r = x * x + y * y;
            if r > 0.0 && r <= 1.0 {
                break expected + deviation * y * (-2.0 * r.ln() / r).sqrt();
            }
        };
        crate::geometry::round_to(sample.clamp(min, max), round)
    }
}

impl RngCore for MapRng {
    fn next_u32(&mut self) -> u32 {
        (self.random() * TWO_32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        impls::next_u64_via_u32(self)
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        impls::fill_bytes_via_next(self, dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = MapRng::new("abc");
        let mut b = MapRng::new("abc");
        let first: Vec<f64> = (0..3).map(|_| a.random()).collect();
        let second: Vec<f64> = (0..3).map(|_| b.random()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = MapRng::new("abc");
        let mut b = MapRng::new("abd");
        let same = (0..10).filter(|_| a.random() == b.random()).count();
        assert!(same < 10);
    }

    #[test]
    fn random_stays_in_unit_interval() {
        let mut rng = MapRng::new("12345");
        for _ in 0..10_000 {
            let v = rng.random();
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn rand_int_is_inclusive() {
        let mut rng = MapRng::new("bounds");
        let mut seen_min = false;
        let mut seen_max = false;
        for _ in 0..5_000 {
            let v = rng.rand_int(40, 60);
            assert!((40..=60).contains(&v));
            seen_min |= v == 40;
            seen_max |= v == 60;
        }
        assert!(seen_min && seen_max);
    }

    #[test]
    fn probability_edges_do_not_draw() {
        let mut a = MapRng::new("p");
        let mut b = MapRng::new("p");
        assert!(a.probability(1.0));
        assert!(!a.probability(0.0));
        assert_eq!(a.random(), b.random());
    }

    #[test]
    fn weighted_pick_skips_zero_weight() {
        let mut rng = MapRng::new("weights");
        let items = [("never", 0), ("always", 3)];
        for _ in 0..100 {
            assert_eq!(rng.pick_weighted(&items), Some(&"always"));
        }
        let empty: [(&str, u32); 0] = [];
        assert_eq!(rng.pick_weighted(&empty), None);
    }

    #[test]
    fn biased_favours_minimum() {
        let mut rng = MapRng::new("biased");
        let samples: Vec<i32> = (0..2_000).map(|_| rng.biased(0, 100, 5.0)).collect();
        assert!(samples.iter().all(|v| (0..=100).contains(v)));
        let low = samples.iter().filter(|&&v| v < 50).count();
        assert!(low > samples.len() * 3 / 4);
    }

    #[test]
    fn gauss_is_clamped() {
        let mut rng = MapRng::new("gauss");
        for _ in 0..1_000 {
            let v = rng.gauss(1.0, 3.0, 0.0, 20.0, 3);
            assert!((0.0..=20.0).contains(&v));
        }
    }

    #[test]
    fn works_as_rand_core() {
        use rand::Rng;
        let mut rng = MapRng::new("core");
        let v: u32 = rng.random_range(0..10);
        assert!(v < 10);
    }
}
