// 地形模板数据结构
//
// 模板是一串步骤，每一步是一个地形工具加上预先解析好的参数。
// 参数在加载模板时一次性解析成带标签的类型，执行时只负责采样。

use crate::geometry::round_to;
use crate::rng::MapRng;

/// 数值参数：`"5"` / `"1.5"` 或 `"40-60"`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumberArg {
    /// 精确值，小数部分按概率向上取整
    Exact(f64),
    /// 闭区间内的整数
    Range(i32, i32),
}

impl NumberArg {
    /// 采样一个整数
    ///
    /// `Exact(1.5)` 有一半概率得到 1，一半概率得到 2
    pub fn sample(&self, rng: &mut MapRng) -> i32 {
        match *self {
            NumberArg::Exact(v) => {
                let whole = v.trunc();
                whole as i32 + rng.probability(v - whole) as i32
            }
            NumberArg::Range(lo, hi) => rng.rand_int(lo, hi),
        }
    }
}

/// 坐标参数：地图宽/高的百分比区间，`"44-56"` 或 `"50"`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PercentRange {
    pub min: f64,
    pub max: f64,
}

impl PercentRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// 在 `[min, max] * length` 中取一个位置
    pub fn sample(&self, length: f64, rng: &mut MapRng) -> f64 {
        let lo = self.min / 100.0 * length;
        let hi = self.max / 100.0 * length;
        (rng.random() * (hi - lo + 1.0)).floor() + lo
    }
}

/// 高度筛选器
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeightSelector {
    /// 所有陆地，修改相对海平面进行
    Land,
    All,
    Between(f64, f64),
}

impl HeightSelector {
    pub fn bounds(&self) -> (f64, f64) {
        match *self {
            HeightSelector::Land => (20.0, 100.0),
            HeightSelector::All => (0.0, 100.0),
            HeightSelector::Between(lo, hi) => (lo, hi),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StraitDirection {
    Vertical,
    Horizontal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvertAxes {
    X,
    Y,
    Both,
}

/// 模板步骤
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateStep {
    Hill {
        count: NumberArg,
        height: NumberArg,
        x: PercentRange,
        y: PercentRange,
    },
    Pit {
        count: NumberArg,
        height: NumberArg,
        x: PercentRange,
        y: PercentRange,
    },
    Range {
        count: NumberArg,
        height: NumberArg,
        x: PercentRange,
        y: PercentRange,
    },
    Trough {
        count: NumberArg,
        height: NumberArg,
        x: PercentRange,
        y: PercentRange,
    },
    Strait {
        width: NumberArg,
        direction: StraitDirection,
    },
    /// 正值压低边缘，负值压低中心
    Mask {
        power: f64,
    },
    Invert {
        probability: f64,
        axes: InvertAxes,
    },
    Add {
        value: f64,
        selector: HeightSelector,
    },
    Multiply {
        factor: f64,
        selector: HeightSelector,
    },
    Smooth {
        factor: f64,
    },
}

impl TemplateStep {
    pub fn tool_name(&self) -> &'static str {
        match self {
            TemplateStep::Hill { .. } => "Hill",
            TemplateStep::Pit { .. } => "Pit",
            TemplateStep::Range { .. } => "Range",
            TemplateStep::Trough { .. } => "Trough",
            TemplateStep::Strait { .. } => "Strait",
            TemplateStep::Mask { .. } => "Mask",
            TemplateStep::Invert { .. } => "Invert",
            TemplateStep::Add { .. } => "Add",
            TemplateStep::Multiply { .. } => "Multiply",
            TemplateStep::Smooth { .. } => "Smooth",
        }
    }
}

/// 地形模板
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub name: String,
    pub steps: Vec<TemplateStep>,
}

impl Template {
    /// 没有固定脚本的模板走程序化生成
    pub fn is_procedural(&self) -> bool {
        self.steps.is_empty()
    }
}

/// 把数值参数写回模板文本（用于日志和导出）
impl std::fmt::Display for NumberArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NumberArg::Exact(v) => write!(f, "{}", round_to(*v, 3)),
            NumberArg::Range(lo, hi) => write!(f, "{lo}-{hi}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_samples_stay_inclusive() {
        let mut rng = MapRng::new("range");
        let arg = NumberArg::Range(40, 60);
        for _ in 0..2_000 {
            let v = arg.sample(&mut rng);
            assert!((40..=60).contains(&v));
        }
    }

    #[test]
    fn exact_integer_is_exact() {
        let mut rng = MapRng::new("exact");
        for _ in 0..500 {
            assert_eq!(NumberArg::Exact(5.0).sample(&mut rng), 5);
        }
    }

    #[test]
    fn exact_fraction_tops_up_by_one() {
        let mut rng = MapRng::new("fraction");
        let samples: Vec<i32> =
            (0..1_000).map(|_| NumberArg::Exact(1.5).sample(&mut rng)).collect();
        assert!(samples.iter().all(|&v| v == 1 || v == 2));
        let twos = samples.iter().filter(|&&v| v == 2).count();
        assert!(twos > 350 && twos < 650, "{twos} twos");
    }

    #[test]
    fn percent_range_scales_with_length() {
        let mut rng = MapRng::new("point");
        let range = PercentRange::new(40.0, 60.0);
        for _ in 0..500 {
            let v = range.sample(1000.0, &mut rng);
            assert!((400.0..=601.0).contains(&v));
        }
    }
}
