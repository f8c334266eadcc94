//! 空间索引模块
//!
//! 提供间距约束采样所需的空间查询：
//! - 首都、城镇、文化中心、宗教中心的最小间距检查
//! - 最近已放置点查询
//!
//! # 主要类型
//! - [`GridIndex`][]: 基于均匀网格、支持逐点插入的点索引

mod grid_index;

pub use grid_index::GridIndex;
