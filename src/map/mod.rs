//! 地图网格数据
//!
//! - `grid`: 粗网格及其分阶段类型
//! - `pack`: 重新取点后的精细网格
//! - `feature`: 水陆连通区

pub mod feature;
pub mod grid;
pub mod pack;

pub use feature::{Feature, FeatureGroup, FeatureType, LakeData};
pub use grid::{Grid, HeightedGrid, MarkedGrid, RawGrid};
pub use pack::{repack, PackMesh, PackTerrain};

/// 海平面高度，>= 20 为陆地
pub const SEA_LEVEL: u8 = 20;
