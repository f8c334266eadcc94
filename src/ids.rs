//! 实体编号
//!
//! 每一类实体有独立的编号类型，下标 0 是该集合自己的"空"条目
//! （无文化的荒野、中立地区、无宗教……），彼此之间不能混用。

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $none:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            Default,
            Serialize,
            Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u16);

        impl $name {
            pub const $none: Self = Self(0);

            pub fn new(index: usize) -> Self {
                Self(index as u16)
            }

            pub fn index(self) -> usize {
                self.0 as usize
            }

            pub fn is_none(self) -> bool {
                self.0 == 0
            }

            pub fn is_some(self) -> bool {
                self.0 != 0
            }

            /// 空条目映射为 None
            pub fn get(self) -> Option<Self> {
                self.is_some().then_some(self)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// 水陆连通区编号，0 表示未标记
    FeatureId,
    UNMARKED
);
define_id!(
    /// 河流编号，0 表示没有河流
    RiverId,
    NONE
);
define_id!(
    /// 文化编号，0 是荒野 (Wildlands)
    CultureId,
    WILDLANDS
);
define_id!(
    /// 国家编号，0 是中立地区 (Neutrals)
    StateId,
    NEUTRALS
);
define_id!(
    /// 省份编号，0 表示不属于任何省
    ProvinceId,
    NONE
);
define_id!(
    /// 宗教编号，0 是无宗教
    ReligionId,
    NONE
);
define_id!(
    /// 城镇编号，0 表示没有城镇
    BurgId,
    NONE
);
