// 地形生成模块
//
// 模板 DSL → 高度图 → 水陆标记 → 气候

pub mod blob;
pub mod climate;
pub mod dsl;
pub mod features;
pub mod heightmap;
pub mod template;

pub use blob::{BlobConfig, HeightCanvas};
pub use climate::{calculate_climate, ClimateConfig};
pub use dsl::{parse_template, parse_template_lenient, presets};
pub use features::{markup_grid, markup_pack, specify_features};
pub use heightmap::{fit_land_percentage, generate_heightmap, land_fraction, select_template};
pub use template::{
    HeightSelector, InvertAxes, NumberArg, PercentRange, StraitDirection, Template, TemplateStep,
};
