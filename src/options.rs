//! 生成参数
//!
//! `MapOptions` 保存全部命名参数。外部传入的是部分配置（JSON 对象），
//! 按固定的校验表逐字段合并：数值越界时截断到允许范围，类型不符或
//! 枚举值不认识时直接报错；校验表之外的键记一条警告后原样保留。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{MapError, Result};

/// 密度档位 1..=13 对应的目标单元格数量
pub const CELLS_DENSITY: [usize; 13] = [
    1_000, 2_000, 5_000, 10_000, 20_000, 30_000, 40_000, 50_000, 60_000, 70_000, 80_000, 90_000,
    100_000,
];

/// 内置地形模板名（与 `terrain::dsl::presets::TEMPLATES` 的顺序一致）
pub const TEMPLATE_NAMES: [&str; 14] = [
    "volcano",
    "highIsland",
    "lowIsland",
    "continents",
    "archipelago",
    "atoll",
    "mediterranean",
    "peninsula",
    "pangea",
    "isthmus",
    "shattered",
    "taklamakan",
    "oldWorld",
    "fractious",
];

const TEMPLATE_CHOICES: [&str; 16] = [
    "volcano",
    "highIsland",
    "lowIsland",
    "continents",
    "archipelago",
    "atoll",
    "mediterranean",
    "peninsula",
    "pangea",
    "isthmus",
    "shattered",
    "taklamakan",
    "oldWorld",
    "fractious",
    "random",
    "procedural",
];

pub const SHIELD_SHAPES: [&str; 10] = [
    "heater", "spanish", "french", "horsehead", "swiss", "wedged", "polish", "round", "oval",
    "square",
];

const EMBLEM_SHAPE_CHOICES: [&str; 13] = [
    "culture", "state", "random", "heater", "spanish", "french", "horsehead", "swiss", "wedged",
    "polish", "round", "oval", "square",
];

/// 全部生成参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapOptions {
    pub seed: String,
    pub map_width: u32,
    pub map_height: u32,
    /// 密度档位 1..=13
    pub points_number: u8,
    pub template: String,
    /// 自定义模板脚本，非空时优先于 `template`
    pub custom_template: String,
    pub land_percentage: u8,

    /// 地图覆盖的纬度跨度（占整个球面的百分比）
    pub map_size: f64,
    /// 纬度偏移，50 表示以赤道为中心
    pub latitude: f64,
    pub longitude: f64,

    pub temperature_equator: i32,
    pub temperature_north_pole: i32,
    pub temperature_south_pole: i32,
    pub height_exponent: f64,
    /// 降水量百分比
    pub precipitation: u32,
    /// 六个 30° 纬度带的盛行风方向（罗盘角度）
    pub winds: [u16; 6],

    pub resolve_depressions: bool,
    pub downcut_rivers: bool,

    pub cultures_number: u16,
    pub cultures_set: String,
    pub states_number: u16,
    pub provinces_ratio: u8,
    /// 1000 表示按人口自动决定城镇数量
    pub manors_number: u16,
    pub religions_number: u16,
    pub size_variety: f64,
    pub growth_rate: f64,
    pub states_growth_rate: f64,
    pub cultures_growth_rate: f64,
    pub religions_growth_rate: f64,
    pub emblem_shape: String,

    pub distance_unit: String,
    pub distance_scale: f64,
    pub area_unit: String,
    pub height_unit: String,
    pub temperature_scale: String,
    pub population_rate: u32,
    pub urbanization: f64,
    pub urban_density: u32,
    pub year: i32,
    pub era: String,
    pub era_short: String,

    /// 校验表以外的键
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            seed: "12345".to_owned(),
            map_width: 1920,
            map_height: 1080,
            points_number: 4,
            template: "continents".to_owned(),
            custom_template: String::new(),
            land_percentage: 40,
            map_size: 60.0,
            latitude: 50.0,
            longitude: 50.0,
            temperature_equator: 27,
            temperature_north_pole: -30,
            temperature_south_pole: -15,
            height_exponent: 2.0,
            precipitation: 100,
            winds: [225, 45, 225, 315, 135, 315],
            resolve_depressions: true,
            downcut_rivers: true,
            cultures_number: 12,
            cultures_set: "world".to_owned(),
            states_number: 18,
            provinces_ratio: 40,
            manors_number: 1000,
            religions_number: 6,
            size_variety: 4.0,
            growth_rate: 1.0,
            states_growth_rate: 1.0,
            cultures_growth_rate: 1.0,
            religions_growth_rate: 1.0,
            emblem_shape: "culture".to_owned(),
            distance_unit: "mi".to_owned(),
            distance_scale: 3.0,
            area_unit: "square".to_owned(),
            height_unit: "ft".to_owned(),
            temperature_scale: "°C".to_owned(),
            population_rate: 1000,
            urbanization: 1.0,
            urban_density: 10,
            year: 1000,
            era: "Era".to_owned(),
            era_short: "E".to_owned(),
            extra: BTreeMap::new(),
        }
    }
}

/// 地图覆盖的经纬度范围（度）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapCoordinates {
    pub lat_t: f64,
    pub lat_n: f64,
    pub lat_s: f64,
    pub lon_t: f64,
    pub lon_w: f64,
    pub lon_e: f64,
}

impl MapOptions {
    /// 密度档位对应的目标单元格数
    pub fn cells_desired(&self) -> usize {
        let idx = (self.points_number.clamp(1, 13) - 1) as usize;
        CELLS_DENSITY[idx]
    }

    pub fn width(&self) -> f64 {
        self.map_width as f64
    }

    pub fn height(&self) -> f64 {
        self.map_height as f64
    }

    pub fn map_coordinates(&self) -> MapCoordinates {
        let round1 = |v: f64| crate::geometry::round_to(v, 1);
        let lat_t = round1(self.map_size / 100.0 * 180.0);
        let lat_n = round1(90.0 - (180.0 - lat_t) * self.latitude / 100.0);
        let lat_s = round1(lat_n - lat_t);

        let lon_t = round1((self.width() / self.height() * lat_t / 2.0).min(360.0));
        let lon_w = round1((360.0 - lon_t) * self.longitude / 100.0 - 180.0);
        let lon_e = round1(lon_w + lon_t);

        MapCoordinates {
            lat_t,
            lat_n,
            lat_s,
            lon_t,
            lon_w,
            lon_e,
        }
    }

    /// 在当前参数之上合并一份部分配置
    pub fn merged(&self, partial: &Value) -> Result<Self> {
        let Value::Object(entries) = partial else {
            return Err(MapError::invalid_option(
                "<options>",
                partial,
                "options must be a JSON object",
            ));
        };

        let mut current = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        for (key, value) in entries {
            match OPTION_TABLE.iter().find(|spec| spec.key == key) {
                Some(spec) => {
                    let accepted = spec.validate(value)?;
                    current.insert(key.clone(), accepted);
                }
                None => {
                    log::warn!("unknown option `{key}` passed through unchanged");
                    current.insert(key.clone(), value.clone());
                }
            }
        }

        Ok(serde_json::from_value(Value::Object(current))?)
    }

    /// 完整校验一份参数（用于读取存档）
    pub fn validated(&self) -> Result<Self> {
        let value = serde_json::to_value(self)?;
        MapOptions::default().merged(&value)
    }
}

/// 校验表中字段的取值类型
#[derive(Debug, Clone, Copy)]
enum OptionKind {
    Int { min: i64, max: i64 },
    Float { min: f64, max: f64 },
    Bool,
    Text { max_len: usize, allow_empty: bool },
    Choice(&'static [&'static str]),
    IntList { len: usize, min: i64, max: i64 },
}

#[derive(Debug, Clone, Copy)]
struct OptionSpec {
    key: &'static str,
    kind: OptionKind,
}

const fn int(key: &'static str, min: i64, max: i64) -> OptionSpec {
    OptionSpec {
        key,
        kind: OptionKind::Int { min, max },
    }
}

const fn float(key: &'static str, min: f64, max: f64) -> OptionSpec {
    OptionSpec {
        key,
        kind: OptionKind::Float { min, max },
    }
}

const fn choice(key: &'static str, allowed: &'static [&'static str]) -> OptionSpec {
    OptionSpec {
        key,
        kind: OptionKind::Choice(allowed),
    }
}

const fn text(key: &'static str, max_len: usize, allow_empty: bool) -> OptionSpec {
    OptionSpec {
        key,
        kind: OptionKind::Text {
            max_len,
            allow_empty,
        },
    }
}

const fn flag(key: &'static str) -> OptionSpec {
    OptionSpec {
        key,
        kind: OptionKind::Bool,
    }
}

const OPTION_TABLE: &[OptionSpec] = &[
    text("seed", 64, false),
    int("mapWidth", 320, 8192),
    int("mapHeight", 240, 8192),
    int("pointsNumber", 1, 13),
    choice("template", &TEMPLATE_CHOICES),
    text("customTemplate", 10_000, true),
    int("landPercentage", 1, 90),
    float("mapSize", 1.0, 100.0),
    float("latitude", 0.0, 100.0),
    float("longitude", 0.0, 100.0),
    int("temperatureEquator", -50, 50),
    int("temperatureNorthPole", -50, 50),
    int("temperatureSouthPole", -50, 50),
    float("heightExponent", 1.5, 2.2),
    int("precipitation", 0, 500),
    OptionSpec {
        key: "winds",
        kind: OptionKind::IntList {
            len: 6,
            min: 0,
            max: 360,
        },
    },
    flag("resolveDepressions"),
    flag("downcutRivers"),
    int("culturesNumber", 1, 100),
    choice("culturesSet", &["world", "european", "oriental"]),
    int("statesNumber", 0, 100),
    int("provincesRatio", 0, 100),
    int("manorsNumber", 0, 1000),
    int("religionsNumber", 0, 50),
    float("sizeVariety", 0.0, 10.0),
    float("growthRate", 0.1, 2.0),
    float("statesGrowthRate", 0.1, 2.0),
    float("culturesGrowthRate", 0.1, 2.0),
    float("religionsGrowthRate", 0.1, 2.0),
    choice("emblemShape", &EMBLEM_SHAPE_CHOICES),
    choice("distanceUnit", &["mi", "km", "lg", "vr", "nmi", "nm"]),
    float("distanceScale", 0.01, 100.0),
    choice("areaUnit", &["square", "ha", "acres"]),
    choice("heightUnit", &["ft", "m", "f"]),
    choice("temperatureScale", &["°C", "°F", "K", "°R", "°De", "°N", "°Ré", "°Rø"]),
    int("populationRate", 10, 10_000),
    float("urbanization", 0.01, 5.0),
    int("urbanDensity", 1, 200),
    int("year", -10_000, 10_000),
    text("era", 64, false),
    text("eraShort", 8, false),
];

impl OptionSpec {
    fn validate(&self, value: &Value) -> Result<Value> {
        let reject = |reason: &str| MapError::invalid_option(self.key, value, reason);

        match self.kind {
            OptionKind::Int { min, max } => {
                let n = as_number(value).ok_or_else(|| reject("expected a number"))?;
                let clamped = n.round().clamp(min as f64, max as f64) as i64;
                if clamped as f64 != n {
                    log::debug!("option `{}` adjusted from {n} to {clamped}", self.key);
                }
                Ok(Value::from(clamped))
            }
            OptionKind::Float { min, max } => {
                let n = as_number(value).ok_or_else(|| reject("expected a number"))?;
                Ok(Value::from(n.clamp(min, max)))
            }
            OptionKind::Bool => match value {
                Value::Bool(b) => Ok(Value::Bool(*b)),
                _ => Err(reject("expected true or false")),
            },
            OptionKind::Text {
                max_len,
                allow_empty,
            } => {
                let s = match value {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    _ => return Err(reject("expected a string")),
                };
                if s.is_empty() && !allow_empty {
                    return Err(reject("must not be empty"));
                }
                if s.chars().count() > max_len {
                    return Err(reject(&format!("longer than {max_len} characters")));
                }
                Ok(Value::String(s))
            }
            OptionKind::Choice(allowed) => {
                let s = value.as_str().ok_or_else(|| reject("expected a string"))?;
                allowed
                    .iter()
                    .find(|a| a.eq_ignore_ascii_case(s))
                    .map(|a| Value::String((*a).to_owned()))
                    .ok_or_else(|| reject(&format!("expected one of {}", allowed.join(", "))))
            }
            OptionKind::IntList { len, min, max } => {
                let items = value
                    .as_array()
                    .ok_or_else(|| reject("expected an array"))?;
                if items.len() != len {
                    return Err(reject(&format!("expected exactly {len} values")));
                }
                items
                    .iter()
                    .map(|item| {
                        as_number(item)
                            .map(|n| Value::from(n.round().clamp(min as f64, max as f64) as i64))
                            .ok_or_else(|| reject("expected numbers"))
                    })
                    .collect::<Result<Vec<_>>>()
                    .map(Value::Array)
            }
        }
    }
}

/// 数字或数字字符串，非有限值视为无效
fn as_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_round_trip_through_the_table() {
        let options = MapOptions::default();
        assert_eq!(options.validated().unwrap(), options);
        assert_eq!(options.cells_desired(), 10_000);
    }

    #[test]
    fn numbers_are_clamped() {
        let options = MapOptions::default()
            .merged(&json!({ "pointsNumber": 40, "landPercentage": -5, "growthRate": 9.5 }))
            .unwrap();
        assert_eq!(options.points_number, 13);
        assert_eq!(options.land_percentage, 1);
        assert_eq!(options.growth_rate, 2.0);
        assert_eq!(options.cells_desired(), 100_000);
    }

    #[test]
    fn numeric_strings_are_accepted() {
        let options = MapOptions::default()
            .merged(&json!({ "statesNumber": "7" }))
            .unwrap();
        assert_eq!(options.states_number, 7);
    }

    #[test]
    fn wrong_type_is_rejected_with_key() {
        let err = MapOptions::default()
            .merged(&json!({ "mapWidth": "wide" }))
            .unwrap_err();
        match err {
            MapError::InvalidOption { key, .. } => assert_eq!(key, "mapWidth"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn template_names_are_case_insensitive() {
        let options = MapOptions::default()
            .merged(&json!({ "template": "Continents" }))
            .unwrap();
        assert_eq!(options.template, "continents");

        let err = MapOptions::default().merged(&json!({ "template": "moon" }));
        assert!(matches!(err, Err(MapError::InvalidOption { .. })));
    }

    #[test]
    fn unknown_keys_pass_through() {
        let options = MapOptions::default()
            .merged(&json!({ "customColour": "teal" }))
            .unwrap();
        assert_eq!(options.extra.get("customColour"), Some(&json!("teal")));
    }

    #[test]
    fn winds_need_six_entries() {
        let err = MapOptions::default().merged(&json!({ "winds": [1, 2, 3] }));
        assert!(err.is_err());
        let options = MapOptions::default()
            .merged(&json!({ "winds": [0, 90, 180, 270, 400, 45] }))
            .unwrap();
        assert_eq!(options.winds[4], 360);
    }

    #[test]
    fn coordinates_follow_size_and_latitude() {
        let options = MapOptions {
            map_size: 100.0,
            latitude: 50.0,
            ..Default::default()
        };
        let c = options.map_coordinates();
        assert_eq!(c.lat_t, 180.0);
        assert_eq!(c.lat_n, 90.0);
        assert_eq!(c.lat_s, -90.0);
    }
}
