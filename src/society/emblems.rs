//! 纹章
//!
//! 盾形、底色、分割、图案与角饰。金属色与颜色交替使用（金属上不放金属，
//! 颜色上不放颜色）；下级纹章按亲缘概率继承上级的底色，按从属概率在角饰
//! 中带上宗主的底色。

use serde::{Deserialize, Serialize};

use super::cultures::CultureType;
use super::names;
use crate::options::SHIELD_SHAPES;
use crate::rng::MapRng;

const METALS: [&str; 2] = ["argent", "or"];
const COLOURS: [&str; 5] = ["gules", "azure", "sable", "vert", "purpure"];

const DIVISIONS: [(&str, u32); 7] = [
    ("perPale", 5),
    ("perFess", 5),
    ("perBend", 3),
    ("perCross", 2),
    ("perSaltire", 1),
    ("quarterly", 2),
    ("gyronny", 1),
];

const CHARGE_COUNTS: [(u8, u32); 3] = [(1, 18), (2, 1), (3, 2)];

const GENERIC_CHARGES: [&str; 10] = [
    "lion", "eagle", "cross", "star", "rose", "tower", "key", "sword", "crown", "castle",
];

/// 按生活方式偏好的图案
fn charges_for(kind: CultureType) -> &'static [&'static str] {
    match kind {
        CultureType::Naval => &["anchor", "ship", "fish", "trident"],
        CultureType::Highland => &["mountain", "eagle", "tower", "goat"],
        CultureType::River => &["fish", "bridge", "wavyBend", "swan"],
        CultureType::Nomadic => &["horse", "crescent", "bow", "camel"],
        CultureType::Hunting => &["stag", "boar", "bear", "wolf"],
        CultureType::Lake => &["swan", "fish", "heron", "waterLily"],
        CultureType::Generic => &GENERIC_CHARGES,
    }
}

/// 分割
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Division {
    pub pattern: String,
    pub tincture: String,
}

/// 纹章
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Emblem {
    pub shield: String,
    pub field: String,
    pub division: Option<Division>,
    pub charge: Option<String>,
    pub charge_tincture: Option<String>,
    pub charge_count: u8,
    /// 宗主底色
    pub canton: Option<String>,
}

fn is_metal(tincture: &str) -> bool {
    METALS.contains(&tincture)
}

fn random_tincture(rng: &mut MapRng) -> String {
    let metal = rng.pick_weighted(&[(true, 3), (false, 4)]).copied().unwrap_or(false);
    contrasting(metal, rng)
}

/// `metal` 为 true 时取金属色，否则取颜色
fn contrasting(metal: bool, rng: &mut MapRng) -> String {
    let list: &[&str] = if metal { &METALS } else { &COLOURS };
    rng.pick(list).copied().unwrap_or("argent").to_owned()
}

/// 文化默认盾形
pub fn culture_shield(base: usize) -> &'static str {
    match base {
        names::GERMAN | names::ENGLISH => "heater",
        names::FRENCH => "french",
        names::ITALIAN => "horsehead",
        names::CASTILLIAN => "spanish",
        names::NORDIC => "wedged",
        names::CHINESE | names::ARABIC => "oval",
        _ => "round",
    }
}

/// 文化的盾形，按 `emblemShape` 选项决定
pub fn culture_shield_for(emblem_shape: &str, base: usize, rng: &mut MapRng) -> String {
    match emblem_shape {
        "culture" | "state" => culture_shield(base).to_owned(),
        "random" => rng.pick(&SHIELD_SHAPES).copied().unwrap_or("heater").to_owned(),
        fixed => fixed.to_owned(),
    }
}

/// 国家、省份、城镇的盾形：`state` 选项下沿用国家盾形，否则沿用文化盾形
pub fn entity_shield(
    emblem_shape: &str,
    culture_shield: &str,
    state_shield: Option<&str>,
) -> String {
    match (emblem_shape, state_shield) {
        ("state", Some(shield)) => shield.to_owned(),
        _ => culture_shield.to_owned(),
    }
}

/// 生成纹章
///
/// `kinship`：继承上级底色与分割的概率；`dominion`：带上宗主角饰的概率
pub fn generate(
    parent: Option<&Emblem>,
    kinship: f64,
    dominion: f64,
    kind: CultureType,
    shield: String,
    rng: &mut MapRng,
) -> Emblem {
    let inherited = parent.filter(|_| rng.probability(kinship));

    let (field, division) = match inherited {
        Some(p) => (p.field.clone(), p.division.clone()),
        None => {
            let field = random_tincture(rng);
            let division = if rng.probability(0.3) {
                let pattern = rng.pick_weighted(&DIVISIONS).copied().unwrap_or("perPale");
                Some(Division {
                    pattern: pattern.to_owned(),
                    tincture: contrasting(!is_metal(&field), rng),
                })
            } else {
                None
            };
            (field, division)
        }
    };

    let (charge, charge_tincture, charge_count) = if rng.probability(0.85) {
        let charge = match inherited.and_then(|p| p.charge.clone()) {
            Some(c) if rng.probability(0.5) => c,
            _ => rng.pick(charges_for(kind)).copied().unwrap_or("lion").to_owned(),
        };
        let tincture = contrasting(!is_metal(&field), rng);
        let count = rng.pick_weighted(&CHARGE_COUNTS).copied().unwrap_or(1);
        (Some(charge), Some(tincture), count)
    } else {
        (None, None, 0)
    };

    let canton = parent
        .filter(|_| dominion > 0.0 && rng.probability(dominion))
        .map(|p| p.field.clone());

    Emblem {
        shield,
        field,
        division,
        charge,
        charge_tincture,
        charge_count,
        canton,
    }
}
