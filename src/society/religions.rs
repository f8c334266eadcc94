//! 宗教：民间信仰、有组织宗教、邪教与异端

use serde::{Deserialize, Serialize};

use super::burgs::Burg;
use super::colors::{mixed_color, random_color};
use super::cultures::Culture;
use super::growth::expand;
use super::names::{abbreviate, adjective, culture_short, deity_name, trim_vowels};
use super::states::State;
use super::Landscape;
use crate::geometry::Bounds;
use crate::ids::{BurgId, CultureId, ReligionId, StateId};
use crate::rng::MapRng;
use crate::spatial::GridIndex;

/// 宗教类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReligionType {
    Folk,
    Organized,
    Cult,
    Heresy,
}

/// 传播范围
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Expansion {
    Global,
    State,
    Culture,
}

/// 宗教
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Religion {
    pub i: ReligionId,
    pub name: String,
    pub color: String,
    pub culture: CultureId,
    #[serde(rename = "type")]
    pub kind: ReligionType,
    pub form: String,
    pub deity: Option<String>,
    pub expansion: Expansion,
    pub expansionism: f64,
    pub center: Option<u32>,
    pub code: String,
    pub origins: Vec<ReligionId>,
}

impl Religion {
    /// 0 号宗教：无宗教
    pub fn none() -> Self {
        Self {
            i: ReligionId::NONE,
            name: "No religion".to_owned(),
            color: String::new(),
            culture: CultureId::WILDLANDS,
            kind: ReligionType::Folk,
            form: String::new(),
            deity: None,
            expansion: Expansion::Global,
            expansionism: 0.0,
            center: None,
            code: String::new(),
            origins: Vec::new(),
        }
    }
}

const FOLK_FORMS: [(&str, u32); 6] = [
    ("Shamanism", 4),
    ("Animism", 4),
    ("Polytheism", 4),
    ("Ancestor Worship", 2),
    ("Nature Worship", 1),
    ("Totemism", 1),
];

const ORGANIZED_FORMS: [(&str, u32); 5] = [
    ("Polytheism", 7),
    ("Monotheism", 7),
    ("Dualism", 3),
    ("Pantheism", 2),
    ("Non-theism", 2),
];

const CULT_FORMS: [(&str, u32); 3] = [("Cult", 5), ("Dark Cult", 5), ("Sect", 1)];

/// 各信仰形式的称呼
fn types_for(form: &str) -> &'static [(&'static str, u32)] {
    match form {
        "Shamanism" => &[("Beliefs", 3), ("Shamanism", 2), ("Spirits", 1)],
        "Animism" => &[("Spirits", 1), ("Beliefs", 1)],
        "Ancestor Worship" => &[("Beliefs", 1), ("Forefathers", 2), ("Ancestors", 2)],
        "Nature Worship" => &[("Beliefs", 3), ("Druidism", 1)],
        "Totemism" => &[("Beliefs", 2), ("Totems", 2), ("Idols", 1)],
        "Polytheism" => &[("Deities", 3), ("Faith", 1), ("Gods", 1), ("Pantheon", 1)],
        "Dualism" => &[("Religion", 3), ("Faith", 1), ("Cult", 1)],
        "Monotheism" => &[("Religion", 1), ("Church", 1)],
        "Pantheism" => &[("Religion", 1), ("Faith", 1)],
        "Non-theism" => &[("Beliefs", 3), ("Spirits", 1)],
        "Cult" => &[
            ("Cult", 4),
            ("Sect", 4),
            ("Arcanum", 1),
            ("Coterie", 1),
            ("Order", 1),
            ("Worship", 1),
        ],
        "Dark Cult" => &[
            ("Cult", 2),
            ("Sect", 2),
            ("Blasphemy", 1),
            ("Circle", 1),
            ("Coven", 1),
            ("Idols", 1),
            ("Occultism", 1),
        ],
        "Sect" => &[("Sect", 3), ("Society", 1)],
        _ => &[
            ("Heresy", 3),
            ("Sect", 2),
            ("Apostates", 1),
            ("Brotherhood", 1),
            ("Circle", 1),
            ("Dissent", 1),
            ("Dissenters", 1),
            ("Iconoclasm", 1),
            ("Schism", 1),
            ("Society", 1),
        ],
    }
}

/// 命名方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NamingMethod {
    RandomType,
    RandomIsm,
    SupremeIsm,
    FaithOfSupreme,
    PlaceIsm,
    CultureIsm,
    PlaceAdjectiveType,
    CultureType,
}

const NAMING_METHODS: [(NamingMethod, u32); 8] = [
    (NamingMethod::RandomType, 3),
    (NamingMethod::RandomIsm, 1),
    (NamingMethod::SupremeIsm, 5),
    (NamingMethod::FaithOfSupreme, 5),
    (NamingMethod::PlaceIsm, 1),
    (NamingMethod::CultureIsm, 2),
    (NamingMethod::PlaceAdjectiveType, 6),
    (NamingMethod::CultureType, 4),
];

const FAITH_WORDS: [&str; 5] = ["Faith", "Way", "Path", "Word", "Witnesses"];

fn weighted(table: &'static [(&'static str, u32)], rng: &mut MapRng) -> &'static str {
    rng.pick_weighted(table).copied().unwrap_or(table[0].0)
}

/// 生成过程中共享的社会图层
struct Context<'a> {
    land: &'a Landscape<'a>,
    cultures: &'a [Culture],
    culture: &'a [CultureId],
    states: &'a [State],
    state: &'a [StateId],
    burgs: &'a [Burg],
    burg_at: &'a [BurgId],
}

impl Context<'_> {
    fn base(&self, cell: usize) -> usize {
        self.cultures[self.culture[cell].index()].base
    }

    /// 单元格所在城镇或国家的名称
    fn place(&self, cell: usize) -> Option<String> {
        let name = if self.burg_at[cell].is_some() {
            &self.burgs[self.burg_at[cell].index()].name
        } else if self.state[cell].is_some() {
            &self.states[self.state[cell].index()].name
        } else {
            return None;
        };
        name.split([' ', ',']).next().map(trim_vowels)
    }

    /// 宗教名与传播范围
    fn religion_name(
        &self,
        form: &str,
        deity: Option<&str>,
        cell: usize,
        rng: &mut MapRng,
    ) -> (String, Expansion) {
        let base = self.base(cell);
        let method = rng.pick_weighted(&NAMING_METHODS).copied().unwrap_or(NamingMethod::RandomIsm);
        let supreme = deity.and_then(|d| d.split([' ', ',']).next());
        let culture_name = &self.cultures[self.culture[cell].index()].name;

        match (method, supreme, self.place(cell)) {
            (NamingMethod::RandomType, ..) => {
                let ty = weighted(types_for(form), rng);
                (format!("{} {ty}", culture_short(base, rng)), Expansion::Global)
            }
            (NamingMethod::SupremeIsm, Some(s), _) => {
                (format!("{}ism", trim_vowels(s)), Expansion::Global)
            }
            (NamingMethod::FaithOfSupreme, Some(s), _) => {
                let word = rng.pick(&FAITH_WORDS).copied().unwrap_or("Faith");
                (format!("{word} of {s}"), Expansion::Global)
            }
            (NamingMethod::PlaceIsm, _, Some(place)) => (format!("{place}ism"), Expansion::State),
            (NamingMethod::CultureIsm, ..) => {
                (format!("{}ism", trim_vowels(culture_name)), Expansion::Culture)
            }
            (NamingMethod::PlaceAdjectiveType, _, Some(place)) => {
                let ty = weighted(types_for(form), rng);
                (format!("{} {ty}", adjective(&place)), Expansion::State)
            }
            (NamingMethod::CultureType, ..) => {
                let ty = weighted(types_for(form), rng);
                (format!("{culture_name} {ty}"), Expansion::Culture)
            }
            _ => (format!("{}ism", trim_vowels(&culture_short(base, rng))), Expansion::Global),
        }
    }

    /// 中心所在国家
    fn state_of(&self, religion: &Religion) -> StateId {
        religion.center.map_or(StateId::NEUTRALS, |c| self.state[c as usize])
    }
}

/// 每个文化一种民间信仰，编号与文化相同
fn folk_religions(cultures: &[Culture], rng: &mut MapRng) -> Vec<Religion> {
    let mut religions = vec![Religion::none()];
    for c in cultures.iter().skip(1) {
        let form = weighted(&FOLK_FORMS, rng);
        let name = format!("{} {}", c.name, weighted(types_for(form), rng));
        let deity = (form != "Animism").then(|| deity_name(c.base, rng));
        religions.push(Religion {
            i: ReligionId::new(c.i.index()),
            name,
            color: mixed_color(&c.color, 0.1, 0.0, rng),
            culture: c.i,
            kind: ReligionType::Folk,
            form: form.to_owned(),
            deity,
            expansion: Expansion::Culture,
            expansionism: 0.0,
            center: c.center,
            code: String::new(),
            origins: vec![ReligionId::NONE],
        });
    }
    religions
}

/// 生成宗教并扩张，返回宗教列表和每个单元格的宗教
#[allow(clippy::too_many_arguments)]
pub fn generate_religions(
    land: &Landscape,
    cultures: &[Culture],
    culture: &[CultureId],
    states: &[State],
    state: &[StateId],
    burgs: &[Burg],
    burg_at: &[BurgId],
    rng: &mut MapRng,
) -> (Vec<Religion>, Vec<ReligionId>) {
    let ctx = Context {
        land,
        cultures,
        culture,
        states,
        state,
        burgs,
        burg_at,
    };
    let options = land.options;

    let mut religions = folk_religions(cultures, rng);
    let mut religion: Vec<ReligionId> =
        culture.iter().map(|c| ReligionId::new(c.index())).collect();

    let count = options.religions_number as usize;
    let mut sorted: Vec<usize> = (0..land.len()).filter(|&i| land.population.s[i] > 2).collect();
    sorted.sort_by(|&a, &b| land.population.s[b].cmp(&land.population.s[a]).then(a.cmp(&b)));
    if count == 0 || cultures.len() < 2 || sorted.is_empty() {
        finish(&mut religions, &religion);
        return (religions, religion);
    }

    let bounds = Bounds::from_size(options.width(), options.height());
    let spacing = (options.width() + options.height()) / 6.0 / count as f64;
    let mut index = GridIndex::new(bounds, spacing.max(1.0));
    let max = sorted.len() as i32 - 1;

    let cults = ((rng.rand_int(10, 40) as f64 / 100.0) * count as f64).floor() as usize;
    let organized = count - cults;

    // 有组织宗教
    let mut placed = 0;
    let mut attempts = 0;
    while placed < organized && attempts < 1000 {
        attempts += 1;
        let mut center = sorted[rng.biased(0, max, 5.0) as usize];
        let form = weighted(&ORGANIZED_FORMS, rng);
        let origin_culture = culture[center];
        let deity = (form != "Non-theism").then(|| deity_name(ctx.base(center), rng));
        let (name, mut expansion) = ctx.religion_name(form, deity.as_deref(), center, rng);

        let home_state = state[center];
        if expansion == Expansion::State && home_state.is_none() {
            expansion = Expansion::Global;
        }
        if expansion == Expansion::Culture && origin_culture.is_none() {
            expansion = Expansion::Global;
        }
        if expansion == Expansion::State && rng.probability(0.5) {
            if let Some(c) = states[home_state.index()].center {
                center = c as usize;
            }
        }
        if expansion == Expansion::Culture && rng.probability(0.5) {
            if let Some(c) = cultures[origin_culture.index()].center {
                center = c as usize;
            }
        }
        if burg_at[center].is_none() {
            if let Some(&b) = land.terrain.mesh.neighbors[center]
                .iter()
                .find(|&&c| burg_at[c as usize].is_some())
            {
                center = b as usize;
            }
        }

        let p = land.point(center);
        if index.find_within(p, spacing * rng.gauss(1.0, 0.3, 0.2, 2.0, 2)).is_some() {
            continue;
        }
        index.insert(p);

        let folk = origin_culture.index();
        if expansion == Expansion::Culture
            && folk > 0
            && !religions[folk].name.starts_with("Old ")
        {
            religions[folk].name = format!("Old {}", religions[folk].name);
        }
        let id = ReligionId::new(religions.len());
        religions.push(Religion {
            i: id,
            name,
            color: random_color(rng),
            culture: origin_culture,
            kind: ReligionType::Organized,
            form: form.to_owned(),
            deity,
            expansion,
            expansionism: rng.rand_int(3, 8) as f64,
            center: Some(center as u32),
            code: String::new(),
            origins: vec![ReligionId::new(folk)],
        });
        placed += 1;
    }

    // 邪教
    let mut placed = 0;
    let mut attempts = 0;
    while placed < cults && attempts < 1000 {
        attempts += 1;
        let center = sorted[rng.biased(0, max, 1.0) as usize];
        let p = land.point(center);
        if index.find_within(p, spacing * rng.gauss(2.0, 0.3, 1.0, 3.0, 2)).is_some() {
            continue;
        }
        index.insert(p);

        let form = weighted(&CULT_FORMS, rng);
        let origin_culture = culture[center];
        let deity = deity_name(ctx.base(center), rng);
        let (name, _) = ctx.religion_name(form, Some(&deity), center, rng);
        let color = mixed_color(&cultures[origin_culture.index()].color, 0.5, 0.0, rng);
        let id = ReligionId::new(religions.len());
        religions.push(Religion {
            i: id,
            name,
            color,
            culture: origin_culture,
            kind: ReligionType::Cult,
            form: form.to_owned(),
            deity: Some(deity),
            expansion: Expansion::Global,
            expansionism: rng.gauss(1.1, 0.5, 0.0, 5.0, 1),
            center: Some(center as u32),
            code: String::new(),
            origins: vec![ReligionId::new(origin_culture.index())],
        });
        placed += 1;
    }

    expand_religions(&ctx, &religions, &mut religion);

    let heresies_from = religions.len();
    add_heresies(&ctx, &mut religions, &religion, spacing, rng);
    if religions.len() > heresies_from {
        expand_heresies(&ctx, &religions, heresies_from, &mut religion);
    }

    finish(&mut religions, &religion);
    log::debug!("religions: {} generated", religions.len() - 1);
    (religions, religion)
}

fn expansion_cap(land: &Landscape) -> f64 {
    let options = land.options;
    land.len() as f64 / 20.0 * options.growth_rate * options.religions_growth_rate
}

/// 海拔代价：水域 500，陆地按海拔线性增加
fn height_cost(land: &Landscape, cell: usize) -> f64 {
    if land.terrain.is_land(cell) {
        (land.h(cell).max(20) - 20) as f64
    } else {
        500.0
    }
}

fn expand_religions(ctx: &Context, religions: &[Religion], religion: &mut [ReligionId]) {
    let land = ctx.land;
    let seeds: Vec<(u32, ReligionId)> = religions
        .iter()
        .filter(|r| r.kind != ReligionType::Folk)
        .filter_map(|r| r.center.map(|c| (c, r.i)))
        .collect();
    if seeds.is_empty() {
        return;
    }
    let home_states: Vec<StateId> = religions.iter().map(|r| ctx.state_of(r)).collect();

    expand(
        &land.terrain.mesh.neighbors,
        &seeds,
        expansion_cap(land),
        religion,
        |owner, _, to| {
            let r = &religions[owner.index()];
            let home_state = home_states[owner.index()];
            match r.expansion {
                Expansion::Culture if ctx.culture[to] != r.culture => return None,
                Expansion::State if ctx.state[to] != home_state => return None,
                _ => {}
            }
            let culture_cost = if ctx.culture[to] != r.culture { 10.0 } else { 0.0 };
            let state_cost = if ctx.state[to] != home_state { 10.0 } else { 0.0 };
            let cost = culture_cost
                + state_cost
                + land.biome_table.cost(land.biomes[to])
                + height_cost(land, to);
            Some(10.0 + cost / r.expansionism.max(0.1))
        },
        |cell| land.terrain.is_land(cell) && ctx.culture[cell].is_some(),
    );
}

/// 在扩张力强的有组织宗教边缘产生异端
fn add_heresies(
    ctx: &Context,
    religions: &mut Vec<Religion>,
    religion: &[ReligionId],
    spacing: f64,
    rng: &mut MapRng,
) {
    let land = ctx.land;
    let neighbors = &land.terrain.mesh.neighbors;
    let mut index = GridIndex::new(
        Bounds::from_size(land.options.width(), land.options.height()),
        (spacing / 10.0).max(1.0),
    );

    let parents: Vec<usize> = religions
        .iter()
        .enumerate()
        .filter(|(_, r)| r.kind == ReligionType::Organized && r.expansionism >= 3.0)
        .map(|(k, _)| k)
        .collect();

    for parent in parents {
        let count = rng.gauss(0.0, 1.0, 0.0, 3.0, 0) as usize;
        if count == 0 {
            continue;
        }
        let id = religions[parent].i;
        let border: Vec<usize> = (0..land.len())
            .filter(|&i| {
                religion[i] == id && neighbors[i].iter().any(|&c| religion[c as usize] != id)
            })
            .collect();

        for _ in 0..count {
            let Some(&center) = rng.pick(&border) else {
                break;
            };
            let p = land.point(center);
            if index.find_within(p, spacing / 10.0).is_some() {
                continue;
            }
            index.insert(p);

            let origin_culture = ctx.culture[center];
            let deity = (religions[parent].form != "Non-theism")
                .then(|| deity_name(ctx.base(center), rng));
            let ty = weighted(types_for("Heresy"), rng);
            let name = format!("{} {ty}", culture_short(ctx.base(center), rng));
            let color = mixed_color(&religions[parent].color, 0.35, 0.2, rng);
            religions.push(Religion {
                i: ReligionId::new(religions.len()),
                name,
                color,
                culture: origin_culture,
                kind: ReligionType::Heresy,
                form: religions[parent].form.clone(),
                deity,
                expansion: Expansion::Global,
                expansionism: rng.gauss(1.2, 0.5, 0.0, 5.0, 1),
                center: Some(center as u32),
                code: String::new(),
                origins: vec![id],
            });
        }
    }
}

fn expand_heresies(
    ctx: &Context,
    religions: &[Religion],
    first: usize,
    religion: &mut [ReligionId],
) {
    let land = ctx.land;
    let before = religion.to_vec();
    let seeds: Vec<(u32, ReligionId)> = religions[first..]
        .iter()
        .filter_map(|r| r.center.map(|c| (c, r.i)))
        .collect();

    expand(
        &land.terrain.mesh.neighbors,
        &seeds,
        expansion_cap(land),
        religion,
        |owner, _, to| {
            let r = &religions[owner.index()];
            let origin = r.origins.first().copied().unwrap_or(ReligionId::NONE);
            let religion_cost = if before[to] == origin { 0.0 } else { 3000.0 };
            let cost =
                religion_cost + land.biome_table.cost(land.biomes[to]) + height_cost(land, to);
            Some(10.0 + cost / r.expansionism.max(0.1))
        },
        |cell| land.terrain.is_land(cell) && ctx.culture[cell].is_some(),
    );
}

/// 失去中心的宗教把中心移到仍信仰它的单元格，并生成缩写
fn finish(religions: &mut [Religion], religion: &[ReligionId]) {
    for r in religions.iter_mut().skip(1) {
        let Some(center) = r.center else {
            continue;
        };
        if religion[center as usize] != r.i {
            if let Some(cell) = religion.iter().position(|&id| id == r.i) {
                r.center = Some(cell as u32);
            }
        }
    }

    let mut codes: Vec<String> = Vec::with_capacity(religions.len());
    for r in religions.iter_mut().skip(1) {
        r.code = abbreviate(&r.name, &codes);
        codes.push(r.code.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::society::tests::{fixture, Fixture};

    #[test]
    fn folk_religions_follow_cultures() {
        let Fixture { society, .. } = fixture("folk");
        for c in &society.cultures[1..] {
            let r = &society.religions[c.i.index()];
            assert_eq!(r.kind, ReligionType::Folk);
            assert_eq!(r.culture, c.i);
            assert!(r.name.contains(&c.name), "{} / {}", r.name, c.name);
            assert_eq!(r.deity.is_none(), r.form == "Animism");
        }
    }

    #[test]
    fn religion_ids_are_valid() {
        let Fixture { society, .. } = fixture("faiths");
        for (k, r) in society.religions.iter().enumerate() {
            assert_eq!(r.i.index(), k);
            if k > 0 {
                assert!(!r.code.is_empty());
            }
        }
        for &r in &society.religion {
            assert!(r.index() < society.religions.len());
        }
        let organized = society
            .religions
            .iter()
            .filter(|r| matches!(r.kind, ReligionType::Organized | ReligionType::Cult))
            .count();
        assert!(organized <= 3);
        for r in &society.religions {
            if r.kind == ReligionType::Heresy {
                let parent = &society.religions[r.origins[0].index()];
                assert_eq!(parent.kind, ReligionType::Organized);
            }
        }
    }

    #[test]
    fn naming_methods_produce_text() {
        let Fixture { society, land, .. } = fixture("naming");
        let land = land.view();
        let burg_at = crate::society::burgs::burg_index(land.len(), &society.burgs);
        let ctx = Context {
            land: &land,
            cultures: &society.cultures,
            culture: &society.culture,
            states: &society.states,
            state: &society.state,
            burgs: &society.burgs,
            burg_at: &burg_at,
        };
        let mut rng = MapRng::new("naming");
        let cell = society.states[1].center.unwrap() as usize;
        for _ in 0..50 {
            let (name, _) =
                ctx.religion_name("Monotheism", Some("Avar, The Great Father"), cell, &mut rng);
            assert!(!name.trim().is_empty());
        }
    }
}
