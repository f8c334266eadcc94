//! 省份：以城镇为中心划分国家，剩余领土划为荒地、岛屿或殖民地

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::burgs::Burg;
use super::colors::mixed_color;
use super::cultures::{define_type, Culture};
use super::emblems::{self, entity_shield, Emblem};
use super::growth::{expand, majority, Frontier};
use super::names::{culture_short, state_name};
use super::states::{State, StateForm};
use super::Landscape;
use crate::ids::{BurgId, CultureId, ProvinceId, StateId};
use crate::map::FeatureGroup;
use crate::rng::MapRng;

/// 省份
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Province {
    pub i: ProvinceId,
    pub state: StateId,
    pub center: Option<u32>,
    pub burg: BurgId,
    pub name: String,
    pub form_name: String,
    pub full_name: String,
    pub color: String,
    pub emblem: Option<Emblem>,
}

impl Province {
    pub fn placeholder() -> Self {
        Self {
            i: ProvinceId::NONE,
            state: StateId::NEUTRALS,
            center: None,
            burg: BurgId::NONE,
            name: String::new(),
            form_name: String::new(),
            full_name: String::new(),
            color: String::new(),
            emblem: None,
        }
    }
}

type FormTable = Vec<(&'static str, u32)>;

/// 各政体下省份称呼的初始权重
fn form_table(form: Option<StateForm>) -> FormTable {
    match form {
        Some(StateForm::Monarchy) | None => vec![
            ("County", 22),
            ("Earldom", 6),
            ("Shire", 2),
            ("Landgrave", 2),
            ("Margrave", 2),
            ("Barony", 2),
            ("Captaincy", 1),
            ("Seneschalty", 1),
        ],
        Some(StateForm::Republic) => vec![
            ("Province", 6),
            ("Department", 2),
            ("Governorate", 2),
            ("District", 1),
            ("Canton", 1),
            ("Prefecture", 1),
        ],
        Some(StateForm::Theocracy) => vec![("Parish", 3), ("Deanery", 1)],
        Some(StateForm::Union) => vec![
            ("Province", 1),
            ("State", 1),
            ("Canton", 1),
            ("Republic", 1),
            ("County", 1),
            ("Council", 1),
        ],
        Some(StateForm::Anarchy) => {
            vec![("Council", 1), ("Commune", 1), ("Community", 1), ("Tribe", 1)]
        }
    }
}

const WILD_FORMS: [(&str, u32); 7] = [
    ("Territory", 10),
    ("Land", 5),
    ("Region", 2),
    ("Tribe", 1),
    ("Clan", 1),
    ("Dependency", 1),
    ("Area", 1),
];

/// 按权重挑选称呼，选中的称呼权重 +10，使同一国家的省份称呼趋于一致
fn take_form(table: &mut FormTable, rng: &mut MapRng) -> &'static str {
    let name = rng.pick_weighted(table).copied().unwrap_or("Province");
    if let Some(entry) = table.iter_mut().find(|(n, _)| *n == name) {
        entry.1 += 10;
    }
    name
}

/// 输入的社会图层
pub struct ProvinceInput<'a> {
    pub cultures: &'a [Culture],
    pub culture: &'a [CultureId],
    pub state: &'a [StateId],
    pub burg_at: &'a [BurgId],
}

/// 生成省份，写回国家的省份列表和城镇所属省份
pub fn generate_provinces(
    land: &Landscape,
    input: &ProvinceInput,
    states: &mut [State],
    burgs: &mut [Burg],
    rng: &mut MapRng,
) -> (Vec<Province>, Vec<ProvinceId>) {
    let options = land.options;
    let mut provinces = vec![Province::placeholder()];
    let mut province = vec![ProvinceId::NONE; land.len()];
    for s in states.iter_mut() {
        s.provinces.clear();
    }

    let ratio = options.provinces_ratio as f64;
    if states.len() < 2 || options.provinces_ratio == 0 {
        for b in burgs.iter_mut() {
            b.province = ProvinceId::NONE;
        }
        return (provinces, province);
    }
    let max_cost = if options.provinces_ratio == 100 {
        1000.0
    } else {
        rng.gauss(20.0, 5.0, 5.0, 100.0, 0) * ratio.powf(0.5)
    };

    // 以城镇为中心的省份
    for s in states.iter_mut().skip(1) {
        let mut ranked: Vec<(usize, f64)> = burgs
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, b)| b.state == s.i)
            .map(|(k, b)| (k, b.population * rng.gauss(1.0, 0.2, 0.5, 1.5, 3)))
            .collect();
        if ranked.len() < 2 {
            continue;
        }
        ranked.sort_by(|a, b| {
            burgs[b.0]
                .capital
                .cmp(&burgs[a.0].capital)
                .then(b.1.total_cmp(&a.1))
                .then(a.0.cmp(&b.0))
        });
        let count = ((ranked.len() as f64 * ratio / 100.0).ceil() as usize).max(2);
        let mut forms = form_table(s.form);

        for &(k, _) in ranked.iter().take(count) {
            let burg = &burgs[k];
            let culture = &input.cultures[burg.culture.index()];
            let id = ProvinceId::new(provinces.len());

            let by_burg = rng.probability(0.5);
            let name = if by_burg {
                burg.name.clone()
            } else {
                let short = culture_short(culture.base, rng);
                state_name(culture.base, &short, rng)
            };
            let form_name = take_form(&mut forms, rng);
            let kinship = if by_burg { 0.8 } else { 0.4 };
            let shield = entity_shield(
                &options.emblem_shape,
                &culture.shield,
                s.emblem.as_ref().map(|e| e.shield.as_str()),
            );
            let emblem =
                emblems::generate(burg.emblem.as_ref(), kinship, 0.0, burg.kind, shield, rng);

            province[burg.cell as usize] = id;
            s.provinces.push(id);
            provinces.push(Province {
                i: id,
                state: s.i,
                center: Some(burg.cell),
                burg: burg.i,
                full_name: format!("{name} {form_name}"),
                name,
                form_name: form_name.to_owned(),
                color: mixed_color(&s.color, 0.2, 0.0, rng),
                emblem: Some(emblem),
            });
        }
    }

    expand_provinces(land, input.state, &provinces, max_cost, &mut province);
    justify_provinces(land, input.state, input.burg_at, &mut province);
    add_wild_provinces(land, input, states, burgs, max_cost, &mut provinces, &mut province, rng);

    for b in burgs.iter_mut().skip(1) {
        b.province = province[b.cell as usize];
    }
    log::debug!("provinces: {} generated", provinces.len() - 1);
    (provinces, province)
}

fn elevation_cost(land: &Landscape, cell: usize) -> f64 {
    match land.h(cell) {
        h if h >= 70 => 100.0,
        h if h >= 50 => 30.0,
        h if h >= 20 => 10.0,
        _ => 100.0,
    }
}

fn expand_provinces(
    land: &Landscape,
    state: &[StateId],
    provinces: &[Province],
    max_cost: f64,
    province: &mut [ProvinceId],
) {
    let terrain = land.terrain;
    let seeds: Vec<(u32, ProvinceId)> = provinces
        .iter()
        .filter_map(|p| p.center.map(|c| (c, p.i)))
        .collect();
    if seeds.is_empty() {
        return;
    }

    expand(
        &terrain.mesh.neighbors,
        &seeds,
        max_cost,
        province,
        |owner, _, to| {
            let is_land = terrain.is_land(to);
            // 远洋不可通过
            if !is_land && terrain.t[to] == 0 {
                return None;
            }
            if is_land && state[to] != provinces[owner.index()].state {
                return None;
            }
            Some(elevation_cost(land, to))
        },
        |cell| terrain.is_land(cell),
    );
}

/// 被多个同一邻省包围的单元格改归该省
fn justify_provinces(
    land: &Landscape,
    state: &[StateId],
    burg_at: &[BurgId],
    province: &mut [ProvinceId],
) {
    let terrain = land.terrain;
    for i in 0..land.len() {
        if !terrain.is_land(i) || state[i].is_none() || burg_at[i].is_some() {
            continue;
        }
        let own = province[i];
        let around: Vec<ProvinceId> = terrain.mesh.neighbors[i]
            .iter()
            .map(|&c| c as usize)
            .filter(|&c| terrain.is_land(c) && state[c] == state[i])
            .map(|c| province[c])
            .collect();
        let adversaries: Vec<ProvinceId> = around.iter().copied().filter(|&p| p != own).collect();
        if adversaries.len() < 2 {
            continue;
        }
        let buddies = around.len() - adversaries.len();
        if buddies > 2 {
            continue;
        }
        let Some((best, max)) = majority(&adversaries) else {
            continue;
        };
        if buddies >= max {
            continue;
        }
        province[i] = best;
    }
}

/// 从 `from` 出发，只经过本国陆地能否到达 `to`
fn is_passable(
    land: &Landscape,
    state: &[StateId],
    owner: StateId,
    from: usize,
    to: usize,
) -> bool {
    let terrain = land.terrain;
    let mut visited = vec![false; land.len()];
    let mut queue = VecDeque::from([from]);
    visited[from] = true;
    while let Some(cell) = queue.pop_front() {
        if cell == to {
            return true;
        }
        for &c in &terrain.mesh.neighbors[cell] {
            let c = c as usize;
            if !visited[c] && terrain.is_land(c) && state[c] == owner {
                visited[c] = true;
                queue.push_back(c);
            }
        }
    }
    false
}

/// 没有被城镇省份覆盖的国土
#[allow(clippy::too_many_arguments)]
fn add_wild_provinces(
    land: &Landscape,
    input: &ProvinceInput,
    states: &mut [State],
    burgs: &[Burg],
    max_cost: f64,
    provinces: &mut Vec<Province>,
    province: &mut [ProvinceId],
    rng: &mut MapRng,
) {
    let terrain = land.terrain;
    let options = land.options;
    let state = input.state;

    // 尚未归入省份的国土，按国家分组，只收集一次
    let mut unassigned: Vec<Vec<u32>> = vec![Vec::new(); states.len()];
    let mut taken: Vec<bool> = province.iter().map(|p| p.is_some()).collect();
    for i in 0..land.len() {
        if !taken[i] && terrain.is_land(i) && state[i].is_some() {
            if let Some(cells) = unassigned.get_mut(state[i].index()) {
                cells.push(i as u32);
            }
        }
    }
    let mut frontier = Frontier::new(land.len());

    for s in states.iter_mut().skip(1) {
        let pending = std::mem::take(&mut unassigned[s.i.index()]);
        let mut cursor = 0;
        loop {
            while cursor < pending.len() && taken[pending[cursor] as usize] {
                cursor += 1;
            }
            let Some(&center) = pending.get(cursor) else {
                break;
            };
            let center = center as usize;
            let id = ProvinceId::new(provinces.len());

            let reached = frontier.grow(
                &terrain.mesh.neighbors,
                &[(center as u32, id)],
                max_cost,
                province,
                |_, _, to| {
                    if terrain.is_land(to) {
                        if state[to] != s.i || taken[to] {
                            return None;
                        }
                        Some(3.0)
                    } else if terrain.t[to] != 0 {
                        Some(10.0)
                    } else {
                        Some(30.0)
                    }
                },
                |cell| terrain.is_land(cell) && state[cell] == s.i && !taken[cell],
            );

            let mut cells: Vec<usize> = reached
                .iter()
                .map(|&c| c as usize)
                .filter(|&c| province[c] == id)
                .collect();
            cells.sort_unstable();
            for &c in &cells {
                taken[c] = true;
            }
            let burg = cells
                .iter()
                .map(|&c| input.burg_at[c])
                .filter(|b| b.is_some())
                .max_by(|a, b| burgs[a.index()].population.total_cmp(&burgs[b.index()].population));
            let center = burg.map_or(center, |b| burgs[b.index()].cell as usize);

            let feature = terrain.feature_of(center);
            let single_isle = cells.len() as u32 == feature.cells
                && cells.iter().all(|&c| terrain.f[c] == terrain.f[center]);
            let isle_group = !single_isle
                && cells
                    .iter()
                    .all(|&c| terrain.feature_of(c).group == Some(FeatureGroup::Isle));
            let colony = !single_isle
                && rng.probability(0.5)
                && s.center.is_some_and(|sc| !is_passable(land, state, s.i, center, sc as usize));

            let form_name = if single_isle {
                "Island"
            } else if isle_group {
                "Islands"
            } else if colony {
                "Colony"
            } else {
                rng.pick_weighted(&WILD_FORMS).copied().unwrap_or("Territory")
            };

            let culture = &input.cultures[input.culture[center].index()];
            let name = match burg {
                Some(b) if rng.probability(0.5) => burgs[b.index()].name.clone(),
                _ => {
                    let short = culture_short(culture.base, rng);
                    state_name(culture.base, &short, rng)
                }
            };

            let dominion = if colony {
                rng.probability(0.95)
            } else if single_isle || isle_group {
                rng.probability(0.7)
            } else {
                rng.probability(0.3)
            };
            let kinship = if dominion { 0.0 } else { 0.4 };
            let kind = define_type(land, center, rng);
            let state_emblem = s.emblem.as_ref();
            let shield = entity_shield(
                &options.emblem_shape,
                &culture.shield,
                state_emblem.map(|e| e.shield.as_str()),
            );
            let emblem = emblems::generate(
                state_emblem,
                kinship,
                if dominion { 1.0 } else { 0.0 },
                kind,
                shield,
                rng,
            );

            s.provinces.push(id);
            provinces.push(Province {
                i: id,
                state: s.i,
                center: Some(center as u32),
                burg: burg.unwrap_or(BurgId::NONE),
                full_name: format!("{name} {form_name}"),
                name,
                form_name: form_name.to_owned(),
                color: mixed_color(&s.color, 0.2, 0.0, rng),
                emblem: Some(emblem),
            });
        }
    }
}
