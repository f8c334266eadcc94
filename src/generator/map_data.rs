//! 地图存档格式
//!
//! 把网格、图层和参数展开成只含普通数组的 JSON 树，供渲染层读取，也能原样读回。

use serde::{Deserialize, Serialize};

use super::{Pack, WorldMap};
use crate::error::{MapError, Result};
use crate::geometry::Point;
use crate::hydrology::{Hydrology, River};
use crate::ids::{BurgId, CultureId, FeatureId, ProvinceId, ReligionId, RiverId, StateId};
use crate::map::{Feature, Grid, PackMesh, PackTerrain, RawGrid};
use crate::options::MapOptions;
use crate::society::{Burg, Culture, Population, Province, Religion, Society, State};

/// 存档格式版本
pub const MAP_DATA_VERSION: &str = "1.0";

/// 粗网格的逐单元格数组
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridCells {
    pub c: Vec<Vec<u32>>,
    pub v: Vec<Vec<u32>>,
    pub b: Vec<bool>,
    pub h: Vec<u8>,
    pub t: Vec<i8>,
    pub f: Vec<FeatureId>,
    pub temp: Vec<i8>,
    pub prec: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridData {
    pub width: f64,
    pub height: f64,
    pub spacing: f64,
    pub cells_desired: usize,
    pub cells_x: usize,
    pub cells_y: usize,
    pub points: Vec<Point>,
    pub boundary: Vec<Point>,
    pub vertices: Vec<Point>,
    pub features: Vec<Feature>,
    pub cells: GridCells,
}

/// 精细网格的逐单元格数组
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackCells {
    pub g: Vec<u32>,
    pub h: Vec<u8>,
    pub c: Vec<Vec<u32>>,
    pub v: Vec<Vec<u32>>,
    pub b: Vec<bool>,
    pub area: Vec<f32>,
    pub t: Vec<i8>,
    pub f: Vec<FeatureId>,
    pub haven: Vec<Option<u32>>,
    pub harbor: Vec<u8>,
    pub fl: Vec<u16>,
    pub conf: Vec<u8>,
    pub r: Vec<RiverId>,
    pub biome: Vec<u8>,
    pub s: Vec<i16>,
    pub pop: Vec<f32>,
    pub culture: Vec<CultureId>,
    pub state: Vec<StateId>,
    pub province: Vec<ProvinceId>,
    pub religion: Vec<ReligionId>,
    pub burg: Vec<BurgId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackData {
    pub points: Vec<Point>,
    pub vertices: Vec<Point>,
    pub cells: PackCells,
    pub features: Vec<Feature>,
    pub rivers: Vec<River>,
    pub cultures: Vec<Culture>,
    pub burgs: Vec<Burg>,
    pub states: Vec<State>,
    pub provinces: Vec<Province>,
    pub religions: Vec<Religion>,
}

/// 完整存档
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapData {
    pub version: String,
    pub seed: String,
    pub options: MapOptions,
    pub grid: GridData,
    pub pack: PackData,
}

impl From<&WorldMap> for MapData {
    fn from(map: &WorldMap) -> Self {
        let grid = &map.grid;
        let mesh = &grid.mesh;
        let pack = &map.pack;
        let pm = &pack.terrain.mesh;
        let society = &pack.society;

        Self {
            version: MAP_DATA_VERSION.to_owned(),
            seed: map.seed.clone(),
            options: map.options.clone(),
            grid: GridData {
                width: mesh.width,
                height: mesh.height,
                spacing: mesh.spacing,
                cells_desired: mesh.cells_desired,
                cells_x: mesh.cells_x,
                cells_y: mesh.cells_y,
                points: mesh.points.clone(),
                boundary: mesh.boundary.clone(),
                vertices: mesh.vertices.clone(),
                features: grid.features.clone(),
                cells: GridCells {
                    c: mesh.neighbors.clone(),
                    v: mesh.cell_vertices.clone(),
                    b: mesh.border.clone(),
                    h: grid.heights.clone(),
                    t: grid.t.clone(),
                    f: grid.f.clone(),
                    temp: grid.temp.clone(),
                    prec: grid.prec.clone(),
                },
            },
            pack: PackData {
                points: pm.points.clone(),
                vertices: pm.vertices.clone(),
                cells: PackCells {
                    g: pm.g.clone(),
                    h: pm.h.clone(),
                    c: pm.neighbors.clone(),
                    v: pm.cell_vertices.clone(),
                    b: pm.border.clone(),
                    area: pm.area.clone(),
                    t: pack.terrain.t.clone(),
                    f: pack.terrain.f.clone(),
                    haven: pack.terrain.haven.clone(),
                    harbor: pack.terrain.harbor.clone(),
                    fl: pack.hydrology.fl.clone(),
                    conf: pack.hydrology.conf.clone(),
                    r: pack.hydrology.r.clone(),
                    biome: pack.biome.clone(),
                    s: pack.population.s.clone(),
                    pop: pack.population.pop.clone(),
                    culture: society.culture.clone(),
                    state: society.state.clone(),
                    province: society.province.clone(),
                    religion: society.religion.clone(),
                    burg: society.burg.clone(),
                },
                features: pack.terrain.features.clone(),
                rivers: pack.hydrology.rivers.clone(),
                cultures: society.cultures.clone(),
                burgs: society.burgs.clone(),
                states: society.states.clone(),
                provinces: society.provinces.clone(),
                religions: society.religions.clone(),
            },
        }
    }
}

impl MapData {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// 校验数组长度并重建地图
    pub fn into_world_map(self) -> Result<WorldMap> {
        if self.grid.points.is_empty() || self.pack.points.is_empty() {
            return Err(MapError::NoData("map data contains no cells".to_owned()));
        }
        let grid = rebuild_grid(self.grid)?;
        let pack = rebuild_pack(self.pack, grid.len())?;
        Ok(WorldMap {
            seed: self.seed,
            options: self.options,
            grid,
            pack,
        })
    }
}

/// 读回存档，等价于 [`MapData::into_world_map`]
pub fn load_map_data(data: MapData) -> Result<WorldMap> {
    data.into_world_map()
}

fn check_len(layer: &str, field: &str, actual: usize, expected: usize) -> Result<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(MapError::generation(format!(
            "{layer}.cells.{field} has {actual} entries, expected {expected}"
        )))
    }
}

fn check_ids<T>(
    layer: &str,
    field: &str,
    ids: &[T],
    count: usize,
    index: impl Fn(&T) -> usize,
) -> Result<()> {
    match ids.iter().map(index).find(|&i| i >= count) {
        Some(bad) => Err(MapError::generation(format!(
            "{layer}.cells.{field} references {bad} but only {count} entries exist"
        ))),
        None => Ok(()),
    }
}

fn rebuild_grid(data: GridData) -> Result<Grid> {
    let n = data.points.len();
    let cells = data.cells;
    check_len("grid", "c", cells.c.len(), n)?;
    check_len("grid", "v", cells.v.len(), n)?;
    check_len("grid", "b", cells.b.len(), n)?;
    check_len("grid", "h", cells.h.len(), n)?;
    check_len("grid", "t", cells.t.len(), n)?;
    check_len("grid", "f", cells.f.len(), n)?;
    check_len("grid", "temp", cells.temp.len(), n)?;
    check_len("grid", "prec", cells.prec.len(), n)?;
    check_ids("grid", "f", &cells.f, data.features.len(), |f| f.index())?;

    Ok(Grid {
        mesh: RawGrid {
            width: data.width,
            height: data.height,
            spacing: data.spacing,
            cells_desired: data.cells_desired,
            cells_x: data.cells_x,
            cells_y: data.cells_y,
            points: data.points,
            boundary: data.boundary,
            neighbors: cells.c,
            cell_vertices: cells.v,
            border: cells.b,
            vertices: data.vertices,
        },
        heights: cells.h,
        t: cells.t,
        f: cells.f,
        features: data.features,
        temp: cells.temp,
        prec: cells.prec,
    })
}

fn rebuild_pack(data: PackData, grid_len: usize) -> Result<Pack> {
    let n = data.points.len();
    let cells = data.cells;
    for (field, len) in [
        ("g", cells.g.len()),
        ("h", cells.h.len()),
        ("c", cells.c.len()),
        ("v", cells.v.len()),
        ("b", cells.b.len()),
        ("area", cells.area.len()),
        ("t", cells.t.len()),
        ("f", cells.f.len()),
        ("haven", cells.haven.len()),
        ("harbor", cells.harbor.len()),
        ("fl", cells.fl.len()),
        ("conf", cells.conf.len()),
        ("r", cells.r.len()),
        ("biome", cells.biome.len()),
        ("s", cells.s.len()),
        ("pop", cells.pop.len()),
        ("culture", cells.culture.len()),
        ("state", cells.state.len()),
        ("province", cells.province.len()),
        ("religion", cells.religion.len()),
        ("burg", cells.burg.len()),
    ] {
        check_len("pack", field, len, n)?;
    }
    check_ids("pack", "g", &cells.g, grid_len, |&g| g as usize)?;
    check_ids("pack", "f", &cells.f, data.features.len(), |f| f.index())?;
    check_ids("pack", "culture", &cells.culture, data.cultures.len(), |c| c.index())?;
    check_ids("pack", "state", &cells.state, data.states.len(), |s| s.index())?;
    check_ids("pack", "province", &cells.province, data.provinces.len(), |p| p.index())?;
    check_ids("pack", "religion", &cells.religion, data.religions.len(), |r| r.index())?;
    check_ids("pack", "burg", &cells.burg, data.burgs.len(), |b| b.index())?;

    let terrain = PackTerrain {
        mesh: PackMesh {
            points: data.points,
            g: cells.g,
            h: cells.h,
            neighbors: cells.c,
            cell_vertices: cells.v,
            border: cells.b,
            vertices: data.vertices,
            area: cells.area,
        },
        t: cells.t,
        f: cells.f,
        features: data.features,
        haven: cells.haven,
        harbor: cells.harbor,
    };

    Ok(Pack {
        terrain,
        hydrology: Hydrology {
            fl: cells.fl,
            conf: cells.conf,
            r: cells.r,
            rivers: data.rivers,
        },
        biome: cells.biome,
        population: Population {
            s: cells.s,
            pop: cells.pop,
        },
        society: Society {
            cultures: data.cultures,
            culture: cells.culture,
            burgs: data.burgs,
            burg: cells.burg,
            states: data.states,
            state: cells.state,
            provinces: data.provinces,
            province: cells.province,
            religions: data.religions,
            religion: cells.religion,
        },
    })
}
