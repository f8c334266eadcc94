use serde::{Deserialize, Serialize};

use crate::ids::{FeatureId, RiverId};

/// 地形特征类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureType {
    Ocean,  // 接触地图边缘的水体
    Lake,   // 内陆水体
    Island, // 陆地
}

/// 按面积和气候细分的类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureGroup {
    Ocean,
    Sea,
    Gulf,
    Continent,
    Island,
    Isle,
    LakeIsland,
    Freshwater,
    Salt,
    Frozen,
    Dry,
    Sinkhole,
    Lava,
}

/// 湖泊的水文属性，在河流生成阶段填写
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LakeData {
    /// 湖面高度（可高于海平面，随溢出口抬升）
    pub height: f32,
    /// 湖岸陆地单元格
    pub shoreline: Vec<u32>,
    pub inlets: Vec<RiverId>,
    /// 流出的河流
    pub outlet: RiverId,
    /// 溢出口所在的湖岸单元格
    pub outlet_cell: Option<u32>,
    /// 注入湖中的河流（通常是流量最大的入湖河）
    pub river: RiverId,
    pub flux: f32,
    pub evaporation: f32,
    pub temp: f32,
}

/// 同类型（陆地或水体）单元格的最大连通区
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    pub i: FeatureId,
    pub land: bool,
    /// 是否接触地图边缘
    pub border: bool,
    #[serde(rename = "type")]
    pub kind: FeatureType,
    /// 单元格数量
    pub cells: u32,
    pub first_cell: u32,
    pub group: Option<FeatureGroup>,
    /// 面积（仅精细网格）
    pub area: f32,
    pub lake: Option<LakeData>,
}

impl Feature {
    pub fn new(i: FeatureId, land: bool, border: bool, first_cell: u32) -> Self {
        let kind = if land {
            FeatureType::Island
        } else if border {
            FeatureType::Ocean
        } else {
            FeatureType::Lake
        };
        Self {
            i,
            land,
            border,
            kind,
            cells: 0,
            first_cell,
            group: None,
            area: 0.0,
            lake: None,
        }
    }

    /// 下标 0 的占位条目
    pub fn placeholder() -> Self {
        Self::new(FeatureId::UNMARKED, false, false, 0)
    }

    pub fn is_lake(&self) -> bool {
        self.kind == FeatureType::Lake
    }

    pub fn is_water(&self) -> bool {
        !self.land
    }
}
