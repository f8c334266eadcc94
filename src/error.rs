//! 生成器错误类型
//!
//! 四类错误对应会话生命周期的不同阶段：
//! - 初始化之前调用生成器
//! - 配置字段被校验表拒绝
//! - 生成流水线内部失败
//! - 尚无已完成的地图时查询数据

use thiserror::Error;

/// 地图生成错误
#[derive(Debug, Error)]
pub enum MapError {
    /// 会话尚未初始化
    #[error("generator is not initialized: {0}")]
    Initialization(String),

    /// 配置字段不合法
    #[error("invalid option `{key}` = {value}: {reason}")]
    InvalidOption {
        key: String,
        value: String,
        reason: String,
    },

    /// 流水线阶段失败
    #[error("map generation failed: {0}")]
    Generation(String),

    /// 没有可用的地图数据
    #[error("no map data: {0}")]
    NoData(String),

    /// 地形模板解析错误
    #[error("template line {line}: {message}")]
    Template { line: usize, message: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl MapError {
    pub fn invalid_option(
        key: impl Into<String>,
        value: impl std::fmt::Display,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidOption {
            key: key.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation(message.into())
    }

    /// 把任意阶段错误包装成 `Generation`，已经是 `Generation` 的保持原样
    pub fn into_generation(self, stage: &str) -> Self {
        match self {
            Self::Generation(_) => self,
            other => Self::Generation(format!("{stage}: {other}")),
        }
    }
}

pub type Result<T, E = MapError> = std::result::Result<T, E>;
