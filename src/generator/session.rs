//! 生成会话
//!
//! 会话持有参数与最近一次生成的地图，彼此独立，同一进程内可以并存多个。

use serde_json::Value;

use super::map_data::MapData;
use super::{generate, WorldMap};
use crate::delaunay::Triangulator;
use crate::error::{MapError, Result};
use crate::options::MapOptions;

/// 会话初始化参数
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitConfig {
    /// 渲染容器的标识，生成本身不使用
    pub container: Option<String>,
}

/// 地图生成会话
///
/// `Generator::default()` 是未初始化的会话，除查询参数外的操作都会返回
/// [`MapError::Initialization`]。
#[derive(Debug, Clone, Default)]
pub struct Generator {
    config: Option<InitConfig>,
    options: MapOptions,
    map: Option<WorldMap>,
}

impl Generator {
    pub fn init(config: InitConfig) -> Self {
        log::debug!("generator initialized (container: {:?})", config.container);
        Self {
            config: Some(config),
            ..Self::default()
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.config.is_some()
    }

    pub fn config(&self) -> Option<&InitConfig> {
        self.config.as_ref()
    }

    pub fn options(&self) -> &MapOptions {
        &self.options
    }

    fn ensure_initialized(&self, action: &str) -> Result<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(MapError::Initialization(format!("call init before {action}")))
        }
    }

    /// 把部分配置合并进当前参数
    ///
    /// 任一字段不合法时整份配置都不生效。
    pub fn load_options(&mut self, partial: &Value) -> Result<&MapOptions> {
        self.ensure_initialized("load_options")?;
        self.options = self.options.merged(partial)?;
        Ok(&self.options)
    }

    /// 用当前参数生成地图并保存在会话中
    pub fn generate_map(&mut self, triangulator: &dyn Triangulator) -> Result<&WorldMap> {
        self.ensure_initialized("generate_map")?;
        let map = generate(&self.options, triangulator)?;
        Ok(self.map.insert(map))
    }

    pub fn map(&self) -> Result<&WorldMap> {
        self.map
            .as_ref()
            .ok_or_else(|| MapError::NoData("no map has been generated yet".to_owned()))
    }

    /// 导出当前地图
    pub fn get_map_data(&self) -> Result<MapData> {
        self.map().map(MapData::from)
    }

    /// 读入存档，替换当前地图与参数
    pub fn load_map_data(&mut self, data: MapData) -> Result<&WorldMap> {
        self.ensure_initialized("load_map_data")?;
        let options = data.options.validated()?;
        let mut map = data.into_world_map()?;
        map.options = options.clone();
        self.options = options;
        Ok(self.map.insert(map))
    }
}

/// 创建一个已初始化的会话
pub fn init_generator(config: InitConfig) -> Generator {
    Generator::init(config)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::delaunay::DelaunatorProvider;
    use crate::generator::tests::small_options;

    fn session(seed: &str) -> Generator {
        let mut generator = init_generator(InitConfig::default());
        let options = serde_json::to_value(small_options(seed)).unwrap();
        generator.load_options(&options).unwrap();
        generator
    }

    #[test]
    fn uninitialized_session_refuses_work() {
        let mut generator = Generator::default();
        assert!(!generator.is_initialized());
        assert!(matches!(
            generator.load_options(&json!({ "pointsNumber": 2 })),
            Err(MapError::Initialization(_))
        ));
        assert!(matches!(
            generator.generate_map(&DelaunatorProvider),
            Err(MapError::Initialization(_))
        ));
    }

    #[test]
    fn queries_before_generation_have_no_data() {
        let generator = init_generator(InitConfig {
            container: Some("map".to_owned()),
        });
        assert_eq!(generator.config().and_then(|c| c.container.as_deref()), Some("map"));
        assert!(matches!(generator.map(), Err(MapError::NoData(_))));
        assert!(matches!(generator.get_map_data(), Err(MapError::NoData(_))));
    }

    #[test]
    fn rejected_options_leave_previous_values() {
        let mut generator = session("options");
        let err = generator.load_options(&json!({ "statesNumber": 3, "pointsNumber": "many" }));
        assert!(matches!(
            err,
            Err(MapError::InvalidOption { ref key, .. }) if key == "pointsNumber"
        ));
        assert_eq!(generator.options().states_number, 6);
        assert_eq!(generator.options().points_number, 1);
    }

    #[test]
    fn sessions_are_independent() {
        let mut a = session("first");
        let mut b = session("second");
        a.generate_map(&DelaunatorProvider).unwrap();
        assert!(b.map().is_err());
        b.generate_map(&DelaunatorProvider).unwrap();
        assert_eq!(a.map().unwrap().seed, "first");
        assert_eq!(b.map().unwrap().seed, "second");
    }

    #[test]
    fn map_data_moves_between_sessions() {
        let mut source = session("moving");
        source.generate_map(&DelaunatorProvider).unwrap();
        let data = source.get_map_data().unwrap();

        let mut target = init_generator(InitConfig::default());
        let loaded = target.load_map_data(data).unwrap();
        assert_eq!(loaded, source.map().unwrap());
        assert_eq!(target.options().seed, "moving");
    }
}
