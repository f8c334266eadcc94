#![warn(clippy::all, rust_2018_idioms)]

//! 幻想世界地图生成器
//!
//! 从种子字符串出发，依次生成 Voronoi 网格、高度图、气候、水文、群系，
//! 以及文化、国家、省份、宗教和城镇等社会图层。
//!
//! ```no_run
//! use sekai_mapgen::{init_generator, DelaunatorProvider, InitConfig};
//!
//! let mut generator = init_generator(InitConfig::default());
//! generator.load_options(&serde_json::json!({ "seed": "12345" }))?;
//! let map = generator.generate_map(&DelaunatorProvider)?;
//! println!("{} states", map.pack.society.states.len() - 1);
//! # Ok::<(), sekai_mapgen::MapError>(())
//! ```

pub mod biomes;
pub mod delaunay;
pub mod error;
pub mod generator;
pub mod geometry;
pub mod hydrology;
pub mod ids;
pub mod map;
pub mod options;
pub mod rng;
pub mod society;
pub mod spatial;
pub mod terrain;

pub use delaunay::{DelaunatorProvider, Triangulation, Triangulator};
pub use error::{MapError, Result};
pub use generator::{generate, init_generator, Generator, InitConfig, MapData, Pack, WorldMap};
pub use options::MapOptions;
pub use rng::MapRng;
