//! 命令行生成一张地图并写出 JSON 存档
//!
//! 用法: `generate_map [--pretty] <seed> [options.json] [output.json]`
//! 未指定输出路径时写到 `map-<seed>.json`；`--pretty` 输出带缩进的 JSON。

use std::error::Error;
use std::fs;
use std::time::Instant;

use sekai_mapgen::{init_generator, DelaunatorProvider, InitConfig};
use serde_json::Value;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let (flags, positional): (Vec<String>, Vec<String>) =
        std::env::args().skip(1).partition(|a| a.starts_with("--"));
    let pretty = flags.iter().any(|f| f == "--pretty");
    let mut args = positional.into_iter();
    let Some(seed) = args.next() else {
        eprintln!("usage: generate_map [--pretty] <seed> [options.json] [output.json]");
        std::process::exit(2);
    };
    let options_path = args.next();
    let output = args.next().unwrap_or_else(|| format!("map-{seed}.json"));

    let mut generator = init_generator(InitConfig::default());
    if let Some(path) = &options_path {
        let partial: Value = serde_json::from_str(&fs::read_to_string(path)?)?;
        generator.load_options(&partial)?;
    }
    generator.load_options(&serde_json::json!({ "seed": seed }))?;

    let start = Instant::now();
    let map = generator.generate_map(&DelaunatorProvider)?;
    let society = &map.pack.society;
    println!("seed:      {}", map.seed);
    println!("cells:     {} grid / {} pack", map.grid.len(), map.pack.len());
    println!("land:      {:.1}%", map.land_fraction() * 100.0);
    println!("rivers:    {}", map.pack.hydrology.rivers.len());
    println!("cultures:  {}", society.cultures.len() - 1);
    println!("states:    {}", society.states.len() - 1);
    println!("burgs:     {}", society.burgs.len() - 1);
    println!("religions: {}", society.religions.len() - 1);
    println!("time:      {:?}", start.elapsed());

    let data = generator.get_map_data()?;
    let json = if pretty { data.to_json_pretty()? } else { data.to_json()? };
    fs::write(&output, json)?;
    log::info!("wrote {output}");
    Ok(())
}
