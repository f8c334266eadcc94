// 气候：温度与降水
//
// 温度按行计算：纬度决定海平面温度，海拔越高越冷。
// 降水由盛行风携带湿度沿一行（或一列）单元格逐格推进，
// 在海面上吸收水汽，在陆地上降下，遇到高山时一次倾泻殆尽。

use std::time::Instant;

use crate::geometry::round_to;
use crate::map::{Grid, MarkedGrid, SEA_LEVEL};
use crate::options::{MapCoordinates, MapOptions};
use crate::rng::MapRng;

/// 热带范围（北纬 16° 到南纬 20°）
const TROPICS: [f64; 2] = [16.0, -20.0];
const TROPICAL_GRADIENT: f64 = 0.15;

/// 每 5° 纬度带的降水系数
const LATITUDE_MODIFIER: [f64; 18] = [
    4.0, 2.0, 2.0, 2.0, 1.0, 1.0, 2.0, 2.0, 2.0, 2.0, 3.0, 3.0, 2.0, 2.0, 1.0, 1.0, 1.0, 0.5,
];

/// 高于此海拔的单元格挡住气流
const MAX_PASSABLE_ELEVATION: u8 = 85;

/// 气候参数
#[derive(Debug, Clone, Copy)]
pub struct ClimateConfig {
    pub temperature_equator: f64,
    pub temperature_north_pole: f64,
    pub temperature_south_pole: f64,
    pub height_exponent: f64,
    /// 降水百分比
    pub precipitation: f64,
    /// 6 个 30° 纬度带的风向（度）
    pub winds: [u16; 6],
    pub coordinates: MapCoordinates,
}

impl ClimateConfig {
    pub fn from_options(options: &MapOptions) -> Self {
        Self {
            temperature_equator: options.temperature_equator as f64,
            temperature_north_pole: options.temperature_north_pole as f64,
            temperature_south_pole: options.temperature_south_pole as f64,
            height_exponent: options.height_exponent,
            precipitation: options.precipitation as f64,
            winds: options.winds,
            coordinates: options.map_coordinates(),
        }
    }

    /// 某纬度的海平面温度
    pub fn sea_level_temp(&self, latitude: f64) -> f64 {
        let equator = self.temperature_equator;
        let north_tropic = equator - TROPICS[0] * TROPICAL_GRADIENT;
        let south_tropic = equator + TROPICS[1] * TROPICAL_GRADIENT;

        if latitude <= TROPICS[0] && latitude >= TROPICS[1] {
            return equator - latitude.abs() * TROPICAL_GRADIENT;
        }
        if latitude > 0.0 {
            let gradient = (north_tropic - self.temperature_north_pole) / (90.0 - TROPICS[0]);
            north_tropic - (latitude - TROPICS[0]) * gradient
        } else {
            let gradient = (south_tropic - self.temperature_south_pole) / (90.0 + TROPICS[1]);
            south_tropic + (latitude - TROPICS[1]) * gradient
        }
    }

    /// 海拔降温
    pub fn altitude_drop(&self, h: u8) -> f64 {
        if h < SEA_LEVEL {
            return 0.0;
        }
        let height = (h as f64 - 18.0).powf(self.height_exponent);
        round_to(height / 1000.0 * 6.5, 0)
    }
}

/// 计算温度与降水
pub fn calculate_climate(marked: MarkedGrid, config: &ClimateConfig, rng: &mut MapRng) -> Grid {
    let start = Instant::now();
    let temp = calculate_temperatures(&marked, config);
    let prec = generate_precipitation(&marked, &temp, config, rng);

    let land: Vec<usize> = (0..marked.heights.len())
        .filter(|&i| marked.heights[i] >= SEA_LEVEL)
        .collect();
    let mean_temp = if land.is_empty() {
        0.0
    } else {
        land.iter().map(|&i| temp[i] as f64).sum::<f64>() / land.len() as f64
    };
    log::info!(
        "climate: mean land temperature {:.1}°, max precipitation {} in {:?}",
        mean_temp,
        prec.iter().max().copied().unwrap_or(0),
        start.elapsed()
    );

    let MarkedGrid {
        mesh,
        heights,
        t,
        f,
        features,
    } = marked;
    Grid {
        mesh,
        heights,
        t,
        f,
        features,
        temp,
        prec,
    }
}

/// 按行计算温度
fn calculate_temperatures(marked: &MarkedGrid, config: &ClimateConfig) -> Vec<i8> {
    let mesh = &marked.mesh;
    let coords = &config.coordinates;
    let mut temp = vec![0i8; mesh.len()];
    if mesh.cells_x == 0 {
        return temp;
    }

    for row_start in (0..mesh.len()).step_by(mesh.cells_x) {
        let y = mesh.points[row_start].y;
        let latitude = coords.lat_n - y / mesh.height * coords.lat_t;
        let sea_level = config.sea_level_temp(latitude);
        let row_end = (row_start + mesh.cells_x).min(mesh.len());
        for cell in row_start..row_end {
            let t = sea_level - config.altitude_drop(marked.heights[cell]);
            temp[cell] = t.clamp(-128.0, 127.0) as i8;
        }
    }
    temp
}

/// 一条风带的起点
struct WindSource {
    cell: usize,
    max_prec: f64,
}

/// 降水模拟的工作状态
struct Rainfall<'a> {
    heights: &'a [u8],
    temp: &'a [i8],
    prec: Vec<u8>,
    modifier: f64,
}

impl Rainfall<'_> {
    fn height_at(&self, cell: isize) -> Option<u8> {
        usize::try_from(cell).ok().and_then(|c| self.heights.get(c).copied())
    }

    fn add(&mut self, cell: usize, amount: f64) {
        let v = self.prec[cell] as f64 + amount;
        self.prec[cell] = v.clamp(0.0, 255.0) as u8;
    }

    /// 正常降水 + 爬坡降水
    fn precipitation(&self, humidity: f64, cell: usize, next_h: u8) -> f64 {
        let normal_loss = (humidity / (10.0 * self.modifier)).max(1.0);
        let diff = (next_h as f64 - self.heights[cell] as f64).max(0.0);
        let slope = (next_h as f64 / 70.0).powi(2);
        (normal_loss + diff * slope).clamp(1.0, humidity.max(1.0))
    }

    /// 沿 `step` 方向推进 `steps` 个单元格
    fn pass_wind(&mut self, sources: &[WindSource], step: isize, steps: usize, rng: &mut MapRng) {
        for source in sources {
            let max_prec = source.max_prec;
            let mut humidity = max_prec - self.heights[source.cell] as f64;
            // 起点太高，气流是干的
            if humidity <= 0.0 {
                continue;
            }

            let mut current = source.cell as isize;
            for _ in 0..steps {
                let cell = current as usize;
                let next = current + step;
                current = next;
                if cell >= self.heights.len() {
                    break;
                }
                // 永久冻土不参与
                if self.temp[cell] < -5 {
                    continue;
                }

                let next_h = self.height_at(next);
                if self.heights[cell] < SEA_LEVEL {
                    match next_h {
                        Some(h) if h >= SEA_LEVEL => {
                            // 海岸降水
                            let amount = (humidity / rng.rand_int(10, 20) as f64).max(1.0);
                            self.add(next as usize, amount);
                        }
                        _ => {
                            humidity = (humidity + 5.0 * self.modifier).min(max_prec);
                            self.add(cell, 5.0 * self.modifier);
                        }
                    }
                    continue;
                }

                let passable = matches!(next_h, Some(h) if h <= MAX_PASSABLE_ELEVATION);
                let precipitation = match next_h {
                    Some(h) if passable => self.precipitation(humidity, cell, h),
                    _ => humidity,
                };
                self.add(cell, precipitation);
                let evaporation = if precipitation > 1.5 { 1.0 } else { 0.0 };
                humidity = if passable {
                    (humidity - precipitation + evaporation).clamp(0.0, max_prec)
                } else {
                    0.0
                };
            }
        }
    }
}

fn band_modifier(latitude: f64) -> f64 {
    let band = ((latitude.abs() - 1.0) / 5.0).trunc().max(0.0) as usize;
    LATITUDE_MODIFIER[band.min(LATITUDE_MODIFIER.len() - 1)]
}

fn generate_precipitation(
    marked: &MarkedGrid,
    temp: &[i8],
    config: &ClimateConfig,
    rng: &mut MapRng,
) -> Vec<u8> {
    let mesh = &marked.mesh;
    let n = mesh.len();
    let cells_x = mesh.cells_x;
    let cells_y = mesh.cells_y;
    let coords = &config.coordinates;

    let cells_modifier = (mesh.cells_desired as f64 / 10_000.0).powf(0.25);
    let modifier = cells_modifier * config.precipitation / 100.0;

    let mut rain = Rainfall {
        heights: &marked.heights,
        temp,
        prec: vec![0; n],
        modifier,
    };
    if cells_x == 0 || cells_y == 0 {
        return rain.prec;
    }

    let mut westerly = Vec::new();
    let mut easterly = Vec::new();
    let mut northerly = 0usize;
    let mut southerly = 0usize;

    for (row, row_start) in (0..n).step_by(cells_x).enumerate() {
        let lat = coords.lat_n - row as f64 / cells_y as f64 * coords.lat_t;
        let lat_mod = band_modifier(lat);
        // 从北到南 0..5 的 30° 风带
        let tier = (((lat - 89.0).abs() / 30.0) as usize).min(5);
        let angle = config.winds[tier] as f64;

        let max_prec = (120.0 * modifier * lat_mod).min(255.0);
        if angle > 40.0 && angle < 140.0 {
            westerly.push(WindSource {
                cell: row_start,
                max_prec,
            });
        }
        if angle > 220.0 && angle < 320.0 {
            easterly.push(WindSource {
                cell: row_start + cells_x - 1,
                max_prec,
            });
        }
        if angle > 100.0 && angle < 260.0 {
            northerly += 1;
        }
        if angle > 280.0 || angle < 80.0 {
            southerly += 1;
        }
    }

    if !westerly.is_empty() {
        rain.pass_wind(&westerly, 1, cells_x, rng);
    }
    if !easterly.is_empty() {
        rain.pass_wind(&easterly, -1, cells_x, rng);
    }

    let vertical = (northerly + southerly) as f64;
    let mean_modifier = LATITUDE_MODIFIER.iter().sum::<f64>() / LATITUDE_MODIFIER.len() as f64;
    if northerly > 0 {
        let lat_mod = if coords.lat_t > 60.0 {
            mean_modifier
        } else {
            band_modifier(coords.lat_n)
        };
        let max_prec = northerly as f64 / vertical * 60.0 * modifier * lat_mod;
        let sources: Vec<WindSource> = (0..cells_x)
            .map(|cell| WindSource { cell, max_prec })
            .collect();
        rain.pass_wind(&sources, cells_x as isize, cells_y, rng);
    }
    if southerly > 0 {
        let lat_mod = if coords.lat_t > 60.0 {
            mean_modifier
        } else {
            band_modifier(coords.lat_s)
        };
        let max_prec = southerly as f64 / vertical * 60.0 * modifier * lat_mod;
        let sources: Vec<WindSource> = (n.saturating_sub(cells_x)..n)
            .map(|cell| WindSource { cell, max_prec })
            .collect();
        rain.pass_wind(&sources, -(cells_x as isize), cells_y, rng);
    }

    rain.prec
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delaunay::DelaunatorProvider;
    use crate::map::{HeightedGrid, RawGrid};
    use crate::terrain::features::markup_grid;

    fn config() -> ClimateConfig {
        ClimateConfig::from_options(&MapOptions::default())
    }

    /// 西半边是海，东半边是陆地，中间一道山脊
    fn half_land(seed: &str) -> MarkedGrid {
        let mut rng = MapRng::new(seed);
        let mesh = RawGrid::build(600.0, 400.0, 2_000, &mut rng, &DelaunatorProvider).unwrap();
        let heights = mesh
            .points
            .iter()
            .map(|p| {
                if p.x < 250.0 {
                    5
                } else if (p.x - 420.0).abs() < 20.0 {
                    90
                } else {
                    40
                }
            })
            .collect();
        markup_grid(HeightedGrid { mesh, heights })
    }

    #[test]
    fn equator_is_warmest() {
        let c = config();
        assert!(c.sea_level_temp(0.0) > c.sea_level_temp(30.0));
        assert!(c.sea_level_temp(30.0) > c.sea_level_temp(60.0));
        assert!((c.sea_level_temp(90.0) - c.temperature_north_pole).abs() < 1e-9);
        assert!((c.sea_level_temp(-90.0) - c.temperature_south_pole).abs() < 1e-9);
    }

    #[test]
    fn altitude_cools() {
        let c = config();
        assert_eq!(c.altitude_drop(10), 0.0);
        assert!(c.altitude_drop(80) > c.altitude_drop(40));
    }

    #[test]
    fn climate_fills_every_cell() {
        let marked = half_land("climate");
        let mut rng = MapRng::new("climate");
        let grid = calculate_climate(marked, &config(), &mut rng);
        assert_eq!(grid.temp.len(), grid.len());
        assert_eq!(grid.prec.len(), grid.len());
        let wet_land = (0..grid.len())
            .filter(|&i| grid.is_land(i) && grid.prec[i] > 0)
            .count();
        assert!(wet_land > 0);
    }

    #[test]
    fn ridge_casts_rain_shadow() {
        let marked = half_land("shadow");
        let mut options = MapOptions::default();
        // 所有纬度带都吹东风（从西向东推进）
        options.winds = [90; 6];
        let mut rng = MapRng::new("shadow");
        let grid = calculate_climate(marked, &ClimateConfig::from_options(&options), &mut rng);

        let mean = |range: std::ops::Range<f64>| {
            let cells: Vec<usize> = (0..grid.len())
                .filter(|&i| range.contains(&grid.mesh.points[i].x) && grid.temp[i] >= -5)
                .collect();
            cells.iter().map(|&i| grid.prec[i] as f64).sum::<f64>() / cells.len().max(1) as f64
        };
        let windward = mean(260.0..380.0);
        let leeward = mean(460.0..600.0);
        assert!(windward > leeward, "{windward} vs {leeward}");
    }
}
