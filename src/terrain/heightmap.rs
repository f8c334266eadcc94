// 高度图生成
//
// 选择模板 → 逐步执行地形工具 → 按目标陆地比例校正

use std::time::Instant;

use super::blob::{lim, HeightCanvas};
use super::dsl::{parse_template_lenient, presets, template_to_dsl};
use super::template::{Template, TemplateStep};
use crate::error::{MapError, Result};
use crate::map::{HeightedGrid, RawGrid, SEA_LEVEL};
use crate::options::MapOptions;
use crate::rng::MapRng;

/// 根据参数选出要执行的模板
///
/// 自定义脚本优先；`random` 按权重抽取内置模板；`procedural` 返回空模板
pub fn select_template(options: &MapOptions, rng: &mut MapRng) -> Result<Template> {
    if !options.custom_template.trim().is_empty() {
        let (template, errors) = parse_template_lenient("custom", &options.custom_template);
        if !errors.is_empty() {
            log::warn!("custom template: {} step(s) skipped", errors.len());
        }
        return Ok(template);
    }

    let name = options.template.as_str();
    if name.eq_ignore_ascii_case("procedural") {
        return Ok(Template {
            name: "procedural".to_owned(),
            steps: Vec::new(),
        });
    }

    let (name, script) = if name.eq_ignore_ascii_case("random") {
        let weighted: Vec<(usize, u32)> = presets::TEMPLATES
            .iter()
            .enumerate()
            .map(|(i, (_, _, weight))| (i, *weight))
            .collect();
        let idx = rng
            .pick_weighted(&weighted)
            .copied()
            .ok_or_else(|| MapError::generation("no templates to pick from"))?;
        let (name, script, _) = presets::TEMPLATES[idx];
        (name, script)
    } else {
        let script = presets::script(name)
            .ok_or_else(|| MapError::invalid_option("template", name, "unknown template"))?;
        (name, script)
    };

    let (template, errors) = parse_template_lenient(name, script);
    if !errors.is_empty() {
        log::warn!("template `{name}`: {} step(s) skipped", errors.len());
    }
    Ok(template)
}

/// 执行单个模板步骤
pub fn apply_step(canvas: &mut HeightCanvas<'_>, step: &TemplateStep, rng: &mut MapRng) {
    match step {
        TemplateStep::Hill {
            count,
            height,
            x,
            y,
        } => {
            let count = count.sample(rng);
            canvas.add_hill(count, *height, x, y, rng);
        }
        TemplateStep::Pit {
            count,
            height,
            x,
            y,
        } => {
            let count = count.sample(rng);
            canvas.add_pit(count, *height, x, y, rng);
        }
        TemplateStep::Range {
            count,
            height,
            x,
            y,
        } => {
            let count = count.sample(rng);
            canvas.add_range(count, *height, x, y, rng);
        }
        TemplateStep::Trough {
            count,
            height,
            x,
            y,
        } => {
            let count = count.sample(rng);
            canvas.add_trough(count, *height, x, y, rng);
        }
        TemplateStep::Strait { width, direction } => canvas.add_strait(*width, *direction, rng),
        TemplateStep::Mask { power } => canvas.mask(*power),
        TemplateStep::Invert { probability, axes } => canvas.invert(*probability, *axes, rng),
        TemplateStep::Add { value, selector } => canvas.modify(*selector, *value, 1.0),
        TemplateStep::Multiply { factor, selector } => canvas.modify(*selector, 0.0, *factor),
        TemplateStep::Smooth { factor } => canvas.smooth(*factor),
    }
}

/// 生成高度图
pub fn generate_heightmap(
    mesh: RawGrid,
    template: &Template,
    land_percentage: u8,
    rng: &mut MapRng,
) -> HeightedGrid {
    let start = Instant::now();
    let heights = {
        let mut canvas = HeightCanvas::new(&mesh);
        if template.is_procedural() {
            procedural_blobs(&mut canvas, rng);
        } else {
            log::debug!("template `{}`:\n{}", template.name, template_to_dsl(template));
            for step in &template.steps {
                apply_step(&mut canvas, step, rng);
            }
        }
        canvas.into_heights()
    };

    let before = land_fraction(&heights) * 100.0;
    let mut heights = heights;
    fit_land_percentage(&mut heights, land_percentage);

    log::info!(
        "heightmap `{}`: {} steps, land {:.1}% -> {:.1}% in {:?}",
        template.name,
        template.steps.len(),
        before,
        land_fraction(&heights) * 100.0,
        start.elapsed()
    );

    HeightedGrid { mesh, heights }
}

/// 没有脚本时的程序化地形：若干个高斯衰减的隆起
fn procedural_blobs(canvas: &mut HeightCanvas<'_>, rng: &mut MapRng) {
    let width = canvas.mesh().width;
    let height = canvas.mesh().height;
    let count = rng.rand_int(4, 8);

    let mut raised = vec![0.0f64; canvas.heights.len()];
    for _ in 0..count {
        let cx = rng.rand_float(0.15, 0.85) * width;
        let cy = rng.rand_float(0.15, 0.85) * height;
        let peak = rng.rand_float(40.0, 80.0);
        let sigma = rng.rand_float(0.08, 0.2) * width.min(height);
        let two_sigma_sq = 2.0 * sigma * sigma;

        for (i, p) in canvas.mesh().points.iter().enumerate() {
            let dx = p.x - cx;
            let dy = p.y - cy;
            raised[i] += peak * (-(dx * dx + dy * dy) / two_sigma_sq).exp();
        }
    }

    for (h, r) in canvas.heights.iter_mut().zip(&raised) {
        *h = lim(*h as f64 + r);
    }
    canvas.smooth(2.0);
}

/// 高度不低于海平面的单元格比例
pub fn land_fraction(heights: &[u8]) -> f64 {
    if heights.is_empty() {
        return 0.0;
    }
    heights.iter().filter(|&&h| h >= SEA_LEVEL).count() as f64 / heights.len() as f64
}

/// 把陆地比例校正到目标百分比
///
/// 先按分位高度做分段线性缩放（分位点映射到海平面），
/// 再把并列在分位点上的多余单元格按 (高度, 下标) 顺序压到海平面以下。
pub fn fit_land_percentage(heights: &mut [u8], target: u8) {
    let n = heights.len();
    if n == 0 {
        return;
    }
    let target = target.min(100) as usize;
    let land_wanted = (n * target + 50) / 100;

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by_key(|&i| (heights[i], i));

    if land_wanted == 0 {
        heights
            .iter_mut()
            .for_each(|h| *h = (*h).min(SEA_LEVEL - 1));
        return;
    }

    let first_land = n - land_wanted;
    let h_q = heights[order[first_land]] as f64;
    let sea = SEA_LEVEL as f64;

    for h in heights.iter_mut() {
        let v = *h as f64;
        let scaled = if v < h_q {
            v * sea / h_q
        } else if h_q >= 100.0 {
            sea
        } else {
            sea + (v - h_q) * (100.0 - sea) / (100.0 - h_q)
        };
        *h = lim(scaled);
    }

    // 分位点以下的单元格必须是水，以上的必须是陆地
    for (rank, &i) in order.iter().enumerate() {
        if rank < first_land {
            if heights[i] >= SEA_LEVEL {
                heights[i] = SEA_LEVEL - 1;
            }
        } else if heights[i] < SEA_LEVEL {
            heights[i] = SEA_LEVEL;
        }
    }
}
