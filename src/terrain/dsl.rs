// 地形模板 DSL 解析器
//
// 每行一个步骤：`Tool arg1 arg2 arg3 arg4`
//
// ```
// Hill 1 90-100 44-56 40-60
// Range 1.5 30-55 45-55 40-60
// Smooth 3 0 0 0
// Multiply 0.8 land 0 0
// Mask 3 0 0 0
// ```
//
// 无法解析的行不会中断整个模板：宽松解析会记录错误并跳过该行。

use super::template::{
    HeightSelector, InvertAxes, NumberArg, PercentRange, StraitDirection, Template, TemplateStep,
};
use crate::error::{MapError, Result};

/// 解析数值参数 (如 "40-60"、"5"、"1.5"、"-20")
pub fn parse_number(s: &str) -> Result<NumberArg, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty number".to_owned());
    }
    if let Ok(v) = s.parse::<f64>() {
        if !v.is_finite() {
            return Err(format!("invalid number: {s}"));
        }
        return Ok(NumberArg::Exact(v));
    }

    // 可选的负号，后面是 "lo-hi"
    let (sign, body) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s),
    };
    let (lo, hi) = body
        .split_once('-')
        .ok_or_else(|| format!("cannot parse number: {s}"))?;
    let lo: i32 = lo
        .trim()
        .parse()
        .map_err(|_| format!("invalid range start: {s}"))?;
    let hi: i32 = hi
        .trim()
        .parse()
        .map_err(|_| format!("invalid range end: {s}"))?;
    let lo = lo * sign;
    if lo > hi {
        return Err(format!("range start is above its end: {s}"));
    }
    Ok(NumberArg::Range(lo, hi))
}

/// 解析百分比坐标区间 (如 "44-56" 或 "50")
pub fn parse_percent(s: &str) -> Result<PercentRange, String> {
    let s = s.trim();
    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| format!("invalid coordinate range: {s}"))
    };
    match s.split_once('-') {
        Some((lo, hi)) => Ok(PercentRange::new(parse(lo)?, parse(hi)?)),
        None => {
            let v = parse(s)?;
            Ok(PercentRange::new(v, v))
        }
    }
}

/// 解析高度筛选器 ("land"、"all"、"20-100")
pub fn parse_selector(s: &str) -> Result<HeightSelector, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "land" => Ok(HeightSelector::Land),
        "all" => Ok(HeightSelector::All),
        other => {
            let (lo, hi) = other
                .split_once('-')
                .ok_or_else(|| format!("invalid height range: {s}"))?;
            let lo: f64 = lo.parse().map_err(|_| format!("invalid height range: {s}"))?;
            let hi: f64 = hi.parse().map_err(|_| format!("invalid height range: {s}"))?;
            Ok(HeightSelector::Between(lo, hi))
        }
    }
}

fn parse_plain(s: &str) -> Result<f64, String> {
    s.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("invalid number: {s}"))
}

/// 解析单行命令，空行和注释返回 None
pub fn parse_line(line: &str, line_num: usize) -> Result<Option<TemplateStep>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
        return Ok(None);
    }

    let parts: Vec<&str> = line.split_whitespace().collect();
    let tool = parts[0].to_ascii_lowercase();
    let arg = |i: usize| parts.get(i).copied().unwrap_or("0");

    let make_err = |msg: String| MapError::Template {
        line: line_num,
        message: format!("{msg} in `{line}`"),
    };

    let blob_args = || -> Result<(NumberArg, NumberArg, PercentRange, PercentRange)> {
        if parts.len() < 5 {
            return Err(make_err(format!("{} requires count height x y", parts[0])));
        }
        Ok((
            parse_number(arg(1)).map_err(make_err)?,
            parse_number(arg(2)).map_err(make_err)?,
            parse_percent(arg(3)).map_err(make_err)?,
            parse_percent(arg(4)).map_err(make_err)?,
        ))
    };

    let step = match tool.as_str() {
        "hill" => {
            let (count, height, x, y) = blob_args()?;
            TemplateStep::Hill {
                count,
                height,
                x,
                y,
            }
        }
        "pit" => {
            let (count, height, x, y) = blob_args()?;
            TemplateStep::Pit {
                count,
                height,
                x,
                y,
            }
        }
        "range" => {
            let (count, height, x, y) = blob_args()?;
            TemplateStep::Range {
                count,
                height,
                x,
                y,
            }
        }
        "trough" => {
            let (count, height, x, y) = blob_args()?;
            TemplateStep::Trough {
                count,
                height,
                x,
                y,
            }
        }
        "strait" => {
            let width = parse_number(arg(1)).map_err(make_err)?;
            let direction = match arg(2).to_ascii_lowercase().as_str() {
                "horizontal" => StraitDirection::Horizontal,
                "vertical" | "0" => StraitDirection::Vertical,
                other => return Err(make_err(format!("unknown strait direction `{other}`"))),
            };
            TemplateStep::Strait { width, direction }
        }
        "mask" => TemplateStep::Mask {
            power: parse_plain(arg(1)).map_err(make_err)?,
        },
        "invert" => {
            let probability = parse_plain(arg(1)).map_err(make_err)?;
            let axes = match arg(2).to_ascii_lowercase().as_str() {
                "x" => InvertAxes::X,
                "y" => InvertAxes::Y,
                "both" | "0" => InvertAxes::Both,
                other => return Err(make_err(format!("unknown invert axes `{other}`"))),
            };
            TemplateStep::Invert { probability, axes }
        }
        "add" => TemplateStep::Add {
            value: parse_plain(arg(1)).map_err(make_err)?,
            selector: parse_selector(arg(2)).map_err(make_err)?,
        },
        "multiply" => TemplateStep::Multiply {
            factor: parse_plain(arg(1)).map_err(make_err)?,
            selector: parse_selector(arg(2)).map_err(make_err)?,
        },
        "smooth" => {
            let factor = parse_plain(arg(1)).map_err(make_err)?;
            if factor <= 0.0 {
                return Err(make_err("smooth factor must be positive".to_owned()));
            }
            TemplateStep::Smooth { factor }
        }
        _ => return Err(make_err(format!("unknown tool `{}`", parts[0]))),
    };

    Ok(Some(step))
}

/// 严格解析：任何一行出错都返回错误
pub fn parse_template(name: &str, script: &str) -> Result<Template> {
    let mut steps = Vec::new();
    for (idx, line) in script.lines().enumerate() {
        if let Some(step) = parse_line(line, idx + 1)? {
            steps.push(step);
        }
    }
    Ok(Template {
        name: name.to_owned(),
        steps,
    })
}

/// 宽松解析：出错的行记录下来并跳过，其余步骤照常保留
pub fn parse_template_lenient(name: &str, script: &str) -> (Template, Vec<MapError>) {
    let mut steps = Vec::new();
    let mut errors = Vec::new();
    for (idx, line) in script.lines().enumerate() {
        match parse_line(line, idx + 1) {
            Ok(Some(step)) => steps.push(step),
            Ok(None) => {}
            Err(err) => {
                log::warn!("template `{name}`: skipping step: {err}");
                errors.push(err);
            }
        }
    }
    (
        Template {
            name: name.to_owned(),
            steps,
        },
        errors,
    )
}

/// 把模板写回文本格式
pub fn template_to_dsl(template: &Template) -> String {
    fn pct(r: &PercentRange) -> String {
        if r.min == r.max {
            format!("{}", r.min)
        } else {
            format!("{}-{}", r.min, r.max)
        }
    }
    fn sel(s: &HeightSelector) -> String {
        match s {
            HeightSelector::Land => "land".to_owned(),
            HeightSelector::All => "all".to_owned(),
            HeightSelector::Between(lo, hi) => format!("{lo}-{hi}"),
        }
    }

    template
        .steps
        .iter()
        .map(|step| match step {
            TemplateStep::Hill {
                count,
                height,
                x,
                y,
            }
            | TemplateStep::Pit {
                count,
                height,
                x,
                y,
            }
            | TemplateStep::Range {
                count,
                height,
                x,
                y,
            }
            | TemplateStep::Trough {
                count,
                height,
                x,
                y,
            } => format!(
                "{} {count} {height} {} {}",
                step.tool_name(),
                pct(x),
                pct(y)
            ),
            TemplateStep::Strait { width, direction } => {
                let dir = match direction {
                    StraitDirection::Vertical => "vertical",
                    StraitDirection::Horizontal => "horizontal",
                };
                format!("Strait {width} {dir} 0 0")
            }
            TemplateStep::Mask { power } => format!("Mask {power} 0 0 0"),
            TemplateStep::Invert { probability, axes } => {
                let axes = match axes {
                    InvertAxes::X => "x",
                    InvertAxes::Y => "y",
                    InvertAxes::Both => "both",
                };
                format!("Invert {probability} {axes} 0 0")
            }
            TemplateStep::Add { value, selector } => format!("Add {value} {} 0 0", sel(selector)),
            TemplateStep::Multiply { factor, selector } => {
                format!("Multiply {factor} {} 0 0", sel(selector))
            }
            TemplateStep::Smooth { factor } => format!("Smooth {factor} 0 0 0"),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// 内置模板：名称、脚本、随机选择时的权重
pub mod presets {
    pub const VOLCANO: &str = r#"
Hill 1 90-100 44-56 40-60
Multiply 0.8 50-100 0 0
Range 1.5 30-55 45-55 40-60
Smooth 3 0 0 0
Hill 1.5 35-45 25-30 20-75
Hill 1 35-55 75-80 25-75
Hill 0.5 20-25 10-15 20-25
Mask 3 0 0 0
"#;

    pub const HIGH_ISLAND: &str = r#"
Hill 1 90-100 65-75 47-53
Add 7 all 0 0
Hill 5-6 20-30 25-55 45-55
Range 1 40-50 45-55 45-55
Multiply 0.8 land 0 0
Mask 3 0 0 0
Smooth 2 0 0 0
Trough 2-3 20-30 20-30 20-30
Trough 2-3 20-30 60-80 70-80
Hill 1 10-15 60-60 50-50
Hill 1.5 13-16 15-20 20-75
Range 1.5 30-40 15-85 30-40
Range 1.5 30-40 15-85 60-70
Pit 3-5 10-30 15-85 20-80
"#;

    pub const LOW_ISLAND: &str = r#"
Hill 1 90-99 60-80 45-55
Hill 1-2 20-30 10-30 10-90
Smooth 2 0 0 0
Hill 6-7 25-35 20-70 30-70
Range 1 40-50 45-55 45-55
Trough 2-3 20-30 15-85 20-30
Trough 2-3 20-30 15-85 70-80
Hill 1.5 10-15 5-15 20-80
Hill 1 10-15 85-95 70-80
Pit 5-7 15-25 15-85 20-80
Multiply 0.4 20-100 0 0
Mask 4 0 0 0
"#;

    pub const CONTINENTS: &str = r#"
Hill 1 80-85 60-80 40-60
Hill 1 80-85 20-30 40-60
Hill 6-7 15-30 25-75 15-85
Multiply 0.6 land 0 0
Hill 8-10 5-10 15-85 20-80
Range 1-2 30-60 5-15 25-75
Range 1-2 30-60 80-95 25-75
Range 0-3 30-60 80-90 20-80
Strait 2 vertical 0 0
Strait 1 vertical 0 0
Smooth 3 0 0 0
Trough 3-4 15-20 15-85 20-80
Trough 3-4 5-10 45-55 45-55
Pit 3-4 10-20 15-85 20-80
Mask 4 0 0 0
"#;

    pub const ARCHIPELAGO: &str = r#"
Add 11 all 0 0
Range 2-3 40-60 20-80 20-80
Hill 5 15-20 10-90 30-70
Hill 2 10-15 10-30 20-80
Hill 2 10-15 60-90 20-80
Smooth 3 0 0 0
Trough 10 20-30 5-95 5-95
Strait 2 vertical 0 0
Strait 2 horizontal 0 0
"#;

    pub const ATOLL: &str = r#"
Hill 1 75-80 50-60 45-55
Hill 1.5 30-50 25-75 30-70
Hill .5 30-50 25-35 30-70
Smooth 1 0 0 0
Multiply 0.2 25-100 0 0
Hill 0.5 10-20 50-55 48-52
"#;

    pub const MEDITERRANEAN: &str = r#"
Range 4-6 30-80 0-100 0-10
Range 4-6 30-80 0-100 90-100
Hill 6-8 30-50 10-90 0-5
Hill 6-8 30-50 10-90 95-100
Multiply 0.9 land 0 0
Mask -2 0 0 0
Smooth 1 0 0 0
Hill 2-3 30-70 0-5 20-80
Hill 2-3 30-70 95-100 20-80
Trough 3-6 40-50 0-100 0-10
Trough 3-6 40-50 0-100 90-100
"#;

    pub const PENINSULA: &str = r#"
Range 2-3 20-35 40-50 0-15
Add 5 all 0 0
Hill 1 90-100 10-90 0-5
Add 13 all 0 0
Hill 3-4 3-5 5-95 80-100
Hill 1-2 3-5 5-95 40-60
Trough 5-6 10-25 5-95 5-95
Smooth 3 0 0 0
Invert 0.4 both 0 0
"#;

    pub const PANGEA: &str = r#"
Hill 1-2 25-40 15-50 0-10
Hill 1-2 5-40 50-85 0-10
Hill 1-2 25-40 50-85 90-100
Hill 1-2 5-40 15-50 90-100
Hill 8-12 20-40 20-80 48-52
Smooth 2 0 0 0
Multiply 0.7 land 0 0
Trough 3-4 25-35 5-95 10-20
Trough 3-4 25-35 5-95 80-90
Range 5-6 30-40 10-90 35-65
"#;

    pub const ISTHMUS: &str = r#"
Hill 5-10 15-30 0-30 0-20
Hill 5-10 15-30 10-50 20-40
Hill 5-10 15-30 30-70 40-60
Hill 5-10 15-30 50-90 60-80
Hill 5-10 15-30 70-100 80-100
Smooth 2 0 0 0
Trough 4-8 15-30 0-30 0-20
Trough 4-8 15-30 10-50 20-40
Trough 4-8 15-30 30-70 40-60
Trough 4-8 15-30 50-90 60-80
Trough 4-8 15-30 70-100 80-100
Invert 0.25 x 0 0
"#;

    pub const SHATTERED: &str = r#"
Hill 8 35-40 15-85 30-70
Trough 10-20 40-50 5-95 5-95
Range 5-7 30-40 10-90 20-80
Pit 12-20 30-40 15-85 20-80
"#;

    pub const TAKLAMAKAN: &str = r#"
Hill 1-3 20-30 30-70 30-70
Hill 2-4 60-85 0-5 0-100
Hill 2-4 60-85 95-100 0-100
Hill 3-4 60-85 20-80 0-5
Hill 3-4 60-85 20-80 95-100
Smooth 3 0 0 0
"#;

    pub const OLD_WORLD: &str = r#"
Range 3 70 15-85 20-80
Hill 2-3 50-70 15-45 20-80
Hill 2-3 50-70 65-85 20-80
Hill 4-6 20-25 15-85 20-80
Multiply 0.5 land 0 0
Smooth 2 0 0 0
Range 3-4 20-50 15-35 20-45
Range 2-4 20-50 65-85 45-80
Strait 3-7 vertical 0 0
Trough 6-8 20-50 15-85 45-65
Pit 5-6 20-30 10-90 10-90
"#;

    pub const FRACTIOUS: &str = r#"
Hill 12-15 50-80 5-95 5-95
Mask -1.5 0 0 0
Mask 3 0 0 0
Add -20 30-100 0 0
Range 6-8 40-50 5-95 10-90
"#;

    /// (名称, 脚本, 随机权重)，顺序与 `options::TEMPLATE_NAMES` 一致
    pub const TEMPLATES: [(&str, &str, u32); 14] = [
        ("volcano", VOLCANO, 3),
        ("highIsland", HIGH_ISLAND, 19),
        ("lowIsland", LOW_ISLAND, 9),
        ("continents", CONTINENTS, 16),
        ("archipelago", ARCHIPELAGO, 18),
        ("atoll", ATOLL, 1),
        ("mediterranean", MEDITERRANEAN, 5),
        ("peninsula", PENINSULA, 3),
        ("pangea", PANGEA, 5),
        ("isthmus", ISTHMUS, 2),
        ("shattered", SHATTERED, 7),
        ("taklamakan", TAKLAMAKAN, 1),
        ("oldWorld", OLD_WORLD, 8),
        ("fractious", FRACTIOUS, 3),
    ];

    pub fn script(name: &str) -> Option<&'static str> {
        TEMPLATES
            .iter()
            .find(|(n, _, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, script, _)| *script)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("40-60"), Ok(NumberArg::Range(40, 60)));
        assert_eq!(parse_number("5"), Ok(NumberArg::Exact(5.0)));
        assert_eq!(parse_number(".5"), Ok(NumberArg::Exact(0.5)));
        assert_eq!(parse_number("-20"), Ok(NumberArg::Exact(-20.0)));
        assert_eq!(parse_number("-10-5"), Ok(NumberArg::Range(-10, 5)));
        assert!(parse_number("abc").is_err());
        assert!(parse_number("60-40").is_err());
        assert!(parse_number("").is_err());
    }

    #[test]
    fn test_parse_hill() {
        let step = parse_line("Hill 1 90-100 44-56 40-60", 1).unwrap().unwrap();
        assert_eq!(
            step,
            TemplateStep::Hill {
                count: NumberArg::Exact(1.0),
                height: NumberArg::Range(90, 100),
                x: PercentRange::new(44.0, 56.0),
                y: PercentRange::new(40.0, 60.0),
            }
        );
    }

    #[test]
    fn test_parse_modifiers() {
        let step = parse_line("Multiply 0.8 land 0 0", 1).unwrap().unwrap();
        assert_eq!(
            step,
            TemplateStep::Multiply {
                factor: 0.8,
                selector: HeightSelector::Land
            }
        );
        let step = parse_line("Add -20 30-100 0 0", 1).unwrap().unwrap();
        assert_eq!(
            step,
            TemplateStep::Add {
                value: -20.0,
                selector: HeightSelector::Between(30.0, 100.0)
            }
        );
        let step = parse_line("invert 0.25 x 0 0", 1).unwrap().unwrap();
        assert_eq!(
            step,
            TemplateStep::Invert {
                probability: 0.25,
                axes: InvertAxes::X
            }
        );
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        assert_eq!(parse_line("", 1).unwrap(), None);
        assert_eq!(parse_line("# note", 2).unwrap(), None);
        assert_eq!(parse_line("// note", 3).unwrap(), None);
    }

    #[test]
    fn all_presets_parse_strictly() {
        for (name, script, _) in presets::TEMPLATES {
            let template = parse_template(name, script).unwrap();
            assert!(!template.steps.is_empty(), "{name} has no steps");
        }
    }

    #[test]
    fn lenient_parse_skips_bad_lines() {
        let script = "Hill 1 90-100 44-56 40-60\nHill x 90 44 40\nWobble 3\nSmooth 2 0 0 0";
        let (template, errors) = parse_template_lenient("custom", script);
        assert_eq!(template.steps.len(), 2);
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[0], MapError::Template { line: 2, .. }));
        assert!(parse_template("custom", script).is_err());
    }

    #[test]
    fn dsl_output_parses_back() {
        let template = parse_template("continents", presets::CONTINENTS).unwrap();
        let text = template_to_dsl(&template);
        let again = parse_template("continents", &text).unwrap();
        assert_eq!(template, again);
    }
}
