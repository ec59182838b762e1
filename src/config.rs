//! # 配置模块
//!
//! ## 设计思路
//!
//! 参数有三个来源，优先级从高到低：命令行 > JSON 配置文件 > 内置默认值。
//! 前两者先合并成 `RawOptions`（数值保持有符号、允许越界），再统一解析成
//! `StripOptions` / `GridOptions`。
//!
//! ## 实现思路
//!
//! - `Default` 提供文档约定的默认值（宽 800、间距 10、9 页、质量 80、png）。
//! - 越界数值回退默认值并记录告警，不中断任务；只有无法回退的值
//!   （未知输出格式、配置文件损坏）才返回 `InvalidConfiguration`。
//! - 未指定输出位置时写到输入目录下的 `result_pic/`，避免下次扫描把输出当成输入。

use std::fs;
use std::path::{Path, PathBuf};

use image::Rgb;
use serde::{Deserialize, Serialize};

use crate::compose::WHITE;
use crate::error::AppError;
use crate::image_io::{OutputFormat, ResizeFilter};
use crate::layout::grid::calculate_grid;

/// 默认输出子目录名。
pub const DEFAULT_OUTPUT_DIR: &str = "result_pic";
/// 矩阵模式默认输出文件名。
pub const DEFAULT_GRID_FILE: &str = "merged.png";

/// 未校验的原始参数（命令行与配置文件共用）。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawOptions {
    pub target_width: Option<i64>,
    pub gap: Option<i64>,
    pub output_count: Option<i64>,
    pub quality: Option<i64>,
    pub output_format: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
    pub rows: Option<i64>,
    pub cols: Option<i64>,
    pub cell_width: Option<i64>,
    pub cell_height: Option<i64>,
    pub resize_filter: Option<ResizeFilter>,
    pub background: Option<[u8; 3]>,
}

impl RawOptions {
    /// 读取 JSON 配置文件。
    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let content = fs::read_to_string(path).map_err(|e| {
            AppError::InvalidConfiguration(format!("无法读取配置文件 {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            AppError::InvalidConfiguration(format!("解析配置文件失败 {}: {}", path.display(), e))
        })
    }

    /// 用 `overrides` 中已设置的字段覆盖当前值。
    pub fn merge(self, overrides: RawOptions) -> Self {
        Self {
            target_width: overrides.target_width.or(self.target_width),
            gap: overrides.gap.or(self.gap),
            output_count: overrides.output_count.or(self.output_count),
            quality: overrides.quality.or(self.quality),
            output_format: overrides.output_format.or(self.output_format),
            output_dir: overrides.output_dir.or(self.output_dir),
            output_path: overrides.output_path.or(self.output_path),
            rows: overrides.rows.or(self.rows),
            cols: overrides.cols.or(self.cols),
            cell_width: overrides.cell_width.or(self.cell_width),
            cell_height: overrides.cell_height.or(self.cell_height),
            resize_filter: overrides.resize_filter.or(self.resize_filter),
            background: overrides.background.or(self.background),
        }
    }

    /// 解析为长图模式参数。`input_dir` 用于推导默认输出目录。
    pub fn into_strip_options(self, input_dir: &Path) -> Result<(StripOptions, Vec<String>), AppError> {
        let defaults = StripOptions::default();
        let mut warnings = Vec::new();

        let output_format = match self.output_format.as_deref() {
            Some(name) => name
                .parse::<OutputFormat>()
                .map_err(|e| AppError::InvalidConfiguration(e.to_string()))?,
            None => defaults.output_format,
        };

        let options = StripOptions {
            target_width: positive_or(self.target_width, "target_width", defaults.target_width, &mut warnings),
            gap: non_negative_or(self.gap, "gap", defaults.gap, &mut warnings),
            output_count: positive_or(self.output_count, "output_count", defaults.output_count, &mut warnings),
            quality: quality_or(self.quality, defaults.quality, &mut warnings),
            output_format,
            output_dir: self
                .output_dir
                .unwrap_or_else(|| input_dir.join(DEFAULT_OUTPUT_DIR)),
            filter: self.resize_filter.unwrap_or(defaults.filter),
            background: self.background.map(Rgb).unwrap_or(defaults.background),
        };

        log_warnings(&warnings);
        Ok((options, warnings))
    }

    /// 解析为矩阵模式参数。
    pub fn into_grid_options(self, input_dir: &Path) -> Result<(GridOptions, Vec<String>), AppError> {
        let defaults = GridOptions::default();
        let mut warnings = Vec::new();

        let output_path = match self.output_path {
            Some(path) => with_known_extension(path, &mut warnings),
            None => input_dir.join(DEFAULT_OUTPUT_DIR).join(DEFAULT_GRID_FILE),
        };

        let options = GridOptions {
            rows: optional_positive(self.rows, "rows", &mut warnings),
            cols: optional_positive(self.cols, "cols", &mut warnings),
            cell_width: optional_positive(self.cell_width, "cell_width", &mut warnings),
            cell_height: optional_positive(self.cell_height, "cell_height", &mut warnings),
            gap: non_negative_or(self.gap, "gap", defaults.gap, &mut warnings),
            quality: quality_or(self.quality, defaults.quality, &mut warnings),
            output_path,
            filter: self.resize_filter.unwrap_or(defaults.filter),
            background: self.background.map(Rgb).unwrap_or(defaults.background),
        };

        log_warnings(&warnings);
        Ok((options, warnings))
    }
}

/// 长图模式参数。
#[derive(Debug, Clone, PartialEq)]
pub struct StripOptions {
    /// 长图宽度（像素）。
    pub target_width: u32,
    /// 图片间距（像素）。
    pub gap: u32,
    /// 输出页数。
    pub output_count: usize,
    /// JPEG 质量（1-100）。
    pub quality: u8,
    pub output_format: OutputFormat,
    /// 输出目录，不存在时自动创建。
    pub output_dir: PathBuf,
    pub filter: ResizeFilter,
    pub background: Rgb<u8>,
}

impl Default for StripOptions {
    fn default() -> Self {
        Self {
            target_width: 800,
            gap: 10,
            output_count: 9,
            quality: 80,
            output_format: OutputFormat::Png,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            filter: ResizeFilter::default(),
            background: WHITE,
        }
    }
}

/// 矩阵模式参数。
#[derive(Debug, Clone, PartialEq)]
pub struct GridOptions {
    /// 行数，`None` 表示自动计算。
    pub rows: Option<usize>,
    /// 列数，`None` 表示自动计算。
    pub cols: Option<usize>,
    /// 格子宽度，`None` 时按第一张图推算。
    pub cell_width: Option<u32>,
    /// 格子高度，`None` 时按第一张图推算。
    pub cell_height: Option<u32>,
    pub gap: u32,
    pub quality: u8,
    /// 输出文件完整路径，输出格式由扩展名决定。
    pub output_path: PathBuf,
    pub filter: ResizeFilter,
    pub background: Rgb<u8>,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            rows: None,
            cols: None,
            cell_width: None,
            cell_height: None,
            gap: 10,
            quality: 80,
            output_path: PathBuf::from(DEFAULT_OUTPUT_DIR).join(DEFAULT_GRID_FILE),
            filter: ResizeFilter::default(),
            background: WHITE,
        }
    }
}

impl GridOptions {
    /// 按 `output_path` 扩展名推断输出格式，无法识别时为 png。
    pub fn output_format(&self) -> OutputFormat {
        OutputFormat::from_path(&self.output_path).unwrap_or_default()
    }
}

/// 修正用户给定的行列数，保证“放得下且首行不为空”。
///
/// - 容量不足：保持行数，`cols = ceil(number / rows)`
/// - 首行为空：保持列数，`rows = ceil(number / cols)`
///
/// 返回修正后的 `(rows, cols)` 与告警信息。
pub fn reconcile_grid(
    number: usize,
    rows: Option<usize>,
    cols: Option<usize>,
) -> (usize, usize, Vec<String>) {
    let number = number.max(1);
    let (mut rows, mut cols) = calculate_grid(number, rows, cols);
    let mut warnings = Vec::new();
    rows = rows.max(1);
    cols = cols.max(1);

    if rows.saturating_mul(cols) < number {
        let fixed = number.div_ceil(rows);
        warnings.push(format!(
            "{}×{} 的网格放不下 {} 张图片，列数调整为 {}",
            rows, cols, number, fixed
        ));
        cols = fixed;
    }

    if (rows - 1).saturating_mul(cols) >= number {
        let fixed = number.div_ceil(cols);
        warnings.push(format!(
            "{} 张图片填不满 {}×{} 网格的首行，行数调整为 {}",
            number, rows, cols, fixed
        ));
        rows = fixed;
    }

    log_warnings(&warnings);
    (rows, cols, warnings)
}

fn log_warnings(warnings: &[String]) {
    for warning in warnings {
        log::warn!("⚠️ {}", warning);
    }
}

fn positive_or<T>(value: Option<i64>, name: &str, default: T, warnings: &mut Vec<String>) -> T
where
    T: TryFrom<i64> + std::fmt::Display + Copy,
{
    match value {
        None => default,
        Some(raw) if raw > 0 => T::try_from(raw).unwrap_or_else(|_| {
            warnings.push(format!("{} = {} 超出范围，使用默认值 {}", name, raw, default));
            default
        }),
        Some(raw) => {
            warnings.push(format!("{} 必须为正数（收到 {}），使用默认值 {}", name, raw, default));
            default
        }
    }
}

fn non_negative_or(value: Option<i64>, name: &str, default: u32, warnings: &mut Vec<String>) -> u32 {
    match value {
        None => default,
        Some(raw) => u32::try_from(raw).unwrap_or_else(|_| {
            warnings.push(format!("{} 不能为负数或过大（收到 {}），使用默认值 {}", name, raw, default));
            default
        }),
    }
}

fn optional_positive<T>(value: Option<i64>, name: &str, warnings: &mut Vec<String>) -> Option<T>
where
    T: TryFrom<i64>,
{
    let raw = value?;
    match T::try_from(raw) {
        Ok(parsed) if raw > 0 => Some(parsed),
        _ => {
            warnings.push(format!("{} 必须为正数（收到 {}），改为自动计算", name, raw));
            None
        }
    }
}

fn quality_or(value: Option<i64>, default: u8, warnings: &mut Vec<String>) -> u8 {
    match value {
        None => default,
        Some(raw) if (1..=100).contains(&raw) => raw as u8,
        Some(raw) => {
            warnings.push(format!("quality 必须在 1~100 之间（收到 {}），使用默认值 {}", raw, default));
            default
        }
    }
}

/// 输出文件名不是已知图片扩展名时追加 `.png`。
fn with_known_extension(path: PathBuf, warnings: &mut Vec<String>) -> PathBuf {
    if OutputFormat::from_path(&path).is_some() {
        return path;
    }
    let mut name = path.clone().into_os_string();
    name.push(".png");
    let fixed = PathBuf::from(name);
    warnings.push(format!(
        "输出文件 {} 不是已知图片格式，改为 {}",
        path.display(),
        fixed.display()
    ));
    fixed
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_temp_dir(tag: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock error")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("image-merge-config-{tag}-{nanos}"));
        fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    #[test]
    fn strip_defaults() {
        let (options, warnings) = RawOptions::default()
            .into_strip_options(Path::new("pics"))
            .expect("resolve");
        assert!(warnings.is_empty());
        assert_eq!(options.target_width, 800);
        assert_eq!(options.gap, 10);
        assert_eq!(options.output_count, 9);
        assert_eq!(options.quality, 80);
        assert_eq!(options.output_format, OutputFormat::Png);
        assert_eq!(options.output_dir, Path::new("pics").join("result_pic"));
        assert_eq!(options.background, WHITE);
    }

    #[test]
    fn invalid_numbers_fall_back_with_warnings() {
        let raw = RawOptions {
            target_width: Some(0),
            gap: Some(-5),
            output_count: Some(-1),
            quality: Some(250),
            ..RawOptions::default()
        };
        let (options, warnings) = raw.into_strip_options(Path::new(".")).expect("resolve");
        assert_eq!(options.target_width, 800);
        assert_eq!(options.gap, 10);
        assert_eq!(options.output_count, 9);
        assert_eq!(options.quality, 80);
        assert_eq!(warnings.len(), 4);
    }

    #[test]
    fn zero_gap_is_allowed() {
        let raw = RawOptions { gap: Some(0), ..RawOptions::default() };
        let (options, warnings) = raw.into_strip_options(Path::new(".")).expect("resolve");
        assert_eq!(options.gap, 0);
        assert!(warnings.is_empty());
    }

    #[test]
    fn unknown_format_is_fatal() {
        let raw = RawOptions { output_format: Some("tiffany".to_string()), ..RawOptions::default() };
        let result = raw.into_strip_options(Path::new("."));
        assert!(matches!(result, Err(AppError::InvalidConfiguration(_))));
    }

    #[test]
    fn grid_output_path_gets_png_extension() {
        let raw = RawOptions { output_path: Some(PathBuf::from("out/collage")), ..RawOptions::default() };
        let (options, warnings) = raw.into_grid_options(Path::new(".")).expect("resolve");
        assert_eq!(options.output_path, PathBuf::from("out/collage.png"));
        assert_eq!(options.output_format(), OutputFormat::Png);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn grid_format_follows_extension() {
        let raw = RawOptions {
            output_path: Some(PathBuf::from("out/collage.JPG")),
            rows: Some(0),
            cell_width: Some(300),
            ..RawOptions::default()
        };
        let (options, warnings) = raw.into_grid_options(Path::new(".")).expect("resolve");
        assert_eq!(options.output_format(), OutputFormat::Jpeg);
        assert_eq!(options.rows, None);
        assert_eq!(options.cell_width, Some(300));
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn grid_default_output_is_inside_input_dir() {
        let (options, _) = RawOptions::default()
            .into_grid_options(Path::new("pics"))
            .expect("resolve");
        assert_eq!(options.output_path, Path::new("pics").join("result_pic").join("merged.png"));
    }

    #[test]
    fn cli_values_override_file_values() {
        let file = RawOptions { target_width: Some(600), gap: Some(4), ..RawOptions::default() };
        let cli = RawOptions { target_width: Some(1024), ..RawOptions::default() };
        let merged = file.merge(cli);
        assert_eq!(merged.target_width, Some(1024));
        assert_eq!(merged.gap, Some(4));
    }

    #[test]
    fn reads_json_config_file() {
        let dir = unique_temp_dir("json");
        let path = dir.join("merge.json");
        fs::write(&path, r#"{ "target_width": 640, "output_format": "jpg", "resize_filter": "triangle" }"#)
            .expect("write config");

        let raw = RawOptions::from_file(&path).expect("parse");
        assert_eq!(raw.target_width, Some(640));
        let (options, _) = raw.into_strip_options(&dir).expect("resolve");
        assert_eq!(options.output_format, OutputFormat::Jpeg);
        assert_eq!(options.filter, ResizeFilter::Triangle);

        fs::write(&path, r#"{ "widht": 640 }"#).expect("write config");
        assert!(matches!(RawOptions::from_file(&path), Err(AppError::InvalidConfiguration(_))));

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn reconcile_keeps_valid_grids() {
        assert_eq!(reconcile_grid(7, None, None), (2, 4, Vec::new()));
        assert_eq!(reconcile_grid(7, Some(3), Some(3)), (3, 3, Vec::new()));
    }

    #[test]
    fn reconcile_grows_columns_when_too_small() {
        let (rows, cols, warnings) = reconcile_grid(10, Some(2), Some(4));
        assert_eq!((rows, cols), (2, 5));
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn reconcile_shrinks_rows_when_first_row_is_empty() {
        let (rows, cols, warnings) = reconcile_grid(9, Some(4), Some(3));
        assert_eq!((rows, cols), (3, 3));
        assert_eq!(warnings.len(), 1);

        // 7 张 5 行：先补列得 5×2，首行仍为空，再收缩为 4×2
        let (rows, cols, warnings) = reconcile_grid(7, Some(5), Some(1));
        assert_eq!((rows, cols), (4, 2));
        assert_eq!(warnings.len(), 2);
    }
}
