//! # 图片拼接工具：命令行入口
//!
//! 本文件只负责参数解析、日志初始化与结果输出。
//! 业务逻辑分布在各子模块中，详见 `lib.rs` 架构文档。

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

use image_merge::catalog::{self, NaturalOrder};
use image_merge::config::RawOptions;
use image_merge::error::AppError;
use image_merge::image_io::FileImageSource;
use image_merge::pipeline::{GridPipeline, StripPipeline};

/// 把一个文件夹里的图片拼接成长图或矩阵图。
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 纵向拼接为若干张长图，输出 1.png、2.png ...
    Strip(StripArgs),
    /// 拼接为一张 N 行 M 列的矩阵图，首行放余数并居中。
    Grid(GridArgs),
    /// 按自然排序把图片重命名为 01、02 ... 的连续序号。
    Renumber(RenumberArgs),
}

#[derive(Args, Debug)]
struct StripArgs {
    /// 图片所在文件夹。
    dir: PathBuf,

    /// 长图宽度，默认 800。
    #[arg(long, short = 'w', allow_negative_numbers = true)]
    width: Option<i64>,

    /// 图片间距，默认 10。
    #[arg(long, short, allow_negative_numbers = true)]
    gap: Option<i64>,

    /// 输出多少张长图，默认 9。
    #[arg(long, short = 'n', allow_negative_numbers = true)]
    pages: Option<i64>,

    /// JPEG 压缩质量（1-100），默认 80。
    #[arg(long, short, allow_negative_numbers = true)]
    quality: Option<i64>,

    /// 输出格式：png / jpg / bmp / webp，默认 png。
    #[arg(long, short)]
    format: Option<String>,

    /// 输出文件夹，默认 `<DIR>/result_pic`。
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// JSON 配置文件，命令行参数优先。
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct GridArgs {
    /// 图片所在文件夹。
    dir: PathBuf,

    /// 行数，不指定时自动计算。
    #[arg(long, allow_negative_numbers = true)]
    rows: Option<i64>,

    /// 列数，不指定时自动计算。
    #[arg(long, allow_negative_numbers = true)]
    cols: Option<i64>,

    /// 格子宽度，不指定时按第一张图推算。
    #[arg(long, allow_negative_numbers = true)]
    cell_width: Option<i64>,

    /// 格子高度，不指定时按第一张图推算。
    #[arg(long, allow_negative_numbers = true)]
    cell_height: Option<i64>,

    /// 图片间距，默认 10。
    #[arg(long, short, allow_negative_numbers = true)]
    gap: Option<i64>,

    /// JPEG 压缩质量（1-100），默认 80。
    #[arg(long, short, allow_negative_numbers = true)]
    quality: Option<i64>,

    /// 输出文件，默认 `<DIR>/result_pic/merged.png`。
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// JSON 配置文件，命令行参数优先。
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct RenumberArgs {
    /// 图片所在文件夹。
    dir: PathBuf,

    /// 只打印改名计划，不修改文件。
    #[arg(long)]
    dry_run: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("❌ {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<(), AppError> {
    match command {
        Command::Strip(args) => run_strip(args),
        Command::Grid(args) => run_grid(args),
        Command::Renumber(args) => run_renumber(args),
    }
}

fn load_raw(config: Option<&Path>, overrides: RawOptions) -> Result<RawOptions, AppError> {
    let base = match config {
        Some(path) => RawOptions::from_file(path)?,
        None => RawOptions::default(),
    };
    Ok(base.merge(overrides))
}

fn scan(dir: &Path) -> Result<FileImageSource, AppError> {
    let files = catalog::scan_images(dir, &NaturalOrder)?;
    if files.is_empty() {
        return Err(AppError::EmptyInput(dir.display().to_string()));
    }
    Ok(FileImageSource::new(files))
}

fn run_strip(args: StripArgs) -> Result<(), AppError> {
    let overrides = RawOptions {
        target_width: args.width,
        gap: args.gap,
        output_count: args.pages,
        quality: args.quality,
        output_format: args.format,
        output_dir: args.output,
        ..RawOptions::default()
    };
    let (options, _) = load_raw(args.config.as_deref(), overrides)?.into_strip_options(&args.dir)?;
    let source = scan(&args.dir)?;

    let summary = StripPipeline::new(options).run(&source)?;
    println!(
        "已将 {} 张图片拼接为 {} 张长图（每页 {:?} 张）",
        summary.total_images,
        summary.pages.len(),
        summary.page_lengths
    );
    for page in &summary.pages {
        println!("  {}", page.display());
    }
    Ok(())
}

fn run_grid(args: GridArgs) -> Result<(), AppError> {
    let overrides = RawOptions {
        rows: args.rows,
        cols: args.cols,
        cell_width: args.cell_width,
        cell_height: args.cell_height,
        gap: args.gap,
        quality: args.quality,
        output_path: args.output,
        ..RawOptions::default()
    };
    let (options, _) = load_raw(args.config.as_deref(), overrides)?.into_grid_options(&args.dir)?;
    let source = scan(&args.dir)?;

    let summary = GridPipeline::new(options).run(&source)?;
    println!(
        "共 {} 张图片，已合并 {} 张为 {}×{} 的矩阵图片（跳过 {} 张），保存至 {}",
        summary.total_images,
        summary.placed,
        summary.rows,
        summary.cols,
        summary.skipped.len(),
        summary.output.display()
    );
    Ok(())
}

fn run_renumber(args: RenumberArgs) -> Result<(), AppError> {
    let plans = catalog::renumber(&args.dir, &NaturalOrder, args.dry_run)?;
    for plan in &plans {
        let from = plan.from.file_name().unwrap_or_default().to_string_lossy();
        let to = plan.to.file_name().unwrap_or_default().to_string_lossy();
        println!("  {} -> {}", from, to);
    }
    if args.dry_run {
        println!("预览完成：{} 个文件（未修改）", plans.len());
    } else {
        println!("重命名完成：{} 个文件", plans.len());
    }
    Ok(())
}
