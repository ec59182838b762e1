//! 矩阵流水线：读取首图尺寸 → 修正行列 → 分格 → 逐张解码合成 → 写出单个文件。
//!
//! 矩阵模式对单张图片失败是宽容的（`FailurePolicy::Skip`）：损坏的图片留白，
//! 其余照常合成。唯一例外是第一张图，格子尺寸依赖它，读不到尺寸直接失败。

use std::borrow::Cow;
use std::path::PathBuf;
use std::time::Instant;

use super::ensure_dir;
use crate::compose::{self, FailurePolicy};
use crate::config::{GridOptions, reconcile_grid};
use crate::error::AppError;
use crate::image_io::{CanvasEncoder, FastResampler, FileEncoder, ImageSource, Resampler};
use crate::layout::Size;
use crate::layout::grid::{self, Grid};

/// 矩阵模式执行结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridSummary {
    pub total_images: usize,
    /// 成功粘贴的图片数。
    pub placed: usize,
    /// 被跳过的输入下标。
    pub skipped: Vec<usize>,
    pub rows: usize,
    pub cols: usize,
    pub cell: Size,
    pub canvas: Size,
    pub output: PathBuf,
    /// 行列修正等非致命告警。
    pub warnings: Vec<String>,
}

/// 矩阵拼接流水线。
pub struct GridPipeline<'a> {
    options: GridOptions,
    resampler: Box<dyn Resampler + 'a>,
    encoder: Box<dyn CanvasEncoder + 'a>,
}

impl<'a> GridPipeline<'a> {
    pub fn new(options: GridOptions) -> Self {
        let resampler = FastResampler::new(options.filter);
        let encoder = FileEncoder { quality: options.quality };
        Self {
            options,
            resampler: Box::new(resampler),
            encoder: Box::new(encoder),
        }
    }

    pub fn with_resampler(mut self, resampler: impl Resampler + 'a) -> Self {
        self.resampler = Box::new(resampler);
        self
    }

    pub fn with_encoder(mut self, encoder: impl CanvasEncoder + 'a) -> Self {
        self.encoder = Box::new(encoder);
        self
    }

    pub fn options(&self) -> &GridOptions {
        &self.options
    }

    pub fn run(&self, source: &dyn ImageSource) -> Result<GridSummary, AppError> {
        self.run_with_cancel(source, || false)
    }

    /// 执行矩阵拼接，合成与写出前各检查一次 `is_cancelled`。
    pub fn run_with_cancel<C>(&self, source: &dyn ImageSource, is_cancelled: C) -> Result<GridSummary, AppError>
    where
        C: Fn() -> bool,
    {
        let options = &self.options;
        let total = source.len();
        if total == 0 {
            return Err(AppError::EmptyInput("输入序列为空".to_string()));
        }

        let total_start = Instant::now();

        let layout_start = Instant::now();
        let first = source.dimensions(0).map_err(|err| AppError::ImageRead {
            index: 0,
            path: source.identity(0),
            source: err,
        })?;
        let (rows, cols, warnings) = reconcile_grid(total, options.rows, options.cols);
        let grid = Grid::new(total, rows, cols)?;
        let cell = grid::cell_size(first, options.cell_width, options.cell_height);
        let plan = grid::plan(grid, cell, options.gap)?;
        let layout_elapsed = layout_start.elapsed();
        log::info!(
            "📐 分格完成 - {} 张图片，{}×{}，首行 {} 张，格子 {}x{}，画布 {}x{}",
            total,
            rows,
            cols,
            grid.first_row_count,
            cell.width,
            cell.height,
            plan.canvas.width,
            plan.canvas.height
        );

        if is_cancelled() {
            return Err(AppError::Cancelled { written: 0 });
        }

        let compose_start = Instant::now();
        let composite = compose::composite(
            plan.canvas,
            options.background,
            &plan.placements,
            |index| {
                log::debug!("📥 解码 #{} - {}", index, source.identity(index));
                source.load(index).map(Cow::Owned)
            },
            self.resampler.as_ref(),
            FailurePolicy::Skip,
        )
        .map_err(|err| AppError::ImageRead {
            index: err.index,
            path: source.identity(err.index),
            source: err.error,
        })?;
        let compose_elapsed = compose_start.elapsed();

        for index in &composite.skipped {
            log::warn!("⚠️ 已留白: #{} {}", index, source.identity(*index));
        }
        if composite.placed == 0 {
            log::warn!("⚠️ 没有任何图片合成成功，输出为空白画布");
        }

        if is_cancelled() {
            return Err(AppError::Cancelled { written: 0 });
        }

        let encode_start = Instant::now();
        if let Some(parent) = options.output_path.parent() {
            ensure_dir(parent)?;
        }
        self.encoder
            .encode(&composite.canvas, &options.output_path, options.output_format())?;
        let encode_elapsed = encode_start.elapsed();

        log::info!(
            "✅ 矩阵拼接完成 - layout={}ms compose={}ms encode={}ms total={}ms -> {}",
            layout_elapsed.as_millis(),
            compose_elapsed.as_millis(),
            encode_elapsed.as_millis(),
            total_start.elapsed().as_millis(),
            options.output_path.display()
        );

        Ok(GridSummary {
            total_images: total,
            placed: composite.placed,
            skipped: composite.skipped,
            rows,
            cols,
            cell,
            canvas: plan.canvas,
            output: options.output_path.clone(),
            warnings,
        })
    }
}
