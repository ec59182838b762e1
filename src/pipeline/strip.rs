//! 长图流水线：全部解码 → 分页 → 逐页合成 → 逐页写出 `<页码>.<扩展名>`。
//!
//! 长图模式任意一张图失败都会中止（`FailurePolicy::Abort`），
//! 图片在开始前一次性解码，所以损坏的输入不会留下半套输出。

use std::borrow::Cow;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use image::DynamicImage;

use super::ensure_dir;
use crate::compose::{self, ComposeError, FailurePolicy};
use crate::config::StripOptions;
use crate::error::AppError;
use crate::image_io::{CanvasEncoder, FastResampler, FileEncoder, ImageError, ImageSource, Resampler};
use crate::layout::Size;
use crate::layout::strip::{self, images_per_page};

/// 长图模式执行结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StripSummary {
    pub total_images: usize,
    pub per_page: usize,
    /// 每页实际张数。
    pub page_lengths: Vec<usize>,
    /// 已写出的文件（按页码顺序）。
    pub pages: Vec<PathBuf>,
}

/// 长图拼接流水线。
pub struct StripPipeline<'a> {
    options: StripOptions,
    resampler: Box<dyn Resampler + 'a>,
    encoder: Box<dyn CanvasEncoder + 'a>,
}

impl<'a> StripPipeline<'a> {
    pub fn new(options: StripOptions) -> Self {
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

    pub fn options(&self) -> &StripOptions {
        &self.options
    }

    pub fn run(&self, source: &dyn ImageSource) -> Result<StripSummary, AppError> {
        self.run_with_cancel(source, || false)
    }

    /// 执行长图拼接，每写出一页前检查一次 `is_cancelled`。
    pub fn run_with_cancel<C>(&self, source: &dyn ImageSource, is_cancelled: C) -> Result<StripSummary, AppError>
    where
        C: Fn() -> bool,
    {
        let options = &self.options;
        let total = source.len();
        if total == 0 {
            return Err(AppError::EmptyInput("输入序列为空".to_string()));
        }
        // 张数不足时在解码前失败，不产生任何输出
        if options.output_count > 0 && images_per_page(total, options.output_count) < 1 {
            return Err(AppError::InsufficientImages {
                requested: options.output_count,
                produced: 0,
            });
        }

        let total_start = Instant::now();

        let decode_start = Instant::now();
        let images = decode_all(source)?;
        let decode_elapsed = decode_start.elapsed();

        let layout_start = Instant::now();
        let sizes: Vec<Size> = images.iter().map(|img| Size::new(img.width(), img.height())).collect();
        let plan = strip::partition(&sizes, options.output_count, options.target_width, options.gap)?;
        let layout_elapsed = layout_start.elapsed();
        log::info!(
            "📐 分页完成 - {} 张图片，每页 {} 张，可拼 {}/{} 页",
            total,
            plan.per_page,
            plan.produced(),
            plan.requested
        );

        ensure_dir(&options.output_dir)?;

        let mut compose_elapsed = Duration::ZERO;
        let mut encode_elapsed = Duration::ZERO;
        let mut written = Vec::with_capacity(plan.pages.len());

        for page in &plan.pages {
            if is_cancelled() {
                log::warn!("⛔ 任务已取消，已写出 {} 页", written.len());
                return Err(AppError::Cancelled { written: written.len() });
            }

            let compose_start = Instant::now();
            let composite = compose::composite(
                page.canvas,
                options.background,
                &page.placements,
                |index| {
                    images
                        .get(index)
                        .map(Cow::Borrowed)
                        .ok_or_else(|| ImageError::FileSystem(format!("图片下标越界：{}", index)))
                },
                self.resampler.as_ref(),
                FailurePolicy::Abort,
            )
            .map_err(|err| image_read(source, err))?;
            compose_elapsed += compose_start.elapsed();

            let encode_start = Instant::now();
            let path = options
                .output_dir
                .join(format!("{}.{}", page.number, options.output_format.extension()));
            self.encoder.encode(&composite.canvas, &path, options.output_format)?;
            encode_elapsed += encode_start.elapsed();

            log::info!(
                "🖼️ 第 {} 页完成 - {} 张图片，{}x{} -> {}",
                page.number,
                page.len(),
                page.canvas.width,
                page.canvas.height,
                path.display()
            );
            written.push(path);
        }

        log::info!(
            "✅ 长图拼接完成 - decode={}ms layout={}ms compose={}ms encode={}ms total={}ms",
            decode_elapsed.as_millis(),
            layout_elapsed.as_millis(),
            compose_elapsed.as_millis(),
            encode_elapsed.as_millis(),
            total_start.elapsed().as_millis()
        );

        plan.ensure_complete()?;

        Ok(StripSummary {
            total_images: total,
            per_page: plan.per_page,
            page_lengths: plan.page_lengths(),
            pages: written,
        })
    }
}

fn decode_all(source: &dyn ImageSource) -> Result<Vec<DynamicImage>, AppError> {
    (0..source.len())
        .map(|index| {
            let image = source.load(index).map_err(|err| AppError::ImageRead {
                index,
                path: source.identity(index),
                source: err,
            })?;
            log::debug!(
                "📥 已解码 #{} {}x{} - {}",
                index,
                image.width(),
                image.height(),
                source.identity(index)
            );
            Ok(image)
        })
        .collect()
}

fn image_read(source: &dyn ImageSource, err: ComposeError) -> AppError {
    AppError::ImageRead {
        index: err.index,
        path: source.identity(err.index),
        source: err.error,
    }
}
