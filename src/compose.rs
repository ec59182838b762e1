//! # 画布合成模块
//!
//! ## 设计思路
//!
//! 输入画布尺寸、背景色与一组 `Placement`，输出一张 RGB 画布。
//! 每个落点依次“取图 → 缩放 → 粘贴”，后面的落点可以覆盖前面的像素（重叠属于调用方错误，这里不校验）。
//!
//! 单张图失败时的处理由 `FailurePolicy` 决定：
//! - `Skip`：记录日志并跳过该落点，继续合成（矩阵模式）
//! - `Abort`：立即返回错误（长图模式，整页一次性构建）

use std::borrow::Cow;

use image::imageops;
use image::{DynamicImage, Rgb, RgbImage};

use crate::image_io::{ImageError, Resampler};
use crate::layout::{Placement, Size};

/// 默认背景色：不透明白色。
pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// 单张图失败时的处理策略。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    Skip,
    Abort,
}

/// 合成结果。
#[derive(Debug)]
pub struct Composite {
    pub canvas: RgbImage,
    /// 成功粘贴的图片数。
    pub placed: usize,
    /// 被跳过的输入下标（仅 `Skip` 策略下可能非空）。
    pub skipped: Vec<usize>,
}

/// `Abort` 策略下的失败信息。
#[derive(Debug, thiserror::Error)]
#[error("第 {index} 张图片合成失败：{error}")]
pub struct ComposeError {
    pub index: usize,
    #[source]
    pub error: ImageError,
}

/// 合成一张画布。
///
/// `load` 按输入下标取图，可以返回借用（已预先解码）或拥有（按需解码）的图片。
pub fn composite<'a, L>(
    canvas_size: Size,
    background: Rgb<u8>,
    placements: &[Placement],
    mut load: L,
    resampler: &dyn Resampler,
    policy: FailurePolicy,
) -> Result<Composite, ComposeError>
where
    L: FnMut(usize) -> Result<Cow<'a, DynamicImage>, ImageError>,
{
    let mut canvas = RgbImage::from_pixel(canvas_size.width, canvas_size.height, background);
    let mut placed = 0;
    let mut skipped = Vec::new();

    for placement in placements {
        let index = placement.image_index;
        let pasted = load(index)
            .and_then(|image| resampler.resize(&image, placement.target))
            .map(|resized| {
                imageops::replace(
                    &mut canvas,
                    &resized.into_rgb8(),
                    i64::from(placement.x),
                    i64::from(placement.y),
                );
            });

        match (pasted, policy) {
            (Ok(()), _) => placed += 1,
            (Err(error), FailurePolicy::Skip) => {
                log::warn!("⚠️ 处理第 {} 张图片时出错，已跳过：{}", index, error);
                skipped.push(index);
            }
            (Err(error), FailurePolicy::Abort) => return Err(ComposeError { index, error }),
        }
    }

    Ok(Composite {
        canvas,
        placed,
        skipped,
    })
}
