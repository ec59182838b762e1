//! # 缩放（重采样）模块
//!
//! ## 设计思路
//!
//! 合成阶段只依赖 `Resampler` trait，高质量滤镜的具体实现可替换。
//! 默认实现 `FastResampler` 基于 `fast_image_resize` 的卷积缩放，失败时回退到
//! `image::DynamicImage::resize_exact`，保证单张图不会因为加速路径失败而丢失。
//!
//! ## 实现思路
//!
//! - 统一在 RGB8 上缩放，画布本身也是 RGB8，避免多余的通道转换。
//! - 目标尺寸与原图一致时直接复制，不走卷积。
//! - 不提供最近邻滤镜：拼图输出面向阅读，锯齿不可接受。

use fast_image_resize as fr;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, RgbImage};
use serde::{Deserialize, Serialize};

use super::ImageError;
use crate::layout::Size;

/// 缩放滤镜。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeFilter {
    Triangle,
    CatmullRom,
    Gaussian,
    #[default]
    Lanczos3,
}

impl ResizeFilter {
    fn to_image_filter(self) -> FilterType {
        match self {
            Self::Triangle => FilterType::Triangle,
            Self::CatmullRom => FilterType::CatmullRom,
            Self::Gaussian => FilterType::Gaussian,
            Self::Lanczos3 => FilterType::Lanczos3,
        }
    }

    fn to_fast_filter(self) -> fr::FilterType {
        match self {
            Self::Triangle => fr::FilterType::Bilinear,
            Self::CatmullRom => fr::FilterType::CatmullRom,
            Self::Gaussian => fr::FilterType::Mitchell,
            Self::Lanczos3 => fr::FilterType::Lanczos3,
        }
    }
}

/// 把图片缩放到指定尺寸。
pub trait Resampler {
    fn resize(&self, image: &DynamicImage, target: Size) -> Result<DynamicImage, ImageError>;
}

/// `fast_image_resize` 卷积缩放，失败回退 `image` 自带实现。
#[derive(Debug, Clone, Copy, Default)]
pub struct FastResampler {
    pub filter: ResizeFilter,
}

impl FastResampler {
    pub fn new(filter: ResizeFilter) -> Self {
        Self { filter }
    }

    fn resize_with_fast_image_resize(
        &self,
        image: &DynamicImage,
        target: Size,
    ) -> Result<DynamicImage, ImageError> {
        let src = image.to_rgb8();
        let (src_width, src_height) = src.dimensions();

        let src_image = fr::images::Image::from_vec_u8(
            src_width,
            src_height,
            src.into_raw(),
            fr::PixelType::U8x3,
        )
        .map_err(|e| ImageError::Resize(format!("构建源图像缓冲失败：{}", e)))?;

        let mut dst_image = fr::images::Image::new(target.width, target.height, fr::PixelType::U8x3);

        let mut resizer = fr::Resizer::new();
        let options = fr::ResizeOptions::new()
            .resize_alg(fr::ResizeAlg::Convolution(self.filter.to_fast_filter()));

        resizer
            .resize(&src_image, &mut dst_image, Some(&options))
            .map_err(|e| ImageError::Resize(format!("fast_image_resize 执行失败：{}", e)))?;

        let rgb = RgbImage::from_raw(target.width, target.height, dst_image.into_vec())
            .ok_or_else(|| ImageError::Resize("fast_image_resize 输出缓冲长度异常".to_string()))?;

        Ok(DynamicImage::ImageRgb8(rgb))
    }
}

impl Resampler for FastResampler {
    fn resize(&self, image: &DynamicImage, target: Size) -> Result<DynamicImage, ImageError> {
        if target.is_empty() {
            return Err(ImageError::Resize(format!(
                "目标尺寸无效：{}x{}",
                target.width, target.height
            )));
        }
        if image.dimensions() == (target.width, target.height) {
            return Ok(image.clone());
        }

        match self.resize_with_fast_image_resize(image, target) {
            Ok(resized) => Ok(resized),
            Err(err) => {
                log::warn!("⚠️ fast_image_resize 缩放失败，回退 image::resize_exact：{}", err);
                Ok(image.resize_exact(target.width, target.height, self.filter.to_image_filter()))
            }
        }
    }
}

/// 纯 `image::imageops` 实现，作为可替换后端。
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageOpsResampler {
    pub filter: ResizeFilter,
}

impl Resampler for ImageOpsResampler {
    fn resize(&self, image: &DynamicImage, target: Size) -> Result<DynamicImage, ImageError> {
        if target.is_empty() {
            return Err(ImageError::Resize(format!(
                "目标尺寸无效：{}x{}",
                target.width, target.height
            )));
        }
        Ok(image.resize_exact(target.width, target.height, self.filter.to_image_filter()))
    }
}
