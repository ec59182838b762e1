//! # 画布编码与落盘
//!
//! ## 设计思路
//!
//! 输出格式与压缩质量集中在这里处理：JPEG 走带质量参数的编码器，
//! 其余格式交给 `image` 的 `save_with_format`。同名文件直接覆盖。

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, RgbImage};
use serde::{Deserialize, Serialize};

use super::ImageError;

/// 输出格式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    #[serde(alias = "jpg")]
    Jpeg,
    Bmp,
    Webp,
}

impl OutputFormat {
    /// 文件扩展名（不含点）。
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Bmp => "bmp",
            Self::Webp => "webp",
        }
    }

    /// 根据路径扩展名推断格式，无法识别时返回 `None`。
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }

    fn image_format(self) -> ImageFormat {
        match self {
            Self::Png => ImageFormat::Png,
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Bmp => ImageFormat::Bmp,
            Self::Webp => ImageFormat::WebP,
        }
    }

    /// 是否为有损格式（质量参数仅对有损格式生效）。
    pub fn is_lossy(self) -> bool {
        matches!(self, Self::Jpeg)
    }
}

impl FromStr for OutputFormat {
    type Err = ImageError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().trim_start_matches('.').to_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" | "jfif" => Ok(Self::Jpeg),
            "bmp" => Ok(Self::Bmp),
            "webp" => Ok(Self::Webp),
            other => Err(ImageError::InvalidFormat(format!(
                "未知输出格式：{}（可选：png / jpg / bmp / webp）",
                other
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// 把画布写入目标路径。
pub trait CanvasEncoder {
    fn encode(&self, canvas: &RgbImage, path: &Path, format: OutputFormat) -> Result<(), ImageError>;
}

impl<T: CanvasEncoder + ?Sized> CanvasEncoder for &T {
    fn encode(&self, canvas: &RgbImage, path: &Path, format: OutputFormat) -> Result<(), ImageError> {
        (**self).encode(canvas, path, format)
    }
}

/// 写本地文件的编码器。
#[derive(Debug, Clone, Copy)]
pub struct FileEncoder {
    /// 有损压缩质量（1-100）。
    pub quality: u8,
}

impl Default for FileEncoder {
    fn default() -> Self {
        Self { quality: 80 }
    }
}

impl CanvasEncoder for FileEncoder {
    fn encode(&self, canvas: &RgbImage, path: &Path, format: OutputFormat) -> Result<(), ImageError> {
        if format.is_lossy() {
            let file = File::create(path).map_err(|e| {
                ImageError::FileSystem(format!("无法创建输出文件 {}：{}", path.display(), e))
            })?;
            let mut writer = BufWriter::new(file);
            let encoder = JpegEncoder::new_with_quality(&mut writer, self.quality.clamp(1, 100));
            canvas
                .write_with_encoder(encoder)
                .map_err(|e| ImageError::Encode(format!("保存图片失败 {}：{}", path.display(), e)))?;
            writer.flush().map_err(|e| {
                ImageError::FileSystem(format!("写入输出文件失败 {}：{}", path.display(), e))
            })?;
        } else {
            canvas
                .save_with_format(path, format.image_format())
                .map_err(|e| ImageError::Encode(format!("保存图片失败 {}：{}", path.display(), e)))?;
        }

        log::debug!(
            "💾 已写入 {} ({}x{}, {})",
            path.display(),
            canvas.width(),
            canvas.height(),
            format
        );
        Ok(())
    }
}
