//! # 图片来源与加载校验
//!
//! ## 设计思路
//!
//! 布局算法只依赖 `ImageSource` trait：知道有多少张图、每张多大、如何解码。
//! 换一套图像后端（或在测试里用内存图片）时不需要改动分页 / 分格逻辑。
//!
//! ## 实现思路
//!
//! `FileImageSource` 按“尽可能早失败”的顺序处理单个文件：
//! 1. 存在性 + metadata 体积限制
//! 2. 读取字节后用 `infer` 校验文件签名
//! 3. 读取 header 尺寸，按像素上限快速拒绝
//! 4. 完整解码并统一转换为 RGB8

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{DynamicImage, GenericImageView, ImageReader};

use super::ImageError;
use crate::layout::Size;

/// 有序图片序列。
pub trait ImageSource {
    /// 图片数量。
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 用于日志与错误提示的标识（通常是文件路径）。
    fn identity(&self, index: usize) -> String;

    /// 只读取尺寸，不做完整解码。
    fn dimensions(&self, index: usize) -> Result<Size, ImageError>;

    /// 完整解码第 `index` 张图片。
    fn load(&self, index: usize) -> Result<DynamicImage, ImageError>;
}

/// 单张图片的读取限制。
#[derive(Debug, Clone, Copy)]
pub struct SourceLimits {
    /// 单个文件最大体积（字节）。
    pub max_file_size: u64,
    /// 解码后的像素上限（`width * height`）。
    pub max_decoded_pixels: u64,
}

impl Default for SourceLimits {
    fn default() -> Self {
        Self {
            max_file_size: 100 * 1024 * 1024,
            max_decoded_pixels: 100_000_000,
        }
    }
}

/// 基于本地文件的图片来源。
#[derive(Debug, Clone)]
pub struct FileImageSource {
    paths: Vec<PathBuf>,
    limits: SourceLimits,
}

impl FileImageSource {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self::with_limits(paths, SourceLimits::default())
    }

    pub fn with_limits(paths: Vec<PathBuf>, limits: SourceLimits) -> Self {
        Self { paths, limits }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    fn path(&self, index: usize) -> Result<&Path, ImageError> {
        self.paths
            .get(index)
            .map(PathBuf::as_path)
            .ok_or_else(|| ImageError::FileSystem(format!("图片下标越界：{}", index)))
    }

    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>, ImageError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            ImageError::FileSystem(format!("无法读取文件信息 {}：{}", path.display(), e))
        })?;

        if metadata.len() > self.limits.max_file_size {
            return Err(ImageError::ResourceLimit(format!(
                "文件过大 {}：{:.2} MB（限制：{:.2} MB）",
                path.display(),
                metadata.len() as f64 / 1024.0 / 1024.0,
                self.limits.max_file_size as f64 / 1024.0 / 1024.0
            )));
        }

        std::fs::read(path)
            .map_err(|e| ImageError::FileSystem(format!("无法读取图片文件 {}：{}", path.display(), e)))
    }

    fn validate_pixel_limits(&self, path: &Path, width: u32, height: u32) -> Result<(), ImageError> {
        let pixels = u64::from(width) * u64::from(height);
        if pixels == 0 {
            return Err(ImageError::InvalidFormat(format!("图片尺寸为 0：{}", path.display())));
        }
        if pixels > self.limits.max_decoded_pixels {
            return Err(ImageError::ResourceLimit(format!(
                "图片像素过大 {}：{} 像素（限制：{} 像素）",
                path.display(),
                pixels,
                self.limits.max_decoded_pixels
            )));
        }
        Ok(())
    }
}

impl ImageSource for FileImageSource {
    fn len(&self) -> usize {
        self.paths.len()
    }

    fn identity(&self, index: usize) -> String {
        self.paths
            .get(index)
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| format!("#{}", index))
    }

    fn dimensions(&self, index: usize) -> Result<Size, ImageError> {
        let path = self.path(index)?;
        let (width, height) = ImageReader::open(path)
            .map_err(|e| ImageError::FileSystem(format!("无法打开图片 {}：{}", path.display(), e)))?
            .with_guessed_format()
            .map_err(|e| ImageError::InvalidFormat(format!("无法识别图片格式 {}：{}", path.display(), e)))?
            .into_dimensions()
            .map_err(|e| ImageError::InvalidFormat(format!("无法读取图片尺寸 {}：{}", path.display(), e)))?;
        self.validate_pixel_limits(path, width, height)?;
        Ok(Size::new(width, height))
    }

    fn load(&self, index: usize) -> Result<DynamicImage, ImageError> {
        let path = self.path(index)?;
        log::debug!("📁 读取图片 #{} - 路径: {}", index, path.display());

        let bytes = self.read_bytes(path)?;
        validate_image_signature(&bytes)
            .map_err(|e| ImageError::InvalidFormat(format!("{}：{}", path.display(), e)))?;

        let (header_width, header_height) = inspect_dimensions_from_memory(&bytes)
            .map_err(|e| ImageError::InvalidFormat(format!("{}：{}", path.display(), e)))?;
        self.validate_pixel_limits(path, header_width, header_height)?;

        let decoded = image::load_from_memory(&bytes)
            .map_err(|e| ImageError::Decode(format!("图片解码失败 {}：{}", path.display(), e)))?;
        let (width, height) = decoded.dimensions();
        self.validate_pixel_limits(path, width, height)?;

        Ok(DynamicImage::ImageRgb8(decoded.to_rgb8()))
    }
}

/// 校验字节签名是否为图片类型。
pub(crate) fn validate_image_signature(bytes: &[u8]) -> Result<(), ImageError> {
    if bytes.is_empty() {
        return Err(ImageError::InvalidFormat("图片内容为空".to_string()));
    }

    let kind = infer::get(bytes)
        .ok_or_else(|| ImageError::InvalidFormat("无法识别图片类型".to_string()))?;

    if kind.matcher_type() != infer::MatcherType::Image {
        return Err(ImageError::InvalidFormat(format!(
            "文件签名不是图片类型：{}",
            kind.mime_type()
        )));
    }

    Ok(())
}

/// 仅通过内存中的图片头信息读取宽高。
fn inspect_dimensions_from_memory(bytes: &[u8]) -> Result<(u32, u32), ImageError> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ImageError::InvalidFormat(format!("无法识别图片格式：{}", e)))?
        .into_dimensions()
        .map_err(|e| ImageError::InvalidFormat(format!("无法读取图片尺寸：{}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, ImageFormat, Rgb};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_temp_dir(tag: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock error")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("image-merge-source-{tag}-{nanos}"));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    fn write_png(path: &Path, width: u32, height: u32) {
        let img = ImageBuffer::from_fn(width, height, |x, y| Rgb([(x % 255) as u8, (y % 255) as u8, 7]));
        img.save_with_format(path, ImageFormat::Png).expect("write png");
    }

    #[test]
    fn loads_dimensions_and_pixels() {
        let dir = unique_temp_dir("load");
        let path = dir.join("1.png");
        write_png(&path, 12, 8);

        let source = FileImageSource::new(vec![path.clone()]);
        assert_eq!(source.len(), 1);
        assert_eq!(source.dimensions(0).expect("dimensions"), Size::new(12, 8));

        let image = source.load(0).expect("load");
        assert_eq!(image.dimensions(), (12, 8));
        assert!(matches!(image, DynamicImage::ImageRgb8(_)));
        assert_eq!(source.identity(0), path.display().to_string());

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn rejects_non_image_payload() {
        let dir = unique_temp_dir("non-image");
        let path = dir.join("broken.png");
        std::fs::write(&path, b"<html>not an image</html>").expect("write file");

        let source = FileImageSource::new(vec![path]);
        assert!(matches!(source.load(0), Err(ImageError::InvalidFormat(_))));

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn rejects_missing_file_and_bad_index() {
        let source = FileImageSource::new(vec![PathBuf::from("/definitely/not/here.png")]);
        assert!(matches!(source.load(0), Err(ImageError::FileSystem(_))));
        assert!(matches!(source.load(3), Err(ImageError::FileSystem(_))));
        assert_eq!(source.identity(3), "#3");
    }

    #[test]
    fn enforces_pixel_limit() {
        let dir = unique_temp_dir("limit");
        let path = dir.join("big.png");
        write_png(&path, 100, 100);

        let limits = SourceLimits { max_file_size: 1024 * 1024, max_decoded_pixels: 5_000 };
        let source = FileImageSource::with_limits(vec![path], limits);
        assert!(matches!(source.load(0), Err(ImageError::ResourceLimit(_))));
        assert!(matches!(source.dimensions(0), Err(ImageError::ResourceLimit(_))));

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn signature_check_accepts_png_header() {
        let png_signature = [137_u8, 80, 78, 71, 13, 10, 26, 10, 0, 0, 0, 13];
        assert!(validate_image_signature(&png_signature).is_ok());
        assert!(validate_image_signature(&[]).is_err());
    }
}
