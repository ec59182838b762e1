//! # 图片读写模块（image_io）
//!
//! ## 设计思路
//!
//! 把“解码 → 缩放 → 编码”三种能力抽象成 trait，布局与合成只面向 trait 编程：
//!
//! - `source`：`ImageSource`，有序图片序列的尺寸探测与解码（含签名、体积、像素校验）
//! - `resample`：`Resampler`，高质量缩放（`fast_image_resize`，失败回退 `image`）
//! - `encode`：`CanvasEncoder`，按格式与质量写出画布
//! - `error`：统一的 `ImageError`
//!
//! ## 调用链
//!
//! ```text
//! pipeline
//!    ├─ ImageSource::dimensions / load   （读图）
//!    ├─ compose → Resampler::resize      （合成）
//!    └─ CanvasEncoder::encode            （落盘）
//! ```

mod encode;
mod error;
mod resample;
mod source;

pub use encode::{CanvasEncoder, FileEncoder, OutputFormat};
pub use error::ImageError;
pub use resample::{FastResampler, ImageOpsResampler, ResizeFilter, Resampler};
pub use source::{FileImageSource, ImageSource, SourceLimits};
