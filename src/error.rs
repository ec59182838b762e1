//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 各组件保留自己的错误类型（`LayoutError`、`ImageError`、`ComposeError`），
//! 在流水线与命令行入口统一汇总为 `AppError`，命令行只需打印一行可读信息。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `LayoutError`、`ImageError`、`std::io::Error` 提供 `From` 转换，配合 `?` 使用。
//! - 布局参数类错误（0 尺寸、网格过小、画布过大）统一归入 `InvalidConfiguration`。

use crate::image_io::ImageError;
use crate::layout::LayoutError;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 图片数量不足以拼出请求的页数 / 行数
    #[error("图片不足：请求 {requested}，实际只能拼接 {produced}")]
    InsufficientImages { requested: usize, produced: usize },

    /// 没有回退值的配置错误（未知输出格式、配置文件无法解析等）
    #[error("配置无效: {0}")]
    InvalidConfiguration(String),

    /// 单张图片读取或解码失败
    #[error("读取第 {} 张图片失败（{path}）: {source}", .index + 1)]
    ImageRead {
        index: usize,
        path: String,
        #[source]
        source: ImageError,
    },

    /// 编码 / 写出阶段的图片错误
    #[error("{0}")]
    Image(#[from] ImageError),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),

    /// 输入或输出目录不可用
    #[error("存储目录不可用: {0}")]
    Storage(String),

    /// 输入目录中没有图片
    #[error("目录中没有找到图片: {0}")]
    EmptyInput(String),

    /// 调用方取消
    #[error("任务已取消，已写出 {written} 个文件")]
    Cancelled { written: usize },
}

impl From<LayoutError> for AppError {
    fn from(err: LayoutError) -> Self {
        match err {
            LayoutError::InsufficientImages { requested, produced, .. } => {
                Self::InsufficientImages { requested, produced }
            }
            other @ (LayoutError::GridTooSmall { .. }
            | LayoutError::ZeroDimension(_)
            | LayoutError::CanvasTooLarge { .. }) => Self::InvalidConfiguration(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_shortfall_maps_to_insufficient_images() {
        let err: AppError = LayoutError::InsufficientImages { requested: 9, produced: 5, available: 5 }.into();
        assert!(matches!(err, AppError::InsufficientImages { requested: 9, produced: 5 }));
    }

    #[test]
    fn layout_parameter_errors_are_configuration_errors() {
        let err: AppError = LayoutError::GridTooSmall { number: 10, rows: 2, cols: 4 }.into();
        assert!(matches!(err, AppError::InvalidConfiguration(_)));
        let err: AppError = LayoutError::ZeroDimension("gap").into();
        assert!(matches!(err, AppError::InvalidConfiguration(_)));
    }

    #[test]
    fn image_read_message_is_one_based() {
        let err = AppError::ImageRead {
            index: 2,
            path: "a/3.png".to_string(),
            source: ImageError::Decode("bad".to_string()),
        };
        let message = err.to_string();
        assert!(message.contains("第 3 张"));
        assert!(message.contains("a/3.png"));
    }
}
