//! # 布局计算模块（layout）
//!
//! ## 设计思路
//!
//! 拼图的核心是纯几何计算：分页/分格、每张图的目标尺寸、画布尺寸与粘贴坐标。
//! 这里不触碰任何像素，输入只有尺寸，输出只有 `Placement`，便于穷举测试。
//!
//! - `strip`：长图模式，按页切分并纵向堆叠
//! - `grid`：矩阵模式，N 行 M 列，首行放余数并居中
//! - `resize`：尺寸约束与取整策略
//!
//! ## 实现思路
//!
//! 像素运算一律先提升到 `u64`，最终再收敛回 `u32`，溢出时返回
//! `LayoutError::CanvasTooLarge` 而不是截断。

pub mod grid;
pub mod resize;
pub mod strip;

/// 像素尺寸（宽、高）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// 任一维度为 0 的尺寸无法参与布局。
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl From<(u32, u32)> for Size {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

/// 单张图片在画布上的落点。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// 输入序列中的下标。
    pub image_index: usize,
    /// 左上角 X 坐标。
    pub x: u32,
    /// 左上角 Y 坐标。
    pub y: u32,
    /// 缩放后的目标尺寸。
    pub target: Size,
}

/// 布局阶段错误。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    /// 图片不足以填满请求的页数 / 行数。
    #[error("图片不足：请求 {requested}，仅能拼接 {produced}（图片总数 {available}）")]
    InsufficientImages {
        requested: usize,
        produced: usize,
        available: usize,
    },

    /// 网格容量小于图片数量。
    #[error("网格 {rows}×{cols} 放不下 {number} 张图片")]
    GridTooSmall {
        number: usize,
        rows: usize,
        cols: usize,
    },

    /// 参数中出现 0 宽 / 0 高 / 0 页等无效尺寸。
    #[error("无效参数：{0} 必须为正数")]
    ZeroDimension(&'static str),

    /// 计算出的画布超过 `u32` 像素范围。
    #[error("画布过大：{width}x{height}")]
    CanvasTooLarge { width: u64, height: u64 },
}

/// 将 `u64` 画布尺寸收敛为 `Size`。
pub(crate) fn canvas_size(width: u64, height: u64) -> Result<Size, LayoutError> {
    if width == 0 || height == 0 {
        return Err(LayoutError::ZeroDimension("canvas"));
    }
    match (u32::try_from(width), u32::try_from(height)) {
        (Ok(w), Ok(h)) => Ok(Size::new(w, h)),
        _ => Err(LayoutError::CanvasTooLarge { width, height }),
    }
}
