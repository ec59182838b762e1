//! # 拼图流水线模块
//!
//! ## 设计思路
//!
//! 流水线只负责编排，不包含几何计算：
//! 1. 从 `ImageSource` 读取尺寸 / 解码
//! 2. 调用 `layout` 计算分页或分格
//! 3. 调用 `compose` 合成画布
//! 4. 通过 `CanvasEncoder` 落盘
//!
//! ## 实现思路
//!
//! - 参数通过构造函数显式传入，没有全局状态。
//! - 缩放器与编码器可注入（`with_resampler` / `with_encoder`），测试时可替换为内存实现。
//! - 记录 `decode/layout/compose/encode/total` 阶段耗时，便于性能诊断。
//! - `run_with_cancel` 在每次写出前检查取消钩子，已写出的文件保留在磁盘上。

mod grid;
mod strip;

use std::fs;
use std::path::Path;

use crate::error::AppError;

pub use grid::{GridPipeline, GridSummary};
pub use strip::{StripPipeline, StripSummary};

/// 确保输出目录存在。
fn ensure_dir(dir: &Path) -> Result<(), AppError> {
    if dir.as_os_str().is_empty() || dir.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(dir)
        .map_err(|e| AppError::Storage(format!("创建输出目录失败 {}: {}", dir.display(), e)))?;
    log::info!("📂 已创建输出目录: {}", dir.display());
    Ok(())
}
