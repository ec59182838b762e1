//! # 图片拼接工具：库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 命令行 (clap, src/main.rs)               │
//! │        strip <DIR>   ·   grid <DIR>   ·   renumber <DIR>   │
//! └───────┬──────────────────────────────────────────────────┘
//!         ↓ RawOptions (CLI > JSON 配置文件 > 默认值)
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↓            库 (Rust)                             │
//! │                                                          │
//! │  ┌─ error ────── AppError (统一错误类型)                  │
//! │  │                                                       │
//! │  ├─ config ───── 参数合并·校验·行列修正                  │
//! │  ├─ catalog ──── 目录扫描 + 自然排序 + 重命名            │
//! │  │                                                       │
//! │  ├─ pipeline ─── StripPipeline / GridPipeline            │
//! │  │   ├─ layout    分页·分格·缩放尺寸 (纯几何)            │
//! │  │   ├─ compose   画布合成 + 失败策略                    │
//! │  │   └─ image_io  解码·缩放·编码 (trait 可替换)          │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError`，命令行只打印一行错误 |
//! | [`config`] | 参数默认值、越界回退、配置文件、矩阵行列修正 |
//! | [`catalog`] | 按扩展名过滤图片、自然排序、批量重命名 |
//! | [`layout`] | 长图分页、矩阵分格、缩放尺寸策略 |
//! | [`compose`] | 在画布上按落点缩放并粘贴图片 |
//! | [`image_io`] | `ImageSource` / `Resampler` / `CanvasEncoder` 及默认实现 |
//! | [`pipeline`] | 编排 解码 → 布局 → 合成 → 写出，输出执行摘要 |

pub mod error;
pub mod catalog;
pub mod compose;
pub mod config;
pub mod image_io;
pub mod layout;
pub mod pipeline;
