//! # 长图分页计算
//!
//! ## 设计思路
//!
//! 把有序图片序列切成 `output_count` 段连续区间，每段纵向堆叠成一张长图：
//! 1. 每页张数：整除时取商，否则四舍五入（0.5 取偶数，与原工具行为一致）
//! 2. 每张图统一缩放到目标宽度，高度按比例截断
//! 3. 前 `output_count - 1` 页各取 `per_page` 张，最后一页吸收余数
//! 4. 页高 = Σ(hᵢ + gap) - gap，≤ 0 说明该页没有图片，停止后续分页
//!
//! ## 实现思路
//!
//! 分页在任何画布分配之前完成。遇到空页时不直接报错，而是保留前面可拼的页，
//! 由调用方先落盘再通过 `StripPlan::ensure_complete` 报告缺口。

use std::ops::Range;

use super::resize::{self, Rounding, SizeConstraint};
use super::{LayoutError, Placement, Size, canvas_size};

/// 计算每页张数。
///
/// 不能整除时按“四舍五入、0.5 取偶”处理，例如 10 张分 4 页得 2，6 张分 4 页得 2。
/// `output_count` 为 0 时返回 0。
pub fn images_per_page(total: usize, output_count: usize) -> usize {
    if output_count == 0 {
        return 0;
    }
    let quotient = total / output_count;
    let remainder = total % output_count;
    if remainder == 0 {
        return quotient;
    }
    let twice = remainder * 2;
    if twice > output_count || (twice == output_count && quotient % 2 == 1) {
        quotient + 1
    } else {
        quotient
    }
}

/// 将每张图缩放到统一宽度后的显示尺寸。
pub fn display_sizes(sizes: &[Size], width: u32) -> Vec<Size> {
    sizes
        .iter()
        .map(|size| resize::resolve(*size, SizeConstraint::FixedWidth(width), Rounding::Truncate))
        .collect()
}

/// 单页长图。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StripPage {
    /// 页码（从 1 开始），同时用作输出文件名。
    pub number: usize,
    /// 本页在输入序列中的区间。
    pub range: Range<usize>,
    /// 画布尺寸。
    pub canvas: Size,
    /// 本页每张图的落点（自上而下）。
    pub placements: Vec<Placement>,
}

impl StripPage {
    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

/// 分页结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StripPlan {
    /// 可以拼出的页（前缀）。
    pub pages: Vec<StripPage>,
    /// 请求的页数。
    pub requested: usize,
    /// 每页张数。
    pub per_page: usize,
    /// 输入图片总数。
    pub total_images: usize,
}

impl StripPlan {
    pub fn produced(&self) -> usize {
        self.pages.len()
    }

    pub fn is_complete(&self) -> bool {
        self.pages.len() == self.requested
    }

    /// 每页张数列表，主要用于日志与测试。
    pub fn page_lengths(&self) -> Vec<usize> {
        self.pages.iter().map(StripPage::len).collect()
    }

    /// 页数不足时返回 `InsufficientImages`。
    pub fn ensure_complete(&self) -> Result<(), LayoutError> {
        if self.is_complete() {
            return Ok(());
        }
        Err(LayoutError::InsufficientImages {
            requested: self.requested,
            produced: self.produced(),
            available: self.total_images,
        })
    }
}

/// 计算长图分页。
///
/// # 参数
/// * `sizes` - 输入图片原始尺寸（按顺序）
/// * `output_count` - 输出页数
/// * `width` - 长图宽度
/// * `gap` - 图片间距
///
/// # 返回
/// - `Ok(StripPlan)`：可拼出的页；若中途出现空页，`pages` 只包含之前的页
/// - `Err(InsufficientImages)`：每页张数不足 1，一页都拼不出
pub fn partition(
    sizes: &[Size],
    output_count: usize,
    width: u32,
    gap: u32,
) -> Result<StripPlan, LayoutError> {
    if output_count == 0 {
        return Err(LayoutError::ZeroDimension("output_count"));
    }
    if width == 0 {
        return Err(LayoutError::ZeroDimension("target_width"));
    }

    let total = sizes.len();
    let per_page = images_per_page(total, output_count);
    if per_page < 1 {
        return Err(LayoutError::InsufficientImages {
            requested: output_count,
            produced: 0,
            available: total,
        });
    }

    let display = display_sizes(sizes, width);
    let mut pages = Vec::with_capacity(output_count);

    for page in 0..output_count {
        let start = (page * per_page).min(total);
        let end = if page + 1 == output_count {
            total
        } else {
            ((page + 1) * per_page).min(total)
        };

        match stack_page(page + 1, start..end, &display, width, gap)? {
            Some(stacked) => pages.push(stacked),
            None => {
                log::warn!("⚠️ 第 {} 页没有图片，仅能拼接 {} 页", page + 1, page);
                break;
            }
        }
    }

    Ok(StripPlan {
        pages,
        requested: output_count,
        per_page,
        total_images: total,
    })
}

/// 纵向堆叠一页。页高 ≤ 0（空页）时返回 `None`。
fn stack_page(
    number: usize,
    range: Range<usize>,
    display: &[Size],
    width: u32,
    gap: u32,
) -> Result<Option<StripPage>, LayoutError> {
    let gap = i64::from(gap);
    let height: i64 = display[range.clone()]
        .iter()
        .map(|size| i64::from(size.height) + gap)
        .sum::<i64>()
        - gap;
    if height <= 0 {
        return Ok(None);
    }

    let canvas = canvas_size(u64::from(width), height.unsigned_abs())?;

    let mut top: u64 = 0;
    let mut placements = Vec::with_capacity(range.len());
    for index in range.clone() {
        let target = display[index];
        let y = u32::try_from(top).map_err(|_| LayoutError::CanvasTooLarge {
            width: u64::from(width),
            height: top,
        })?;
        placements.push(Placement {
            image_index: index,
            x: 0,
            y,
            target,
        });
        top += u64::from(target.height) + gap.unsigned_abs();
    }

    Ok(Some(StripPage {
        number,
        range,
        canvas,
        placements,
    }))
}
