//! # 矩阵拼图计算
//!
//! ## 设计思路
//!
//! 所有图片缩放到同一格子尺寸，按行优先排布成 `rows × cols` 的矩阵。
//! 图片数不是 `cols` 的整数倍时，余数放在**首行**，首行整体水平居中。
//!
//! ## 实现思路
//!
//! - `calculate_grid`：未指定行列时从 2 行起步，列数超过行数 3 倍就加一行
//! - `Grid::new`：校验容量与“首行不为空”
//! - `cell_size`：以第一张图的原始尺寸为基准推算统一格子尺寸
//! - `plan`：输出画布尺寸、首行偏移与每格落点

use super::resize::{self, Rounding, SizeConstraint};
use super::{LayoutError, Placement, Size, canvas_size};

/// 列数与行数的最大比例，超过则增加行数。
const MAX_COLS_PER_ROW_RATIO: usize = 3;

/// 计算行列数。
///
/// - 行列都给定：原样返回（由调用方保证容量）
/// - 仅给定行数：`cols = ceil(number / rows)`
/// - 仅给定列数：`rows = ceil(number / cols)`
/// - 都未给定：从 `min(2, number)` 行开始，`cols > 3 * rows` 时加一行，最多加到 `number` 行
///
/// # 示例
/// ```
/// use image_merge::layout::grid::calculate_grid;
///
/// assert_eq!(calculate_grid(7, None, None), (2, 4));
/// assert_eq!(calculate_grid(7, Some(3), None), (3, 3));
/// ```
pub fn calculate_grid(number: usize, rows: Option<usize>, cols: Option<usize>) -> (usize, usize) {
    match (rows, cols) {
        (Some(rows), Some(cols)) => (rows, cols),
        (Some(rows), None) => (rows, number.div_ceil(rows.max(1))),
        (None, Some(cols)) => (number.div_ceil(cols.max(1)), cols),
        (None, None) => {
            let number = number.max(1);
            let mut rows = number.min(2);
            loop {
                let cols = number.div_ceil(rows);
                if cols > MAX_COLS_PER_ROW_RATIO * rows && rows < number {
                    rows += 1;
                    continue;
                }
                return (rows, cols);
            }
        }
    }
}

/// 已校验的矩阵。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    pub number: usize,
    pub rows: usize,
    pub cols: usize,
    /// 首行图片数，`1 <= first_row_count <= cols`。
    pub first_row_count: usize,
}

impl Grid {
    /// 校验并构建矩阵。
    ///
    /// - 容量 `rows * cols < number`：`GridTooSmall`
    /// - 首行为空（`(rows - 1) * cols >= number`）：`InsufficientImages`
    pub fn new(number: usize, rows: usize, cols: usize) -> Result<Self, LayoutError> {
        if number == 0 {
            return Err(LayoutError::ZeroDimension("number"));
        }
        if rows == 0 {
            return Err(LayoutError::ZeroDimension("rows"));
        }
        if cols == 0 {
            return Err(LayoutError::ZeroDimension("cols"));
        }
        if rows.saturating_mul(cols) < number {
            return Err(LayoutError::GridTooSmall { number, rows, cols });
        }

        let below_first = (rows - 1).saturating_mul(cols);
        if below_first >= number {
            return Err(LayoutError::InsufficientImages {
                requested: rows,
                produced: number.div_ceil(cols),
                available: number,
            });
        }

        Ok(Self {
            number,
            rows,
            cols,
            first_row_count: number - below_first,
        })
    }

    /// 第 `row` 行应放置的图片数。
    pub fn row_len(&self, row: usize) -> usize {
        if row == 0 { self.first_row_count } else { self.cols }
    }
}

/// 统一格子尺寸。
///
/// 未指定宽高时直接使用第一张图的原始尺寸；只给一边时按第一张图的比例四舍五入推算。
pub fn cell_size(first: Size, width: Option<u32>, height: Option<u32>) -> Size {
    let constraint = match (width, height) {
        (None, None) => return first,
        (Some(width), None) => SizeConstraint::FixedWidth(width),
        (None, Some(height)) => SizeConstraint::FixedHeight(height),
        (Some(width), Some(height)) => SizeConstraint::FixedBoth(Size::new(width, height)),
    };
    resize::resolve(first, constraint, Rounding::Nearest)
}

/// 矩阵布局结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridPlan {
    pub grid: Grid,
    pub cell: Size,
    pub canvas: Size,
    /// 首行居中偏移。
    pub first_row_offset: u32,
    pub placements: Vec<Placement>,
}

fn span(count: usize, cell: u32, gap: u32) -> u64 {
    let count = count as u64;
    count * u64::from(cell) + count.saturating_sub(1) * u64::from(gap)
}

/// 计算画布尺寸与每格落点。
pub fn plan(grid: Grid, cell: Size, gap: u32) -> Result<GridPlan, LayoutError> {
    if cell.is_empty() {
        return Err(LayoutError::ZeroDimension("cell"));
    }

    let full_width = span(grid.cols, cell.width, gap);
    let canvas = canvas_size(full_width, span(grid.rows, cell.height, gap))?;
    let first_width = span(grid.first_row_count, cell.width, gap);
    // 首行不超过 cols，差值非负；画布已校验在 u32 内
    let first_row_offset = ((full_width - first_width) / 2) as u32;

    let step_x = cell.width.saturating_add(gap);
    let step_y = cell.height.saturating_add(gap);
    let mut placements = Vec::with_capacity(grid.number);
    let mut index = 0;

    'rows: for row in 0..grid.rows {
        let offset = if row == 0 { first_row_offset } else { 0 };
        for col in 0..grid.row_len(row) {
            if index >= grid.number {
                break 'rows;
            }
            placements.push(Placement {
                image_index: index,
                x: col as u32 * step_x + offset,
                y: row as u32 * step_y,
                target: cell,
            });
            index += 1;
        }
    }

    Ok(GridPlan {
        grid,
        cell,
        canvas,
        first_row_offset,
        placements,
    })
}
