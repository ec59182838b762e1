//! 缩放尺寸策略
//!
//! 给定源尺寸与约束，计算输出尺寸。只固定一边时按比例推算另一边；
//! `FixedBoth` / `FixedCellUniform` 直接使用给定尺寸，可能改变宽高比。
//!
//! 推算出的边统一用整数运算 `a * b / c`，避免浮点误差导致 599.999 被截成 599。

use super::Size;

/// 推算边的取整方式。
///
/// - `Truncate`：向零截断（长图模式）
/// - `Nearest`：四舍五入，0.5 向上（矩阵模式）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    Truncate,
    Nearest,
}

/// 尺寸约束。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeConstraint {
    /// 固定宽度，高度按比例。
    FixedWidth(u32),
    /// 固定高度，宽度按比例。
    FixedHeight(u32),
    /// 宽高都固定。
    FixedBoth(Size),
    /// 所有图片统一缩放到同一格子尺寸。
    FixedCellUniform(Size),
}

/// 计算 `value * numerator / denominator`，结果至少为 1。
///
/// `denominator` 为 0 时返回 1（源尺寸异常的兜底，正常输入不会出现）。
pub fn scale_dimension(value: u32, numerator: u32, denominator: u32, rounding: Rounding) -> u32 {
    if denominator == 0 {
        return 1;
    }
    let product = u64::from(value) * u64::from(numerator);
    let denominator = u64::from(denominator);
    let scaled = match rounding {
        Rounding::Truncate => product / denominator,
        Rounding::Nearest => (product * 2 + denominator) / (denominator * 2),
    };
    u32::try_from(scaled).unwrap_or(u32::MAX).max(1)
}

/// 按约束计算输出尺寸。
pub fn resolve(source: Size, constraint: SizeConstraint, rounding: Rounding) -> Size {
    match constraint {
        SizeConstraint::FixedWidth(width) => Size::new(
            width,
            scale_dimension(source.height, width, source.width, rounding),
        ),
        SizeConstraint::FixedHeight(height) => Size::new(
            scale_dimension(source.width, height, source.height, rounding),
            height,
        ),
        SizeConstraint::FixedBoth(size) | SizeConstraint::FixedCellUniform(size) => size,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_width_keeps_aspect_ratio() {
        let out = resolve(Size::new(1600, 1200), SizeConstraint::FixedWidth(800), Rounding::Truncate);
        assert_eq!(out, Size::new(800, 600));
    }

    #[test]
    fn fixed_height_keeps_aspect_ratio() {
        let out = resolve(Size::new(1600, 1200), SizeConstraint::FixedHeight(300), Rounding::Nearest);
        assert_eq!(out, Size::new(400, 300));
    }

    #[test]
    fn truncate_and_nearest_differ_on_fraction() {
        // 333 * 800 / 1000 = 266.4；1000 * 800 / 1200 = 666.67
        assert_eq!(scale_dimension(333, 800, 1000, Rounding::Truncate), 266);
        assert_eq!(scale_dimension(333, 800, 1000, Rounding::Nearest), 266);
        assert_eq!(scale_dimension(1000, 800, 1200, Rounding::Truncate), 666);
        assert_eq!(scale_dimension(1000, 800, 1200, Rounding::Nearest), 667);
    }

    #[test]
    fn nearest_rounds_half_up() {
        // 5 * 3 / 2 = 7.5
        assert_eq!(scale_dimension(5, 3, 2, Rounding::Nearest), 8);
        assert_eq!(scale_dimension(5, 3, 2, Rounding::Truncate), 7);
    }

    #[test]
    fn scaled_dimension_never_reaches_zero() {
        let out = resolve(Size::new(4000, 1), SizeConstraint::FixedWidth(10), Rounding::Truncate);
        assert_eq!(out, Size::new(10, 1));
    }

    #[test]
    fn uniform_cell_ignores_source_ratio() {
        let cell = Size::new(200, 100);
        let out = resolve(Size::new(50, 900), SizeConstraint::FixedCellUniform(cell), Rounding::Nearest);
        assert_eq!(out, cell);

        let both = resolve(Size::new(50, 900), SizeConstraint::FixedBoth(cell), Rounding::Truncate);
        assert_eq!(both, cell);
    }

    #[test]
    fn zero_denominator_falls_back_to_one() {
        assert_eq!(scale_dimension(10, 10, 0, Rounding::Nearest), 1);
    }
}
