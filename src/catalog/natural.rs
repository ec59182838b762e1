//! 自然排序：把文件名中的连续数字当作整数比较，`2.png` 排在 `10.png` 之前。

use std::cmp::Ordering;

use once_cell::sync::Lazy;
use regex::Regex;

static DIGIT_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9]+").expect("digit pattern is valid"));

/// 文件名比较器。
pub trait NameOrder {
    fn compare(&self, a: &str, b: &str) -> Ordering;
}

/// 数字感知的自然排序，文本部分忽略大小写。
#[derive(Debug, Clone, Copy, Default)]
pub struct NaturalOrder;

#[derive(Debug)]
enum Token<'a> {
    Number(&'a str),
    Text(String),
}

impl Ord for Token<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Token::Number(a), Token::Number(b)) => compare_digits(a, b),
            (Token::Text(a), Token::Text(b)) => a.cmp(b),
            (Token::Number(_), Token::Text(_)) => Ordering::Less,
            (Token::Text(_), Token::Number(_)) => Ordering::Greater,
        }
    }
}

impl PartialEq for Token<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Token<'_> {}

impl PartialOrd for Token<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// 按数值比较两段数字串，不受位数上限影响。
fn compare_digits(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn tokenize(name: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut last = 0;
    for run in DIGIT_RUNS.find_iter(name) {
        if run.start() > last {
            tokens.push(Token::Text(name[last..run.start()].to_lowercase()));
        }
        tokens.push(Token::Number(run.as_str()));
        last = run.end();
    }
    if last < name.len() {
        tokens.push(Token::Text(name[last..].to_lowercase()));
    }
    tokens
}

impl NameOrder for NaturalOrder {
    fn compare(&self, a: &str, b: &str) -> Ordering {
        // 键相同（如 `01` 与 `1`）时退回原始字符串，保证排序结果确定
        tokenize(a).cmp(&tokenize(b)).then_with(|| a.cmp(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(names: &[&str]) -> Vec<String> {
        let mut names: Vec<String> = names.iter().map(|s| s.to_string()).collect();
        names.sort_by(|a, b| NaturalOrder.compare(a, b));
        names
    }

    #[test]
    fn numbers_compare_numerically() {
        assert_eq!(
            sorted(&["10.png", "2.png", "1.png"]),
            vec!["1.png", "2.png", "10.png"]
        );
    }

    #[test]
    fn text_ignores_case() {
        assert_eq!(
            sorted(&["Page-10.jpg", "page-9.jpg", "PAGE-1.jpg"]),
            vec!["PAGE-1.jpg", "page-9.jpg", "Page-10.jpg"]
        );
    }

    #[test]
    fn numbers_sort_before_text() {
        assert_eq!(sorted(&["cover.png", "1.png"]), vec!["1.png", "cover.png"]);
    }

    #[test]
    fn leading_zeros_are_stable() {
        assert_eq!(sorted(&["1.png", "01.png", "002.png"]), vec!["01.png", "1.png", "002.png"]);
    }

    #[test]
    fn very_long_digit_runs_do_not_overflow() {
        let huge = "123456789012345678901234567890.png";
        assert_eq!(sorted(&[huge, "9.png"]), vec!["9.png", huge]);
    }
}
