//! # 图片目录模块（catalog）
//!
//! ## 设计思路
//!
//! 负责把“一个文件夹”变成“有序的图片路径列表”：
//! - 按扩展名过滤图片文件（不区分大小写）
//! - 按 `NameOrder` 排序，默认自然排序
//! - `renumber` 把文件夹内图片重命名为 `01.png`、`02.jpg` 这样的连续序号
//!
//! 排序器通过 trait 注入，替换排序规则不影响布局算法。

mod natural;
mod renumber;

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AppError;

pub use natural::{NameOrder, NaturalOrder};
pub use renumber::{RenamePlan, plan_renumber, renumber};

/// 识别为图片的扩展名（小写）。
pub const IMAGE_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "bmp", "jfif", "gif", "webp"];

/// 判断路径是否为支持的图片扩展名。
pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// 扫描目录下的图片文件（不递归），按 `order` 排序后返回完整路径。
pub fn scan_images(dir: &Path, order: &dyn NameOrder) -> Result<Vec<PathBuf>, AppError> {
    let entries = fs::read_dir(dir)
        .map_err(|e| AppError::Storage(format!("无法读取图片目录 '{}': {}", dir.display(), e)))?;

    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_image_path(path))
        .collect();

    files.sort_by(|a, b| order.compare(&file_name(a), &file_name(b)));
    log::info!("🔍 在 {} 中找到 {} 张图片", dir.display(), files.len());
    Ok(files)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_temp_dir(tag: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock error")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("image-merge-catalog-{tag}-{nanos}"));
        fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    #[test]
    fn recognizes_image_extensions_case_insensitively() {
        assert!(is_image_path(Path::new("a/B.JPG")));
        assert!(is_image_path(Path::new("c.jfif")));
        assert!(!is_image_path(Path::new("notes.txt")));
        assert!(!is_image_path(Path::new("png")));
    }

    #[test]
    fn scan_filters_and_sorts_naturally() {
        let dir = unique_temp_dir("scan");
        for name in ["10.png", "2.jpg", "1.PNG", "readme.txt"] {
            fs::write(dir.join(name), b"x").expect("write file");
        }
        fs::create_dir_all(dir.join("3.png")).expect("dir that looks like an image");

        let files = scan_images(&dir, &NaturalOrder).expect("scan");
        let names: Vec<String> = files.iter().map(|p| file_name(p)).collect();
        assert_eq!(names, vec!["1.PNG", "2.jpg", "10.png"]);

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn scan_missing_dir_is_storage_error() {
        let result = scan_images(Path::new("/definitely/not/here"), &NaturalOrder);
        assert!(matches!(result, Err(AppError::Storage(_))));
    }
}
