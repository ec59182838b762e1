//! 图片重命名：按当前排序把文件改名为零填充的连续序号，保留原扩展名。
//!
//! 两阶段执行（先改成临时名，再改成目标名），避免 `0.png -> 01.png` 与
//! `01.png -> 02.png` 这类链式改名互相覆盖。

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use super::{NameOrder, scan_images};
use crate::error::AppError;

/// 单个文件的改名计划。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamePlan {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// 序号位数：至少两位，文件数更多时随之增加。
fn sequence_width(count: usize) -> usize {
    count.to_string().len().max(2)
}

/// 为有序文件列表生成改名计划（序号从 1 开始）。
pub fn plan_renumber(files: &[PathBuf]) -> Vec<RenamePlan> {
    let width = sequence_width(files.len());
    files
        .iter()
        .enumerate()
        .map(|(idx, from)| {
            let mut name = format!("{:0width$}", idx + 1, width = width);
            if let Some(ext) = from.extension() {
                name.push('.');
                name.push_str(&ext.to_string_lossy());
            }
            let to = from.with_file_name(name);
            RenamePlan { from: from.clone(), to }
        })
        .collect()
}

/// 重命名目录内全部图片。`dry_run` 为真时只返回计划，不改动文件。
///
/// 任一步改名失败时撤销已完成的改名，文件恢复原名后再返回错误。
pub fn renumber(dir: &Path, order: &dyn NameOrder, dry_run: bool) -> Result<Vec<RenamePlan>, AppError> {
    let files = scan_images(dir, order)?;
    let plans = plan_renumber(&files);

    let sources: HashSet<&PathBuf> = files.iter().collect();
    if let Some(conflict) = plans.iter().find(|p| p.to.exists() && !sources.contains(&p.to)) {
        return Err(AppError::Storage(format!(
            "目标文件已存在且不在重命名列表中：{}",
            conflict.to.display()
        )));
    }

    if dry_run {
        for plan in &plans {
            log::info!("📝 {} -> {}", plan.from.display(), plan.to.display());
        }
        return Ok(plans);
    }

    let moves = stage_moves(dir, &plans, &run_token())?;
    apply_moves(&moves, |from, to| fs::rename(from, to))?;

    log::info!("✅ 重命名完成：{} 个文件（{} 个改名）", plans.len(), moves.len());
    Ok(plans)
}

/// 一次改名：`from -> temp -> to`。
#[derive(Debug)]
struct Move<'a> {
    from: &'a Path,
    temp: PathBuf,
    to: &'a Path,
}

/// 本次运行的临时名前缀（进程号 + 纳秒时间戳）。
fn run_token() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("{}-{}", std::process::id(), nanos)
}

/// 为需要改名的文件分配临时名；临时名已被占用时拒绝执行。
fn stage_moves<'a>(dir: &Path, plans: &'a [RenamePlan], token: &str) -> Result<Vec<Move<'a>>, AppError> {
    let moves: Vec<Move<'a>> = plans
        .iter()
        .filter(|plan| plan.from != plan.to)
        .enumerate()
        .map(|(idx, plan)| Move {
            from: &plan.from,
            temp: dir.join(format!(".image-merge-renumber-{token}-{idx}.tmp")),
            to: &plan.to,
        })
        .collect();

    if let Some(taken) = moves.iter().find(|m| m.temp.exists()) {
        return Err(AppError::Storage(format!(
            "临时文件已存在，拒绝覆盖：{}",
            taken.temp.display()
        )));
    }
    Ok(moves)
}

/// 两阶段执行改名，失败时按相反顺序撤销。
fn apply_moves<F>(moves: &[Move<'_>], mut rename: F) -> Result<(), AppError>
where
    F: FnMut(&Path, &Path) -> io::Result<()>,
{
    for (done, m) in moves.iter().enumerate() {
        if let Err(err) = rename(m.from, &m.temp) {
            undo(&moves[..done], 0, &mut rename);
            return Err(err.into());
        }
    }
    for (done, m) in moves.iter().enumerate() {
        if let Err(err) = rename(&m.temp, m.to) {
            undo(moves, done, &mut rename);
            return Err(err.into());
        }
    }
    Ok(())
}

/// 撤销：前 `finished` 个已到目标名的先退回临时名，再把全部临时名还原为原名。
fn undo<F>(moves: &[Move<'_>], finished: usize, rename: &mut F)
where
    F: FnMut(&Path, &Path) -> io::Result<()>,
{
    for m in moves[..finished].iter().rev() {
        if let Err(err) = rename(m.to, &m.temp) {
            log::error!("❌ 回滚失败 {} -> {}: {}", m.to.display(), m.temp.display(), err);
        }
    }
    for m in moves.iter().rev() {
        if let Err(err) = rename(&m.temp, m.from) {
            log::error!("❌ 回滚失败 {} -> {}: {}", m.temp.display(), m.from.display(), err);
        }
    }
    log::warn!("⚠️ 重命名失败，已尝试恢复 {} 个文件的原名", moves.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::NaturalOrder;

    fn unique_temp_dir(tag: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock error")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("image-merge-renumber-{tag}-{nanos}"));
        fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    fn names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .expect("read dir")
            .flatten()
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn plan_pads_to_two_digits_and_keeps_extension() {
        let files = vec![PathBuf::from("d/b.JPG"), PathBuf::from("d/a.png")];
        let plans = plan_renumber(&files);
        assert_eq!(plans[0].to, PathBuf::from("d/01.JPG"));
        assert_eq!(plans[1].to, PathBuf::from("d/02.png"));
    }

    #[test]
    fn width_grows_with_file_count() {
        assert_eq!(sequence_width(9), 2);
        assert_eq!(sequence_width(100), 3);
    }

    #[test]
    fn chained_renames_do_not_clobber() {
        let dir = unique_temp_dir("chain");
        // 01.png 原地不动，2.png -> 02.png，x.png 排在数字之后
        fs::write(dir.join("2.png"), b"two").expect("write");
        fs::write(dir.join("01.png"), b"one").expect("write");
        fs::write(dir.join("x.png"), b"x").expect("write");

        renumber(&dir, &NaturalOrder, false).expect("renumber");

        assert_eq!(names(&dir), vec!["01.png", "02.png", "03.png"]);
        assert_eq!(fs::read(dir.join("01.png")).expect("read"), b"one");
        assert_eq!(fs::read(dir.join("02.png")).expect("read"), b"two");
        assert_eq!(fs::read(dir.join("03.png")).expect("read"), b"x");

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn occupied_target_is_moved_out_of_the_way_first() {
        let dir = unique_temp_dir("occupied");
        // 0.png -> 01.png，而 01.png 自身要改成 02.png
        fs::write(dir.join("0.png"), b"zero").expect("write");
        fs::write(dir.join("01.png"), b"one").expect("write");

        renumber(&dir, &NaturalOrder, false).expect("renumber");

        assert_eq!(names(&dir), vec!["01.png", "02.png"]);
        assert_eq!(fs::read(dir.join("01.png")).expect("read"), b"zero");
        assert_eq!(fs::read(dir.join("02.png")).expect("read"), b"one");

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn dry_run_leaves_files_untouched() {
        let dir = unique_temp_dir("dry");
        fs::write(dir.join("b.png"), b"b").expect("write");
        fs::write(dir.join("a.png"), b"a").expect("write");

        let plans = renumber(&dir, &NaturalOrder, true).expect("renumber");

        assert_eq!(plans.len(), 2);
        assert_eq!(names(&dir), vec!["a.png", "b.png"]);

        let _ = fs::remove_dir_all(dir);
    }

    fn write_abc(dir: &Path) -> Vec<RenamePlan> {
        // c.png, a.png, b.png 依次改为 01、02、03，三个都需要改名
        for (name, body) in [("a.png", "A"), ("b.png", "B"), ("c.png", "C")] {
            fs::write(dir.join(name), body).expect("write");
        }
        plan_renumber(&[dir.join("c.png"), dir.join("a.png"), dir.join("b.png")])
    }

    fn assert_originals_restored(dir: &Path) {
        assert_eq!(names(dir), vec!["a.png", "b.png", "c.png"]);
        assert_eq!(fs::read(dir.join("a.png")).expect("read"), b"A");
        assert_eq!(fs::read(dir.join("b.png")).expect("read"), b"B");
        assert_eq!(fs::read(dir.join("c.png")).expect("read"), b"C");
    }

    #[test]
    fn failure_in_second_phase_restores_original_names() {
        let dir = unique_temp_dir("rollback-final");
        let plans = write_abc(&dir);
        let moves = stage_moves(&dir, &plans, "t").expect("stage");
        assert_eq!(moves.len(), 3);

        // 前 3 次是 原名 -> 临时名，第 5 次（第二个 临时名 -> 目标名）失败
        let mut calls = 0;
        let result = apply_moves(&moves, |from, to| {
            calls += 1;
            if calls == 5 {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "target busy"));
            }
            fs::rename(from, to)
        });

        assert!(matches!(result, Err(AppError::Io(_))));
        assert_originals_restored(&dir);

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn failure_in_first_phase_restores_original_names() {
        let dir = unique_temp_dir("rollback-temp");
        let plans = write_abc(&dir);
        let moves = stage_moves(&dir, &plans, "t").expect("stage");

        let mut calls = 0;
        let result = apply_moves(&moves, |from, to| {
            calls += 1;
            if calls == 3 {
                return Err(io::Error::other("disk full"));
            }
            fs::rename(from, to)
        });

        assert!(matches!(result, Err(AppError::Io(_))));
        assert_originals_restored(&dir);

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn occupied_temp_name_is_refused() {
        let dir = unique_temp_dir("temp-taken");
        let plans = write_abc(&dir);
        fs::write(dir.join(".image-merge-renumber-t-1.tmp"), b"leftover").expect("write");

        let result = stage_moves(&dir, &plans, "t");

        assert!(matches!(result, Err(AppError::Storage(_))));
        assert_eq!(
            fs::read(dir.join(".image-merge-renumber-t-1.tmp")).expect("read"),
            b"leftover"
        );

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn run_tokens_carry_the_process_id() {
        assert!(run_token().starts_with(&format!("{}-", std::process::id())));
    }
}
