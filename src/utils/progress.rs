// 进度条

use indicatif::{ProgressBar, ProgressStyle};

/// 创建批次进度条
///
/// `visible` 为 false 时返回隐藏的进度条，调用方不需要区分。
pub fn create_progress_bar(total: u64, message: &str, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template("{msg} [{bar:40.cyan/blue}] {pos}/{len} ({elapsed})")
        .unwrap_or_else(|e| {
            eprintln!("进度条模板无效: {}", e);
            ProgressStyle::default_bar()
        })
        .progress_chars("=>-");
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb
}
