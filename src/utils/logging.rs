/// 日志工具模块
///
/// 提供日志初始化和运行各阶段的格式化输出
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// 初始化 tracing 订阅器
///
/// 优先使用 `RUST_LOG`，否则按 `verbose` 选择 `debug` 或 `info`。
/// 重复调用不会报错（测试中会多次调用）。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(model_name: &str, batch_size: usize, max_workers: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 字符描述生成");
    info!("🤖 模型: {}", model_name);
    info!("📊 每批 {} 个字符，最大并发数: {}", batch_size, max_workers);
    info!("{}", "=".repeat(60));
}

/// 记录待处理字符信息
///
/// # 参数
/// - `pending`: 待处理字符数
/// - `total_batches`: 批次总数
pub fn log_pending(pending: usize, total_batches: usize) {
    info!("✓ {} 个字符待处理", pending);
    info!("📋 共 {} 个批次", total_batches);
}

/// 记录没有返回描述的批次
pub fn log_empty_batches(indices: &[usize]) {
    for index in indices {
        warn!("⚠️ 批次（起始索引 {}）没有返回任何描述", index);
    }
}

/// 打印最终统计信息
///
/// # 参数
/// - `generated`: 本次新生成的描述数
/// - `total`: 描述文件中的总条数
/// - `failed_batches`: 失败批次数
/// - `output_path`: 描述文件路径
pub fn print_final_stats(generated: usize, total: usize, failed_batches: usize, output_path: &str) {
    info!("{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 本次生成: {}", generated);
    info!("📚 描述总数: {}", total);
    if failed_batches > 0 {
        info!("❌ 失败批次: {}", failed_batches);
    }
    info!("{}", "=".repeat(60));
    info!("描述已保存至: {}", output_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
