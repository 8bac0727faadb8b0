// ==========================================
// 机台生产排程 - 日志初始化
// ==========================================
// 工具: tracing + tracing-subscriber (EnvFilter)
// 输出: stderr；stdout 留给命令输出（JSON/CSV）
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 未设置 RUST_LOG 时的过滤规则
///
/// perf 目标单独列出，便于只关闭性能日志: RUST_LOG=info,perf=off
pub const DEFAULT_FILTER: &str = "info,perf=info";

/// 测试环境的过滤规则
pub const TEST_FILTER: &str = "debug,production_schedule=trace";

fn build_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// 初始化日志系统（命令行入口调用一次）
///
/// # 环境变量
/// - RUST_LOG: 覆盖默认过滤规则，例如 `RUST_LOG=production_schedule::engine=debug`
pub fn init() {
    let result = fmt()
        .with_env_filter(build_filter(DEFAULT_FILTER))
        .with_target(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .try_init();

    if result.is_err() {
        tracing::debug!("日志系统已初始化，忽略重复调用");
    }
}

/// 初始化测试日志（可重复调用）
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(build_filter(TEST_FILTER))
        .with_test_writer()
        .try_init();
}
