// ==========================================
// 机台生产排程 - 性能统计
// ==========================================
// 职责: API 操作耗时 + 期间执行的 SQL 条数 + 慢 SQL 告警
// 开关:
// - PRODUCTION_SCHEDULE_PERF_SQL: 是否挂载 SQLite trace/profile（Debug 默认开）
// - PRODUCTION_SCHEDULE_SLOW_SQL_MS: 慢 SQL 阈值，毫秒（Debug 50 / Release 200）
// ==========================================

use rusqlite::Connection;
use std::cell::Cell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

const PERF_SQL_ENV: &str = "PRODUCTION_SCHEDULE_PERF_SQL";
const SLOW_SQL_ENV: &str = "PRODUCTION_SCHEDULE_SLOW_SQL_MS";
const SQL_LOG_MAX_CHARS: usize = 400;

// 0 表示未开启慢 SQL 告警
static SLOW_SQL_THRESHOLD_MS: AtomicU64 = AtomicU64::new(0);

/// SQL 统计开关
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerfSettings {
    pub sql_tracing: bool,
    pub slow_sql_ms: u64,
}

impl PerfSettings {
    /// 从原始环境变量值解析
    pub fn parse(perf_sql: Option<&str>, slow_sql_ms: Option<&str>) -> Self {
        let sql_tracing = perf_sql
            .map(|v| {
                matches!(
                    v.trim().to_ascii_lowercase().as_str(),
                    "1" | "true" | "yes" | "on"
                )
            })
            .unwrap_or(cfg!(debug_assertions));

        let default_ms = if cfg!(debug_assertions) { 50 } else { 200 };
        let slow_sql_ms = slow_sql_ms
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(default_ms);

        Self {
            sql_tracing,
            slow_sql_ms,
        }
    }

    pub fn from_env() -> Self {
        let perf_sql = std::env::var(PERF_SQL_ENV).ok();
        let slow_ms = std::env::var(SLOW_SQL_ENV).ok();
        Self::parse(perf_sql.as_deref(), slow_ms.as_deref())
    }
}

// ==========================================
// 线程内计数（PerfGuard 存活期间才计数）
// ==========================================
#[derive(Default)]
struct SqlCounters {
    guards: Cell<u32>,
    statements: Cell<u64>,
    slow: Cell<u64>,
}

thread_local! {
    static COUNTERS: SqlCounters = SqlCounters::default();
}

fn bump(cell: &Cell<u64>) {
    cell.set(cell.get().saturating_add(1));
}

fn one_line(sql: &str) -> String {
    let flat = sql.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= SQL_LOG_MAX_CHARS {
        return flat;
    }
    let head: String = flat.chars().take(SQL_LOG_MAX_CHARS).collect();
    format!("{}…", head)
}

/// 为连接挂载 SQL 计数与慢 SQL 日志
pub fn install_sqlite_tracing(conn: &mut Connection) {
    let settings = PerfSettings::from_env();
    if !settings.sql_tracing {
        conn.trace(None);
        conn.profile(None);
        return;
    }

    SLOW_SQL_THRESHOLD_MS.store(settings.slow_sql_ms, Ordering::Relaxed);
    conn.trace(Some(on_statement));
    conn.profile(Some(on_profile));
}

fn on_statement(_sql: &str) {
    COUNTERS.with(|c| {
        if c.guards.get() > 0 {
            bump(&c.statements);
        }
    });
}

fn on_profile(sql: &str, duration: Duration) {
    let threshold = SLOW_SQL_THRESHOLD_MS.load(Ordering::Relaxed);
    let ms = duration.as_millis() as u64;
    if threshold == 0 || ms < threshold {
        return;
    }

    tracing::warn!(target: "slow_sql", duration_ms = ms, sql = %one_line(sql), "慢 SQL");
    COUNTERS.with(|c| {
        if c.guards.get() > 0 {
            bump(&c.slow);
        }
    });
}

/// 操作级性能统计，drop 时写一条 perf 日志
///
/// ```ignore
/// let _perf = PerfGuard::new("export_schedule");
/// ```
pub struct PerfGuard {
    op: &'static str,
    started: Instant,
    statements_at_start: u64,
    slow_at_start: u64,
}

impl PerfGuard {
    pub fn new(op: &'static str) -> Self {
        let (statements_at_start, slow_at_start) = COUNTERS.with(|c| {
            c.guards.set(c.guards.get().saturating_add(1));
            (c.statements.get(), c.slow.get())
        });
        Self {
            op,
            started: Instant::now(),
            statements_at_start,
            slow_at_start,
        }
    }

    /// 本 Guard 创建以来执行的 SQL 条数
    pub fn sql_count(&self) -> u64 {
        COUNTERS.with(|c| c.statements.get().saturating_sub(self.statements_at_start))
    }

    fn slow_sql_count(&self) -> u64 {
        COUNTERS.with(|c| c.slow.get().saturating_sub(self.slow_at_start))
    }
}

impl Drop for PerfGuard {
    fn drop(&mut self) {
        tracing::info!(
            target: "perf",
            op = self.op,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            sql_count = self.sql_count(),
            slow_sql_count = self.slow_sql_count(),
            "操作完成"
        );
        COUNTERS.with(|c| c.guards.set(c.guards.get().saturating_sub(1)));
    }
}
