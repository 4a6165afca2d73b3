use rusqlite::Connection;
use std::cell::Cell;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

static PERF_SQL_ENABLED: AtomicBool = AtomicBool::new(false);
static SLOW_SQL_THRESHOLD_MS: AtomicU64 = AtomicU64::new(0);

thread_local! {
    static PERF_DEPTH: Cell<u32> = Cell::new(0);
    static SQL_COUNT: Cell<u64> = Cell::new(0);
}

fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name).ok().map(|v| {
        matches!(
            v.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

/// 安装 SQLite 语句 trace/profile（SQL 计数 + 慢查询日志）
///
/// 开关：
/// - `DELIVERY_PLANNER_PERF_SQL=1` 开启（默认关闭）
/// - `DELIVERY_PLANNER_SLOW_SQL_MS=50` 慢 SQL 阈值（毫秒，默认 200）
pub fn install_sqlite_tracing(conn: &mut Connection) {
    let enabled = env_flag("DELIVERY_PLANNER_PERF_SQL").unwrap_or(false);
    PERF_SQL_ENABLED.store(enabled, Ordering::Relaxed);

    if !enabled {
        conn.trace(None);
        conn.profile(None);
        return;
    }

    let slow_ms = std::env::var("DELIVERY_PLANNER_SLOW_SQL_MS")
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(200);
    SLOW_SQL_THRESHOLD_MS.store(slow_ms, Ordering::Relaxed);

    conn.trace(Some(on_sql_trace));
    conn.profile(Some(on_sql_profile));
}

fn on_sql_trace(_sql: &str) {
    if PERF_DEPTH.with(|d| d.get() > 0) {
        SQL_COUNT.with(|c| c.set(c.get().saturating_add(1)));
    }
}

fn on_sql_profile(sql: &str, duration: Duration) {
    let ms = duration.as_millis() as u64;
    let threshold = SLOW_SQL_THRESHOLD_MS.load(Ordering::Relaxed);
    if threshold == 0 || ms < threshold {
        return;
    }
    // IN (...) 批量更新的语句很长，日志里只保留开头
    let sql_short: String = sql.split_whitespace().collect::<Vec<_>>().join(" ").chars().take(200).collect();
    tracing::warn!(target: "slow_sql", duration_ms = ms, sql = %sql_short, "slow sql");
}

/// 性能统计 Guard：记录 elapsed_ms + 当前线程上执行的 SQL 语句数
///
/// ```ignore
/// let _perf = delivery_planner::perf::PerfGuard::new("plan.generate");
/// ```
pub struct PerfGuard {
    op: &'static str,
    start: Instant,
    sql_start: u64,
}

impl PerfGuard {
    pub fn new(op: &'static str) -> Self {
        PERF_DEPTH.with(|d| d.set(d.get().saturating_add(1)));
        Self {
            op,
            start: Instant::now(),
            sql_start: SQL_COUNT.with(|c| c.get()),
        }
    }
}

impl Drop for PerfGuard {
    fn drop(&mut self) {
        let elapsed_ms = self.start.elapsed().as_millis() as u64;
        let sql_count = SQL_COUNT.with(|c| c.get()).saturating_sub(self.sql_start);

        if PERF_SQL_ENABLED.load(Ordering::Relaxed) {
            tracing::info!(target: "perf", op = self.op, elapsed_ms, sql_count, "done");
        } else {
            tracing::debug!(target: "perf", op = self.op, elapsed_ms, "done");
        }

        PERF_DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
    }
}
