// ==========================================
// 配送计划后端 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::planning_config_trait::{ConfigResult, PlanningConfigReader};
use crate::db::open_sqlite_connection;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 读取并解析配置值；缺失或格式错误时回退默认值
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> ConfigResult<T>
    where
        T: FromStr + Display,
    {
        let Some(raw) = self.get_config_value(key)? else {
            return Ok(default);
        };

        match raw.trim().parse::<T>() {
            Ok(v) => Ok(v),
            Err(_) => {
                tracing::warn!(
                    config_key = key,
                    raw_value = %raw,
                    default = %default,
                    "配置格式错误，使用默认值"
                );
                Ok(default)
            }
        }
    }

    /// 获取所有配置的快照（JSON格式，键有序）
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt = conn.prepare(
            "SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key",
        )?;

        let config_map = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<Result<BTreeMap<String, String>, _>>()?;

        Ok(serde_json::to_string(&json!(config_map))?)
    }
}

// ==========================================
// PlanningConfigReader Trait 实现
// ==========================================
#[async_trait]
impl PlanningConfigReader for ConfigManager {
    async fn get_planning_deadline_ms(&self) -> ConfigResult<u64> {
        self.get_parsed_or_default(config_keys::PLANNING_DEADLINE_MS, defaults::PLANNING_DEADLINE_MS)
    }

    async fn get_dp_max_cells(&self) -> ConfigResult<u64> {
        let value = self.get_parsed_or_default(config_keys::DP_MAX_CELLS, defaults::DP_MAX_CELLS)?;
        if value > defaults::DP_MAX_CELLS {
            tracing::warn!(
                config_key = config_keys::DP_MAX_CELLS,
                value,
                max = defaults::DP_MAX_CELLS,
                "动态规划单元上限超出允许范围，已截断"
            );
        }
        Ok(value.min(defaults::DP_MAX_CELLS))
    }

    async fn get_dp_cancel_check_every(&self) -> ConfigResult<u64> {
        let value = self.get_parsed_or_default(
            config_keys::DP_CANCEL_CHECK_EVERY,
            defaults::DP_CANCEL_CHECK_EVERY,
        )?;
        Ok(value.max(1))
    }

    async fn get_status_batch_size(&self) -> ConfigResult<usize> {
        let value =
            self.get_parsed_or_default(config_keys::STATUS_BATCH_SIZE, defaults::STATUS_BATCH_SIZE)?;
        Ok(if value == 0 { defaults::STATUS_BATCH_SIZE } else { value })
    }

    async fn get_product_count_cache_ttl_secs(&self) -> ConfigResult<u64> {
        self.get_parsed_or_default(
            config_keys::PRODUCT_COUNT_CACHE_TTL_SECS,
            defaults::PRODUCT_COUNT_CACHE_TTL_SECS,
        )
    }

    async fn get_session_cache_ttl_secs(&self) -> ConfigResult<u64> {
        self.get_parsed_or_default(
            config_keys::SESSION_CACHE_TTL_SECS,
            defaults::SESSION_CACHE_TTL_SECS,
        )
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 计划请求
    pub const PLANNING_DEADLINE_MS: &str = "planning_deadline_ms";

    // 装载优化
    pub const DP_MAX_CELLS: &str = "dp_max_cells";
    pub const DP_CANCEL_CHECK_EVERY: &str = "dp_cancel_check_every";

    // 状态变更
    pub const STATUS_BATCH_SIZE: &str = "status_batch_size";

    // 缓存
    pub const PRODUCT_COUNT_CACHE_TTL_SECS: &str = "product_count_cache_ttl_secs";
    pub const SESSION_CACHE_TTL_SECS: &str = "session_cache_ttl_secs";
}

// ==========================================
// 默认值
// ==========================================
pub mod defaults {
    pub const PLANNING_DEADLINE_MS: u64 = 10_000;
    pub const DP_MAX_CELLS: u64 = 5_000_000;
    pub const DP_CANCEL_CHECK_EVERY: u64 = 4096;
    pub const STATUS_BATCH_SIZE: usize = 1000;
    pub const PRODUCT_COUNT_CACHE_TTL_SECS: u64 = 60;
    pub const SESSION_CACHE_TTL_SECS: u64 = 60;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::ensure_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[tokio::test]
    async fn test_defaults_when_missing() {
        let config = manager();
        assert_eq!(config.get_planning_deadline_ms().await.unwrap(), 10_000);
        assert_eq!(config.get_dp_max_cells().await.unwrap(), 5_000_000);
        assert_eq!(config.get_dp_cancel_check_every().await.unwrap(), 4096);
        assert_eq!(config.get_status_batch_size().await.unwrap(), 1000);
    }

    #[tokio::test]
    async fn test_override_and_invalid_fallback() {
        let config = manager();
        config.set_global_value(config_keys::STATUS_BATCH_SIZE, "250").unwrap();
        config.set_global_value(config_keys::DP_MAX_CELLS, "lots").unwrap();
        config.set_global_value(config_keys::DP_CANCEL_CHECK_EVERY, "0").unwrap();

        assert_eq!(config.get_status_batch_size().await.unwrap(), 250);
        assert_eq!(config.get_dp_max_cells().await.unwrap(), 5_000_000);
        assert_eq!(config.get_dp_cancel_check_every().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_dp_max_cells_is_capped() {
        let config = manager();
        config.set_global_value(config_keys::DP_MAX_CELLS, "18446744073709551615").unwrap();
        assert_eq!(config.get_dp_max_cells().await.unwrap(), 5_000_000);

        config.set_global_value(config_keys::DP_MAX_CELLS, "1000").unwrap();
        assert_eq!(config.get_dp_max_cells().await.unwrap(), 1000);
    }

    #[test]
    fn test_config_snapshot_is_sorted_json() {
        let config = manager();
        config.set_global_value("b_key", "2").unwrap();
        config.set_global_value("a_key", "1").unwrap();

        let snapshot = config.get_config_snapshot().unwrap();
        assert_eq!(snapshot, r#"{"a_key":"1","b_key":"2"}"#);
    }
}
