// ==========================================
// 配送计划后端 - 会话数据仓储
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex, MutexGuard};

pub struct SessionRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SessionRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 按会话ID查询用户ID
    pub fn find_user_by_session_id(&self, session_id: &str) -> RepositoryResult<Option<i64>> {
        let conn = self.get_conn()?;
        let user_id = conn
            .query_row(
                "SELECT user_id FROM sessions WHERE session_id = ?1",
                params![session_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(user_id)
    }

    /// 登记会话（同ID覆盖）
    pub fn upsert(&self, session_id: &str, user_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO sessions (session_id, user_id) VALUES (?1, ?2)
            ON CONFLICT(session_id) DO UPDATE SET user_id = excluded.user_id
            "#,
            params![session_id, user_id],
        )?;
        Ok(())
    }

    pub fn delete(&self, session_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM sessions WHERE session_id = ?1", params![session_id])?;
        Ok(affected > 0)
    }
}
