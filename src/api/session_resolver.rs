// ==========================================
// 配送计划后端 - 会话身份解析
// ==========================================
// 职责: 会话ID → 用户ID
// 约束: 命中缓存直接返回；未命中查 sessions 表并写入缓存
// 约束: 缓存由调用方注入，TTL 有上限，可按会话主动失效
// ==========================================

use std::sync::Arc;
use tracing::debug;

use crate::api::error::{ApiError, ApiResult};
use crate::cache::TtlCache;
use crate::repository::SessionRepository;

pub type SessionCache = TtlCache<String, i64>;

pub struct SessionResolver {
    session_repo: Arc<SessionRepository>,
    cache: Arc<SessionCache>,
}

impl SessionResolver {
    pub fn new(session_repo: Arc<SessionRepository>, cache: Arc<SessionCache>) -> Self {
        Self {
            session_repo,
            cache,
        }
    }

    /// 解析会话对应的用户ID
    ///
    /// # 返回
    /// - Ok(user_id)
    /// - Err(ApiError::Unauthorized): 会话不存在
    pub fn resolve(&self, session_id: &str) -> ApiResult<i64> {
        let session_id = session_id.trim();
        if session_id.is_empty() {
            return Err(ApiError::Unauthorized("缺少会话ID".to_string()));
        }

        let key = session_id.to_string();
        if let Some(user_id) = self.cache.get(&key) {
            return Ok(user_id);
        }

        match self.session_repo.find_user_by_session_id(session_id)? {
            Some(user_id) => {
                debug!(user_id, "会话缓存未命中，已从数据库加载");
                self.cache.insert(key, user_id);
                Ok(user_id)
            }
            None => Err(ApiError::Unauthorized(format!("会话不存在: {}", session_id))),
        }
    }

    /// 使某个会话的缓存失效（登出、切换用户时调用）
    pub fn invalidate(&self, session_id: &str) {
        self.cache.invalidate(&session_id.trim().to_string());
    }
}
