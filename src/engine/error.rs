// ==========================================
// 配送计划后端 - 引擎层错误类型
// ==========================================
// 分类:
// - 存储失败: 读写失败，事务已回滚
// - 超时/取消: 与数据错误区分，便于调用方重试
// 容量为 0 或没有待发货订单不是错误，返回空计划
// ==========================================

use crate::engine::capacity_allocator::AllocationError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlanningError {
    #[error(transparent)]
    Repository(RepositoryError),

    #[error("计划计算已取消")]
    Cancelled,

    #[error("计划请求超时: deadline={deadline_ms}ms")]
    DeadlineExceeded { deadline_ms: u64 },

    #[error("配置读取失败: {0}")]
    Config(String),

    #[error("计划工作线程异常: {0}")]
    Worker(String),
}

impl PlanningError {
    /// 超时/取消类错误（"太慢"而非"数据错误"）
    pub fn is_cancellation(&self) -> bool {
        matches!(
            self,
            PlanningError::Cancelled | PlanningError::DeadlineExceeded { .. }
        )
    }

    /// 调用方可以直接重试的错误
    pub fn is_retryable(&self) -> bool {
        self.is_cancellation()
            || matches!(
                self,
                PlanningError::Repository(
                    RepositoryError::LockError(_) | RepositoryError::DatabaseTransactionError(_)
                )
            )
    }
}

// 批量更新中途观察到取消，与计算阶段取消同等对待
impl From<RepositoryError> for PlanningError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Cancelled { .. } => PlanningError::Cancelled,
            other => PlanningError::Repository(other),
        }
    }
}

impl From<AllocationError> for PlanningError {
    fn from(err: AllocationError) -> Self {
        match err {
            AllocationError::Cancelled => PlanningError::Cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_sources_collapse() {
        let from_repo = PlanningError::from(RepositoryError::Cancelled { completed_batches: 1 });
        assert!(matches!(from_repo, PlanningError::Cancelled));

        let from_alloc = PlanningError::from(AllocationError::Cancelled);
        assert!(from_alloc.is_cancellation());
    }

    #[test]
    fn test_retryable_classification() {
        assert!(PlanningError::DeadlineExceeded { deadline_ms: 5 }.is_retryable());
        assert!(PlanningError::from(RepositoryError::LockError("busy".into())).is_retryable());
        assert!(!PlanningError::from(RepositoryError::DatabaseQueryError("syntax".into())).is_retryable());
    }
}
