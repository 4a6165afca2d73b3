// ==========================================
// 配送计划后端 - 截止时间执行器
// ==========================================
// 职责: 在阻塞线程上执行一段工作，超过截止时间即发出取消信号
// 约束: 超时后等待工作线程结束（事务回滚完成）才返回
// 约束: 工作线程在取消前已提交的结果照常返回，
//       避免订单已变为"配送中"而调用方拿不到计划
// ==========================================

use crate::engine::error::PlanningError;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// 带截止时间执行阻塞工作
///
/// # 参数
/// - deadline: 截止时长
/// - parent: 调用方取消信号（取消时返回 PlanningError::Cancelled）
/// - work: 阻塞工作，接收本次执行专用的子取消信号
///
/// # 返回
/// - Ok(T): 工作完成
/// - Err(PlanningError::DeadlineExceeded): 超时且工作已因取消而放弃
/// - Err(PlanningError::Cancelled): 调用方取消
pub async fn with_deadline<T, F>(
    deadline: Duration,
    parent: &CancellationToken,
    work: F,
) -> Result<T, PlanningError>
where
    F: FnOnce(CancellationToken) -> Result<T, PlanningError> + Send + 'static,
    T: Send + 'static,
{
    let token = parent.child_token();
    let worker_token = token.clone();
    let mut handle = tokio::task::spawn_blocking(move || work(worker_token));

    match tokio::time::timeout(deadline, &mut handle).await {
        Ok(joined) => joined.map_err(|e| PlanningError::Worker(e.to_string()))?,
        Err(_) => {
            let deadline_ms = u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX);
            warn!(deadline_ms, "已超过截止时间，发出取消信号");
            token.cancel();

            match handle.await {
                Ok(Ok(value)) => {
                    warn!(deadline_ms, "取消前事务已提交，返回已提交结果");
                    Ok(value)
                }
                Ok(Err(PlanningError::Cancelled)) if !parent.is_cancelled() => {
                    Err(PlanningError::DeadlineExceeded { deadline_ms })
                }
                Ok(Err(err)) => Err(err),
                Err(join_err) => Err(PlanningError::Worker(join_err.to_string())),
            }
        }
    }
}
