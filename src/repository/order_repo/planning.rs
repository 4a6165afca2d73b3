use super::OrderRepository;
use crate::domain::order::PlanningOrder;
use crate::domain::types::ShippedStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, ToSql};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// 单条 UPDATE 语句携带的订单ID上限
pub const DEFAULT_STATUS_BATCH_SIZE: usize = 1000;

/// 分批状态变更结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransitionReport {
    pub batches: usize,       // 执行的 UPDATE 语句数
    pub rows_affected: usize, // 实际更新的行数
}

impl OrderRepository {
    /// 读取全部待发货订单（不分页）
    ///
    /// 必须在计划事务内调用：装载优化需要看到完整的候选集合。
    /// 结果按 order_id 升序，保证相同数据下计划结果确定。
    pub fn fetch_eligible_orders(conn: &Connection) -> RepositoryResult<Vec<PlanningOrder>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT
                o.order_id,
                p.weight,
                p.value
            FROM orders o
            JOIN products p ON o.product_id = p.product_id
            WHERE o.shipped_status = ?1
            ORDER BY o.order_id
            "#,
        )?;

        let orders = stmt
            .query_map(params![ShippedStatus::AwaitingShipment.to_db_str()], |row| {
                Ok(PlanningOrder {
                    order_id: row.get(0)?,
                    weight: row.get(1)?,
                    value: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        debug!(eligible_count = orders.len(), "读取待发货订单");
        Ok(orders)
    }

    /// 分批更新订单状态
    ///
    /// # 参数
    /// - conn: 外层事务（批次之间不提交）
    /// - order_ids: 订单ID列表（可达数千条）
    /// - new_status: 目标状态
    /// - batch_size: 每条 UPDATE 携带的ID数（0 按默认值处理）
    /// - cancel: 可选取消信号，在批次之间检查
    ///
    /// # 说明
    /// - 任一批次失败立即返回错误，由调用方回滚整个事务
    /// - 空列表不执行任何语句
    pub fn apply_status_transition(
        conn: &Connection,
        order_ids: &[i64],
        new_status: ShippedStatus,
        batch_size: usize,
        cancel: Option<&CancellationToken>,
    ) -> RepositoryResult<TransitionReport> {
        let mut report = TransitionReport::default();
        if order_ids.is_empty() {
            return Ok(report);
        }

        let batch_size = if batch_size == 0 {
            DEFAULT_STATUS_BATCH_SIZE
        } else {
            batch_size
        };
        let status_str = new_status.to_db_str();

        for chunk in order_ids.chunks(batch_size) {
            if cancel.is_some_and(|token| token.is_cancelled()) {
                return Err(RepositoryError::Cancelled {
                    completed_batches: report.batches,
                });
            }

            let placeholders = (0..chunk.len())
                .map(|i| format!("?{}", i + 2))
                .collect::<Vec<_>>()
                .join(", ");
            let sql = format!(
                "UPDATE orders SET shipped_status = ?1 WHERE order_id IN ({})",
                placeholders
            );

            let mut params_vec: Vec<&dyn ToSql> = Vec::with_capacity(chunk.len() + 1);
            params_vec.push(&status_str);
            params_vec.extend(chunk.iter().map(|id| id as &dyn ToSql));

            let affected = conn.execute(&sql, params_vec.as_slice())?;
            report.batches += 1;
            report.rows_affected += affected;
        }

        debug!(
            status = status_str,
            batches = report.batches,
            rows_affected = report.rows_affected,
            "订单状态分批更新完成"
        );
        Ok(report)
    }
}
