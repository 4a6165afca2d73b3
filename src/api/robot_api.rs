// ==========================================
// 配送计划后端 - 机器人 API
// ==========================================
// 职责: 生成配送计划、单笔订单状态变更
// 入口校验: robot_id 非空、capacity 非负
// ==========================================

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::plan::DeliveryPlan;
use crate::domain::types::ShippedStatus;
use crate::engine::orchestrator::DeliveryOrchestrator;

/// 机器人API
pub struct RobotApi {
    orchestrator: Arc<DeliveryOrchestrator<ConfigManager>>,
}

impl RobotApi {
    pub fn new(orchestrator: Arc<DeliveryOrchestrator<ConfigManager>>) -> Self {
        Self { orchestrator }
    }

    /// 生成配送计划
    ///
    /// # 参数
    /// - robot_id: 机器人标识（不能为空）
    /// - capacity: 载重上限（0 合法，返回只含零重量订单的计划）
    ///
    /// # 返回
    /// - Ok(DeliveryPlan): 计划中的订单均已变为"配送中"
    /// - Err(ApiError::Timeout / Cancelled): 未修改任何订单，可重试
    pub async fn generate_delivery_plan(
        &self,
        robot_id: &str,
        capacity: i64,
    ) -> ApiResult<DeliveryPlan> {
        self.generate_delivery_plan_with_cancel(robot_id, capacity, &CancellationToken::new())
            .await
    }

    /// 生成配送计划（调用方断开时可取消）
    pub async fn generate_delivery_plan_with_cancel(
        &self,
        robot_id: &str,
        capacity: i64,
        cancel: &CancellationToken,
    ) -> ApiResult<DeliveryPlan> {
        let robot_id = robot_id.trim();
        if robot_id.is_empty() {
            return Err(ApiError::InvalidInput("robot_id不能为空".to_string()));
        }
        if capacity < 0 {
            return Err(ApiError::InvalidInput(format!(
                "capacity不能为负数: {}",
                capacity
            )));
        }

        debug!(robot_id, capacity, "收到配送计划请求");
        Ok(self
            .orchestrator
            .generate_delivery_plan_with_cancel(robot_id, capacity, cancel)
            .await?)
    }

    /// 单笔订单状态变更
    pub async fn update_order_status(
        &self,
        order_id: i64,
        new_status: ShippedStatus,
    ) -> ApiResult<()> {
        if order_id <= 0 {
            return Err(ApiError::InvalidInput(format!("无效的订单ID: {}", order_id)));
        }
        Ok(self
            .orchestrator
            .update_order_status(order_id, new_status)
            .await?)
    }
}
