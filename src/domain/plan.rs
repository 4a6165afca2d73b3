// ==========================================
// 配送计划后端 - 配送计划领域模型
// ==========================================
// 生命周期: 每次计划请求构造一次，返回给调用方，不单独落库
// 唯一持久化效果: 被选订单的状态变更为"配送中"
// ==========================================

use crate::domain::order::PlanningOrder;
use serde::{Deserialize, Serialize};

// ==========================================
// DeliveryPlan - 配送计划
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryPlan {
    pub robot_id: String,            // 机器人标识（不透明字符串）
    pub orders: Vec<PlanningOrder>,  // 被选订单（按 order_id 升序）
    pub total_weight: i64,           // 总重量
    pub total_value: i64,            // 总价值
}

impl DeliveryPlan {
    /// 空计划（容量为 0 或无可配送订单）
    pub fn empty(robot_id: impl Into<String>) -> Self {
        Self {
            robot_id: robot_id.into(),
            orders: Vec::new(),
            total_weight: 0,
            total_value: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// 被选订单ID列表（用于状态变更）
    pub fn order_ids(&self) -> Vec<i64> {
        self.orders.iter().map(|o| o.order_id).collect()
    }
}
