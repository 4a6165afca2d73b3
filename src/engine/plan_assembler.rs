// ==========================================
// 配送计划后端 - 配送计划组装
// ==========================================
// 职责: 将分配结果包装为 DeliveryPlan（机器人标识 + 订单 + 汇总）
// ==========================================

use crate::domain::order::PlanningOrder;
use crate::domain::plan::DeliveryPlan;

#[derive(Debug, Clone, Copy, Default)]
pub struct PlanAssembler {
    // 无状态
}

impl PlanAssembler {
    pub fn new() -> Self {
        Self {}
    }

    /// 组装配送计划，汇总值由被选订单重新累加
    pub fn assemble(&self, robot_id: &str, selected: Vec<PlanningOrder>) -> DeliveryPlan {
        let (total_weight, total_value) = selected.iter().fold((0i64, 0i64), |(w, v), o| {
            (w.saturating_add(o.weight), v.saturating_add(o.value))
        });

        DeliveryPlan {
            robot_id: robot_id.to_string(),
            orders: selected,
            total_weight,
            total_value,
        }
    }
}
