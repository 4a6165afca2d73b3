// ==========================================
// 配送计划后端 - 订单领域模型
// ==========================================
// 职责: 订单的计划视图、履历视图、下单明细
// ==========================================

use crate::domain::types::ShippedStatus;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// PlanningOrder - 参与装载计划的订单
// ==========================================
// 重量/价值取自订单对应商品，计划期间只读
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlanningOrder {
    pub order_id: i64, // 订单ID
    pub weight: i64,   // 重量（占用容量）
    pub value: i64,    // 价值（优化目标）
}

impl PlanningOrder {
    pub fn new(order_id: i64, weight: i64, value: i64) -> Self {
        Self {
            order_id,
            weight,
            value,
        }
    }

    /// 不占用容量的订单（无条件装载）
    pub fn is_weightless(&self) -> bool {
        self.weight <= 0
    }
}

// ==========================================
// OrderSummary - 订单履历行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub order_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub shipped_status: ShippedStatus,
    pub created_at: NaiveDateTime,
    pub arrived_at: Option<NaiveDateTime>, // 送达时间（未送达为空）
}

// ==========================================
// OrderLine - 下单明细
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: i64,
    pub quantity: u32, // 每件生成一条订单
}
