// ==========================================
// 配送计划后端 - 商品领域模型
// ==========================================

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: i64,
    pub name: String,
    pub value: i64,
    pub weight: i64,
    pub image: Option<String>,
    pub description: Option<String>,
}
