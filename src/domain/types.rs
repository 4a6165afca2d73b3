// ==========================================
// 配送计划后端 - 领域类型定义
// ==========================================
// 职责: 订单生命周期状态、列表查询的排序/检索枚举
// 约束: 所有可排序字段均为枚举白名单，禁止拼接调用方字符串
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 订单配送状态 (Shipped Status)
// ==========================================
// 生命周期: 待发货 → 配送中 → 已送达
// 序列化格式与 orders.shipped_status 列一致
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShippedStatus {
    #[serde(rename = "shipping")]
    AwaitingShipment, // 待发货（可参与装载计划）
    #[serde(rename = "delivering")]
    InTransit, // 配送中（已装载到机器人）
    #[serde(rename = "completed")]
    Delivered, // 已送达
    #[serde(rename = "returned")]
    Returned, // 已退回（不在计划核心范围内）
}

impl ShippedStatus {
    /// 从数据库字符串解析（未知值返回 None）
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.trim() {
            "shipping" => Some(ShippedStatus::AwaitingShipment),
            "delivering" => Some(ShippedStatus::InTransit),
            "completed" => Some(ShippedStatus::Delivered),
            "returned" => Some(ShippedStatus::Returned),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ShippedStatus::AwaitingShipment => "shipping",
            ShippedStatus::InTransit => "delivering",
            ShippedStatus::Delivered => "completed",
            ShippedStatus::Returned => "returned",
        }
    }

    /// 是否可以参与装载计划
    pub fn is_eligible_for_planning(&self) -> bool {
        *self == ShippedStatus::AwaitingShipment
    }
}

impl fmt::Display for ShippedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 排序方向 (Sort Order)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// 宽松解析：仅 "desc"（不区分大小写）视为降序，其余一律升序
    pub fn from_str_lenient(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("desc") {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        }
    }

    pub fn to_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }

    pub fn is_desc(&self) -> bool {
        *self == SortOrder::Desc
    }
}

// ==========================================
// 检索方式 (Search Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchType {
    #[default]
    Partial, // 部分匹配
    Prefix,  // 前缀匹配
}

impl SearchType {
    pub fn from_str_lenient(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "prefix" => SearchType::Prefix,
            _ => SearchType::Partial,
        }
    }

    /// 判断名称是否命中检索词（空检索词视为全部命中）
    pub fn matches(&self, haystack: &str, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }
        match self {
            SearchType::Prefix => haystack.starts_with(needle),
            SearchType::Partial => haystack.contains(needle),
        }
    }
}

// ==========================================
// 订单履历排序字段（白名单）
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderSortField {
    #[default]
    OrderId,
    ProductName,
    CreatedAt,
    ShippedStatus,
    ArrivedAt,
}

impl OrderSortField {
    /// 解析调用方传入的字段名，未知字段回退到 order_id
    pub fn from_str_lenient(s: &str) -> Self {
        match s.trim() {
            "product_name" => OrderSortField::ProductName,
            "created_at" => OrderSortField::CreatedAt,
            "shipped_status" => OrderSortField::ShippedStatus,
            "arrived_at" => OrderSortField::ArrivedAt,
            _ => OrderSortField::OrderId,
        }
    }
}

// ==========================================
// 商品列表排序字段（白名单）
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSortField {
    #[default]
    ProductId,
    Name,
    Value,
    Weight,
}

impl ProductSortField {
    pub fn from_str_lenient(s: &str) -> Self {
        match s.trim() {
            "name" => ProductSortField::Name,
            "value" => ProductSortField::Value,
            "weight" => ProductSortField::Weight,
            _ => ProductSortField::ProductId,
        }
    }

    /// 映射为固定的 SQL 列名
    pub fn to_column(&self) -> &'static str {
        match self {
            ProductSortField::ProductId => "product_id",
            ProductSortField::Name => "name",
            ProductSortField::Value => "value",
            ProductSortField::Weight => "weight",
        }
    }
}
