// ==========================================
// 配送计划后端 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod listing;
pub mod order;
pub mod plan;
pub mod product;
pub mod types;

// 重导出核心类型
pub use listing::{ListQuery, Page};
pub use order::{OrderLine, OrderSummary, PlanningOrder};
pub use plan::DeliveryPlan;
pub use product::Product;
pub use types::{OrderSortField, ProductSortField, SearchType, ShippedStatus, SortOrder};
