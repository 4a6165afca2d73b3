// ==========================================
// 配送计划后端 - 核心库
// ==========================================
// 技术栈: Rust + SQLite + Tokio
// 系统定位: 为配送机器人挑选待发货订单
//           在载重上限内使总价值最大，并原子地标记为"配送中"
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 容量分配与计划编排
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// SQL 性能追踪
pub mod perf;

// 显式 TTL 缓存
pub mod cache;

// API 层 - 业务接口
pub mod api;

// 应用层 - 实例组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{OrderSortField, ProductSortField, SearchType, ShippedStatus, SortOrder};

// 领域实体
pub use domain::{DeliveryPlan, ListQuery, OrderLine, OrderSummary, Page, PlanningOrder, Product};

// 引擎
pub use engine::{CapacityAllocator, DeliveryOrchestrator, PlanAssembler, PlanningError};

// API
pub use api::{ApiError, ApiResult, OrderApi, ProductApi, RobotApi, SessionResolver};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "配送机器人装载计划";
