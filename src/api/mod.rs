// ==========================================
// 配送计划后端 - API 层
// ==========================================
// 职责: 入口参数校验 + 错误转换，业务逻辑在 engine/repository
// ==========================================

pub mod error;
pub mod order_api;
pub mod product_api;
pub mod robot_api;
pub mod session_resolver;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use order_api::OrderApi;
pub use product_api::ProductApi;
pub use robot_api::RobotApi;
pub use session_resolver::{SessionCache, SessionResolver};
