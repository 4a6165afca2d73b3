// ==========================================
// 配送计划后端 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod error;
pub mod order_repo;
pub mod product_repo;
pub mod session_repo;
pub mod transaction;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use order_repo::{OrderRepository, TransitionReport, DEFAULT_STATUS_BATCH_SIZE};
pub use product_repo::{ProductCountCache, ProductRepository};
pub use session_repo::SessionRepository;
pub use transaction::TransactionRunner;
