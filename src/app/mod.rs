// ==========================================
// 配送计划后端 - 应用层
// ==========================================
// 职责: 组装各层实例，供可执行入口使用
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
