// ==========================================
// 配送计划后端 - 引擎层
// ==========================================
// 职责: 容量分配、计划组装、截止时间与事务编排
// 红线: Engine 不拼 SQL（SQL 全部在 repository 层）
// ==========================================

pub mod capacity_allocator;
pub mod deadline;
pub mod error;
pub mod orchestrator;
pub mod plan_assembler;

// 重导出核心引擎
pub use capacity_allocator::{
    Allocation, AllocationError, AllocatorLimits, CapacityAllocator, SolverKind,
};
pub use deadline::with_deadline;
pub use error::PlanningError;
pub use orchestrator::{DeliveryOrchestrator, PlanningSettings};
pub use plan_assembler::PlanAssembler;
