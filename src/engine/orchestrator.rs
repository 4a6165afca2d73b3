// ==========================================
// 配送计划后端 - 计划编排器
// ==========================================
// 用途: 将一次机器人计划请求编排为单个带截止时间的事务
// 流程:
//   截止时间 → 开启事务 → 读取全部待发货订单 → 容量分配 → 组装计划
//   → 计划非空时分批变更为"配送中" → 提交
// 任一步骤失败（含取消）整体回滚：
//   不会有订单变为"配送中"却不在返回的计划里
// ==========================================

use crate::config::PlanningConfigReader;
use crate::domain::plan::DeliveryPlan;
use crate::domain::types::ShippedStatus;
use crate::engine::capacity_allocator::{AllocatorLimits, CapacityAllocator, SolverKind};
use crate::engine::deadline::with_deadline;
use crate::engine::error::PlanningError;
use crate::engine::plan_assembler::PlanAssembler;
use crate::perf::PerfGuard;
use crate::repository::error::RepositoryError;
use crate::repository::{OrderRepository, TransitionReport, TransactionRunner};
use rusqlite::Connection;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn, Span};
use uuid::Uuid;

// ==========================================
// PlanningSettings - 单次请求的运行参数
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanningSettings {
    pub deadline: Duration,
    pub limits: AllocatorLimits,
    pub status_batch_size: usize,
}

impl PlanningSettings {
    /// 从配置读取（每次请求读取一次，配置变更无需重启）
    pub async fn load<C>(config: &C) -> Result<Self, PlanningError>
    where
        C: PlanningConfigReader + ?Sized,
    {
        let deadline_ms = config
            .get_planning_deadline_ms()
            .await
            .map_err(|e| PlanningError::Config(e.to_string()))?;
        let max_cells = config
            .get_dp_max_cells()
            .await
            .map_err(|e| PlanningError::Config(e.to_string()))?;
        let cancel_check_every = config
            .get_dp_cancel_check_every()
            .await
            .map_err(|e| PlanningError::Config(e.to_string()))?;
        let status_batch_size = config
            .get_status_batch_size()
            .await
            .map_err(|e| PlanningError::Config(e.to_string()))?;

        Ok(Self {
            deadline: Duration::from_millis(deadline_ms),
            limits: AllocatorLimits {
                max_cells,
                cancel_check_every,
            },
            status_batch_size,
        })
    }
}

/// 事务内计划结果（含日志用的附加信息）
struct PlannedDelivery {
    plan: DeliveryPlan,
    solver: SolverKind,
    eligible_count: usize,
    report: TransitionReport,
}

// ==========================================
// DeliveryOrchestrator - 计划编排器
// ==========================================
pub struct DeliveryOrchestrator<C>
where
    C: PlanningConfigReader,
{
    config: Arc<C>,
    tx_runner: Arc<TransactionRunner>,
    order_repo: Arc<OrderRepository>,
    assembler: PlanAssembler,
}

impl<C> DeliveryOrchestrator<C>
where
    C: PlanningConfigReader,
{
    /// 创建新的编排器实例
    ///
    /// # 参数
    /// - config: 配置读取器
    /// - tx_runner: 事务执行器（每次计划独立连接 + 事务）
    /// - order_repo: 订单仓储（单笔状态变更）
    pub fn new(
        config: Arc<C>,
        tx_runner: Arc<TransactionRunner>,
        order_repo: Arc<OrderRepository>,
    ) -> Self {
        Self {
            config,
            tx_runner,
            order_repo,
            assembler: PlanAssembler::new(),
        }
    }

    /// 生成配送计划（使用配置的截止时间）
    pub async fn generate_delivery_plan(
        &self,
        robot_id: &str,
        capacity: i64,
    ) -> Result<DeliveryPlan, PlanningError> {
        self.generate_delivery_plan_with_cancel(robot_id, capacity, &CancellationToken::new())
            .await
    }

    /// 生成配送计划（调用方可随时取消）
    ///
    /// # 参数
    /// - robot_id: 机器人标识
    /// - capacity: 载重上限
    /// - cancel: 调用方取消信号
    ///
    /// # 返回
    /// - Ok(DeliveryPlan): 计划已返回且其中订单均已持久化为"配送中"
    /// - Err(PlanningError): 没有任何订单状态被修改
    #[instrument(skip(self, cancel), fields(request_id = %Uuid::new_v4()))]
    pub async fn generate_delivery_plan_with_cancel(
        &self,
        robot_id: &str,
        capacity: i64,
        cancel: &CancellationToken,
    ) -> Result<DeliveryPlan, PlanningError> {
        let settings = PlanningSettings::load(self.config.as_ref()).await?;
        debug!(
            deadline_ms = settings.deadline.as_millis() as u64,
            max_cells = settings.limits.max_cells,
            status_batch_size = settings.status_batch_size,
            "开始生成配送计划"
        );

        let runner = self.tx_runner.clone();
        let assembler = self.assembler;
        let robot = robot_id.to_string();
        let span = Span::current();

        let outcome = with_deadline(settings.deadline, cancel, move |token| {
            let _entered = span.enter();
            let _perf = PerfGuard::new("plan.generate");
            runner.run(|tx| plan_in_transaction(tx, &robot, capacity, &settings, assembler, &token))
        })
        .await;

        match outcome {
            Ok(planned) => {
                info!(
                    solver = %planned.solver,
                    eligible_count = planned.eligible_count,
                    order_count = planned.plan.orders.len(),
                    total_weight = planned.plan.total_weight,
                    total_value = planned.plan.total_value,
                    batches = planned.report.batches,
                    "配送计划已生成"
                );
                Ok(planned.plan)
            }
            Err(err) => {
                warn!(error = %err, retryable = err.is_retryable(), "配送计划生成失败，事务已回滚");
                Err(err)
            }
        }
    }

    /// 单笔订单状态变更（无计划逻辑，直接透传）
    #[instrument(skip(self))]
    pub async fn update_order_status(
        &self,
        order_id: i64,
        new_status: ShippedStatus,
    ) -> Result<(), PlanningError> {
        let deadline_ms = self
            .config
            .get_planning_deadline_ms()
            .await
            .map_err(|e| PlanningError::Config(e.to_string()))?;

        let repo = self.order_repo.clone();
        with_deadline(
            Duration::from_millis(deadline_ms),
            &CancellationToken::new(),
            move |_token| Ok(repo.update_status(order_id, new_status)?),
        )
        .await?;

        info!(order_id, status = %new_status, "订单状态已更新");
        Ok(())
    }
}

/// 事务内的计划主体
///
/// 返回错误时由 TransactionRunner 回滚，提交前最后检查一次取消信号。
fn plan_in_transaction(
    conn: &Connection,
    robot_id: &str,
    capacity: i64,
    settings: &PlanningSettings,
    assembler: PlanAssembler,
    token: &CancellationToken,
) -> Result<PlannedDelivery, PlanningError> {
    let orders = OrderRepository::fetch_eligible_orders(conn)?;
    let eligible_count = orders.len();

    let allocation = CapacityAllocator::with_limits(settings.limits).allocate(&orders, capacity, token)?;
    let solver = allocation.solver;
    let plan = assembler.assemble(robot_id, allocation.selected);

    let mut report = TransitionReport::default();
    if !plan.is_empty() {
        let order_ids = plan.order_ids();
        report = OrderRepository::apply_status_transition(
            conn,
            &order_ids,
            ShippedStatus::InTransit,
            settings.status_batch_size,
            Some(token),
        )?;

        if report.rows_affected != order_ids.len() {
            return Err(RepositoryError::InternalError(format!(
                "状态变更行数不一致: expected={}, actual={}",
                order_ids.len(),
                report.rows_affected
            ))
            .into());
        }
        debug!(order_count = order_ids.len(), "已将被选订单更新为配送中");
    }

    if token.is_cancelled() {
        return Err(PlanningError::Cancelled);
    }

    Ok(PlannedDelivery {
        plan,
        solver,
        eligible_count,
        report,
    })
}
