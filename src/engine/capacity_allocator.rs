// ==========================================
// 配送计划后端 - 装载容量分配引擎
// ==========================================
// 职责: 在机器人载重上限内选出总价值最大的订单子集（0/1 背包）
// 输入: 待发货订单列表 + 容量 + 取消信号
// 输出: 被选订单（按 order_id 升序）
// ==========================================
// 规则:
// 1) 重量 <= 0 的订单不占容量，无条件装载
// 2) n * C 不超过表格上限时用动态规划求精确解，否则用价值密度贪心
// 3) 计算过程可被取消，取消后不返回任何部分结果
// ==========================================

use crate::domain::order::PlanningOrder;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

/// 动态规划表格单元上限（n * C），同时是可配置值的硬上限
pub const DEFAULT_MAX_CELLS: u64 = 5_000_000;

/// 动态规划内层循环检查取消信号的步长
pub const DEFAULT_CANCEL_CHECK_EVERY: u64 = 4096;

// ==========================================
// AllocatorLimits - 求解器选择与取消检查参数
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocatorLimits {
    pub max_cells: u64,          // n * C 超过该值时改用贪心
    pub cancel_check_every: u64, // 动态规划每多少步检查一次取消
}

impl Default for AllocatorLimits {
    fn default() -> Self {
        Self {
            max_cells: DEFAULT_MAX_CELLS,
            cancel_check_every: DEFAULT_CANCEL_CHECK_EVERY,
        }
    }
}

// ==========================================
// SolverKind - 实际使用的求解方式
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolverKind {
    Trivial, // 容量为 0 或没有占容量的订单，无需优化
    Exact,   // 动态规划精确解
    Greedy,  // 价值密度贪心近似
}

impl fmt::Display for SolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverKind::Trivial => write!(f, "TRIVIAL"),
            SolverKind::Exact => write!(f, "EXACT"),
            SolverKind::Greedy => write!(f, "GREEDY"),
        }
    }
}

/// 分配结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub selected: Vec<PlanningOrder>, // 按 order_id 升序，含零重量订单
    pub solver: SolverKind,
}

/// 分配错误（唯一失败原因是调用方取消）
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationError {
    #[error("装载计算已取消")]
    Cancelled,
}

// ==========================================
// CapacityAllocator - 容量分配引擎
// ==========================================
// 无状态引擎，不做 I/O，只在取消检查点观察外部信号
#[derive(Debug, Clone, Copy, Default)]
pub struct CapacityAllocator {
    limits: AllocatorLimits,
}

impl CapacityAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: AllocatorLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> AllocatorLimits {
        self.limits
    }

    /// 根据表格规模选择求解器
    ///
    /// # 参数
    /// - weighted_count: 重量 > 0 的订单数
    /// - capacity: 容量
    pub fn choose_solver(&self, weighted_count: usize, capacity: i64) -> SolverKind {
        if weighted_count == 0 || capacity <= 0 {
            return SolverKind::Trivial;
        }
        if usize::try_from(capacity).is_err() {
            return SolverKind::Greedy;
        }
        // 配置值不得突破默认上限，动态规划表格需整块分配
        let budget = self.limits.max_cells.min(DEFAULT_MAX_CELLS);
        match (weighted_count as u64).checked_mul(capacity as u64) {
            Some(cells) if cells <= budget => SolverKind::Exact,
            _ => SolverKind::Greedy,
        }
    }

    /// 计算装载方案
    ///
    /// # 参数
    /// - orders: 候选订单（只读快照）
    /// - capacity: 机器人载重上限
    /// - cancel: 取消信号
    ///
    /// # 返回
    /// - Ok(Allocation): 被选订单，总重量不超过容量（零重量订单除外不占容量）
    /// - Err(AllocationError::Cancelled): 计算过程中观察到取消
    #[instrument(skip(self, orders, cancel), fields(order_count = orders.len()))]
    pub fn allocate(
        &self,
        orders: &[PlanningOrder],
        capacity: i64,
        cancel: &CancellationToken,
    ) -> Result<Allocation, AllocationError> {
        if cancel.is_cancelled() {
            return Err(AllocationError::Cancelled);
        }

        let (weightless, weighted): (Vec<PlanningOrder>, Vec<PlanningOrder>) =
            orders.iter().copied().partition(PlanningOrder::is_weightless);

        let solver = self.choose_solver(weighted.len(), capacity);
        debug!(
            weightless_count = weightless.len(),
            weighted_count = weighted.len(),
            solver = %solver,
            "选择求解器"
        );

        let mut selected = match solver {
            SolverKind::Trivial => Vec::new(),
            SolverKind::Greedy => solve_greedy(&weighted, capacity, cancel)?,
            SolverKind::Exact => {
                // choose_solver 已确认 capacity 可转为 usize
                let capacity = usize::try_from(capacity).unwrap_or(0);
                solve_exact(&weighted, capacity, self.limits.cancel_check_every, cancel)?
            }
        };

        selected.extend(weightless);
        selected.sort_by_key(|o| o.order_id);

        Ok(Allocation { selected, solver })
    }
}

/// 价值密度贪心：按 value / weight 降序（稳定排序），能装就装
///
/// 每处理一个订单检查一次取消信号。
fn solve_greedy(
    orders: &[PlanningOrder],
    capacity: i64,
    cancel: &CancellationToken,
) -> Result<Vec<PlanningOrder>, AllocationError> {
    let mut ranked: Vec<(f64, PlanningOrder)> = orders
        .iter()
        .map(|o| (o.value as f64 / o.weight as f64, *o))
        .collect();
    ranked.sort_by(|a, b| b.0.total_cmp(&a.0));

    let mut remaining = capacity;
    let mut selected = Vec::new();
    for (_, order) in ranked {
        if cancel.is_cancelled() {
            return Err(AllocationError::Cancelled);
        }
        if order.weight <= remaining {
            remaining -= order.weight;
            selected.push(order);
        }
    }

    Ok(selected)
}

/// 0/1 背包动态规划
///
/// - 容量从 C 倒序遍历到 w，保证每个订单最多使用一次
/// - 只有严格更优（`>`）时才记录选入，价值相同保留先处理的组合
/// - 取最大价值对应的最小容量，再从最后一个订单向前回溯
fn solve_exact(
    orders: &[PlanningOrder],
    capacity: usize,
    cancel_check_every: u64,
    cancel: &CancellationToken,
) -> Result<Vec<PlanningOrder>, AllocationError> {
    let n = orders.len();
    let width = capacity + 1;
    let check_every = cancel_check_every.max(1);

    let mut dp = vec![0i64; width];
    let mut keep = vec![false; n * width];
    let mut steps: u64 = 0;

    for (i, order) in orders.iter().enumerate() {
        let w = match usize::try_from(order.weight) {
            Ok(w) if w <= capacity => w,
            _ => continue,
        };
        let row = &mut keep[i * width..(i + 1) * width];

        for c in (w..=capacity).rev() {
            steps += 1;
            if steps % check_every == 0 && cancel.is_cancelled() {
                return Err(AllocationError::Cancelled);
            }

            let candidate = dp[c - w].saturating_add(order.value);
            if candidate > dp[c] {
                dp[c] = candidate;
                row[c] = true;
            }
        }
    }

    let mut best_value = 0i64;
    let mut best_capacity = 0usize;
    for (c, &value) in dp.iter().enumerate() {
        if value > best_value {
            best_value = value;
            best_capacity = c;
        }
    }

    let mut selected = Vec::new();
    let mut c = best_capacity;
    for i in (0..n).rev() {
        if c == 0 {
            break;
        }
        if keep[i * width + c] {
            selected.push(orders[i]);
            c -= orders[i].weight as usize;
        }
    }

    debug!(best_value, best_capacity, steps, "动态规划求解完成");
    Ok(selected)
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;

    fn order(order_id: i64, weight: i64, value: i64) -> PlanningOrder {
        PlanningOrder::new(order_id, weight, value)
    }

    fn ids(allocation: &Allocation) -> Vec<i64> {
        allocation.selected.iter().map(|o| o.order_id).collect()
    }

    fn totals(selected: &[PlanningOrder]) -> (i64, i64) {
        selected
            .iter()
            .fold((0, 0), |(w, v), o| (w + o.weight, v + o.value))
    }

    /// 小规模穷举最优值
    fn brute_force_best(orders: &[PlanningOrder], capacity: i64) -> i64 {
        let mut best = 0;
        for mask in 0u32..(1 << orders.len()) {
            let (mut w, mut v) = (0, 0);
            for (i, o) in orders.iter().enumerate() {
                if mask & (1 << i) != 0 {
                    w += o.weight;
                    v += o.value;
                }
            }
            if w <= capacity && v > best {
                best = v;
            }
        }
        best
    }

    /// 确定性伪随机序列（线性同余）
    fn lcg_orders(seed: u64, n: usize, max_weight: u64, max_value: u64) -> Vec<PlanningOrder> {
        let mut state = seed;
        let mut next = move || {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            state >> 33
        };
        (0..n)
            .map(|i| {
                let weight = (next() % max_weight) as i64 + 1;
                let value = (next() % max_value) as i64;
                order(i as i64 + 1, weight, value)
            })
            .collect()
    }

    #[test]
    fn test_example_selects_highest_value_pair() {
        let orders = vec![order(1, 2, 10), order(2, 3, 15), order(3, 0, 5)];
        let allocation = CapacityAllocator::new()
            .allocate(&orders, 4, &CancellationToken::new())
            .unwrap();

        assert_eq!(allocation.solver, SolverKind::Exact);
        assert_eq!(ids(&allocation), vec![2, 3]);
        assert_eq!(totals(&allocation.selected), (3, 20));
    }

    #[test]
    fn test_zero_capacity_with_positive_weights_is_empty() {
        let orders = vec![order(1, 2, 10), order(2, 3, 15)];
        let allocation = CapacityAllocator::new()
            .allocate(&orders, 0, &CancellationToken::new())
            .unwrap();

        assert_eq!(allocation.solver, SolverKind::Trivial);
        assert!(allocation.selected.is_empty());
    }

    #[test]
    fn test_weightless_orders_always_included() {
        let orders = vec![order(5, 0, 1), order(1, 100, 50), order(3, -2, 4)];
        let token = CancellationToken::new();

        for capacity in [0, 1, 99, 100] {
            let allocation = CapacityAllocator::new().allocate(&orders, capacity, &token).unwrap();
            assert!(ids(&allocation).contains(&5), "capacity={}", capacity);
            assert!(ids(&allocation).contains(&3), "capacity={}", capacity);
        }

        let allocation = CapacityAllocator::new().allocate(&orders, 100, &token).unwrap();
        assert_eq!(ids(&allocation), vec![1, 3, 5]);
    }

    #[test]
    fn test_empty_input() {
        let allocation = CapacityAllocator::new()
            .allocate(&[], 10, &CancellationToken::new())
            .unwrap();
        assert!(allocation.selected.is_empty());
    }

    #[test]
    fn test_exact_matches_brute_force() {
        let token = CancellationToken::new();
        let allocator = CapacityAllocator::new();

        for seed in 0..40u64 {
            let orders = lcg_orders(seed, 12, 15, 40);
            let capacity = (seed as i64 % 30) + 1;

            let allocation = allocator.allocate(&orders, capacity, &token).unwrap();
            let (weight, value) = totals(&allocation.selected);

            assert_eq!(allocation.solver, SolverKind::Exact);
            assert!(weight <= capacity, "seed={} weight={} capacity={}", seed, weight, capacity);
            assert_eq!(value, brute_force_best(&orders, capacity), "seed={}", seed);
        }
    }

    #[test]
    fn test_exact_is_deterministic() {
        let orders = lcg_orders(7, 30, 20, 100);
        let allocator = CapacityAllocator::new();
        let token = CancellationToken::new();

        let first = allocator.allocate(&orders, 57, &token).unwrap();
        let second = allocator.allocate(&orders, 57, &token).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_exact_keeps_earlier_combination_on_tie() {
        // 两个订单价值相同，先处理的订单保留
        let orders = vec![order(1, 3, 10), order(2, 3, 10)];
        let allocation = CapacityAllocator::new()
            .allocate(&orders, 3, &CancellationToken::new())
            .unwrap();
        assert_eq!(ids(&allocation), vec![1]);
    }

    #[test]
    fn test_exact_does_not_reuse_an_order() {
        let orders = vec![order(1, 1, 10)];
        let allocation = CapacityAllocator::new()
            .allocate(&orders, 5, &CancellationToken::new())
            .unwrap();
        assert_eq!(totals(&allocation.selected), (1, 10));
    }

    #[test]
    fn test_solver_threshold() {
        let allocator = CapacityAllocator::with_limits(AllocatorLimits {
            max_cells: 100,
            cancel_check_every: DEFAULT_CANCEL_CHECK_EVERY,
        });
        assert_eq!(allocator.choose_solver(10, 10), SolverKind::Exact);
        assert_eq!(allocator.choose_solver(10, 11), SolverKind::Greedy);
        assert_eq!(allocator.choose_solver(0, 11), SolverKind::Trivial);
        assert_eq!(allocator.choose_solver(10, 0), SolverKind::Trivial);
        assert_eq!(
            CapacityAllocator::new().choose_solver(usize::MAX, i64::MAX),
            SolverKind::Greedy
        );
    }

    #[test]
    fn test_oversized_cell_budget_is_capped() {
        let allocator = CapacityAllocator::with_limits(AllocatorLimits {
            max_cells: u64::MAX,
            cancel_check_every: DEFAULT_CANCEL_CHECK_EVERY,
        });
        assert_eq!(allocator.choose_solver(2, i64::MAX / 2), SolverKind::Greedy);
        assert_eq!(allocator.choose_solver(1, DEFAULT_MAX_CELLS as i64), SolverKind::Exact);
        assert_eq!(allocator.choose_solver(1, DEFAULT_MAX_CELLS as i64 + 1), SolverKind::Greedy);

        let orders = vec![order(1, 3, 7), order(2, 4, 9)];
        let allocation = allocator
            .allocate(&orders, i64::MAX / 2, &CancellationToken::new())
            .unwrap();
        assert_eq!(allocation.solver, SolverKind::Greedy);
        assert_eq!(ids(&allocation), vec![1, 2]);
        assert_eq!(totals(&allocation.selected), (7, 16));
    }

    #[test]
    fn test_greedy_is_feasible_lower_bound() {
        let token = CancellationToken::new();
        let exact = CapacityAllocator::with_limits(AllocatorLimits {
            max_cells: u64::MAX,
            cancel_check_every: DEFAULT_CANCEL_CHECK_EVERY,
        });
        let greedy = CapacityAllocator::with_limits(AllocatorLimits {
            max_cells: 0,
            cancel_check_every: DEFAULT_CANCEL_CHECK_EVERY,
        });

        for seed in 100..130u64 {
            let orders = lcg_orders(seed, 25, 30, 90);
            let capacity = 40 + seed as i64 % 50;

            let g = greedy.allocate(&orders, capacity, &token).unwrap();
            let e = exact.allocate(&orders, capacity, &token).unwrap();
            assert_eq!(g.solver, SolverKind::Greedy);
            assert_eq!(e.solver, SolverKind::Exact);

            let (g_weight, g_value) = totals(&g.selected);
            let (_, e_value) = totals(&e.selected);
            assert!(g_weight <= capacity, "seed={}", seed);
            assert!(g_value >= 0 && g_value <= e_value, "seed={}", seed);
        }
    }

    #[test]
    fn test_greedy_prefers_value_density() {
        let greedy = CapacityAllocator::with_limits(AllocatorLimits {
            max_cells: 0,
            cancel_check_every: DEFAULT_CANCEL_CHECK_EVERY,
        });
        // 密度: 1 → 5.0, 2 → 2.0, 3 → 1.0
        let orders = vec![order(1, 2, 10), order(2, 5, 10), order(3, 3, 3)];
        let allocation = greedy.allocate(&orders, 5, &CancellationToken::new()).unwrap();
        assert_eq!(ids(&allocation), vec![1, 3]);
    }

    #[test]
    fn test_cancelled_before_start() {
        let token = CancellationToken::new();
        token.cancel();
        let err = CapacityAllocator::new()
            .allocate(&[order(1, 1, 1)], 10, &token)
            .unwrap_err();
        assert_eq!(err, AllocationError::Cancelled);
    }

    #[test]
    fn test_exact_checks_cancel_at_step_cadence() {
        let token = CancellationToken::new();
        token.cancel();

        // 10 * 1000 步 > 4096：在检查点观察到取消
        let big = lcg_orders(3, 10, 5, 10);
        assert_eq!(
            solve_exact(&big, 1000, DEFAULT_CANCEL_CHECK_EVERY, &token),
            Err(AllocationError::Cancelled)
        );

        // 总步数不足一个检查周期：直接完成
        let small = vec![order(1, 1, 3), order(2, 2, 4)];
        assert!(solve_exact(&small, 3, DEFAULT_CANCEL_CHECK_EVERY, &token).is_ok());
    }

    #[test]
    fn test_greedy_checks_cancel_per_order() {
        let token = CancellationToken::new();
        token.cancel();
        assert_eq!(
            solve_greedy(&[order(1, 1, 1)], 10, &token),
            Err(AllocationError::Cancelled)
        );
    }
}
