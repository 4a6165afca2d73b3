// ==========================================
// 配送计划后端 - 计划配置读取 Trait
// ==========================================
// 职责: 定义计划引擎所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use async_trait::async_trait;
use std::error::Error;

/// 配置读取结果（错误需可跨线程传递，计划请求运行在多线程运行时上）
pub type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

// ==========================================
// PlanningConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait PlanningConfigReader: Send + Sync {
    /// 单次计划请求的截止时间（毫秒）
    ///
    /// # 默认值
    /// - 10000
    async fn get_planning_deadline_ms(&self) -> ConfigResult<u64>;

    /// 精确解（动态规划）允许的最大表格单元数 n * C
    ///
    /// 超过该值时改用贪心近似
    ///
    /// # 默认值
    /// - 5000000
    async fn get_dp_max_cells(&self) -> ConfigResult<u64>;

    /// 动态规划内层循环每多少步检查一次取消信号
    ///
    /// # 默认值
    /// - 4096
    async fn get_dp_cancel_check_every(&self) -> ConfigResult<u64>;

    /// 状态变更每批订单数
    ///
    /// # 默认值
    /// - 1000
    async fn get_status_batch_size(&self) -> ConfigResult<usize>;

    /// 商品总数缓存 TTL（秒）
    ///
    /// # 默认值
    /// - 60
    async fn get_product_count_cache_ttl_secs(&self) -> ConfigResult<u64>;

    /// 会话身份缓存 TTL（秒）
    ///
    /// # 默认值
    /// - 60
    async fn get_session_cache_ttl_secs(&self) -> ConfigResult<u64>;
}
