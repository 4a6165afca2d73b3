// ==========================================
// 配送计划后端 - 应用状态
// ==========================================
// 职责: 组装仓储、引擎、API 实例，管理共享连接与缓存
// ==========================================

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::api::{OrderApi, ProductApi, RobotApi, SessionCache, SessionResolver};
use crate::cache::TtlCache;
use crate::config::{ConfigManager, PlanningConfigReader};
use crate::db::{ensure_schema, open_sqlite_connection};
use crate::engine::DeliveryOrchestrator;
use crate::repository::{
    OrderRepository, ProductCountCache, ProductRepository, SessionRepository, TransactionRunner,
};

/// 缓存 TTL 上限（秒），配置值超过时截断
pub const MAX_CACHE_TTL_SECS: u64 = 3600;

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 机器人API（配送计划、状态变更）
    pub robot_api: Arc<RobotApi>,

    /// 商品API（列表、下单）
    pub product_api: Arc<ProductApi>,

    /// 订单履历API
    pub order_api: Arc<OrderApi>,

    /// 会话身份解析
    pub session_resolver: Arc<SessionResolver>,

    /// 会话仓储（登录/登出时维护 sessions 表）
    pub session_repo: Arc<SessionRepository>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 说明
    /// 1. 打开共享连接并建表（幂等）
    /// 2. 按配置创建缓存
    /// 3. 初始化Repository、编排器与API
    pub async fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        ensure_schema(&conn).map_err(|e| format!("数据库初始化失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 配置与缓存
        // ==========================================
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法初始化ConfigManager: {}", e))?,
        );

        let product_ttl = config_manager
            .get_product_count_cache_ttl_secs()
            .await
            .map_err(|e| format!("读取缓存配置失败: {}", e))?;
        let session_ttl = config_manager
            .get_session_cache_ttl_secs()
            .await
            .map_err(|e| format!("读取缓存配置失败: {}", e))?;

        let product_count_cache: Arc<ProductCountCache> = Arc::new(TtlCache::new(bounded_ttl(product_ttl)));
        let session_cache: Arc<SessionCache> = Arc::new(TtlCache::new(bounded_ttl(session_ttl)));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let order_repo = Arc::new(OrderRepository::from_connection(conn.clone()));
        let product_repo = Arc::new(ProductRepository::from_connection(
            conn.clone(),
            product_count_cache,
        ));
        let session_repo = Arc::new(SessionRepository::from_connection(conn));
        let tx_runner = Arc::new(TransactionRunner::new(db_path.clone()));

        // ==========================================
        // 初始化Engine层
        // ==========================================
        let orchestrator = Arc::new(DeliveryOrchestrator::new(
            config_manager.clone(),
            tx_runner.clone(),
            order_repo.clone(),
        ));

        // ==========================================
        // 初始化API层
        // ==========================================
        let robot_api = Arc::new(RobotApi::new(orchestrator));
        let product_api = Arc::new(ProductApi::new(product_repo, tx_runner));
        let order_api = Arc::new(OrderApi::new(order_repo));
        let session_resolver = Arc::new(SessionResolver::new(session_repo.clone(), session_cache));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            config_manager,
            robot_api,
            product_api,
            order_api,
            session_resolver,
            session_repo,
        })
    }
}

fn bounded_ttl(secs: u64) -> Duration {
    Duration::from_secs(secs.min(MAX_CACHE_TTL_SECS))
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 DELIVERY_PLANNER_DB_PATH > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("DELIVERY_PLANNER_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./delivery_planner.db");

    if let Some(data_dir) = dirs::data_dir() {
        #[cfg(debug_assertions)]
        let dir = data_dir.join("robot-delivery-planner-dev");

        #[cfg(not(debug_assertions))]
        let dir = data_dir.join("robot-delivery-planner");

        // 目录创建失败时退回当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("delivery_planner.db");
        }
    }

    path.to_string_lossy().to_string()
}
