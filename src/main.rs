// ==========================================
// 配送计划后端 - 命令行入口
// ==========================================
// 用法:
//   delivery-planner <robot_id> <capacity> [db_path]
// 生成一次配送计划并以 JSON 输出到标准输出
// ==========================================

use delivery_planner::app::{get_default_db_path, AppState};
use delivery_planner::{logging, APP_NAME, VERSION};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let mut args = std::env::args().skip(1);
    let robot_id = args
        .next()
        .ok_or_else(|| anyhow::anyhow!("用法: delivery-planner <robot_id> <capacity> [db_path]"))?;
    let capacity: i64 = args
        .next()
        .ok_or_else(|| anyhow::anyhow!("缺少 capacity 参数"))?
        .trim()
        .parse()
        .map_err(|e| anyhow::anyhow!("capacity 不是整数: {}", e))?;
    let db_path = args
        .next()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(get_default_db_path);

    tracing::info!("{} v{}", APP_NAME, VERSION);
    tracing::info!("使用数据库: {}", db_path);

    let state = AppState::new(db_path).await.map_err(anyhow::Error::msg)?;
    let plan = state
        .robot_api
        .generate_delivery_plan(&robot_id, capacity)
        .await?;

    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}
