// ==========================================
// 配送计划后端 - 商品 API
// ==========================================
// 职责: 商品列表查询、下单（每件商品一条待发货订单）
// ==========================================

use std::sync::Arc;
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::listing::{ListQuery, Page};
use crate::domain::order::OrderLine;
use crate::domain::product::Product;
use crate::domain::types::ProductSortField;
use crate::repository::error::RepositoryError;
use crate::repository::{OrderRepository, ProductRepository, TransactionRunner};

/// 商品API
pub struct ProductApi {
    product_repo: Arc<ProductRepository>,
    tx_runner: Arc<TransactionRunner>,
}

impl ProductApi {
    /// 创建新的ProductApi实例
    ///
    /// # 参数
    /// - product_repo: 商品仓储（含总数缓存）
    /// - tx_runner: 事务执行器（下单在单个事务内完成）
    pub fn new(product_repo: Arc<ProductRepository>, tx_runner: Arc<TransactionRunner>) -> Self {
        Self {
            product_repo,
            tx_runner,
        }
    }

    /// 查询商品列表
    pub fn list_products(&self, query: &ListQuery<ProductSortField>) -> ApiResult<Page<Product>> {
        if query.page_size == 0 {
            return Err(ApiError::InvalidInput("page_size必须大于0".to_string()));
        }
        Ok(self.product_repo.list_products(query)?)
    }

    /// 下单
    ///
    /// 每一件商品展开为一条订单（quantity=3 生成 3 条），全部在一个事务内写入。
    ///
    /// # 返回
    /// - Ok(Vec<i64>): 新订单ID（按明细顺序），明细为空时返回空列表
    /// - Err(ApiError): 任一条写入失败则全部回滚
    pub fn create_orders(&self, user_id: i64, lines: &[OrderLine]) -> ApiResult<Vec<i64>> {
        let product_ids: Vec<i64> = lines
            .iter()
            .flat_map(|line| std::iter::repeat(line.product_id).take(line.quantity as usize))
            .collect();

        if product_ids.is_empty() {
            return Ok(vec![]);
        }

        let order_ids = self
            .tx_runner
            .run::<_, RepositoryError, _>(|tx| OrderRepository::bulk_create(tx, user_id, &product_ids))?;

        info!(user_id, order_count = order_ids.len(), "订单已创建");
        Ok(order_ids)
    }

    /// 主动清空商品总数缓存（商品数据在外部变更后调用）
    pub fn invalidate_product_counts(&self) {
        self.product_repo.invalidate_count_cache();
    }
}
