// ==========================================
// 配送计划后端 - 订单履历 API
// ==========================================

use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::listing::{ListQuery, Page};
use crate::domain::order::OrderSummary;
use crate::domain::types::OrderSortField;
use crate::repository::OrderRepository;

pub struct OrderApi {
    order_repo: Arc<OrderRepository>,
}

impl OrderApi {
    pub fn new(order_repo: Arc<OrderRepository>) -> Self {
        Self { order_repo }
    }

    /// 查询用户订单履历
    ///
    /// 检索作用于商品名称；page_size 为 0 视为参数错误。
    pub fn list_orders(
        &self,
        user_id: i64,
        query: &ListQuery<OrderSortField>,
    ) -> ApiResult<Page<OrderSummary>> {
        if query.page_size == 0 {
            return Err(ApiError::InvalidInput("page_size必须大于0".to_string()));
        }
        Ok(self.order_repo.list_orders(user_id, query)?)
    }
}
