// ==========================================
// 配送计划后端 - 列表查询参数与分页结果
// ==========================================

use crate::domain::types::{SearchType, SortOrder};
use serde::{Deserialize, Serialize};

/// 默认分页大小
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// 列表查询参数
///
/// `F` 为排序字段白名单枚举（OrderSortField / ProductSortField）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery<F> {
    pub search: String,
    pub search_type: SearchType,
    pub sort_field: F,
    pub sort_order: SortOrder,
    pub offset: usize,
    pub page_size: usize,
}

impl<F: Default> Default for ListQuery<F> {
    fn default() -> Self {
        Self {
            search: String::new(),
            search_type: SearchType::default(),
            sort_field: F::default(),
            sort_order: SortOrder::default(),
            offset: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// 分页结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize, // 过滤后的总条数（分页前）
}

impl<T> Page<T> {
    /// 对已排序的全量结果做内存分页（越界时返回空页）
    pub fn slice(all: Vec<T>, offset: usize, page_size: usize) -> Self {
        let total = all.len();
        let items = all.into_iter().skip(offset).take(page_size).collect();
        Self { items, total }
    }
}
