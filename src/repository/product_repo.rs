// ==========================================
// 配送计划后端 - 商品数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 约束: 排序列只来自 ProductSortField 白名单映射
// 约束: 总数缓存由调用方注入，写入商品时显式失效
// ==========================================

use crate::cache::TtlCache;
use crate::domain::listing::{ListQuery, Page};
use crate::domain::product::Product;
use crate::domain::types::{ProductSortField, SearchType};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, ToSql};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// 商品总数缓存（key: 检索条件）
pub type ProductCountCache = TtlCache<String, usize>;

pub struct ProductRepository {
    conn: Arc<Mutex<Connection>>,
    count_cache: Arc<ProductCountCache>,
}

impl ProductRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>, count_cache: Arc<ProductCountCache>) -> Self {
        Self { conn, count_cache }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 登记商品，返回商品ID（会使总数缓存失效）
    pub fn insert(
        &self,
        name: &str,
        value: i64,
        weight: i64,
        image: Option<&str>,
        description: Option<&str>,
    ) -> RepositoryResult<i64> {
        let product_id = {
            let conn = self.get_conn()?;
            conn.execute(
                "INSERT INTO products (name, value, weight, image, description) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![name, value, weight, image, description],
            )?;
            conn.last_insert_rowid()
        };
        self.invalidate_count_cache();
        Ok(product_id)
    }

    /// 商品总数（按检索条件缓存）
    pub fn count_products(&self, search: &str, search_type: SearchType) -> RepositoryResult<usize> {
        let cache_key = format!("count:{:?}:{}", search_type, search);
        if let Some(count) = self.count_cache.get(&cache_key) {
            debug!(cache_key = %cache_key, count, "商品总数命中缓存");
            return Ok(count);
        }

        let (where_sql, args) = search_clause(search, search_type);
        let sql = format!("SELECT COUNT(*) FROM products{}", where_sql);
        let params_vec: Vec<&dyn ToSql> = args.iter().map(|a| a as &dyn ToSql).collect();

        let count: i64 = {
            let conn = self.get_conn()?;
            conn.query_row(&sql, params_vec.as_slice(), |row| row.get(0))?
        };
        let count = usize::try_from(count).unwrap_or(0);

        self.count_cache.insert(cache_key, count);
        Ok(count)
    }

    /// 商品列表（检索 + 白名单排序 + LIMIT/OFFSET）
    pub fn list_products(&self, query: &ListQuery<ProductSortField>) -> RepositoryResult<Page<Product>> {
        let total = self.count_products(&query.search, query.search_type)?;

        let (where_sql, args) = search_clause(&query.search, query.search_type);
        let sql = format!(
            r#"
            SELECT product_id, name, value, weight, image, description
            FROM products{}
            ORDER BY {} {}, product_id ASC
            LIMIT ? OFFSET ?
            "#,
            where_sql,
            query.sort_field.to_column(),
            query.sort_order.to_sql()
        );

        let limit = i64::try_from(query.page_size).unwrap_or(i64::MAX);
        let offset = i64::try_from(query.offset).unwrap_or(i64::MAX);
        let mut params_vec: Vec<&dyn ToSql> = args.iter().map(|a| a as &dyn ToSql).collect();
        params_vec.push(&limit);
        params_vec.push(&offset);

        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let items = stmt
            .query_map(params_vec.as_slice(), |row| {
                Ok(Product {
                    product_id: row.get(0)?,
                    name: row.get(1)?,
                    value: row.get(2)?,
                    weight: row.get(3)?,
                    image: row.get(4)?,
                    description: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page { items, total })
    }

    /// 显式清空总数缓存
    pub fn invalidate_count_cache(&self) {
        self.count_cache.clear();
    }
}

/// 构造检索条件（仅返回固定 SQL 片段 + 绑定参数）
fn search_clause(search: &str, search_type: SearchType) -> (&'static str, Vec<String>) {
    if search.is_empty() {
        return ("", vec![]);
    }
    match search_type {
        SearchType::Prefix => (" WHERE name LIKE ?", vec![format!("{}%", search)]),
        SearchType::Partial => {
            let pattern = format!("%{}%", search);
            (" WHERE name LIKE ? OR description LIKE ?", vec![pattern.clone(), pattern])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::SortOrder;
    use std::time::Duration;

    fn repo() -> ProductRepository {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::ensure_schema(&conn).unwrap();
        let repo = ProductRepository::from_connection(
            Arc::new(Mutex::new(conn)),
            Arc::new(TtlCache::new(Duration::from_secs(60))),
        );
        repo.insert("drill", 50, 5, None, Some("cordless")).unwrap();
        repo.insert("hammer", 20, 3, None, Some("steel head")).unwrap();
        repo.insert("saw", 20, 4, None, None).unwrap();
        repo
    }

    #[test]
    fn test_list_products_sorted_by_allow_listed_column() {
        let repo = repo();
        let query = ListQuery {
            sort_field: ProductSortField::Value,
            sort_order: SortOrder::Desc,
            ..ListQuery::default()
        };
        let page = repo.list_products(&query).unwrap();
        let names: Vec<_> = page.items.iter().map(|p| p.name.as_str()).collect();
        // 价值相同时按 product_id 升序
        assert_eq!(names, vec!["drill", "hammer", "saw"]);
        assert_eq!(page.total, 3);
    }

    #[test]
    fn test_partial_search_matches_description() {
        let repo = repo();
        let query = ListQuery {
            search: "steel".to_string(),
            ..ListQuery::default()
        };
        let page = repo.list_products(&query).unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].name, "hammer");
    }

    #[test]
    fn test_count_cache_until_invalidated() {
        let repo = repo();
        assert_eq!(repo.count_products("", SearchType::Partial).unwrap(), 3);

        // 绕过仓储直接写库：缓存仍返回旧值
        repo.get_conn()
            .unwrap()
            .execute("INSERT INTO products (name, value, weight) VALUES ('file', 1, 1)", [])
            .unwrap();
        assert_eq!(repo.count_products("", SearchType::Partial).unwrap(), 3);

        repo.invalidate_count_cache();
        assert_eq!(repo.count_products("", SearchType::Partial).unwrap(), 4);
    }
}
