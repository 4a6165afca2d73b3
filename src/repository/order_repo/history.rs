use super::OrderRepository;
use crate::domain::listing::{ListQuery, Page};
use crate::domain::order::OrderSummary;
use crate::domain::types::{OrderSortField, ShippedStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::cmp::Ordering;

impl OrderRepository {
    /// 批量创建订单（每个商品ID一条，状态为待发货）
    ///
    /// 在调用方事务内执行，返回按输入顺序生成的订单ID。
    pub fn bulk_create(
        conn: &Connection,
        user_id: i64,
        product_ids: &[i64],
    ) -> RepositoryResult<Vec<i64>> {
        if product_ids.is_empty() {
            return Ok(vec![]);
        }

        let created_at = Utc::now().naive_utc();
        let mut stmt = conn.prepare(
            r#"
            INSERT INTO orders (user_id, product_id, shipped_status, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )?;

        let mut order_ids = Vec::with_capacity(product_ids.len());
        for product_id in product_ids {
            stmt.execute(params![
                user_id,
                product_id,
                ShippedStatus::AwaitingShipment.to_db_str(),
                created_at
            ])?;
            order_ids.push(conn.last_insert_rowid());
        }

        Ok(order_ids)
    }

    /// 单笔订单状态变更（无计划逻辑，直接透传）
    ///
    /// 变更为"已送达"时记录 arrived_at（已有值不覆盖）。
    pub fn update_status(&self, order_id: i64, new_status: ShippedStatus) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let now = Utc::now().naive_utc();

        let affected = conn.execute(
            r#"
            UPDATE orders
            SET shipped_status = ?1,
                arrived_at = CASE WHEN ?1 = ?2 THEN COALESCE(arrived_at, ?3) ELSE arrived_at END
            WHERE order_id = ?4
            "#,
            params![
                new_status.to_db_str(),
                ShippedStatus::Delivered.to_db_str(),
                now,
                order_id
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "order".to_string(),
                id: order_id.to_string(),
            });
        }
        Ok(())
    }

    /// 查询单笔订单当前状态
    pub fn find_status(&self, order_id: i64) -> RepositoryResult<Option<ShippedStatus>> {
        let conn = self.get_conn()?;
        let raw: Option<String> = conn
            .query_row(
                "SELECT shipped_status FROM orders WHERE order_id = ?1",
                params![order_id],
                |row| row.get(0),
            )
            .optional()?;

        raw.map(|s| parse_status(&s)).transpose()
    }

    /// 按状态统计订单数
    pub fn count_by_status(&self, status: ShippedStatus) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM orders WHERE shipped_status = ?1",
            params![status.to_db_str()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// 查询用户订单履历（检索 + 白名单排序 + 分页）
    ///
    /// 检索作用于商品名称，排序字段只接受 OrderSortField 枚举。
    pub fn list_orders(
        &self,
        user_id: i64,
        query: &ListQuery<OrderSortField>,
    ) -> RepositoryResult<Page<OrderSummary>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT
                o.order_id,
                o.product_id,
                p.name AS product_name,
                o.shipped_status,
                o.created_at,
                o.arrived_at
            FROM orders o
            JOIN products p ON o.product_id = p.product_id
            WHERE o.user_id = ?1
            "#,
        )?;

        let rows = stmt
            .query_map(params![user_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, NaiveDateTime>(4)?,
                    row.get::<_, Option<NaiveDateTime>>(5)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut orders = Vec::with_capacity(rows.len());
        for (order_id, product_id, product_name, status, created_at, arrived_at) in rows {
            if !query.search_type.matches(&product_name, &query.search) {
                continue;
            }
            orders.push(OrderSummary {
                order_id,
                product_id,
                product_name,
                shipped_status: parse_status(&status)?,
                created_at,
                arrived_at,
            });
        }

        sort_orders(&mut orders, query);
        Ok(Page::slice(orders, query.offset, query.page_size))
    }
}

fn parse_status(raw: &str) -> RepositoryResult<ShippedStatus> {
    ShippedStatus::from_db_str(raw).ok_or_else(|| RepositoryError::FieldValueError {
        field: "shipped_status".to_string(),
        message: format!("未知状态: {}", raw),
    })
}

/// 稳定排序；arrived_at 为空的订单无论升降序都排在最后
fn sort_orders(orders: &mut [OrderSummary], query: &ListQuery<OrderSortField>) {
    let desc = query.sort_order.is_desc();
    let directed = |ord: Ordering| if desc { ord.reverse() } else { ord };

    match query.sort_field {
        OrderSortField::OrderId => orders.sort_by(|a, b| directed(a.order_id.cmp(&b.order_id))),
        OrderSortField::ProductName => {
            orders.sort_by(|a, b| directed(a.product_name.cmp(&b.product_name)))
        }
        OrderSortField::CreatedAt => {
            orders.sort_by(|a, b| directed(a.created_at.cmp(&b.created_at)))
        }
        OrderSortField::ShippedStatus => orders.sort_by(|a, b| {
            directed(a.shipped_status.to_db_str().cmp(b.shipped_status.to_db_str()))
        }),
        OrderSortField::ArrivedAt => orders.sort_by(|a, b| match (a.arrived_at, b.arrived_at) {
            (Some(x), Some(y)) => directed(x.cmp(&y)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{SearchType, SortOrder};
    use std::sync::{Arc, Mutex};

    fn repo_with_orders() -> OrderRepository {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::ensure_schema(&conn).unwrap();
        conn.execute_batch(
            r#"
            INSERT INTO products (product_id, name, value, weight) VALUES
                (1, 'apple box', 10, 2),
                (2, 'banana crate', 20, 3),
                (3, 'cherry pack', 5, 1);
            INSERT INTO orders (order_id, user_id, product_id, shipped_status, created_at, arrived_at) VALUES
                (1, 7, 2, 'completed', '2026-01-01 10:00:00', '2026-01-02 09:00:00'),
                (2, 7, 1, 'shipping',  '2026-01-03 10:00:00', NULL),
                (3, 7, 3, 'completed', '2026-01-02 10:00:00', '2026-01-01 09:00:00'),
                (4, 8, 1, 'shipping',  '2026-01-04 10:00:00', NULL);
            "#,
        )
        .unwrap();
        OrderRepository::from_connection(Arc::new(Mutex::new(conn)))
    }

    fn ids(page: &Page<OrderSummary>) -> Vec<i64> {
        page.items.iter().map(|o| o.order_id).collect()
    }

    #[test]
    fn test_list_orders_scoped_to_user() {
        let repo = repo_with_orders();
        let page = repo.list_orders(7, &ListQuery::default()).unwrap();
        assert_eq!(ids(&page), vec![1, 2, 3]);
        assert_eq!(page.total, 3);
    }

    #[test]
    fn test_list_orders_arrived_at_nulls_last() {
        let repo = repo_with_orders();
        let mut query = ListQuery {
            sort_field: OrderSortField::ArrivedAt,
            ..ListQuery::default()
        };
        assert_eq!(ids(&repo.list_orders(7, &query).unwrap()), vec![3, 1, 2]);

        query.sort_order = SortOrder::Desc;
        assert_eq!(ids(&repo.list_orders(7, &query).unwrap()), vec![1, 3, 2]);
    }

    #[test]
    fn test_list_orders_prefix_search_and_paging() {
        let repo = repo_with_orders();
        let query = ListQuery {
            search: "b".to_string(),
            search_type: SearchType::Prefix,
            ..ListQuery::default()
        };
        assert_eq!(ids(&repo.list_orders(7, &query).unwrap()), vec![1]);

        let paged = ListQuery {
            sort_field: OrderSortField::CreatedAt,
            sort_order: SortOrder::Desc,
            offset: 1,
            page_size: 1,
            ..ListQuery::default()
        };
        let page = repo.list_orders(7, &paged).unwrap();
        assert_eq!(ids(&page), vec![3]);
        assert_eq!(page.total, 3);
    }

    #[test]
    fn test_update_status_stamps_arrival() {
        let repo = repo_with_orders();
        repo.update_status(2, ShippedStatus::Delivered).unwrap();
        assert_eq!(repo.find_status(2).unwrap(), Some(ShippedStatus::Delivered));

        let page = repo.list_orders(7, &ListQuery::default()).unwrap();
        let order = page.items.iter().find(|o| o.order_id == 2).unwrap();
        assert!(order.arrived_at.is_some());
    }

    #[test]
    fn test_update_status_missing_order() {
        let repo = repo_with_orders();
        let err = repo.update_status(404, ShippedStatus::Delivered).unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }
}
