// ==========================================
// 配送计划后端 - 事务执行器
// ==========================================
// 职责: 在单个原子事务中执行一段工作，任意失败（含取消）整体回滚
// 约束: 每次执行独立打开连接，并发请求各自持有自己的事务
// 约束: 使用 BEGIN IMMEDIATE，读取待发货订单前即取得写保留锁，
//       并发计划请求在此串行化，同一订单不会被两个计划同时提交
// ==========================================

use crate::db::open_sqlite_connection;
use crate::repository::error::RepositoryError;
use rusqlite::{Transaction, TransactionBehavior};
use tracing::{debug, warn};

pub struct TransactionRunner {
    db_path: String,
}

impl TransactionRunner {
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    /// 在 IMMEDIATE 事务中执行 `work`
    ///
    /// # 返回
    /// - Ok(T): work 成功且事务已提交
    /// - Err(E): work 失败（事务已回滚）或连接/提交失败
    pub fn run<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, E>,
        E: From<RepositoryError>,
    {
        let mut conn = open_sqlite_connection(&self.db_path)
            .map_err(|e| E::from(RepositoryError::DatabaseConnectionError(e.to_string())))?;

        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| E::from(RepositoryError::DatabaseTransactionError(e.to_string())))?;

        match work(&tx) {
            Ok(out) => {
                tx.commit()
                    .map_err(|e| E::from(RepositoryError::DatabaseTransactionError(e.to_string())))?;
                debug!("事务已提交");
                Ok(out)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    warn!(error = %rollback_err, "事务回滚失败");
                } else {
                    debug!("事务已回滚");
                }
                Err(err)
            }
        }
    }
}
