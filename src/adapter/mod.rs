//! 数据库适配器模块
//!
//! 客户端库边界：协议与连接处理全部委托给 sqlx，引擎只通过
//! [`Driver`] 建立会话、通过 [`Session`] 执行语句。

use crate::error::{AsyncSqlError, AsyncSqlResult};
use crate::types::*;
use async_trait::async_trait;
use std::sync::Arc;

// 导入各个数据库适配器 (条件编译)
#[cfg(feature = "mysql-support")]
mod mysql;
#[cfg(feature = "sqlite-support")]
mod sqlite;
pub mod utils;

// 条件导出适配器
#[cfg(feature = "mysql-support")]
pub use mysql::{MysqlDriver, MysqlSession};
#[cfg(feature = "sqlite-support")]
pub use sqlite::{SqliteDriver, SqliteSession};
pub use utils::{escape_mysql, escape_sqlite, is_valid_charset};

/// 一条活动会话
///
/// 会话在任一时刻只属于一个持有者（池中空闲，或被一个任务租用），因此不要求 `Sync`
#[async_trait]
pub trait Session: Send {
    /// 执行一条语句或一个多语句批次
    ///
    /// 返回 `Err` 表示在产生任何结果集之前执行就失败了，调用方据此做存活探测；
    /// 批次中后续语句的失败以失败结果的形式出现在 `Ok` 中。
    async fn execute(&mut self, sql: &str, flags: QueryFlags) -> Result<Vec<QueryResult>, String>;

    /// 存活探测
    async fn ping(&mut self) -> bool;

    /// 切换连接字符集
    async fn set_character_set(&mut self, charset: &str) -> Result<(), String>;

    /// 按会话方言转义字符串
    fn escape(&self, text: &str) -> String;

    /// 关闭会话
    async fn close(self: Box<Self>);
}

/// 会话工厂，持有建立连接所需的全部凭据
#[async_trait]
pub trait Driver: Send + Sync {
    /// 驱动对应的数据库类型
    fn db_type(&self) -> DatabaseType;

    /// 用原始凭据建立一条新会话
    async fn connect(&self) -> AsyncSqlResult<Box<dyn Session>>;
}

/// 根据数据库配置创建驱动
pub fn create_driver(config: &DatabaseConfig) -> AsyncSqlResult<Arc<dyn Driver>> {
    match &config.connection {
        #[cfg(feature = "sqlite-support")]
        ConnectionConfig::SQLite { .. } => Ok(Arc::new(SqliteDriver::new(config)?)),
        #[cfg(feature = "mysql-support")]
        ConnectionConfig::MySQL { .. } => Ok(Arc::new(MysqlDriver::new(config)?)),
        #[allow(unreachable_patterns)]
        other => Err(AsyncSqlError::ConfigError {
            message: crate::i18n::tf(
                "error.unsupported_database",
                &[("db_type", other.db_type().as_str())],
            ),
        }),
    }
}
