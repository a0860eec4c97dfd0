//! SQLite数据库适配器
//!
//! 使用sqlx库实现真实的SQLite会话

use super::utils::{BatchCollector, error_text, escape_sqlite, is_sqlite_numeric, is_valid_charset, materialize_row};
use super::{Driver, Session};
use crate::error::{AsyncSqlError, AsyncSqlResult};
use crate::types::*;
use async_trait::async_trait;
use futures::TryStreamExt;
use rat_logger::{debug, info};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{ConnectOptions, Connection, Either};
use std::path::Path;
use std::str::FromStr;

/// SQLite驱动
pub struct SqliteDriver {
    /// 数据库别名
    alias: String,
    /// 数据库文件路径
    path: String,
    /// 是否创建数据库文件（如果不存在）
    create_if_missing: bool,
    /// 连接选项，所有池连接与重建共用同一份
    options: SqliteConnectOptions,
}

impl SqliteDriver {
    /// 由数据库配置创建驱动
    pub fn new(config: &DatabaseConfig) -> AsyncSqlResult<Self> {
        let ConnectionConfig::SQLite {
            path,
            create_if_missing,
        } = &config.connection
        else {
            return Err(crate::async_sql_error!(config, "SQLite连接配置类型不匹配"));
        };

        // 内存数据库：sqlx 为每次解析分配一个共享缓存的命名库，
        // 同一份选项建立的连接看到的是同一个库
        let options = if path == ":memory:" {
            SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| crate::async_sql_error!(config, e))?
        } else {
            SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(*create_if_missing)
        };

        Ok(Self {
            alias: config.alias.clone(),
            path: path.clone(),
            create_if_missing: *create_if_missing,
            options,
        })
    }
}

#[async_trait]
impl Driver for SqliteDriver {
    fn db_type(&self) -> DatabaseType {
        DatabaseType::SQLite
    }

    async fn connect(&self) -> AsyncSqlResult<Box<dyn Session>> {
        debug!("建立SQLite连接: 别名={}, 路径={}", self.alias, self.path);

        if self.path != ":memory:" {
            let path = Path::new(&self.path);
            let file_exists = path.exists();

            // 如果文件不存在且不允许创建，则返回错误
            if !file_exists && !self.create_if_missing {
                return Err(AsyncSqlError::ConnectError {
                    message: crate::i18n::tf("error.sqlite_file_not_found", &[("path", &self.path)]),
                });
            }

            // 如果需要创建文件且文件不存在，则创建父目录
            if !file_exists {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    tokio::fs::create_dir_all(parent).await.map_err(|e| {
                        crate::async_sql_error!(connect, format!("创建SQLite数据库目录失败: {}", e))
                    })?;
                }
            }
        }

        let conn = self
            .options
            .connect()
            .await
            .map_err(|e| crate::async_sql_error!(connect, error_text(&e)))?;

        info!("SQLite连接建立成功: 别名={}", self.alias);
        Ok(Box::new(SqliteSession { conn }))
    }
}

/// SQLite会话
pub struct SqliteSession {
    conn: SqliteConnection,
}

#[async_trait]
impl Session for SqliteSession {
    async fn execute(&mut self, sql: &str, flags: QueryFlags) -> Result<Vec<QueryResult>, String> {
        let mut collector = BatchCollector::new(flags);
        let assoc = collector.assoc();
        let mut failure = None;

        let mut stream = sqlx::raw_sql(sql).fetch_many(&mut self.conn);
        loop {
            match stream.try_next().await {
                Ok(Some(Either::Left(done))) => {
                    let last_id = u64::try_from(done.last_insert_rowid()).unwrap_or(0);
                    collector.finish_statement(done.rows_affected(), last_id);
                }
                Ok(Some(Either::Right(row))) => match materialize_row(&row, assoc, is_sqlite_numeric) {
                    Ok(row) => collector.push_row(row),
                    Err(e) => {
                        failure = Some(error_text(&e));
                        break;
                    }
                },
                Ok(None) => break,
                Err(e) => {
                    failure = Some(error_text(&e));
                    break;
                }
            }
        }
        drop(stream);
        collector.finish(failure)
    }

    async fn ping(&mut self) -> bool {
        self.conn.ping().await.is_ok()
    }

    /// SQLite 没有连接级字符集，名称合法即视为成功
    async fn set_character_set(&mut self, charset: &str) -> Result<(), String> {
        if !is_valid_charset(charset) {
            return Err(crate::i18n::tf("error.charset_invalid", &[("name", charset)]));
        }
        Ok(())
    }

    fn escape(&self, text: &str) -> String {
        escape_sqlite(text)
    }

    async fn close(self: Box<Self>) {
        let SqliteSession { conn } = *self;
        if let Err(e) = conn.close().await {
            debug!("关闭SQLite连接时出错: {}", e);
        }
    }
}
