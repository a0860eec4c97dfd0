//! MySQL数据库适配器
//!
//! 基于sqlx库实现的MySQL会话，语句走文本协议以支持多语句批次

use super::utils::{BatchCollector, escape_mysql, is_mysql_numeric, is_valid_charset, materialize_row};
use super::{Driver, Session};
use crate::error::AsyncSqlResult;
use crate::types::*;
use async_trait::async_trait;
use futures::TryStreamExt;
use rat_logger::{debug, info};
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::{ConnectOptions, Connection, Either};

/// MySQL驱动
pub struct MysqlDriver {
    /// 数据库别名
    alias: String,
    /// 连接选项（包含原始凭据）
    options: MySqlConnectOptions,
    /// 日志用端点描述
    endpoint: String,
}

impl MysqlDriver {
    /// 由数据库配置创建驱动
    pub fn new(config: &DatabaseConfig) -> AsyncSqlResult<Self> {
        let ConnectionConfig::MySQL {
            host,
            port,
            database,
            username,
            password,
            socket,
            charset,
        } = &config.connection
        else {
            return Err(crate::async_sql_error!(config, "MySQL连接配置类型不匹配"));
        };

        let mut options = MySqlConnectOptions::new()
            .host(host)
            .port(*port)
            .username(username)
            .password(password)
            .database(database);

        if let Some(socket) = socket {
            options = options.socket(socket);
        }
        if let Some(charset) = charset {
            if !is_valid_charset(charset) {
                return Err(crate::async_sql_error!(
                    config,
                    crate::i18n::tf("error.charset_invalid", &[("name", charset)])
                ));
            }
            options = options.charset(charset);
        }

        Ok(Self {
            alias: config.alias.clone(),
            options,
            endpoint: config.connection.endpoint(),
        })
    }
}

#[async_trait]
impl Driver for MysqlDriver {
    fn db_type(&self) -> DatabaseType {
        DatabaseType::MySQL
    }

    async fn connect(&self) -> AsyncSqlResult<Box<dyn Session>> {
        debug!("建立MySQL连接: 别名={}, 端点={}", self.alias, self.endpoint);

        let conn = self
            .options
            .connect()
            .await
            .map_err(|e| crate::async_sql_error!(connect, super::utils::error_text(&e)))?;

        info!("MySQL连接建立成功: 别名={}", self.alias);
        Ok(Box::new(MysqlSession { conn }))
    }
}

/// MySQL会话
pub struct MysqlSession {
    conn: MySqlConnection,
}

#[async_trait]
impl Session for MysqlSession {
    async fn execute(&mut self, sql: &str, flags: QueryFlags) -> Result<Vec<QueryResult>, String> {
        let mut collector = BatchCollector::new(flags);
        let assoc = collector.assoc();
        let mut failure = None;

        let mut stream = sqlx::raw_sql(sql).fetch_many(&mut self.conn);
        loop {
            match stream.try_next().await {
                Ok(Some(Either::Left(done))) => {
                    collector.finish_statement(done.rows_affected(), done.last_insert_id());
                }
                Ok(Some(Either::Right(row))) => match materialize_row(&row, assoc, is_mysql_numeric) {
                    Ok(row) => collector.push_row(row),
                    Err(e) => {
                        failure = Some(super::utils::error_text(&e));
                        break;
                    }
                },
                Ok(None) => break,
                Err(e) => {
                    failure = Some(super::utils::error_text(&e));
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

    async fn set_character_set(&mut self, charset: &str) -> Result<(), String> {
        if !is_valid_charset(charset) {
            return Err(crate::i18n::tf("error.charset_invalid", &[("name", charset)]));
        }

        let statement = format!("SET NAMES {}", charset);
        sqlx::Executor::execute(&mut self.conn, sqlx::raw_sql(&statement))
            .await
            .map(|_| ())
            .map_err(|e| super::utils::error_text(&e))
    }

    fn escape(&self, text: &str) -> String {
        escape_mysql(text)
    }

    async fn close(self: Box<Self>) {
        let MysqlSession { conn } = *self;
        if let Err(e) = conn.close().await {
            debug!("关闭MySQL连接时出错: {}", e);
        }
    }
}
