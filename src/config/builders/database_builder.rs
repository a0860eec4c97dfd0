//! # 数据库配置构建器模块
//!
//! 提供数据库配置的构建器实现，支持链式调用和严格验证

use crate::error::AsyncSqlError;
use crate::types::*;
use rat_logger::info;

/// 数据库配置构建器
///
/// 严格要求所有配置项必须显式设置，严禁使用默认值
#[derive(Debug, Default)]
pub struct DatabaseConfigBuilder {
    db_type: Option<DatabaseType>,
    connection: Option<ConnectionConfig>,
    pool: Option<PoolConfig>,
    alias: Option<String>,
}

impl DatabaseConfig {
    /// 创建数据库配置构建器
    pub fn builder() -> DatabaseConfigBuilder {
        DatabaseConfigBuilder::new()
    }
}

impl DatabaseConfigBuilder {
    /// 创建新的构建器
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置数据库类型
    ///
    /// # 参数
    ///
    /// * `db_type` - 数据库类型
    pub fn db_type(mut self, db_type: DatabaseType) -> Self {
        self.db_type = Some(db_type);
        self
    }

    /// 设置连接配置
    ///
    /// # 参数
    ///
    /// * `connection` - 连接配置
    pub fn connection(mut self, connection: ConnectionConfig) -> Self {
        self.connection = Some(connection);
        self
    }

    /// 设置连接池配置
    ///
    /// # 参数
    ///
    /// * `pool` - 连接池配置
    pub fn pool(mut self, pool: PoolConfig) -> Self {
        self.pool = Some(pool);
        self
    }

    /// 设置数据库别名
    ///
    /// # 参数
    ///
    /// * `alias` - 数据库别名，注册表以此为键
    pub fn alias<S: Into<String>>(mut self, alias: S) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// 构建数据库配置
    ///
    /// # 错误
    ///
    /// 如果任何必需的配置项未设置，将返回错误
    pub fn build(self) -> Result<DatabaseConfig, AsyncSqlError> {
        let db_type = self
            .db_type
            .ok_or_else(|| crate::async_sql_error!(config, "数据库类型必须设置"))?;

        let connection = self
            .connection
            .ok_or_else(|| crate::async_sql_error!(config, "连接配置必须设置"))?;

        let pool = self
            .pool
            .ok_or_else(|| crate::async_sql_error!(config, "连接池配置必须设置"))?;

        let alias = self
            .alias
            .ok_or_else(|| crate::async_sql_error!(config, "数据库别名必须设置"))?;

        let config = DatabaseConfig {
            db_type,
            connection,
            pool,
            alias,
        };
        config.validate()?;

        info!("创建数据库配置: 别名={}, 类型={:?}", config.alias, config.db_type);

        Ok(config)
    }
}

impl DatabaseConfig {
    /// 验证配置的一致性
    pub fn validate(&self) -> Result<(), AsyncSqlError> {
        if self.alias.trim().is_empty() {
            return Err(crate::async_sql_error!(config, "数据库别名不能为空"));
        }

        if self.connection.db_type() != self.db_type {
            return Err(crate::async_sql_error!(
                config,
                format!("数据库类型 {:?} 与连接配置不匹配", self.db_type)
            ));
        }

        self.pool.validate()
    }
}
