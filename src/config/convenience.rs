//! # 便利配置函数模块
//!
//! 提供常用数据库配置的便利函数，简化配置过程

use crate::error::AsyncSqlError;
use crate::types::*;

/// 创建SQLite数据库配置
///
/// # 参数
///
/// * `alias` - 数据库别名
/// * `path` - 数据库文件路径
/// * `pool_config` - 连接池配置
pub fn sqlite_config<S: Into<String>, P: Into<String>>(
    alias: S,
    path: P,
    pool_config: PoolConfig,
) -> Result<DatabaseConfig, AsyncSqlError> {
    DatabaseConfig::builder()
        .db_type(DatabaseType::SQLite)
        .connection(ConnectionConfig::SQLite {
            path: path.into(),
            create_if_missing: true,
        })
        .pool(pool_config)
        .alias(alias)
        .build()
}

/// 创建MySQL数据库配置
///
/// 别名取数据库名，与宿主按库名复用实例的习惯一致
///
/// # 参数
///
/// * `host` - 主机地址
/// * `port` - 端口号
/// * `database` - 数据库名
/// * `username` - 用户名
/// * `password` - 密码
/// * `pool_config` - 连接池配置
pub fn mysql_config<S: Into<String>>(
    host: S,
    port: u16,
    database: S,
    username: S,
    password: S,
    pool_config: PoolConfig,
) -> Result<DatabaseConfig, AsyncSqlError> {
    let database = database.into();
    DatabaseConfig::builder()
        .db_type(DatabaseType::MySQL)
        .connection(ConnectionConfig::MySQL {
            host: host.into(),
            port,
            database: database.clone(),
            username: username.into(),
            password: password.into(),
            socket: None,
            charset: None,
        })
        .pool(pool_config)
        .alias(database)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mysql_alias_is_database_name() {
        let config = mysql_config("localhost", 3306, "gmod", "root", "", PoolConfig::default())
            .unwrap();
        assert_eq!(config.alias, "gmod");
        assert_eq!(config.connection.endpoint(), "mysql://root@localhost:3306/gmod");
    }

    #[test]
    fn test_sqlite_creates_if_missing() {
        let config = sqlite_config("local", "./local.db", PoolConfig::default()).unwrap();
        assert!(matches!(
            config.connection,
            ConnectionConfig::SQLite {
                create_if_missing: true,
                ..
            }
        ));
    }
}
