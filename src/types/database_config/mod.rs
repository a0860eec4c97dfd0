use serde::{Deserialize, Serialize};

/// MySQL 默认端口
pub const DEFAULT_MYSQL_PORT: u16 = 3306;

/// 支持的数据库类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatabaseType {
    /// SQLite 数据库
    SQLite,
    /// MySQL 数据库
    MySQL,
}

impl DatabaseType {
    /// 获取数据库类型的字符串表示
    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseType::SQLite => "sqlite",
            DatabaseType::MySQL => "mysql",
        }
    }

    /// 从字符串解析数据库类型
    pub fn parse(s: &str) -> Result<Self, crate::error::AsyncSqlError> {
        match s.to_lowercase().as_str() {
            "sqlite" => Ok(DatabaseType::SQLite),
            "mysql" | "mariadb" => Ok(DatabaseType::MySQL),
            _ => Err(crate::error::AsyncSqlError::ConfigError {
                message: crate::i18n::tf("error.unsupported_database", &[("db_type", s)]),
            }),
        }
    }
}

/// 数据库连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// 数据库类型
    pub db_type: DatabaseType,
    /// 连接配置
    pub connection: ConnectionConfig,
    /// 连接池配置
    pub pool: PoolConfig,
    /// 数据库别名，注册表以此为键
    pub alias: String,
}

/// 连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ConnectionConfig {
    /// SQLite 文件路径
    SQLite {
        /// 数据库文件路径
        path: String,
        /// 是否创建数据库文件（如果不存在）
        create_if_missing: bool,
    },
    /// MySQL 连接配置
    ///
    /// 没有客户端标志（client flags）选项：语句经 sqlx 文本协议执行，
    /// 多语句批次总是可用，其余标志由 sqlx 自行设置
    MySQL {
        /// 主机地址
        host: String,
        /// 端口号
        #[serde(default = "default_mysql_port")]
        port: u16,
        /// 数据库名
        database: String,
        /// 用户名
        username: String,
        /// 密码
        password: String,
        /// Unix 套接字路径（设置后优先于 host/port）
        #[serde(default)]
        socket: Option<String>,
        /// 连接建立时使用的字符集
        #[serde(default)]
        charset: Option<String>,
    },
}

fn default_mysql_port() -> u16 {
    DEFAULT_MYSQL_PORT
}

impl ConnectionConfig {
    /// 连接配置对应的数据库类型
    pub fn db_type(&self) -> DatabaseType {
        match self {
            ConnectionConfig::SQLite { .. } => DatabaseType::SQLite,
            ConnectionConfig::MySQL { .. } => DatabaseType::MySQL,
        }
    }

    /// 用于日志的端点描述，不包含密码
    pub fn endpoint(&self) -> String {
        match self {
            ConnectionConfig::SQLite { path, .. } => format!("sqlite://{}", path),
            ConnectionConfig::MySQL {
                host,
                port,
                database,
                username,
                socket: Some(socket),
                ..
            } => format!("mysql://{}@{}[{}]:{}/{}", username, host, socket, port, database),
            ConnectionConfig::MySQL {
                host,
                port,
                database,
                username,
                ..
            } => format!("mysql://{}@{}:{}/{}", username, host, port, database),
        }
    }
}

/// 连接池配置
///
/// 连接数与工作线程数在初始化时固定，运行期间不会伸缩
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// 池内连接数 N
    pub connections: usize,
    /// 工作线程数
    pub workers: usize,
    /// 驱动 sqlx 会话的 runtime I/O 线程数
    pub io_threads: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            connections: 4,
            workers: 4,
            io_threads: 1,
        }
    }
}
