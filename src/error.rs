//! 错误处理模块
//!
//! 定义引擎对外暴露的错误类型。执行期错误（语句失败、重连失败）不会以 `Err`
//! 的形式穿过引擎边界，而是作为 [`crate::types::QueryResult`] 中的数据返回。

use thiserror::Error;

/// 引擎错误类型
#[derive(Error, Debug)]
pub enum AsyncSqlError {
    /// 初始连接无法建立（对 Connect 致命）
    #[error("{message}")]
    ConnectError { message: String },

    /// 租用中的连接失效且无法重建（仅对当前任务致命）
    #[error("{message}")]
    ReconnectError { message: String },

    /// 数据库拒绝执行语句（仅对对应的结果致命）
    #[error("{message}")]
    StatementError { message: String },

    /// 某个连接拒绝切换字符集
    #[error("{message}")]
    CharsetError { message: String },

    /// 配置错误
    #[error("{message}")]
    ConfigError { message: String },

    /// 数据库别名未找到
    #[error("{}", crate::i18n::tf("error.alias_not_found", &[("alias", alias)]))]
    AliasNotFound { alias: String },

    /// 数据库已不在运行状态，不再接受任务
    #[error("{}", crate::i18n::tf("error.not_running", &[("alias", alias)]))]
    NotRunning { alias: String },

    /// 工作线程启动失败
    #[error("{message}")]
    WorkerSpawn { message: String },

    /// IO 错误
    #[error("IO错误: {0}")]
    IoError(#[from] std::io::Error),
}

/// 引擎结果类型
pub type AsyncSqlResult<T> = Result<T, AsyncSqlError>;

/// 快速构造带翻译消息的错误
///
/// ```
/// use rat_asyncsql::async_sql_error;
///
/// let err = async_sql_error!(config, "连接数不能为零");
/// assert_eq!(err.kind(), "config");
/// ```
#[macro_export]
macro_rules! async_sql_error {
    (connect, $msg:expr) => {
        $crate::error::AsyncSqlError::ConnectError {
            message: $crate::i18n::tf("error.connection", &[("message", &$msg.to_string())]),
        }
    };
    (reconnect, $msg:expr) => {
        $crate::error::AsyncSqlError::ReconnectError {
            message: $crate::i18n::tf("error.reconnect", &[("message", &$msg.to_string())]),
        }
    };
    (statement, $msg:expr) => {
        $crate::error::AsyncSqlError::StatementError {
            message: $msg.to_string(),
        }
    };
    (charset, $msg:expr) => {
        $crate::error::AsyncSqlError::CharsetError {
            message: $crate::i18n::tf("error.charset", &[("message", &$msg.to_string())]),
        }
    };
    (config, $msg:expr) => {
        $crate::error::AsyncSqlError::ConfigError {
            message: $crate::i18n::tf("error.config", &[("message", &$msg.to_string())]),
        }
    };
    (worker, $msg:expr) => {
        $crate::error::AsyncSqlError::WorkerSpawn {
            message: $crate::i18n::tf("error.worker_spawn", &[("message", &$msg.to_string())]),
        }
    };
}

impl AsyncSqlError {
    /// 错误类别名称，便于宿主层做粗粒度分派
    pub fn kind(&self) -> &'static str {
        match self {
            AsyncSqlError::ConnectError { .. } => "connect",
            AsyncSqlError::ReconnectError { .. } => "reconnect",
            AsyncSqlError::StatementError { .. } => "statement",
            AsyncSqlError::CharsetError { .. } => "charset",
            AsyncSqlError::ConfigError { .. } => "config",
            AsyncSqlError::AliasNotFound { .. } => "alias_not_found",
            AsyncSqlError::NotRunning { .. } => "not_running",
            AsyncSqlError::WorkerSpawn { .. } => "worker_spawn",
            AsyncSqlError::IoError(_) => "io",
        }
    }
}
