//! 数据库类型定义和配置
//!
//! 定义支持的数据库类型、连接配置、单元格/行模型以及任务与结果模型

pub mod database_config;
pub mod query;
pub mod value;

// 重新导出所有公共类型
pub use database_config::{
    ConnectionConfig, DEFAULT_MYSQL_PORT, DatabaseConfig, DatabaseType, PoolConfig,
};
pub use query::{
    CallbackHandle, Completion, QueryFlags, QueryResult, QueryStatus, Task, UserContext,
};
pub use value::{Row, Value};
