//! 数据库管理模块
//!
//! 提供单个数据库的执行门面与按别名索引的注册表

mod database;
mod registry;

// 重新导出主要类型
pub use database::{Database, DatabaseState};
pub use registry::Registry;
