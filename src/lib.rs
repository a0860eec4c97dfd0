//! rat_asyncsql - 面向单线程宿主的异步SQL执行引擎
//!
//! 宿主线程以非阻塞方式提交语句，固定大小的工作线程池租用连接执行，
//! 结果经完成队列由宿主在自己的节拍中轮询取回并分发到回调。
//! 协议与连接处理委托给 sqlx（MySQL、SQLite）。

use std::sync::Once;

// 导出所有公共模块
pub mod adapter;
pub mod config;
pub mod error;
pub mod i18n;
pub mod manager;
pub mod pool;
pub mod types;

// 重新导出常用类型和函数
pub use adapter::{Driver, Session, create_driver};
pub use config::{
    DatabaseConfigBuilder, EngineConfig, PoolConfigBuilder, mysql_config, sqlite_config,
};
pub use error::{AsyncSqlError, AsyncSqlResult};
pub use manager::{Database, DatabaseState, Registry};
pub use pool::PoolStats;
pub use types::*;

// 条件编译调试宏 - 只有在 debug 模式下才输出调试信息
#[cfg(debug_assertions)]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        rat_logger::debug!($($arg)*);
    };
}

#[cfg(not(debug_assertions))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        // 在 release 模式下不输出调试信息
    };
}

static INIT: Once = Once::new();

/// 初始化rat_asyncsql库
///
/// 注册多语言错误消息，可重复调用。`Registry::new` 与 `Database::connect` 会自动调用。
///
/// 注意：日志系统由调用者自行初始化，本库不会自动初始化日志
pub fn init() {
    INIT.call_once(|| {
        i18n::ErrorMessageI18n::init();
        debug_log!("rat_asyncsql 初始化完成: 版本={}", VERSION);
    });
}

/// 库版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 库名称
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// 获取库信息
pub fn get_info() -> String {
    let mut drivers = Vec::new();
    if cfg!(feature = "sqlite-support") {
        drivers.push("sqlite");
    }
    if cfg!(feature = "mysql-support") {
        drivers.push("mysql");
    }
    format!("{} v{} (drivers: {})", NAME, VERSION, drivers.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_info() {
        init();
        init();
        let info = get_info();
        assert!(info.starts_with("rat_asyncsql v"));
    }
}
