//! # 配置管理模块
//!
//! 提供统一的配置管理系统，支持构建器模式和链式配置
//! 构建器要求所有配置项显式设置，缺项即报错

pub mod builders;
pub mod convenience;
pub mod core;

pub use builders::{DatabaseConfigBuilder, PoolConfigBuilder};
pub use convenience::{mysql_config, sqlite_config};
pub use core::EngineConfig;
