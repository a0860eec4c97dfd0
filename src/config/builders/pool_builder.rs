//! # 连接池配置构建器模块
//!
//! 提供连接池配置的构建器实现，支持链式调用和严格验证

use crate::error::AsyncSqlError;
use crate::types::*;
use rat_logger::info;

/// 连接池配置构建器
///
/// 严格要求所有配置项必须显式设置，严禁使用默认值
#[derive(Debug, Default)]
pub struct PoolConfigBuilder {
    connections: Option<usize>,
    workers: Option<usize>,
    io_threads: Option<usize>,
}

impl PoolConfig {
    /// 创建连接池配置构建器
    pub fn builder() -> PoolConfigBuilder {
        PoolConfigBuilder::new()
    }

    /// 验证配置的合理性
    pub fn validate(&self) -> Result<(), AsyncSqlError> {
        if self.connections == 0 {
            return Err(crate::async_sql_error!(config, "连接数不能为零"));
        }
        if self.workers == 0 {
            return Err(crate::async_sql_error!(config, "工作线程数不能为零"));
        }
        if self.io_threads == 0 {
            return Err(crate::async_sql_error!(config, "I/O线程数不能为零"));
        }
        Ok(())
    }
}

impl PoolConfigBuilder {
    /// 创建新的构建器
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置池内连接数
    ///
    /// # 参数
    ///
    /// * `connections` - 初始化时建立的连接数，运行期间固定
    pub fn connections(mut self, connections: usize) -> Self {
        self.connections = Some(connections);
        self
    }

    /// 设置工作线程数
    ///
    /// # 参数
    ///
    /// * `workers` - 工作线程数
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// 设置 runtime I/O 线程数
    ///
    /// # 参数
    ///
    /// * `io_threads` - 驱动网络 I/O 的线程数
    pub fn io_threads(mut self, io_threads: usize) -> Self {
        self.io_threads = Some(io_threads);
        self
    }

    /// 构建连接池配置
    ///
    /// # 错误
    ///
    /// 如果任何必需的配置项未设置或为零，将返回错误
    pub fn build(self) -> Result<PoolConfig, AsyncSqlError> {
        let connections = self
            .connections
            .ok_or_else(|| crate::async_sql_error!(config, "连接数必须设置"))?;

        let workers = self
            .workers
            .ok_or_else(|| crate::async_sql_error!(config, "工作线程数必须设置"))?;

        let io_threads = self
            .io_threads
            .ok_or_else(|| crate::async_sql_error!(config, "I/O线程数必须设置"))?;

        let config = PoolConfig {
            connections,
            workers,
            io_threads,
        };
        config.validate()?;

        info!(
            "创建连接池配置: 连接数={}, 工作线程数={}, I/O线程数={}",
            connections, workers, io_threads
        );

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_fields_required() {
        let err = PoolConfig::builder().connections(4).workers(2).build();
        assert!(matches!(err, Err(AsyncSqlError::ConfigError { .. })));
    }

    #[test]
    fn test_zero_rejected() {
        let err = PoolConfig::builder()
            .connections(0)
            .workers(2)
            .io_threads(1)
            .build();
        assert!(err.is_err());
    }

    #[test]
    fn test_build_ok() {
        let config = PoolConfig::builder()
            .connections(6)
            .workers(2)
            .io_threads(1)
            .build()
            .unwrap();
        assert_eq!(config.connections, 6);
        assert_eq!(config.workers, 2);
    }
}
