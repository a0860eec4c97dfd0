//! # 配置管理模块 - 核心配置类型
//!
//! 引擎级配置：一组预先声明的数据库，可以从 TOML/JSON 文件加载

use crate::error::AsyncSqlError;
use crate::types::*;
use rat_logger::info;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// 引擎配置
///
/// 宿主可以在启动时一次性声明所有数据库，再交给注册表逐个连接
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// 数据库配置列表
    #[serde(default)]
    pub databases: Vec<DatabaseConfig>,
}

fn is_toml(path: &Path) -> bool {
    path.extension().and_then(|s| s.to_str()) == Some("toml")
}

impl EngineConfig {
    /// 创建空配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加数据库配置
    pub fn add_database(mut self, config: DatabaseConfig) -> Self {
        self.databases.push(config);
        self
    }

    /// 从配置文件加载配置
    ///
    /// # 参数
    ///
    /// * `config_path` - 配置文件路径，`.toml` 按 TOML 解析，其余按 JSON 解析
    pub fn from_file<P: AsRef<Path>>(config_path: P) -> Result<Self, AsyncSqlError> {
        let path = config_path.as_ref();
        let content = std::fs::read_to_string(path)?;

        let config: EngineConfig = if is_toml(path) {
            toml::from_str(&content).map_err(|e| {
                crate::async_sql_error!(config, format!("解析TOML配置文件失败: {}", e))
            })?
        } else {
            serde_json::from_str(&content).map_err(|e| {
                crate::async_sql_error!(config, format!("解析JSON配置文件失败: {}", e))
            })?
        };
        config.validate()?;

        info!("从文件加载配置: {:?}", path);
        Ok(config)
    }

    /// 保存配置到文件
    ///
    /// # 参数
    ///
    /// * `config_path` - 配置文件路径
    pub fn save_to_file<P: AsRef<Path>>(&self, config_path: P) -> Result<(), AsyncSqlError> {
        let path = config_path.as_ref();
        let content = if is_toml(path) {
            toml::to_string_pretty(self).map_err(|e| {
                crate::async_sql_error!(config, format!("序列化TOML配置失败: {}", e))
            })?
        } else {
            serde_json::to_string_pretty(self).map_err(|e| {
                crate::async_sql_error!(config, format!("序列化JSON配置失败: {}", e))
            })?
        };

        std::fs::write(path, content)?;

        info!("保存配置到文件: {:?}", path);
        Ok(())
    }

    /// 校验每个数据库配置，并拒绝重复别名
    pub fn validate(&self) -> Result<(), AsyncSqlError> {
        let mut seen = HashSet::new();
        for db in &self.databases {
            db.validate()?;
            if !seen.insert(db.alias.as_str()) {
                return Err(crate::async_sql_error!(
                    config,
                    format!("数据库别名重复: {}", db.alias)
                ));
            }
        }
        Ok(())
    }

    /// 获取指定别名的数据库配置
    ///
    /// # 参数
    ///
    /// * `alias` - 数据库别名
    pub fn get_database(&self, alias: &str) -> Result<&DatabaseConfig, AsyncSqlError> {
        self.databases
            .iter()
            .find(|db| db.alias == alias)
            .ok_or_else(|| AsyncSqlError::AliasNotFound {
                alias: alias.to_string(),
            })
    }
}
