//! 数据库注册表
//!
//! 按别名保存已连接的数据库，由宿主集成层持有。
//! 同一别名重复连接返回同一个实例，不会建立新连接。

use super::database::{Database, DatabaseState};
use crate::adapter::{Driver, create_driver};
use crate::error::{AsyncSqlError, AsyncSqlResult};
use crate::types::{Completion, DatabaseConfig};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rat_logger::{debug, info, warn};
use std::sync::Arc;

/// 数据库注册表
#[derive(Debug, Default)]
pub struct Registry {
    /// 数据库映射 (别名 -> 数据库)
    databases: DashMap<String, Arc<Database>>,
}

impl Registry {
    /// 创建空注册表
    pub fn new() -> Self {
        crate::init();
        info!("创建数据库注册表");
        Self::default()
    }

    /// 按别名获取或创建数据库
    pub fn connect(&self, config: DatabaseConfig) -> AsyncSqlResult<Arc<Database>> {
        if let Some(existing) = self.running(&config.alias) {
            debug!("复用已连接的数据库: 别名={}", config.alias);
            return Ok(existing);
        }
        let driver = create_driver(&config)?;
        self.connect_with_driver(config, driver)
    }

    /// 使用指定驱动按别名获取或创建数据库
    ///
    /// 已登记但不再运行的实例（例如宿主直接调用了 [`Database::disconnect`]）
    /// 视为不存在，会被新连接替换
    pub fn connect_with_driver(
        &self,
        config: DatabaseConfig,
        driver: Arc<dyn Driver>,
    ) -> AsyncSqlResult<Arc<Database>> {
        if let Some(existing) = self.running(&config.alias) {
            debug!("复用已连接的数据库: 别名={}", config.alias);
            return Ok(existing);
        }

        // 建立连接期间不持有分片锁
        let alias = config.alias.clone();
        let database = Arc::new(Database::connect_with_driver(config, driver)?);

        match self.databases.entry(alias) {
            Entry::Occupied(mut entry) if entry.get().state() != DatabaseState::Running => {
                info!("替换已停止的数据库实例: 别名={}", entry.key());
                entry.insert(database.clone());
                Ok(database)
            }
            Entry::Occupied(entry) => {
                warn!("并发连接同一别名，关闭后建立的实例: 别名={}", entry.key());
                let existing = entry.get().clone();
                drop(entry);
                database.disconnect(drop);
                Ok(existing)
            }
            Entry::Vacant(entry) => {
                entry.insert(database.clone());
                Ok(database)
            }
        }
    }

    /// 取出仍在运行的实例，顺带清除已停止的登记
    fn running(&self, alias: &str) -> Option<Arc<Database>> {
        let existing = self.databases.get(alias).map(|entry| entry.value().clone())?;
        if existing.state() == DatabaseState::Running {
            return Some(existing);
        }
        debug!("清除已停止的数据库登记: 别名={}", alias);
        self.databases
            .remove_if(alias, |_, db| Arc::ptr_eq(db, &existing));
        None
    }

    /// 获取数据库
    pub fn get(&self, alias: &str) -> AsyncSqlResult<Arc<Database>> {
        self.databases
            .get(alias)
            .map(|db| db.value().clone())
            .ok_or_else(|| AsyncSqlError::AliasNotFound {
                alias: alias.to_string(),
            })
    }

    /// 所有别名
    pub fn aliases(&self) -> Vec<String> {
        self.databases.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.databases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.databases.is_empty()
    }

    fn snapshot(&self) -> Vec<Arc<Database>> {
        self.databases.iter().map(|entry| entry.value().clone()).collect()
    }

    /// 轮询所有数据库，通常每个宿主周期调用一次
    ///
    /// 分发期间不持有注册表锁，回调中可以安全地提交或断开数据库
    pub fn poll_all<F>(&self, mut dispatch: F) -> usize
    where
        F: FnMut(&Database, Completion),
    {
        self.snapshot()
            .iter()
            .map(|db| db.poll(|completion| dispatch(db.as_ref(), completion)))
            .sum()
    }

    /// 移除并关闭一个数据库
    ///
    /// 先从注册表中移除，之后同名连接请求会创建新实例
    pub fn disconnect<F>(&self, alias: &str, dispatch: F) -> AsyncSqlResult<usize>
    where
        F: FnMut(Completion),
    {
        let (_, database) = self
            .databases
            .remove(alias)
            .ok_or_else(|| AsyncSqlError::AliasNotFound {
                alias: alias.to_string(),
            })?;
        Ok(database.disconnect(dispatch))
    }

    /// 宿主退出：关闭所有仍然打开的数据库
    pub fn shutdown_all<F>(&self, mut dispatch: F) -> usize
    where
        F: FnMut(&Database, Completion),
    {
        let mut delivered = 0;
        for alias in self.aliases() {
            if let Some((_, database)) = self.databases.remove(&alias) {
                delivered += database.disconnect(|completion| dispatch(database.as_ref(), completion));
            }
        }
        info!("所有数据库已关闭");
        delivered
    }
}
