//! 数据库门面
//!
//! 组合连接池、任务队列、完成队列与工作线程池，并管理关闭状态机：
//! `Initializing → Running → Draining → Stopped`。

use crate::adapter::{Driver, Session, create_driver};
use crate::error::{AsyncSqlError, AsyncSqlResult};
use crate::pool::{CompletionQueue, ConnectionPool, PoolStats, StatementExecutor, TaskQueue, WorkerPool};
use crate::types::{Completion, DatabaseConfig, DatabaseType, Task};
use parking_lot::Mutex;
use rat_logger::{debug, error, info, warn};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use tokio::runtime::Runtime;

/// 数据库生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseState {
    /// 正在建立连接
    Initializing,
    /// 接受任务
    Running,
    /// 关闭中：不再接受任务，排空剩余工作
    Draining,
    /// 已关闭，所有连接已释放
    Stopped,
}

/// 一个数据库端点上的执行引擎
///
/// 除工作线程外，所有方法都应在宿主线程上调用，且不能处于 tokio runtime 上下文中。
pub struct Database {
    config: DatabaseConfig,
    db_type: DatabaseType,
    state: Mutex<DatabaseState>,
    runtime: Arc<Runtime>,
    pool: Arc<ConnectionPool>,
    tasks: Arc<TaskQueue>,
    completions: Arc<CompletionQueue>,
    executor: Arc<StatementExecutor>,
    workers: Mutex<Option<WorkerPool>>,
    /// 转义与字符集专用连接，不经过任务队列
    control: Mutex<Option<Box<dyn Session>>>,
}

impl Database {
    /// 按配置创建驱动并连接
    pub fn connect(config: DatabaseConfig) -> AsyncSqlResult<Self> {
        crate::init();
        let driver = create_driver(&config)?;
        Self::connect_with_driver(config, driver)
    }

    /// 使用指定驱动连接
    ///
    /// 先建立 N 条池连接和一条控制连接，任何一条失败都会关闭已建立的连接并返回错误，
    /// 此时不会启动任何工作线程。
    pub fn connect_with_driver(
        config: DatabaseConfig,
        driver: Arc<dyn Driver>,
    ) -> AsyncSqlResult<Self> {
        config.validate()?;
        let alias = config.alias.clone();
        debug!("数据库状态: 别名={}, 状态={:?}", alias, DatabaseState::Initializing);

        let runtime = Arc::new(
            tokio::runtime::Builder::new_multi_thread()
                .worker_threads(config.pool.io_threads)
                .thread_name(format!("asyncsql-io-{}", alias))
                .enable_all()
                .build()
                .map_err(|e| AsyncSqlError::WorkerSpawn {
                    message: crate::i18n::tf("error.runtime", &[("message", &e.to_string())]),
                })?,
        );

        let pool = Arc::new(runtime.block_on(ConnectionPool::initialize(
            &alias,
            driver.clone(),
            config.pool.connections,
        ))?);

        let control = match runtime.block_on(driver.connect()) {
            Ok(session) => session,
            Err(e) => {
                error!("控制连接建立失败: 别名={}, 错误={}", alias, e);
                runtime.block_on(pool.close_all());
                return Err(e);
            }
        };

        let tasks = Arc::new(TaskQueue::new());
        let completions = Arc::new(CompletionQueue::new());
        let executor = Arc::new(StatementExecutor::new(
            &alias,
            runtime.clone(),
            pool.clone(),
            completions.clone(),
        ));

        let workers = match WorkerPool::spawn(&alias, config.pool.workers, tasks.clone(), executor.clone()) {
            Ok(workers) => workers,
            Err(e) => {
                runtime.block_on(async {
                    pool.close_all().await;
                    control.close().await;
                });
                return Err(e);
            }
        };

        info!(
            "数据库已连接: 别名={}, 端点={}, 连接数={}, 工作线程数={}",
            alias,
            config.connection.endpoint(),
            config.pool.connections,
            config.pool.workers
        );

        Ok(Self {
            db_type: driver.db_type(),
            config,
            state: Mutex::new(DatabaseState::Running),
            runtime,
            pool,
            tasks,
            completions,
            executor,
            workers: Mutex::new(Some(workers)),
            control: Mutex::new(Some(control)),
        })
    }

    /// 数据库别名
    pub fn alias(&self) -> &str {
        &self.config.alias
    }

    /// 数据库类型
    pub fn db_type(&self) -> DatabaseType {
        self.db_type
    }

    /// 连接配置
    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// 当前状态
    pub fn state(&self) -> DatabaseState {
        *self.state.lock()
    }

    fn not_running(&self) -> AsyncSqlError {
        AsyncSqlError::NotRunning {
            alias: self.config.alias.clone(),
        }
    }

    /// 提交任务，立即返回
    pub fn submit(&self, task: Task) -> AsyncSqlResult<()> {
        if self.state() != DatabaseState::Running {
            return Err(self.not_running());
        }
        self.tasks.push(task).map_err(|_| self.not_running())
    }

    /// 取走所有已完成的任务并逐个交给 `dispatch`，返回分发数量
    ///
    /// 没有回调句柄的完成项同样会被分发，宿主借此释放用户上下文
    pub fn poll<F>(&self, mut dispatch: F) -> usize
    where
        F: FnMut(Completion),
    {
        let batch = self.completions.pop_all();
        let count = batch.len();
        for completion in batch {
            dispatch(completion);
        }
        count
    }

    /// 排队中尚未开始的任务数
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// 连接池统计
    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// 在控制连接上同步转义字符串
    pub fn escape(&self, text: &str) -> AsyncSqlResult<String> {
        let control = self.control.lock();
        match control.as_ref() {
            Some(session) => Ok(session.escape(text)),
            None => Err(self.not_running()),
        }
    }

    /// 为所有池连接和控制连接切换字符集
    ///
    /// 按槽位顺序逐个应用，遇到第一个失败立即停止；已切换的连接不会回滚。
    /// 调用会等待正在执行的任务归还连接。
    pub fn set_character_set(&self, charset: &str) -> AsyncSqlResult<()> {
        if self.state() != DatabaseState::Running {
            return Err(self.not_running());
        }
        if !crate::adapter::is_valid_charset(charset) {
            return Err(AsyncSqlError::CharsetError {
                message: crate::i18n::tf("error.charset_invalid", &[("name", charset)]),
            });
        }

        let mut conns = self.pool.lease_all();
        let outcome = self.runtime.block_on(async {
            for conn in conns.iter_mut() {
                let slot = conn.slot();
                // 失效的槽位先重建，新会话同样需要切换
                if !conn.is_alive() {
                    self.pool.reconnect(conn).await.map_err(|e| (slot, e.to_string()))?;
                }
                let Some(session) = conn.session_mut() else {
                    return Err((slot, crate::i18n::t("error.connection_unavailable")));
                };
                session.set_character_set(charset).await.map_err(|e| (slot, e))?;
            }
            Ok::<(), (usize, String)>(())
        });
        self.pool.release_all(conns);

        if let Err((slot, message)) = outcome {
            warn!(
                "设置字符集失败: 别名={}, 字符集={}, 槽位={}, 错误={}",
                self.config.alias, charset, slot, message
            );
            return Err(crate::async_sql_error!(charset, message));
        }

        let mut control = self.control.lock();
        let Some(session) = control.as_mut() else {
            return Err(self.not_running());
        };
        self.runtime
            .block_on(session.set_character_set(charset))
            .map_err(|message| {
                warn!(
                    "控制连接设置字符集失败: 别名={}, 字符集={}, 错误={}",
                    self.config.alias, charset, message
                );
                crate::async_sql_error!(charset, message)
            })?;

        info!("字符集已切换: 别名={}, 字符集={}", self.config.alias, charset);
        Ok(())
    }

    /// 同步执行关闭流程，返回关闭期间分发的完成项数量
    ///
    /// 停止接收任务，等待工作线程退出，然后反复执行残留任务并分发完成项直到两者皆空，
    /// 最后关闭所有连接。分发函数中的 panic 会被记录并吞掉。
    /// 对已停止的数据库调用是空操作。
    pub fn disconnect<F>(&self, mut dispatch: F) -> usize
    where
        F: FnMut(Completion),
    {
        {
            let mut state = self.state.lock();
            if matches!(*state, DatabaseState::Draining | DatabaseState::Stopped) {
                return 0;
            }
            *state = DatabaseState::Draining;
        }
        info!("开始关闭数据库: 别名={}", self.config.alias);

        self.tasks.close();
        if let Some(mut workers) = self.workers.lock().take() {
            workers.join();
        }

        let mut delivered = 0;
        loop {
            while let Some(task) = self.tasks.try_pop() {
                self.executor.process(task);
            }

            let batch = self.completions.pop_all();
            if batch.is_empty() && self.tasks.is_empty() {
                break;
            }
            for completion in batch {
                delivered += 1;
                if catch_unwind(AssertUnwindSafe(|| dispatch(completion))).is_err() {
                    warn!("关闭期间回调分发出错，已忽略: 别名={}", self.config.alias);
                }
            }
        }

        let control = self.control.lock().take();
        let closed = self.runtime.block_on(async {
            let closed = self.pool.close_all().await;
            if let Some(session) = control {
                session.close().await;
            }
            closed
        });

        *self.state.lock() = DatabaseState::Stopped;
        info!(
            "数据库已关闭: 别名={}, 分发完成项={}, 关闭连接={}",
            self.config.alias, delivered, closed
        );
        delivered
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        // 宿主已放弃该对象，剩余完成项连同回调句柄一并丢弃
        if self.state() != DatabaseState::Stopped {
            self.disconnect(drop);
        }
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("alias", &self.config.alias)
            .field("db_type", &self.db_type)
            .field("state", &self.state())
            .field("pool", &self.pool.stats())
            .finish()
    }
}
