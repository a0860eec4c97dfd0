//! 工作线程池与语句执行器
//!
//! 工作线程是普通的系统线程，通过数据库私有的 tokio runtime 驱动 sqlx 会话。

use super::completion_queue::CompletionQueue;
use super::pool::{Connection, ConnectionPool};
use super::task_queue::TaskQueue;
use crate::error::AsyncSqlResult;
use crate::types::{Completion, QueryFlags, QueryResult, Task};
use rat_logger::{debug, error, info, warn};
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tokio::runtime::Runtime;

/// 语句执行器
///
/// 处理一个任务：租用连接，执行（必要时重建连接并重试一次），
/// 把完成项推入完成队列，最后归还连接。
pub struct StatementExecutor {
    alias: String,
    runtime: Arc<Runtime>,
    pool: Arc<ConnectionPool>,
    completions: Arc<CompletionQueue>,
}

impl StatementExecutor {
    pub fn new(
        alias: &str,
        runtime: Arc<Runtime>,
        pool: Arc<ConnectionPool>,
        completions: Arc<CompletionQueue>,
    ) -> Self {
        Self {
            alias: alias.to_string(),
            runtime,
            pool,
            completions,
        }
    }

    /// 处理一个任务直至完成
    ///
    /// 不能在 tokio runtime 上下文中调用
    pub fn process(&self, task: Task) {
        let mut conn = self.pool.lease();
        debug!("执行任务: 别名={}, 任务={}, 槽位={}", self.alias, task.id, conn.slot());

        // 会话实现中的 panic 不能带走工作线程，也不能让连接永远处于租用状态
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            self.runtime
                .block_on(self.execute_with_retry(&mut conn, &task.sql, task.flags))
        }));
        let results = match outcome {
            Ok(results) => results,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(
                    "任务执行时发生panic: 别名={}, 槽位={}, 错误={}",
                    self.alias,
                    conn.slot(),
                    message
                );
                self.discard_session(&mut conn);
                vec![QueryResult::failure(crate::i18n::tf(
                    "error.task_panicked",
                    &[("message", &message)],
                ))]
            }
        };

        self.completions.push(Completion::new(task, results));
        self.pool.release(conn);
    }

    /// 关闭状态未知的会话，槽位留空等待下一个任务重建
    fn discard_session(&self, conn: &mut Connection) {
        let Some(session) = conn.take_session() else {
            return;
        };
        let closed = catch_unwind(AssertUnwindSafe(|| self.runtime.block_on(session.close())));
        if closed.is_err() {
            warn!("关闭会话时发生panic，已忽略: 别名={}, 槽位={}", self.alias, conn.slot());
        }
    }

    async fn execute_with_retry(
        &self,
        conn: &mut Connection,
        sql: &str,
        flags: QueryFlags,
    ) -> Vec<QueryResult> {
        if let Some(session) = conn.session_mut() {
            match session.execute(sql, flags).await {
                Ok(results) => return results,
                Err(message) => {
                    // 连接仍然存活：这是语句本身的错误
                    if session.ping().await {
                        return vec![QueryResult::from_error(&crate::async_sql_error!(statement, message))];
                    }
                    warn!(
                        "连接失效: 别名={}, 槽位={}, 错误={}",
                        self.alias,
                        conn.slot(),
                        message
                    );
                }
            }
        }

        if let Err(e) = self.pool.reconnect(conn).await {
            return vec![QueryResult::from_error(&e)];
        }

        let Some(session) = conn.session_mut() else {
            return vec![QueryResult::failure(crate::i18n::t("error.connection_unavailable"))];
        };
        match session.execute(sql, flags).await {
            Ok(results) => results,
            Err(message) => {
                error!("重试失败: 别名={}, 槽位={}, 错误={}", self.alias, conn.slot(), message);
                vec![QueryResult::from_error(&crate::async_sql_error!(statement, message))]
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        text.to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// 固定大小的工作线程池
pub struct WorkerPool {
    alias: String,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// 启动 `count` 个工作线程
    ///
    /// 任一线程启动失败时关闭队列、回收已启动的线程并返回错误
    pub fn spawn(
        alias: &str,
        count: usize,
        queue: Arc<TaskQueue>,
        executor: Arc<StatementExecutor>,
    ) -> AsyncSqlResult<Self> {
        let mut pool = Self {
            alias: alias.to_string(),
            handles: Vec::with_capacity(count),
        };

        for index in 0..count {
            let queue_ref = queue.clone();
            let executor_ref = executor.clone();
            let spawned = thread::Builder::new()
                .name(format!("asyncsql-{}-{}", alias, index))
                .spawn(move || {
                    while let Some(task) = queue_ref.pop_blocking() {
                        executor_ref.process(task);
                    }
                });

            match spawned {
                Ok(handle) => pool.handles.push(handle),
                Err(e) => {
                    error!("工作线程启动失败: 别名={}, 序号={}, 错误={}", alias, index, e);
                    queue.close();
                    pool.join();
                    return Err(crate::async_sql_error!(worker, e));
                }
            }
        }

        info!("工作线程池已启动: 别名={}, 线程数={}", alias, count);
        Ok(pool)
    }

    /// 线程数
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// 等待所有工作线程退出，返回回收的线程数
    ///
    /// 调用前必须先关闭任务队列
    pub fn join(&mut self) -> usize {
        let mut joined = 0;
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                error!("工作线程异常退出: 别名={}", self.alias);
            }
            joined += 1;
        }
        debug!("工作线程已全部退出: 别名={}, 数量={}", self.alias, joined);
        joined
    }
}
