//! 连接池模块
//!
//! 基于生产者/消费者模式的执行核心：
//! 宿主线程提交任务到任务队列，工作线程租用连接执行，
//! 完成项经完成队列交还给宿主线程轮询。

pub mod completion_queue;
pub mod pool;
pub mod task_queue;
pub mod worker;

#[cfg(test)]
pub(crate) mod test_support;

// 重新导出主要的公共类型和结构体
pub use completion_queue::CompletionQueue;
pub use pool::{Connection, ConnectionPool, PoolStats};
pub use task_queue::TaskQueue;
pub use worker::{StatementExecutor, WorkerPool};
