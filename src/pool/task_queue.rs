//! 任务队列
//!
//! 基于 crossbeam::SegQueue 的无锁 FIFO，配合条件变量让空闲工作线程阻塞等待。
//! 提交方从不阻塞。

use crate::types::Task;
use crossbeam_queue::SegQueue;
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};

/// 任务队列
#[derive(Debug, Default)]
pub struct TaskQueue {
    tasks: SegQueue<Task>,
    closed: AtomicBool,
    lock: Mutex<()>,
    ready: Condvar,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// 入队，队列关闭后把任务原样退回
    pub fn push(&self, task: Task) -> Result<(), Task> {
        if self.closed.load(Ordering::Acquire) {
            return Err(task);
        }
        self.tasks.push(task);

        // 先取锁再通知，等待方在锁内检查队列，不会错过唤醒
        drop(self.lock.lock());
        self.ready.notify_one();
        Ok(())
    }

    /// 阻塞出队
    ///
    /// 队列关闭后仍会先把剩余任务取完，全部取完才返回 `None`
    pub fn pop_blocking(&self) -> Option<Task> {
        loop {
            if let Some(task) = self.tasks.pop() {
                return Some(task);
            }

            let mut guard = self.lock.lock();
            if !self.tasks.is_empty() {
                continue;
            }
            if self.closed.load(Ordering::Acquire) {
                return None;
            }
            self.ready.wait(&mut guard);
        }
    }

    /// 非阻塞出队
    pub fn try_pop(&self) -> Option<Task> {
        self.tasks.pop()
    }

    /// 关闭队列并唤醒所有等待的工作线程
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        drop(self.lock.lock());
        self.ready.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// 排队中尚未开始的任务数
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_fifo_order() {
        let queue = TaskQueue::new();
        for i in 0..3 {
            queue.push(Task::new(format!("SELECT {}", i))).unwrap();
        }
        let order: Vec<String> = std::iter::from_fn(|| queue.try_pop()).map(|t| t.sql).collect();
        assert_eq!(order, vec!["SELECT 0", "SELECT 1", "SELECT 2"]);
    }

    #[test]
    fn test_closed_queue_rejects_and_drains() {
        let queue = TaskQueue::new();
        queue.push(Task::new("SELECT 1")).unwrap();
        queue.close();

        let rejected = queue.push(Task::new("SELECT 2")).unwrap_err();
        assert_eq!(rejected.sql, "SELECT 2");
        assert_eq!(queue.pop_blocking().map(|t| t.sql).as_deref(), Some("SELECT 1"));
        assert!(queue.pop_blocking().is_none());
    }

    #[test]
    fn test_close_wakes_blocked_consumers() {
        let queue = Arc::new(TaskQueue::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let queue = queue.clone();
                thread::spawn(move || {
                    let mut seen = 0;
                    while queue.pop_blocking().is_some() {
                        seen += 1;
                    }
                    seen
                })
            })
            .collect();

        for i in 0..50 {
            queue.push(Task::new(format!("SELECT {}", i))).unwrap();
        }
        queue.close();

        let total: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(total, 50);
    }
}
