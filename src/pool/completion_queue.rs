//! 完成队列
//!
//! 多生产者、单消费者。工作线程逐个追加，轮询方一次性取走全部。

use crate::types::Completion;
use parking_lot::Mutex;

/// 完成队列
#[derive(Debug, Default)]
pub struct CompletionQueue {
    pending: Mutex<Vec<Completion>>,
}

impl CompletionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个完成项
    pub fn push(&self, completion: Completion) {
        self.pending.lock().push(completion);
    }

    /// 取走全部完成项，锁只在交换期间持有
    pub fn pop_all(&self) -> Vec<Completion> {
        std::mem::take(&mut *self.pending.lock())
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }
}
