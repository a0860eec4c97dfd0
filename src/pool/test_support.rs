//! 单元测试用的内存驱动

use crate::adapter::{Driver, Session};
use crate::error::AsyncSqlResult;
use crate::types::*;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// 共享的驱动状态
#[derive(Default)]
pub(crate) struct MemoryState {
    pub connects: AtomicUsize,
    pub closes: AtomicUsize,
    /// 为真时新连接建立失败
    pub refuse_connect: AtomicBool,
    /// 非零时，累计建立这么多连接后拒绝新连接
    pub refuse_after: AtomicUsize,
    /// 下一次执行时让会话"断线"
    pub drop_next: AtomicBool,
}

pub(crate) struct MemoryDriver {
    pub state: Arc<MemoryState>,
}

impl MemoryDriver {
    pub fn new() -> (Arc<dyn Driver>, Arc<MemoryState>) {
        let state = Arc::new(MemoryState::default());
        let driver: Arc<dyn Driver> = Arc::new(Self {
            state: state.clone(),
        });
        (driver, state)
    }
}

#[async_trait]
impl Driver for MemoryDriver {
    fn db_type(&self) -> DatabaseType {
        DatabaseType::SQLite
    }

    async fn connect(&self) -> AsyncSqlResult<Box<dyn Session>> {
        let limit = self.state.refuse_after.load(Ordering::SeqCst);
        let exhausted = limit > 0 && self.state.connects.load(Ordering::SeqCst) >= limit;
        if exhausted || self.state.refuse_connect.load(Ordering::SeqCst) {
            return Err(crate::async_sql_error!(connect, "connection refused"));
        }
        self.state.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemorySession {
            state: self.state.clone(),
            alive: true,
        }))
    }
}

struct MemorySession {
    state: Arc<MemoryState>,
    alive: bool,
}

#[async_trait]
impl Session for MemorySession {
    async fn execute(&mut self, sql: &str, _flags: QueryFlags) -> Result<Vec<QueryResult>, String> {
        if self.state.drop_next.swap(false, Ordering::SeqCst) {
            self.alive = false;
        }
        if !self.alive {
            return Err("server has gone away".to_string());
        }
        if sql.starts_with("PANIC") {
            panic!("会话实现出错");
        }
        if sql.starts_with("FAIL") {
            return Err("syntax error".to_string());
        }
        Ok(sql
            .split(';')
            .map(|stmt| {
                QueryResult::success(0, None, vec![Row::Indexed(vec![Value::Text(stmt.trim().to_string())])])
            })
            .collect())
    }

    async fn ping(&mut self) -> bool {
        self.alive
    }

    async fn set_character_set(&mut self, _charset: &str) -> Result<(), String> {
        Ok(())
    }

    fn escape(&self, text: &str) -> String {
        crate::adapter::escape_sqlite(text)
    }

    async fn close(self: Box<Self>) {
        self.state.closes.fetch_add(1, Ordering::SeqCst);
    }
}
