//! 集成测试共用的脚本化驱动
//!
//! 语句脚本（以分号分隔）：
//! - `ROWS n`：返回 n 行，值依次为 0..n
//! - `ERROR msg`：该语句失败
//! - `PANIC`：会话实现 panic
//! - 其他：影响 1 行，返回一行语句文本
#![allow(dead_code)]

use async_trait::async_trait;
use rand::Rng;
use rat_asyncsql::{
    AsyncSqlResult, Completion, DatabaseConfig, DatabaseType, Driver, PoolConfig, QueryFlags,
    QueryResult, Row, Session, Value, async_sql_error,
};
use rat_asyncsql::{ConnectionConfig, Database};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// 驱动与所有会话共享的状态
#[derive(Default)]
pub struct Script {
    /// 成功建立的会话数（会话编号从 0 开始）
    pub connects: AtomicUsize,
    /// 每个会话被关闭的次数
    pub closes: Mutex<HashMap<usize, usize>>,
    /// 非零时，累计建立这么多会话后拒绝新连接
    pub refuse_after: AtomicUsize,
    /// 拒绝所有新连接
    pub refuse_connect: AtomicBool,
    /// 接下来这么多次执行会发现连接已断开
    pub kill_next: AtomicUsize,
    /// 执行延迟上限（毫秒），零表示不延迟
    pub max_latency_ms: AtomicU64,
    /// 拒绝切换字符集的会话编号
    pub reject_charset_for: Mutex<Option<usize>>,
    /// 每个会话当前的字符集
    pub charsets: Mutex<HashMap<usize, String>>,
    next_insert_id: AtomicU64,
}

impl Script {
    pub fn close_counts(&self) -> HashMap<usize, usize> {
        self.closes.lock().unwrap().clone()
    }

    pub fn charset_of(&self, session: usize) -> Option<String> {
        self.charsets.lock().unwrap().get(&session).cloned()
    }
}

pub struct ScriptedDriver {
    script: Arc<Script>,
}

impl ScriptedDriver {
    pub fn new() -> (Arc<dyn Driver>, Arc<Script>) {
        let script = Arc::new(Script::default());
        let driver: Arc<dyn Driver> = Arc::new(Self {
            script: script.clone(),
        });
        (driver, script)
    }
}

#[async_trait]
impl Driver for ScriptedDriver {
    fn db_type(&self) -> DatabaseType {
        DatabaseType::SQLite
    }

    async fn connect(&self) -> AsyncSqlResult<Box<dyn Session>> {
        let limit = self.script.refuse_after.load(Ordering::SeqCst);
        let count = self.script.connects.load(Ordering::SeqCst);
        if self.script.refuse_connect.load(Ordering::SeqCst) || (limit > 0 && count >= limit) {
            return Err(async_sql_error!(connect, "Can't connect to server"));
        }
        let id = self.script.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedSession {
            id,
            alive: true,
            script: self.script.clone(),
        }))
    }
}

struct ScriptedSession {
    id: usize,
    alive: bool,
    script: Arc<Script>,
}

impl ScriptedSession {
    fn make_row(flags: QueryFlags, value: Value) -> Row {
        if flags.contains(QueryFlags::ASSOC) {
            Row::Named(vec![("value".to_string(), value)])
        } else {
            Row::Indexed(vec![value])
        }
    }
}

#[async_trait]
impl Session for ScriptedSession {
    async fn execute(&mut self, sql: &str, flags: QueryFlags) -> Result<Vec<QueryResult>, String> {
        let max = self.script.max_latency_ms.load(Ordering::SeqCst);
        if max > 0 {
            let delay = rand::thread_rng().gen_range(0..=max);
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        let killed = self
            .script
            .kill_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if killed {
            self.alive = false;
        }
        if !self.alive {
            return Err("Lost connection to server during query".to_string());
        }

        let mut results = Vec::new();
        for (index, statement) in sql.split(';').map(str::trim).filter(|s| !s.is_empty()).enumerate() {
            if statement == "PANIC" {
                panic!("脚本化会话 panic");
            }
            if statement.starts_with("ERROR") {
                if index == 0 {
                    return Err(statement.to_string());
                }
                results.push(QueryResult::failure(statement));
                break;
            }
            if let Some(count) = statement.strip_prefix("ROWS ") {
                let count: usize = count.parse().map_err(|_| "bad ROWS count".to_string())?;
                let rows = (0..count)
                    .map(|n| Self::make_row(flags, Value::Number(n as f64)))
                    .collect();
                results.push(QueryResult::success(0, None, rows));
                continue;
            }
            let insert_id = self.script.next_insert_id.fetch_add(1, Ordering::SeqCst) + 1;
            let last_id = flags.contains(QueryFlags::LAST_ID).then_some(insert_id);
            let row = Self::make_row(flags, Value::Text(statement.to_string()));
            results.push(QueryResult::success(1, last_id, vec![row]));
        }
        Ok(results)
    }

    async fn ping(&mut self) -> bool {
        self.alive
    }

    async fn set_character_set(&mut self, charset: &str) -> Result<(), String> {
        if *self.script.reject_charset_for.lock().unwrap() == Some(self.id) {
            return Err(format!("Unknown character set: '{}'", charset));
        }
        self.script
            .charsets
            .lock()
            .unwrap()
            .insert(self.id, charset.to_string());
        Ok(())
    }

    fn escape(&self, text: &str) -> String {
        rat_asyncsql::adapter::escape_mysql(text)
    }

    async fn close(self: Box<Self>) {
        *self.script.closes.lock().unwrap().entry(self.id).or_insert(0) += 1;
    }
}

/// 测试用数据库配置
pub fn test_config(alias: &str, connections: usize, workers: usize) -> DatabaseConfig {
    DatabaseConfig::builder()
        .db_type(DatabaseType::SQLite)
        .connection(ConnectionConfig::SQLite {
            path: format!("./{}.db", alias),
            create_if_missing: true,
        })
        .pool(
            PoolConfig::builder()
                .connections(connections)
                .workers(workers)
                .io_threads(1)
                .build()
                .expect("连接池配置无效"),
        )
        .alias(alias)
        .build()
        .expect("数据库配置无效")
}

/// 反复轮询直到收到 `expected` 个完成项或超时
pub fn poll_until(db: &Database, expected: usize) -> Vec<Completion> {
    let deadline = Instant::now() + Duration::from_secs(20);
    let mut collected = Vec::new();
    while collected.len() < expected && Instant::now() < deadline {
        if db.poll(|c| collected.push(c)) == 0 {
            std::thread::sleep(Duration::from_millis(2));
        }
    }
    collected
}
