//! 任务与结果模型
//!
//! 一次提交对应一个 [`Task`]，执行后产生按语句顺序排列的 [`QueryResult`] 列表，
//! 最终以 [`Completion`] 的形式经完成队列交还给轮询方。

use serde::{Deserialize, Serialize};
use std::ops::BitOr;
use uuid::Uuid;

use super::value::Row;
use crate::error::AsyncSqlError;

/// 提交标志
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryFlags(u32);

impl QueryFlags {
    /// 无标志
    pub const NONE: QueryFlags = QueryFlags(0);
    /// 行按列名组织
    pub const ASSOC: QueryFlags = QueryFlags(1);
    /// 返回每条语句的 last-insert-id
    pub const LAST_ID: QueryFlags = QueryFlags(2);

    /// 从原始位值构造，未知位被忽略
    pub fn from_bits(bits: u32) -> Self {
        QueryFlags(bits & (Self::ASSOC.0 | Self::LAST_ID.0))
    }

    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn contains(&self, other: QueryFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for QueryFlags {
    type Output = QueryFlags;

    fn bitor(self, rhs: QueryFlags) -> QueryFlags {
        QueryFlags(self.0 | rhs.0)
    }
}

/// 宿主回调句柄
///
/// 引擎从不解释其内容。句柄不可复制：每个句柄要么经完成分发恰好交还一次，
/// 要么在宿主已放弃数据库时随任务一同丢弃，不会被再次触碰。
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct CallbackHandle(i64);

impl CallbackHandle {
    pub fn new(raw: i64) -> Self {
        CallbackHandle(raw)
    }

    pub fn raw(&self) -> i64 {
        self.0
    }

    /// 交还原始值，由宿主负责释放
    pub fn into_raw(self) -> i64 {
        self.0
    }
}

/// 宿主用户上下文，原样透传
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct UserContext(i64);

impl UserContext {
    pub fn new(raw: i64) -> Self {
        UserContext(raw)
    }

    pub fn raw(&self) -> i64 {
        self.0
    }

    pub fn into_raw(self) -> i64 {
        self.0
    }
}

/// 一次客户端提交
#[derive(Debug)]
pub struct Task {
    /// 任务ID
    pub id: Uuid,
    /// 语句文本（可以是多语句批次）
    pub sql: String,
    /// 回调句柄
    pub callback: Option<CallbackHandle>,
    /// 用户上下文
    pub context: Option<UserContext>,
    /// 提交标志
    pub flags: QueryFlags,
}

impl Task {
    pub fn new<S: Into<String>>(sql: S) -> Self {
        Self {
            id: Uuid::new_v4(),
            sql: sql.into(),
            callback: None,
            context: None,
            flags: QueryFlags::NONE,
        }
    }

    pub fn with_callback(mut self, callback: CallbackHandle) -> Self {
        self.callback = Some(callback);
        self
    }

    pub fn with_context(mut self, context: UserContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_flags(mut self, flags: QueryFlags) -> Self {
        self.flags = flags;
        self
    }
}

/// 单条语句的执行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryStatus {
    Success,
    Failure,
}

/// 批次中一条语句的结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    /// 执行状态
    pub status: QueryStatus,
    /// 错误信息（成功时为空）
    pub error: String,
    /// 影响行数
    pub affected_rows: u64,
    /// 最后插入ID（仅在请求 `LAST_ID` 时填充）
    pub last_insert_id: Option<u64>,
    /// 结果行，顺序与引擎返回一致
    pub rows: Vec<Row>,
}

impl QueryResult {
    pub fn success(affected_rows: u64, last_insert_id: Option<u64>, rows: Vec<Row>) -> Self {
        Self {
            status: QueryStatus::Success,
            error: String::new(),
            affected_rows,
            last_insert_id,
            rows,
        }
    }

    pub fn failure<S: Into<String>>(error: S) -> Self {
        let mut error = error.into();
        if error.is_empty() {
            error = "unknown error".to_string();
        }
        Self {
            status: QueryStatus::Failure,
            error,
            affected_rows: 0,
            last_insert_id: None,
            rows: Vec::new(),
        }
    }

    /// 由引擎错误构造失败结果，错误以数据形式交还宿主
    pub fn from_error(err: &AsyncSqlError) -> Self {
        Self::failure(err.to_string())
    }

    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }
}

/// 完成的任务，由工作线程移交给轮询方
#[derive(Debug)]
pub struct Completion {
    /// 任务ID
    pub id: Uuid,
    /// 原始语句
    pub sql: String,
    /// 回调句柄
    pub callback: Option<CallbackHandle>,
    /// 用户上下文，原样透传
    pub context: Option<UserContext>,
    /// 顶层成功标志：所有结果都成功
    pub success: bool,
    /// 顶层错误信息：第一条失败结果的错误
    pub error: Option<String>,
    /// 按语句顺序排列的结果
    pub results: Vec<QueryResult>,
}

impl Completion {
    /// 由任务与其结果构造完成项，任务的所有权在此转移
    pub fn new(task: Task, results: Vec<QueryResult>) -> Self {
        let error = results
            .iter()
            .find(|r| !r.is_success())
            .map(|r| r.error.clone());

        Self {
            id: task.id,
            sql: task.sql,
            callback: task.callback,
            context: task.context,
            success: error.is_none(),
            error,
            results,
        }
    }

    /// 第一条结果的 last-insert-id（对应单语句提交）
    pub fn last_insert_id(&self) -> Option<u64> {
        self.results.first().and_then(|r| r.last_insert_id)
    }

    /// 回调负载的 JSON 形式，供宿主绑定层直接转换
    pub fn payload(&self) -> serde_json::Value {
        serde_json::json!({
            "success": self.success,
            "error": self.error,
            "results": self.results,
        })
    }
}
