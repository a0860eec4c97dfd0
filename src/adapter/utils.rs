//! 数据库适配器通用工具模块
//!
//! 行物化、列类型归类、方言转义与字符集名称校验

use crate::types::{QueryFlags, QueryResult, Row, Value};
use once_cell::sync::Lazy;
use regex::Regex;

/// 字符集名称只允许字母、数字和下划线，`SET NAMES` 无法参数化
static CHARSET_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_]+$").expect("字符集名称正则无效")
});

/// 校验字符集名称
pub fn is_valid_charset(name: &str) -> bool {
    CHARSET_NAME.is_match(name)
}

/// MySQL 字符串转义
///
/// 与 `mysql_real_escape_string` 对 ASCII 兼容字符集的行为一致
pub fn escape_mysql(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + text.len() / 8);
    for ch in text.chars() {
        match ch {
            '\0' => escaped.push_str("\\0"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("\\'"),
            '"' => escaped.push_str("\\\""),
            '\x1a' => escaped.push_str("\\Z"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// SQLite 字符串转义（单引号加倍）
pub fn escape_sqlite(text: &str) -> String {
    text.replace('\'', "''")
}

/// MySQL 列类型是否按数值处理
///
/// BIGINT 与 YEAR 保持文本，避免 64 位整数在浮点数中丢失精度
pub fn is_mysql_numeric(type_name: &str) -> bool {
    let base = type_name.strip_suffix(" UNSIGNED").unwrap_or(type_name);
    matches!(
        base,
        "TINYINT"
            | "SMALLINT"
            | "MEDIUMINT"
            | "INT"
            | "BOOLEAN"
            | "BIT"
            | "DECIMAL"
            | "FLOAT"
            | "DOUBLE"
    )
}

/// SQLite 值类型是否按数值处理
pub fn is_sqlite_numeric(type_name: &str) -> bool {
    matches!(type_name, "INTEGER" | "REAL" | "NUMERIC" | "BOOLEAN")
}

/// 把文本形式的数值解析为浮点数，无法解析时为 0
pub fn parse_number(bytes: &[u8]) -> f64 {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.trim().parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// BIT 列按大端无符号整数解码
pub fn decode_bit(bytes: &[u8]) -> f64 {
    bytes
        .iter()
        .take(8)
        .fold(0u64, |acc, b| (acc << 8) | u64::from(*b)) as f64
}

/// 一次批次执行的结果收集器
///
/// 行在到达时立即物化，每个语句结束时封装为一个 [`QueryResult`]
#[derive(Debug)]
pub struct BatchCollector {
    flags: QueryFlags,
    rows: Vec<Row>,
    results: Vec<QueryResult>,
}

impl BatchCollector {
    pub fn new(flags: QueryFlags) -> Self {
        Self {
            flags,
            rows: Vec::new(),
            results: Vec::new(),
        }
    }

    /// 是否使用列名组织行
    pub fn assoc(&self) -> bool {
        self.flags.contains(QueryFlags::ASSOC)
    }

    /// 尚未产生任何输出
    pub fn is_pristine(&self) -> bool {
        self.results.is_empty() && self.rows.is_empty()
    }

    pub fn push_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// 当前语句执行完毕
    pub fn finish_statement(&mut self, affected_rows: u64, last_insert_id: u64) {
        let last_insert_id = self
            .flags
            .contains(QueryFlags::LAST_ID)
            .then_some(last_insert_id);
        let rows = std::mem::take(&mut self.rows);
        self.results
            .push(QueryResult::success(affected_rows, last_insert_id, rows));
    }

    /// 结束收集
    ///
    /// 出错时，如果批次还没有任何输出，返回 `Err` 交给调用方做存活探测；
    /// 否则把错误作为一个失败结果追加到已完成的结果之后。
    pub fn finish(mut self, error: Option<String>) -> Result<Vec<QueryResult>, String> {
        match error {
            None => {
                // 最后一个语句的行没有收到结束标记时也要保留
                if !self.rows.is_empty() {
                    self.finish_statement(0, 0);
                }
                Ok(self.results)
            }
            Some(message) if self.is_pristine() => Err(message),
            Some(message) => {
                self.rows.clear();
                self.results.push(QueryResult::failure(message));
                Ok(self.results)
            }
        }
    }
}

/// 提取 sqlx 错误的文本，数据库错误只保留服务端原始消息
#[cfg(feature = "sqlx")]
pub fn error_text(err: &sqlx::Error) -> String {
    match err {
        sqlx::Error::Database(db) => db.message().to_string(),
        other => other.to_string(),
    }
}

/// 把 sqlx 行物化为引擎行
///
/// 所有列先以原始字节读取：文本协议下数值列本身就是十进制文本，
/// 由 `numeric` 根据列的运行时类型名决定是否转为数值。
#[cfg(feature = "sqlx")]
pub fn materialize_row<R>(
    row: &R,
    assoc: bool,
    numeric: fn(&str) -> bool,
) -> Result<Row, sqlx::Error>
where
    R: sqlx::Row,
    usize: sqlx::ColumnIndex<R>,
    for<'r> Vec<u8>: sqlx::Decode<'r, R::Database>,
{
    use sqlx::{Column, TypeInfo, ValueRef};

    let mut values = Vec::with_capacity(row.len());
    for index in 0..row.len() {
        let raw = row.try_get_raw(index)?;
        if raw.is_null() {
            values.push(Value::Null);
            continue;
        }
        let type_name = raw.type_info().name().to_string();

        let bytes: Vec<u8> = row.try_get_unchecked(index)?;
        let value = if type_name == "BIT" {
            Value::Number(decode_bit(&bytes))
        } else if numeric(&type_name) {
            Value::Number(parse_number(&bytes))
        } else {
            Value::Text(String::from_utf8_lossy(&bytes).into_owned())
        };
        values.push(value);
    }

    if assoc {
        let named = row
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .zip(values)
            .collect();
        Ok(Row::Named(named))
    } else {
        Ok(Row::Indexed(values))
    }
}
