use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

/// 单元格标量值
///
/// 数值类列统一转为浮点数，其余类型按文本透传，NULL 显式保留
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// 空值
    Null,
    /// 数值（整数、定点数、浮点数、位类型）
    Number(f64),
    /// 文本
    Text(String),
}

impl Value {
    /// 是否为空值
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::Text(s) => serializer.serialize_str(s),
        }
    }
}

/// 结果行
///
/// 由提交时的 `ASSOC` 标志决定按位置还是按列名组织，列顺序始终与引擎返回一致
#[derive(Debug, Clone, PartialEq)]
pub enum Row {
    /// 按位置访问
    Indexed(Vec<Value>),
    /// 按列名访问（保留列顺序）
    Named(Vec<(String, Value)>),
}

impl Row {
    /// 列数
    pub fn len(&self) -> usize {
        match self {
            Row::Indexed(values) => values.len(),
            Row::Named(pairs) => pairs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 按位置取值（从0开始）
    pub fn get(&self, index: usize) -> Option<&Value> {
        match self {
            Row::Indexed(values) => values.get(index),
            Row::Named(pairs) => pairs.get(index).map(|(_, v)| v),
        }
    }

    /// 按列名取值
    ///
    /// 同名列时后出现的列覆盖先出现的列，与映射语义一致
    pub fn get_named(&self, name: &str) -> Option<&Value> {
        match self {
            Row::Indexed(_) => None,
            Row::Named(pairs) => pairs.iter().rev().find(|(k, _)| k == name).map(|(_, v)| v),
        }
    }

    /// 取出所有值，丢弃列名
    pub fn into_values(self) -> Vec<Value> {
        match self {
            Row::Indexed(values) => values,
            Row::Named(pairs) => pairs.into_iter().map(|(_, v)| v).collect(),
        }
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Row::Indexed(values) => {
                let mut seq = serializer.serialize_seq(Some(values.len()))?;
                for value in values {
                    seq.serialize_element(value)?;
                }
                seq.end()
            }
            Row::Named(pairs) => {
                let mut map = serializer.serialize_map(Some(pairs.len()))?;
                for (name, value) in pairs {
                    map.serialize_entry(name, value)?;
                }
                map.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_row_last_duplicate_wins() {
        let row = Row::Named(vec![
            ("id".to_string(), Value::Number(1.0)),
            ("id".to_string(), Value::Number(2.0)),
            ("name".to_string(), Value::Text("bob".to_string())),
        ]);
        assert_eq!(row.get_named("id"), Some(&Value::Number(2.0)));
        assert_eq!(row.get(0), Some(&Value::Number(1.0)));
        assert_eq!(row.get_named("missing"), None);
    }

    #[test]
    fn test_row_json_shape_follows_mode() {
        let indexed = Row::Indexed(vec![Value::Number(1.0), Value::Null, Value::Text("a".into())]);
        assert_eq!(serde_json::to_string(&indexed).unwrap(), r#"[1.0,null,"a"]"#);

        let named = Row::Named(vec![
            ("b".to_string(), Value::Text("x".into())),
            ("a".to_string(), Value::Null),
        ]);
        let json = serde_json::to_value(&named).unwrap();
        assert_eq!(json["b"], "x");
        assert!(json["a"].is_null());
    }
}
