use serde::{Deserialize, Serialize};

/// 由下一個值的第一個位元組判斷出的 JSON 型別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Invalid,
    String,
    Number,
    Null,
    Boolean,
    Array,
    Object,
}

impl ValueType {
    pub fn of(b: u8) -> Self {
        match b {
            b'"' => ValueType::String,
            b'-' | b'0'..=b'9' => ValueType::Number,
            b't' | b'f' => ValueType::Boolean,
            b'n' => ValueType::Null,
            b'[' => ValueType::Array,
            b'{' => ValueType::Object,
            _ => ValueType::Invalid,
        }
    }
}
