//! 欄位名稱比對工具，搭配 `test_obj_field` / `test_object` 使用
use std::cmp::Ordering;

pub fn field_equals(expected: &str, field: &str) -> bool {
    expected.len() == field.len() && expected == field
}

/// 31 倍乘法雜湊，和 `match` 搭配可以快速分派欄位
pub fn field_hash_code(field: &str) -> i32 {
    field
        .bytes()
        .fold(0i32, |hash, b| hash.wrapping_mul(31).wrapping_add(i32::from(b)))
}

/// Orders by length first, then bytewise.
pub fn field_compare(expected: &str, field: &str) -> Ordering {
    field
        .len()
        .cmp(&expected.len())
        .then_with(|| field.as_bytes().cmp(expected.as_bytes()))
}
