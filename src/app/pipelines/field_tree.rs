use crate::core::input::Input;
use crate::core::iterator::JsonIterator;
use crate::core::value_type::ValueType;
use crate::domain::model::{FieldMapping, Record};
use crate::utils::error::Result;
use serde_json::Value;
use std::collections::HashMap;

/// Field selections arranged by path segment.
///
/// Reading an object walks the tree alongside the JSON: unselected fields are
/// skipped without being decoded and only selected branches are descended.
#[derive(Debug, Default)]
pub struct FieldTree {
    children: HashMap<String, FieldTree>,
    column: Option<String>,
}

impl FieldTree {
    pub fn new(mappings: &[FieldMapping]) -> Self {
        let mut root = FieldTree::default();
        for mapping in mappings {
            let node = mapping.segments().fold(&mut root, |node, segment| {
                node.children.entry(segment.to_string()).or_default()
            });
            node.column = Some(mapping.column.clone());
        }
        root
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// 讀取目前位置的物件；沒有選任何欄位時保留所有頂層欄位
    pub fn read_record<I: Input>(&self, ji: &mut JsonIterator<I>) -> Result<Record> {
        let mut record = Record::default();
        if self.is_empty() {
            while let Some(field) = ji.read_obj_field()? {
                let value = ji.read_value()?;
                record.data.insert(field, value);
            }
        } else {
            self.read_fields(ji, &mut record)?;
        }
        Ok(record)
    }

    fn read_fields<I: Input>(&self, ji: &mut JsonIterator<I>, record: &mut Record) -> Result<()> {
        ji.test_object(|field, ji| {
            match self.children.get(field) {
                Some(node) => node.read_node(ji, record)?,
                None => {
                    ji.skip()?;
                }
            }
            Ok(true)
        })
    }

    fn read_node<I: Input>(&self, ji: &mut JsonIterator<I>, record: &mut Record) -> Result<()> {
        match &self.column {
            Some(column) => {
                let value = ji.read_value()?;
                // 同一個節點本身和子欄位都被選到
                if !self.children.is_empty() {
                    self.select_from_value(&value, record);
                }
                record.data.insert(column.clone(), value);
            }
            None if ji.what_is_next()? == ValueType::Object => self.read_fields(ji, record)?,
            None => {
                ji.skip()?;
            }
        }
        Ok(())
    }

    fn select_from_value(&self, value: &Value, record: &mut Record) {
        for (name, child) in &self.children {
            if let Some(inner) = value.get(name) {
                if let Some(column) = &child.column {
                    record.data.insert(column.clone(), inner.clone());
                }
                child.select_from_value(inner, record);
            }
        }
    }
}
