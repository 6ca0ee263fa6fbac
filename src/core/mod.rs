pub mod engine;
pub mod factory;
pub mod field;
pub mod input;
pub mod instant;
pub mod iterator;
mod number;
mod string;
pub mod value_type;

pub use crate::domain::model::{Record, TransformResult};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
