pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;
pub use crate::config::{cli::LocalStorage, toml_config::JobConfig};

pub use crate::app::pipelines::ExtractPipeline;
pub use crate::core::engine::ExtractEngine;
pub use crate::core::factory::{parse_list, parse_list_or_strings, ElementFactory, JsonIterParser};
pub use crate::core::input::{Input, ReadInput, SliceInput};
pub use crate::core::instant::parse_instant;
pub use crate::core::iterator::{JsonIterator, SliceJsonIterator, StreamJsonIterator};
pub use crate::core::value_type::ValueType;
pub use crate::utils::error::{JsonError, Result};

pub use bigdecimal::{num_bigint::BigInt, BigDecimal};
