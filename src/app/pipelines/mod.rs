pub mod extract_pipeline;
pub mod field_tree;

pub use extract_pipeline::ExtractPipeline;
pub use field_tree::FieldTree;
