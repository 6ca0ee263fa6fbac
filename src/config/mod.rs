pub mod cli;
pub mod toml_config;

/// 串流讀取緩衝區上限 (64 MiB)
pub const MAX_BUFFER_SIZE: usize = 64 * 1024 * 1024;

#[cfg(feature = "cli")]
pub use self::args::CliConfig;

#[cfg(feature = "cli")]
mod args {
    use crate::core::ConfigProvider;
    use crate::domain::model::{FieldMapping, OutputFormat};
    use crate::utils::error::Result;
    use crate::utils::validation::{self, Validate};
    use clap::Parser;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize, Parser)]
    #[command(name = "jsoniter")]
    #[command(about = "Pull selected fields out of large JSON documents")]
    pub struct CliConfig {
        /// JSON or newline-delimited JSON input, `-` reads stdin
        #[arg(long, short = 'i', default_value = "-")]
        pub input: String,

        /// Dotted path to the array or object holding the records
        #[arg(long)]
        pub root: Option<String>,

        /// Fields to extract as `path` or `path=column`
        #[arg(long, short = 'f', value_delimiter = ',')]
        pub fields: Vec<String>,

        #[arg(long, value_delimiter = ',', default_value = "csv")]
        pub formats: Vec<String>,

        #[arg(long, default_value = "./output")]
        pub output_path: String,

        /// Stream the input through a buffer of this many bytes
        #[arg(long)]
        pub buffer_size: Option<usize>,

        /// Output file name without extension
        #[arg(long, default_value = "extract")]
        pub name: String,

        #[arg(long)]
        pub max_records: Option<usize>,

        #[arg(long, help = "Trim whitespace around string values")]
        pub trim: bool,

        /// Columns that must be present and not null
        #[arg(long, value_delimiter = ',')]
        pub required: Vec<String>,

        /// Columns holding date-times to normalize to RFC 3339
        #[arg(long, value_delimiter = ',')]
        pub instants: Vec<String>,

        #[arg(long, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, default_value = "text")]
        pub log_format: String,

        /// TOML job file; replaces the extraction flags above
        #[arg(long)]
        pub config: Option<String>,
    }

    impl ConfigProvider for CliConfig {
        fn input_path(&self) -> &str {
            &self.input
        }

        fn root(&self) -> Option<&str> {
            self.root.as_deref()
        }

        fn fields(&self) -> &[String] {
            &self.fields
        }

        fn buffer_size(&self) -> Option<usize> {
            self.buffer_size
        }

        fn output_path(&self) -> &str {
            &self.output_path
        }

        fn output_formats(&self) -> &[String] {
            &self.formats
        }

        fn max_records(&self) -> Option<usize> {
            self.max_records
        }

        fn trim_whitespace(&self) -> bool {
            self.trim
        }

        fn required_fields(&self) -> &[String] {
            &self.required
        }

        fn instant_fields(&self) -> &[String] {
            &self.instants
        }

        fn job_name(&self) -> &str {
            &self.name
        }
    }

    impl Validate for CliConfig {
        fn validate(&self) -> Result<()> {
            validation::validate_path("input", &self.input)?;
            validation::validate_path("output_path", &self.output_path)?;
            validation::validate_non_empty_string("name", &self.name)?;
            validation::validate_one_of("log_format", &self.log_format, &["text", "json"])?;

            if let Some(size) = self.buffer_size {
                validation::validate_range("buffer_size", size, 1, super::MAX_BUFFER_SIZE)?;
            }
            if let Some(max) = self.max_records {
                validation::validate_positive_number("max_records", max, 1)?;
            }

            for field in &self.fields {
                field.parse::<FieldMapping>()?;
            }
            for format in &self.formats {
                validation::validate_one_of(
                    "formats",
                    &format.to_ascii_lowercase(),
                    &OutputFormat::NAMES,
                )?;
            }

            Ok(())
        }
    }

}
