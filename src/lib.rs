pub mod api;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use app::pipelines::{MergePipeline, NormalizePipeline, VideoPipeline, WebcastPipeline};
pub use app::{run_stages, Stage};
pub use config::cli::LocalStorage;
pub use config::toml_config::EtlConfig;
#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use core::etl::EtlEngine;
pub use utils::error::{EtlError, Result};
