pub mod categorizer;
pub mod columns;
pub mod etl;
pub mod merger;
pub mod normalizer;
pub mod table;

pub use crate::domain::model::TransformResult;
pub use crate::domain::ports::{Pipeline, Storage};
pub use crate::utils::error::Result;
