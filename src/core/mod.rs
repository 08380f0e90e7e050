pub mod aggregator;
pub mod archive;
pub mod engine;
pub mod grid;
pub mod pipeline;
pub mod renderer;

pub use crate::domain::model::{PivotRow, SalesRecord, TransformResult};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
