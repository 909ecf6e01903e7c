pub mod error;
pub mod executor;
pub mod mapping_oracle;
pub mod pipeline;
pub mod processors;
pub mod progress_tracker;

pub use error::{MappingError, OrderError};
pub use executor::FillExecutor;
pub use mapping_oracle::{LlmMappingOracle, MappingOracle};
pub use pipeline::{OrderPipeline, PipelineOutcome, ProgressObserver};
pub use processors::{TemplateLayout, UpdateSummary};
pub use progress_tracker::ProgressTracker;
