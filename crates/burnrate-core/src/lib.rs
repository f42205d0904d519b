pub mod config;
pub mod error;
pub mod metrics;
pub mod report;
pub mod stream;

pub use config::{parse_concurrency_levels, BenchmarkConfig, EndpointConfig, DEFAULT_BASE_URL};
pub use error::{BurnRateError, ErrorKind, Result};
pub use metrics::{BenchmarkResultRow, RunMetrics};
pub use report::{OutputArchive, ReportMeta};
pub use stream::{StreamEvent, Usage};
