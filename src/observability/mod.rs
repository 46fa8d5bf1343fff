pub mod logging;
pub mod metrics;

pub use logging::{init_logging, mask_gateway_id, mask_sensitive, LogConfig, LogFormat};
pub use metrics::{EngineMetrics, MetricsSnapshot};
