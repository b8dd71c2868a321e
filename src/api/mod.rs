//! API layer - HTTP endpoint handlers organized by domain.

mod email;
mod health;
mod metrics;
mod routes;

pub use email::{preview_email, send_email, PreviewRequest};
pub use health::{health, stats};
pub use metrics::prometheus_metrics;
pub use routes::api_routes;
