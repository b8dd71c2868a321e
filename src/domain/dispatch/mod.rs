//! Send pipeline: template lookup, rendering, and delivery.

mod dispatcher;
mod types;

pub use dispatcher::{DispatcherStats, DispatcherStatsSnapshot, EmailDispatcher};
pub use types::{DispatchError, RenderedEmail, SendRequest};
