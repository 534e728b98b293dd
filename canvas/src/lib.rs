mod audit;
mod clock;
mod config;
mod errors;
mod stats;
mod store;

use std::sync::{Arc, Mutex};

pub use crate::audit::{AuditLog, MemoryAuditLog};
pub use crate::clock::{Clock, ManualClock, SystemClock};
pub use crate::config::{CanvasConfig, RETALIATION_LIMIT_SECONDS, TOLERANCE_SECONDS};
pub use crate::errors::CanvasError;
pub use crate::stats::CanvasStats;
pub use crate::store::{CanvasStore, WriteOutcome};

/// The one store instance, shared by the request side and the snapshot loop.
pub type SharedCanvas = Arc<Mutex<CanvasStore>>;
