mod coordinator;
mod errors;
mod publisher;

pub use crate::coordinator::{CoordinatorHandle, SnapshotCoordinator, TickOutcome};
pub use crate::errors::{PublishError, SnapshotError};
pub use crate::publisher::{FilePublisher, Frame, Publisher};
