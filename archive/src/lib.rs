mod constants;
mod errors;
mod state_store;

pub use crate::errors::ArchiveError;
pub use crate::state_store::{FileStateStore, StateStore};
