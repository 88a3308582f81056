pub mod client;
pub mod poll;
pub mod types;

pub use client::RegistryClient;
pub use poll::{PollPolicy, poll_task};
pub use types::{SpecSummary, TaskStatus};

use crate::error::RegistryError;

/// Source of the specs known to a workspace
pub trait SpecCatalog {
    async fn list_specs(&self, workspace_id: &str) -> Result<Vec<SpecSummary>, RegistryError>;
}
