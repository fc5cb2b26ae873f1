//! Remote tree API integration
//!
//! This crate provides:
//! - The `TreeStore` read/write capability and its GitHub implementation
//! - Materializing a remote tree along a path (`TreeFetcher`)
//! - Writing a merged tree back bottom-up (`TreeSubmitter`)
//! - Bounded polling for eventually-consistent remote state

pub mod fetch;
pub mod github;
pub mod memory;
pub mod poll;
pub mod store;
pub mod submit;

pub use fetch::TreeFetcher;
pub use github::{CommitInfo, GitHubClient, GitHubConfig};
pub use memory::MemoryTreeStore;
pub use poll::poll_until;
pub use store::TreeStore;
pub use submit::TreeSubmitter;
