//! Resource Authority client: the system of record for resource visibility

pub mod client;
pub mod traits;

pub use client::AuthorityClient;
pub use traits::{AuthorityScope, ResourceAuthority};

#[cfg(test)]
pub(crate) mod mock;
