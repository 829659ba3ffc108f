//! In-memory post cache for Jonline clients.
//!
//! [`PostsState`] owns the entity table and the listing index and applies
//! every state transition synchronously. [`PostsController`] runs fetches
//! against a [`PostSource`](jonline_core::source::PostSource) and funnels each
//! completion into exactly one transition.

mod controller;
mod entities;
mod listing;
mod state;

pub mod error;

pub use controller::PostsController;
pub use entities::EntityTable;
pub use error::{Error, Result};
pub use listing::{DEFAULT_PAGE_SIZE, ListingIndex};
pub use state::{PostsState, StoreConfig};

#[cfg(test)]
mod tests;
