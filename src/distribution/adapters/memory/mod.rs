//! In-memory adapters for distribution persistence and the app-store APIs.
//!
//! These adapters back unit and integration tests and local deterministic
//! rollout runs.

mod repository;
mod store;

pub use repository::InMemoryDistributionRepository;
pub use store::{ScriptedStoreClient, StoreCall};
