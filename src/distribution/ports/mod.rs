//! Port contracts for store distribution: persistence and the remote store
//! submission APIs.

pub mod repository;
pub mod store;

pub use repository::{
    DistributionRepository, DistributionRepositoryError, DistributionRepositoryResult,
};
pub use store::{
    StoreClient, StoreClientError, StoreClientResult, StoreOperation, StoreSubmissionReceipt,
};
