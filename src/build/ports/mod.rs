//! Port contracts for build tracking.
//!
//! Ports define infrastructure-agnostic interfaces used by build services:
//! persistence, tenant credentials, raw CI/CD provider clients, and the
//! downstream task callback sink.

pub mod callback;
pub mod credentials;
pub mod provider;
pub mod repository;

pub use callback::{TaskCallbackError, TaskCallbackSink};
pub use credentials::{CredentialStore, CredentialStoreError, ProviderCredentials};
pub use provider::{
    GitHubActionsApi, GitHubWorkflowRun, JenkinsApi, JenkinsBuild, JenkinsExecutable,
    JenkinsQueueItem, ProviderApiError, ProviderApiResult, WorkflowTrigger,
};
pub use repository::{BuildRepository, BuildRepositoryError, BuildRepositoryResult};
