//! In-memory adapters for build persistence, credentials, provider clients,
//! and task callbacks.
//!
//! These adapters model collaborator behaviour without network access. They
//! back unit and integration tests and local deterministic pipeline runs.

mod build;
mod callback;
mod credentials;
mod provider;

pub use build::InMemoryBuildRepository;
pub use callback::RecordingTaskCallbackSink;
pub use credentials::InMemoryCredentialStore;
pub use provider::{ScriptedGitHubActionsApi, ScriptedJenkinsApi};
