//! Error taxonomy for the provisioning API.

use thiserror::Error;

/// Failure of a single provisioning operation.
///
/// Remote-side rejections keep the upstream message verbatim so the wizard
/// can surface it to the user unchanged.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProvisionError {
    /// The resource is already provisioned (pre-check hit or remote
    /// conflict on insert).
    #[error("{resource} already exists")]
    AlreadyExists { resource: String },

    /// The resource is not known to the remote registry.
    #[error("{resource} not found")]
    NotFound { resource: String },

    /// Credentials were rejected. Refreshing them is the transport
    /// collaborator's job; if it could not, the failure lands here.
    #[error("provisioning API rejected the credentials")]
    Unauthenticated,

    /// Validation or business-rule rejection from the remote service.
    #[error("{message}")]
    RemoteRejected { message: String },

    /// Network or serialization fault below the API layer.
    #[error("transport error: {message}")]
    Transport { message: String },
}

impl ProvisionError {
    pub fn already_exists(resource: impl Into<String>) -> Self {
        ProvisionError::AlreadyExists {
            resource: resource.into(),
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        ProvisionError::NotFound {
            resource: resource.into(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        ProvisionError::RemoteRejected {
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        ProvisionError::Transport {
            message: message.into(),
        }
    }

    /// Map an HTTP status and upstream error message onto the taxonomy.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        match status {
            401 => ProvisionError::Unauthenticated,
            404 => ProvisionError::not_found(message),
            409 => ProvisionError::already_exists(message),
            _ => ProvisionError::rejected(message),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ProvisionError::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, ProvisionError::AlreadyExists { .. })
    }
}
