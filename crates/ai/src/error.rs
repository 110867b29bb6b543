//! Chat relay error types.

use bigstep_core::Error as CoreError;
use thiserror::Error;

/// Reply text sent back on every failed relay.
pub const GENERIC_FAILURE_REPLY: &str = "Desculpe, algo deu errado ao tentar gerar uma resposta.";

/// Chat relay errors.
#[derive(Debug, Error)]
pub enum RelayError {
    /// No signed-in user on the request.
    #[error("Not authenticated")]
    Unauthenticated,

    /// The user has no profile for the requested model id.
    #[error("Model profile not found: {0}")]
    ProfileNotFound(String),

    /// Profile names a provider tag nobody recognizes.
    #[error("Unsupported provider: {0}")]
    ProviderUnsupported(String),

    /// Provider is known but has no upstream integration yet.
    #[error("Provider not implemented: {0}")]
    ProviderNotImplemented(String),

    /// Upstream call failed, timed out or answered with a non-success status.
    #[error("Upstream request failed: {0}")]
    UpstreamRequestFailed(String),

    /// Neither a linked key nor a configured key is available.
    #[error("Missing API key for provider {0}")]
    MissingApiKey(String),

    /// Core error from bigstep-core.
    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}

impl RelayError {
    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::UpstreamRequestFailed(msg.into())
    }

    /// HTTP status the chat route answers with.
    pub fn status_code(&self) -> u16 {
        match self {
            RelayError::Unauthenticated => 401,
            RelayError::ProfileNotFound(_) => 404,
            RelayError::ProviderUnsupported(_) => 400,
            RelayError::ProviderNotImplemented(_) => 501,
            RelayError::UpstreamRequestFailed(_)
            | RelayError::MissingApiKey(_)
            | RelayError::Core(_) => 500,
        }
    }

    /// Human-readable reply carried in the `{reply}` body.
    pub fn reply(&self) -> String {
        match self {
            RelayError::Unauthenticated => "Você precisa estar autenticado para conversar.".to_string(),
            RelayError::ProfileNotFound(id) => {
                format!("Nenhum perfil de modelo encontrado para \"{}\".", id)
            }
            RelayError::ProviderUnsupported(tag) => {
                format!("Provedor \"{}\" não é suportado.", tag)
            }
            RelayError::ProviderNotImplemented(tag) => {
                format!("Provedor \"{}\" ainda não está disponível.", tag)
            }
            RelayError::UpstreamRequestFailed(_)
            | RelayError::MissingApiKey(_)
            | RelayError::Core(_) => GENERIC_FAILURE_REPLY.to_string(),
        }
    }

    /// Error code for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            RelayError::Unauthenticated => "UNAUTHENTICATED",
            RelayError::ProfileNotFound(_) => "PROFILE_NOT_FOUND",
            RelayError::ProviderUnsupported(_) => "PROVIDER_UNSUPPORTED",
            RelayError::ProviderNotImplemented(_) => "PROVIDER_NOT_IMPLEMENTED",
            RelayError::UpstreamRequestFailed(_) => "UPSTREAM_REQUEST_FAILED",
            RelayError::MissingApiKey(_) => "MISSING_API_KEY",
            RelayError::Core(_) => "CORE_ERROR",
        }
    }
}
