//! Container Error Types
//!
//! Resolution failures, integrated with the unified `kernel::error::AppError`.

use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Container result type alias
pub type ContainerResult<T> = Result<T, ContainerError>;

#[derive(Debug, Error)]
pub enum ContainerError {
    /// Neither a contextual nor a global binding exists
    #[error("Unresolved dependency: {contract}")]
    Unresolved {
        contract: &'static str,
        consumer: Option<&'static str>,
    },

    /// Contract requested again while it is being resolved
    #[error("Circular dependency while resolving {contract}: {chain}")]
    Circular {
        contract: &'static str,
        chain: String,
    },

    /// A binding produced a value of an unexpected type
    #[error("Binding for {contract} produced an unexpected type")]
    TypeMismatch { contract: &'static str },

    /// A producer failed on its own terms
    #[error("Producer failed: {0}")]
    Producer(#[from] AppError),
}

impl ContainerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ContainerError::Unresolved { .. } => ErrorKind::UnresolvedDependency,
            ContainerError::Circular { .. } => ErrorKind::CircularDependency,
            ContainerError::TypeMismatch { .. } => ErrorKind::Internal,
            ContainerError::Producer(err) => err.kind(),
        }
    }

    /// Convert to AppError, keeping the contract names as context
    pub fn into_app_error(self) -> AppError {
        match self {
            ContainerError::Unresolved { contract, consumer } => {
                let err = AppError::new(ErrorKind::UnresolvedDependency, "No binding for contract")
                    .with_context("contract", contract);
                match consumer {
                    Some(consumer) => err.with_context("consumer", consumer),
                    None => err,
                }
            }
            ContainerError::Circular { contract, chain } => {
                AppError::new(ErrorKind::CircularDependency, "Circular dependency detected")
                    .with_context("contract", contract)
                    .with_context("chain", chain)
            }
            ContainerError::TypeMismatch { contract } => {
                AppError::internal("Binding produced an unexpected type")
                    .with_context("contract", contract)
            }
            ContainerError::Producer(err) => err,
        }
    }
}

impl From<ContainerError> for AppError {
    fn from(err: ContainerError) -> Self {
        err.into_app_error()
    }
}
