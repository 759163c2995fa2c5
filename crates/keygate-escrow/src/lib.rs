//! # Keygate Escrow
//!
//! Policy-gated custody of content keys.
//!
//! A [`KeyEscrowService`] wraps a [`SymmetricKey`] under a [`Policy`] and
//! later releases it to any candidate whose signed assertion satisfies the
//! policy against live chain state.
//!
//! ## Wrapping
//!
//! Wrapping is pluggable through [`KeyWrapper`]. The policy digest is bound
//! into every wrapping, so a record whose policy was swapped cannot be
//! unwrapped even if the swapped policy would authorize the caller.
//!
//! ## Errors
//!
//! [`EscrowError::AuthorizationDenied`] is final.
//! [`EscrowError::PolicyEvaluationFailed`] means a determining condition
//! could not be evaluated; see [`EscrowError::is_transient`].
//!
//! [`SymmetricKey`]: keygate_core::SymmetricKey
//! [`Policy`]: keygate_core::Policy

pub mod error;
pub mod service;
pub mod wrap;

pub use error::{EscrowError, Result};
pub use service::KeyEscrowService;
pub use wrap::{KeyWrapper, MasterKeyWrapper, SealedKeyWrapper};
