//! Error kinds surfaced by the gate, the loader and the verifier.
//!
//! None of these are fatal: each one becomes a short message on screen.

use reqwest::StatusCode;
use thiserror::Error;

/// Gate rejections. The `Display` text is what the user sees in the error slot.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AccessError {
  #[error("Please enter your team number.")]
  MissingTeamIdentifier,
  #[error("Invalid code. Access denied.")]
  InvalidAccessPhrase,
}

/// Anything that goes wrong talking to the quiz service.
#[derive(Debug, Error)]
pub enum ServiceError {
  #[error("request failed: {0}")]
  Http(#[from] reqwest::Error),
  #[error("service returned HTTP {0}: {1}")]
  Status(StatusCode, String),
}

#[derive(Debug, Error)]
pub enum LoadError {
  #[error("failed to load questions: {0}")]
  LoadFailed(#[source] ServiceError),
  #[error("the service has no questions")]
  NoQuestionsAvailable,
}

/// Transport and decoding failures collapse into one kind during verification.
#[derive(Debug, Error)]
#[error("answer verification failed: {0}")]
pub struct VerificationTransportError(#[from] pub ServiceError);
