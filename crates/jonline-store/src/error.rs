//! Error type for `jonline-store`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] jonline_core::Error),

  /// The post source rejected or failed a request.
  #[error("source error: {0}")]
  Source(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub(crate) fn from_source<E>(error: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Source(Box::new(error))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
