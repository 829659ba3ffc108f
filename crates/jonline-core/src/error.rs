//! Error types for `jonline-core`.

use thiserror::Error;

use crate::post::{PostId, format_path};

#[derive(Debug, Error)]
pub enum Error {
  #[error("post not found: {0}")]
  PostNotFound(PostId),

  #[error("post {segment} not found along reply path {}", format_path(.path))]
  ReplyPathSegmentNotFound { segment: PostId, path: Vec<PostId> },

  #[error("reply path is empty")]
  EmptyReplyPath,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
