//! Load status of the posts state and the operations that drive it.

use serde::{Deserialize, Serialize};

/// `unloaded → loading → loaded | errored`.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LoadStatus {
  #[default]
  Unloaded,
  Loading,
  Loaded,
  Errored,
}

/// The asynchronous operations the posts state tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
  CreatePost,
  LoadPostsPage,
  LoadPost,
  LoadPostReplies,
  LoadPostPreview,
}

impl Operation {
  /// Preview loads run alongside everything else and never touch `status`.
  pub fn tracks_status(self) -> bool { !matches!(self, Self::LoadPostPreview) }

  /// Listing fetches additionally drive `base_status`.
  pub fn tracks_base_status(self) -> bool {
    matches!(self, Self::LoadPostsPage)
  }

  /// Message shown when the operation fails with `error`.
  pub fn error_message(self, error: &str) -> String {
    match self {
      Self::LoadPostReplies => format!("Error loading replies: {error}"),
      _ => error.to_owned(),
    }
  }

  /// Message shown when the operation succeeds.
  pub fn success_message(self) -> &'static str {
    match self {
      Self::CreatePost => "Post created.",
      Self::LoadPostsPage => "Posts loaded.",
      Self::LoadPost => "Post data loaded.",
      Self::LoadPostReplies => "Replies loaded.",
      Self::LoadPostPreview => "Preview image loaded.",
    }
  }
}
