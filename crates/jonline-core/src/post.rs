//! Post types — the records held by the cache.
//!
//! A post is a node in a reply tree. The `replies` field is only as deep as
//! whatever fetch produced the value; the cache assembles the deepest known
//! tree on read.

use std::{borrow::Borrow, fmt};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── Identifiers ─────────────────────────────────────────────────────────────

/// Opaque server-assigned post identifier.
#[derive(
  Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
  Deserialize,
)]
#[serde(transparent)]
pub struct PostId(String);

impl PostId {
  pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for PostId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for PostId {
  fn from(id: &str) -> Self { Self(id.to_owned()) }
}

impl From<String> for PostId {
  fn from(id: String) -> Self { Self(id) }
}

impl Borrow<str> for PostId {
  fn borrow(&self) -> &str { &self.0 }
}

/// Render a reply path as `a/b/c` for logs and error messages.
pub fn format_path(path: &[PostId]) -> String {
  path
    .iter()
    .map(PostId::as_str)
    .collect::<Vec<_>>()
    .join("/")
}

// ─── Enumerations ────────────────────────────────────────────────────────────

/// Who may see a post.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
  #[default]
  Unknown,
  Private,
  Limited,
  ServerPublic,
  GlobalPublic,
  Direct,
}

impl Visibility {
  /// Visible to anyone who can reach the server.
  pub fn is_public(self) -> bool {
    matches!(self, Self::ServerPublic | Self::GlobalPublic)
  }
}

/// Moderation state of a post or a group post.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Moderation {
  #[default]
  Unknown,
  Unmoderated,
  Pending,
  Approved,
  Rejected,
}

/// What kind of thing a post row represents.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PostContext {
  #[default]
  Post,
  Reply,
  Event,
  EventInstance,
}

// ─── Sub-records ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
  pub user_id:  String,
  #[serde(default)]
  pub username: Option<String>,
}

/// A post's membership in a group feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupPost {
  pub group_id:         String,
  pub post_id:          PostId,
  #[serde(default)]
  pub user_id:          String,
  #[serde(default)]
  pub group_moderation: Moderation,
  #[serde(default)]
  pub created_at:       Option<DateTime<Utc>>,
}

// ─── Post ────────────────────────────────────────────────────────────────────

/// A post as delivered by the server, possibly carrying a partial reply
/// tree. `Post::default()` is the empty draft.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Post {
  pub id:                 PostId,
  pub reply_to_post_id:   Option<PostId>,
  pub author:             Option<Author>,

  pub title:              Option<String>,
  pub link:               Option<String>,
  pub content:            Option<String>,

  pub response_count:     i32,
  pub reply_count:        i32,
  pub group_count:        i32,
  pub current_group_post: Option<GroupPost>,
  pub media:              Vec<String>,
  pub media_generated:    bool,
  pub embed_link:         bool,
  pub shareable:          bool,

  pub context:            PostContext,
  pub visibility:         Visibility,
  pub moderation:         Moderation,

  pub replies:            Vec<Post>,
  #[serde(with = "base64_opt")]
  pub preview_image:      Option<Vec<u8>>,

  pub created_at:         DateTime<Utc>,
  pub updated_at:         Option<DateTime<Utc>>,
  pub published_at:       Option<DateTime<Utc>>,
  pub last_activity_at:   Option<DateTime<Utc>>,
}

impl Post {
  /// Convenience constructor with every other field defaulted.
  pub fn new(id: impl Into<PostId>, created_at: DateTime<Utc>) -> Self {
    Self {
      id: id.into(),
      created_at,
      ..Self::default()
    }
  }

  /// The preview image as a `data:` URL, or an empty string when the post
  /// has none.
  pub fn preview_data_url(&self) -> String {
    self
      .preview_image
      .as_deref()
      .map(|bytes| format!("data:image/png;base64,{}", STANDARD.encode(bytes)))
      .unwrap_or_default()
  }

  /// A copy of this post with its reply tree cut off below `depth` levels.
  pub fn truncated(&self, depth: u32) -> Self {
    let replies = match depth {
      0 => Vec::new(),
      d => self.replies.iter().map(|r| r.truncated(d - 1)).collect(),
    };
    Self {
      replies,
      ..self.clone()
    }
  }
}

/// Serde adapter storing optional bytes as standard base64 text.
mod base64_opt {
  use base64::{Engine as _, engine::general_purpose::STANDARD};
  use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

  pub fn serialize<S: Serializer>(
    value: &Option<Vec<u8>>,
    serializer: S,
  ) -> Result<S::Ok, S::Error> {
    match value {
      Some(bytes) => serializer.serialize_some(&STANDARD.encode(bytes)),
      None => serializer.serialize_none(),
    }
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(
    deserializer: D,
  ) -> Result<Option<Vec<u8>>, D::Error> {
    Option::<String>::deserialize(deserializer)?
      .map(|s| STANDARD.decode(s).map_err(D::Error::custom))
      .transpose()
  }
}
