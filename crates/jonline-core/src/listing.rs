//! Listing types — the feeds that share the paging mechanism.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Which server-side feed a page of posts was fetched from.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "kebab-case")]
pub enum PostListingType {
  #[default]
  PublicPosts,
  FollowingPosts,
  MyGroupsPosts,
  DirectPosts,
  PostsPendingModeration,
  GroupPosts,
  GroupPostsPendingModeration,
}

/// Key of one feed in the listing index: a listing type, narrowed to a
/// single group for the group-scoped types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListingKey {
  pub listing_type: PostListingType,
  pub group_id:     Option<String>,
}

impl ListingKey {
  pub fn new(listing_type: PostListingType) -> Self {
    Self {
      listing_type,
      group_id: None,
    }
  }

  /// The `group_posts` feed of one group.
  pub fn group(group_id: impl Into<String>) -> Self {
    Self {
      listing_type: PostListingType::GroupPosts,
      group_id:     Some(group_id.into()),
    }
  }
}

impl From<PostListingType> for ListingKey {
  fn from(listing_type: PostListingType) -> Self { Self::new(listing_type) }
}

impl fmt::Display for ListingKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.group_id {
      Some(group_id) => write!(f, "{}[{group_id}]", self.listing_type),
      None => write!(f, "{}", self.listing_type),
    }
  }
}
