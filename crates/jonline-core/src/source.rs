//! The `PostSource` trait and its request/response types.
//!
//! A source is whatever can answer post queries: an authenticated RPC client
//! in the app, a fixture file in the CLI, an in-memory fake in tests. The
//! cache depends on this abstraction, never on a transport.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::{
  listing::{ListingKey, PostListingType},
  post::{Post, PostId, Visibility},
};

// ─── Requests ────────────────────────────────────────────────────────────────

/// Parameters for [`PostSource::get_posts`].
///
/// With `post_id` set the request targets one post: `reply_depth = None`
/// returns the post itself, `reply_depth = Some(n)` returns its replies, `n`
/// levels deep. Otherwise it pages through the given listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetPostsRequest {
  pub post_id:      Option<PostId>,
  pub reply_depth:  Option<u32>,
  pub listing_type: PostListingType,
  pub group_id:     Option<String>,
  pub page:         Option<u32>,
}

impl GetPostsRequest {
  /// Fetch a single post.
  pub fn post(post_id: PostId) -> Self {
    Self {
      post_id: Some(post_id),
      ..Self::default()
    }
  }

  /// Fetch the direct replies of a post.
  pub fn replies(post_id: PostId) -> Self {
    Self {
      post_id: Some(post_id),
      reply_depth: Some(1),
      ..Self::default()
    }
  }

  /// Fetch one page of a listing.
  pub fn page(listing: &ListingKey, page: u32) -> Self {
    Self {
      listing_type: listing.listing_type,
      group_id: listing.group_id.clone(),
      page: Some(page),
      ..Self::default()
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetPostsResponse {
  pub posts: Vec<Post>,
}

/// Input to [`PostSource::create_post`]. The identifier and timestamps are
/// always assigned by the source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePostRequest {
  pub title:            Option<String>,
  pub link:             Option<String>,
  pub content:          Option<String>,
  pub reply_to_post_id: Option<PostId>,
  pub visibility:       Visibility,
  pub media:            Vec<String>,
  pub embed_link:       bool,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over whatever answers post queries.
///
/// All methods return `Send` futures so a source can be driven from spawned
/// tokio tasks.
pub trait PostSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Answer a listing, single-post or replies query.
  fn get_posts(
    &self,
    request: GetPostsRequest,
  ) -> impl Future<Output = Result<GetPostsResponse, Self::Error>> + Send + '_;

  /// Create a post and return it as persisted.
  fn create_post(
    &self,
    request: CreatePostRequest,
  ) -> impl Future<Output = Result<Post, Self::Error>> + Send + '_;
}
