//! A [`PostSource`] answering queries from a JSON fixture file.
//!
//! The fixture is a post dump shaped like a server response,
//! `{ "posts": [...], "page_size": 20 }`, with replies nested under their
//! parents. Created posts live in memory for the rest of the process.

use std::path::Path;

use chrono::Utc;
use jonline_core::{
  listing::PostListingType,
  post::{Moderation, Post, PostContext, PostId, Visibility},
  source::{CreatePostRequest, GetPostsRequest, GetPostsResponse, PostSource},
};
use serde::Deserialize;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Posts per page the fixture serves, before the cache re-chunks them.
const DEFAULT_FIXTURE_PAGE_SIZE: usize = 20;

#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
  #[error("reading fixture: {0}")]
  Io(#[from] std::io::Error),

  #[error("parsing fixture: {0}")]
  Json(#[from] serde_json::Error),

  #[error("post not found: {0}")]
  PostNotFound(PostId),
}

#[derive(Deserialize)]
struct FixtureFile {
  posts:     Vec<Post>,
  #[serde(default = "default_fixture_page_size")]
  page_size: usize,
}

fn default_fixture_page_size() -> usize { DEFAULT_FIXTURE_PAGE_SIZE }

pub struct FixtureSource {
  posts:     RwLock<Vec<Post>>,
  page_size: usize,
}

impl FixtureSource {
  pub fn new(posts: Vec<Post>, page_size: usize) -> Self {
    Self {
      posts:     RwLock::new(posts),
      page_size: page_size.max(1),
    }
  }

  /// Read a fixture file from disk.
  pub fn open(path: &Path) -> Result<Self, FixtureError> {
    let raw = std::fs::read_to_string(path)?;
    Self::parse(&raw)
  }

  pub fn parse(raw: &str) -> Result<Self, FixtureError> {
    let file: FixtureFile = serde_json::from_str(raw)?;
    tracing::debug!(roots = file.posts.len(), "fixture loaded");
    Ok(Self::new(file.posts, file.page_size))
  }

  fn listing(&self, posts: &[Post], request: &GetPostsRequest) -> Vec<Post> {
    let mut matching: Vec<&Post> = posts
      .iter()
      .filter(|p| p.reply_to_post_id.is_none() && in_listing(p, request))
      .collect();
    matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let page = request.page.unwrap_or(0) as usize;
    matching
      .into_iter()
      .skip(page.saturating_mul(self.page_size))
      .take(self.page_size)
      .map(|p| p.truncated(0))
      .collect()
  }
}

fn in_listing(post: &Post, request: &GetPostsRequest) -> bool {
  let group_post = post.current_group_post.as_ref();
  let in_group = || {
    group_post.is_some_and(|gp| Some(&gp.group_id) == request.group_id.as_ref())
  };
  match request.listing_type {
    PostListingType::PublicPosts | PostListingType::FollowingPosts => {
      post.visibility.is_public()
    }
    PostListingType::MyGroupsPosts => group_post.is_some(),
    PostListingType::DirectPosts => post.visibility == Visibility::Direct,
    PostListingType::PostsPendingModeration => {
      post.moderation == Moderation::Pending
    }
    PostListingType::GroupPosts => in_group(),
    PostListingType::GroupPostsPendingModeration => {
      in_group()
        && group_post.is_some_and(|gp| gp.group_moderation == Moderation::Pending)
    }
  }
}

fn find<'a>(posts: &'a [Post], id: &PostId) -> Option<&'a Post> {
  posts
    .iter()
    .find_map(|p| if &p.id == id { Some(p) } else { find(&p.replies, id) })
}

fn find_mut<'a>(posts: &'a mut [Post], id: &PostId) -> Option<&'a mut Post> {
  for post in posts {
    if &post.id == id {
      return Some(post);
    }
    if let Some(found) = find_mut(&mut post.replies, id) {
      return Some(found);
    }
  }
  None
}

impl PostSource for FixtureSource {
  type Error = FixtureError;

  async fn get_posts(
    &self,
    request: GetPostsRequest,
  ) -> Result<GetPostsResponse, FixtureError> {
    let posts = self.posts.read().await;
    let found = match (&request.post_id, request.reply_depth) {
      (Some(id), None) => find(&posts, id).map(|p| p.truncated(0)).into_iter().collect(),
      (Some(id), Some(depth)) => find(&posts, id)
        .map(|p| {
          p.replies
            .iter()
            .map(|r| r.truncated(depth.saturating_sub(1)))
            .collect()
        })
        .unwrap_or_default(),
      (None, _) => self.listing(&posts, &request),
    };
    tracing::debug!(?request, returned = found.len(), "fixture query");
    Ok(GetPostsResponse { posts: found })
  }

  async fn create_post(
    &self,
    request: CreatePostRequest,
  ) -> Result<Post, FixtureError> {
    let now = Utc::now();
    let post = Post {
      id: PostId::new(Uuid::new_v4().to_string()),
      context: if request.reply_to_post_id.is_some() {
        PostContext::Reply
      } else {
        PostContext::Post
      },
      reply_to_post_id: request.reply_to_post_id,
      title: request.title,
      link: request.link,
      content: request.content,
      visibility: request.visibility,
      media: request.media,
      embed_link: request.embed_link,
      created_at: now,
      last_activity_at: Some(now),
      ..Post::default()
    };

    let mut posts = self.posts.write().await;
    match &post.reply_to_post_id {
      Some(parent_id) => {
        let parent = find_mut(&mut posts, parent_id)
          .ok_or_else(|| FixtureError::PostNotFound(parent_id.clone()))?;
        parent.reply_count += 1;
        parent.replies.push(post.clone());
      }
      None => posts.push(post.clone()),
    }
    Ok(post)
  }
}
