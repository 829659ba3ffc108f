//! [`PostsState`] — the posts state container and its transitions.
//!
//! Every method here is synchronous and applies one complete transition.
//! Callers that share a state between tasks must serialise writes; the
//! [`PostsController`](crate::PostsController) does so with a `RwLock`.

use std::collections::HashMap;

use jonline_core::{
  listing::ListingKey,
  post::{Post, PostId, format_path},
  status::{LoadStatus, Operation},
};
use serde::Deserialize;

use crate::{EntityTable, ListingIndex, Result, listing::DEFAULT_PAGE_SIZE};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Library-side settings for a [`PostsState`].
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
  /// Number of post ids per cached listing page.
  #[serde(default = "default_page_size")]
  pub page_size: usize,
}

fn default_page_size() -> usize { DEFAULT_PAGE_SIZE }

impl Default for StoreConfig {
  fn default() -> Self {
    Self {
      page_size: DEFAULT_PAGE_SIZE,
    }
  }
}

// ─── State ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct PostsState {
  /// Status of the most recent operation of any kind.
  pub status:          LoadStatus,
  /// Status of listing fetches only.
  pub base_status:     LoadStatus,
  pub error_message:   Option<String>,
  pub success_message: Option<String>,
  pub draft_post:      Post,
  pub entities:        EntityTable,
  pub listings:        ListingIndex,
  /// Preview image `data:` URLs keyed by post id.
  pub previews:        HashMap<PostId, String>,
  config:              StoreConfig,
}

impl Default for PostsState {
  fn default() -> Self { Self::new(StoreConfig::default()) }
}

impl PostsState {
  pub fn new(config: StoreConfig) -> Self {
    Self {
      status: LoadStatus::Unloaded,
      base_status: LoadStatus::Unloaded,
      error_message: None,
      success_message: None,
      draft_post: Post::default(),
      entities: EntityTable::new(),
      listings: ListingIndex::new(config.page_size),
      previews: HashMap::new(),
      config,
    }
  }

  // ── Operation lifecycle ───────────────────────────────────────────────────

  /// Pending transition for `op`.
  pub fn begin(&mut self, op: Operation) {
    if op.tracks_status() {
      self.status = LoadStatus::Loading;
      self.error_message = None;
    }
    if op.tracks_base_status() {
      self.base_status = LoadStatus::Loading;
    }
  }

  /// Rejected transition for `op`.
  pub fn fail(&mut self, op: Operation, error: &str) {
    if !op.tracks_status() {
      tracing::warn!(?op, error, "untracked operation failed");
      return;
    }
    self.status = LoadStatus::Errored;
    if op.tracks_base_status() {
      self.base_status = LoadStatus::Errored;
    }
    self.error_message = Some(op.error_message(error));
  }

  fn succeed(&mut self, op: Operation) {
    if op.tracks_status() {
      self.status = LoadStatus::Loaded;
    }
    if op.tracks_base_status() {
      self.base_status = LoadStatus::Loaded;
    }
    self.success_message = Some(op.success_message().to_owned());
  }

  // ── Fulfilled transitions ─────────────────────────────────────────────────

  pub fn post_created(&mut self, post: Post) {
    self.entities.upsert(post);
    self.succeed(Operation::CreatePost);
  }

  /// Store a fetched listing page. Posts already cached keep their replies.
  pub fn posts_page_loaded(
    &mut self,
    listing: &ListingKey,
    page: u32,
    posts: Vec<Post>,
  ) {
    let ids: Vec<PostId> = posts
      .into_iter()
      .map(|post| self.entities.upsert_preserving_replies(post))
      .collect();
    tracing::debug!(%listing, page, count = ids.len(), "posts page loaded");
    self.listings.apply_page(listing, page, ids);
    self.succeed(Operation::LoadPostsPage);
  }

  pub fn post_loaded(&mut self, post: Post, preview: String) {
    let id = self.entities.upsert_preserving_replies(post);
    self.previews.insert(id, preview);
    self.succeed(Operation::LoadPost);
  }

  /// Splice fetched replies into the tree at `path`.
  ///
  /// The fetch itself succeeded, so `status` becomes `loaded` either way; a
  /// path that no longer resolves leaves the entities untouched and is
  /// returned to the caller.
  pub fn replies_loaded(
    &mut self,
    path: &[PostId],
    replies: Vec<Post>,
  ) -> Result<Post> {
    self.status = LoadStatus::Loaded;
    match self.entities.merge_replies(path, replies) {
      Ok(root) => {
        self.success_message =
          Some(Operation::LoadPostReplies.success_message().to_owned());
        Ok(root)
      }
      Err(e) => {
        tracing::error!(path = %format_path(path), error = %e, "cannot merge replies");
        Err(e)
      }
    }
  }

  pub fn preview_loaded(&mut self, id: PostId, preview: String) {
    self.previews.insert(id, preview);
    self.succeed(Operation::LoadPostPreview);
  }

  // ── Synchronous actions ───────────────────────────────────────────────────

  pub fn upsert_post(&mut self, post: Post) { self.entities.upsert(post); }

  pub fn upsert_posts(&mut self, posts: impl IntoIterator<Item = Post>) {
    for post in posts {
      self.entities.upsert(post);
    }
  }

  pub fn remove_post(&mut self, id: &PostId) -> Option<Post> {
    self.previews.remove(id);
    self.entities.remove(id)
  }

  /// Back to the initial state, keeping the configuration.
  pub fn reset(&mut self) { *self = Self::new(self.config.clone()); }

  pub fn clear_alerts(&mut self) {
    self.error_message = None;
    self.success_message = None;
  }

  // ── Selectors ─────────────────────────────────────────────────────────────

  pub fn post(&self, id: &PostId) -> Option<Post> { self.entities.get(id) }

  pub fn all_posts(&self) -> Vec<Post> { self.entities.all() }

  pub fn posts_page(&self, listing: &ListingKey, page: usize) -> Vec<Post> {
    self.listings.get_page(&self.entities, listing, page)
  }

  pub fn posts_pages_through(
    &self,
    listing: &ListingKey,
    max_page: usize,
  ) -> Vec<Post> {
    self
      .listings
      .get_pages_through(&self.entities, listing, max_page)
  }
}
