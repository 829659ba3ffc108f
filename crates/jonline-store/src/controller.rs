//! [`PostsController`] — drives fetches against a [`PostSource`] and applies
//! their results to a shared [`PostsState`].

use std::sync::Arc;

use jonline_core::{
  Error as CoreError,
  listing::ListingKey,
  post::{Post, PostId},
  source::{CreatePostRequest, GetPostsRequest, PostSource},
  status::Operation,
};
use tokio::{
  sync::{RwLock, RwLockReadGuard},
  task::JoinHandle,
};

use crate::{Error, PostsState, Result, StoreConfig};

/// Shared handle to a posts state and the source that feeds it.
///
/// Cloning is cheap: both the source and the state are reference-counted.
/// The write lock is never held across a fetch, so reads stay available
/// while requests are in flight, and each completion applies exactly one
/// transition.
pub struct PostsController<S> {
  source: Arc<S>,
  state:  Arc<RwLock<PostsState>>,
}

impl<S> Clone for PostsController<S> {
  fn clone(&self) -> Self {
    Self {
      source: Arc::clone(&self.source),
      state:  Arc::clone(&self.state),
    }
  }
}

impl<S: PostSource + 'static> PostsController<S> {
  pub fn new(source: S, config: StoreConfig) -> Self {
    Self {
      source: Arc::new(source),
      state:  Arc::new(RwLock::new(PostsState::new(config))),
    }
  }

  pub fn source(&self) -> &S { &self.source }

  // ── State access ──────────────────────────────────────────────────────────

  /// A consistent read view for as long as the guard is held.
  pub async fn read(&self) -> RwLockReadGuard<'_, PostsState> {
    self.state.read().await
  }

  /// An owned copy of the current state.
  pub async fn snapshot(&self) -> PostsState { self.state.read().await.clone() }

  /// Apply one synchronous transition with exclusive access.
  pub async fn dispatch<T>(&self, f: impl FnOnce(&mut PostsState) -> T) -> T {
    let mut state = self.state.write().await;
    f(&mut state)
  }

  // ── Operations ────────────────────────────────────────────────────────────

  pub async fn create_post(&self, request: CreatePostRequest) -> Result<Post> {
    self.dispatch(|s| s.begin(Operation::CreatePost)).await;
    match self.source.create_post(request).await {
      Ok(post) => {
        tracing::info!(id = %post.id, "post created");
        self.dispatch(|s| s.post_created(post.clone())).await;
        Ok(post)
      }
      Err(e) => Err(self.reject(Operation::CreatePost, e).await),
    }
  }

  /// Fetch `page` of `listing` and return the posts it delivered.
  pub async fn load_posts_page(
    &self,
    listing: ListingKey,
    page: u32,
  ) -> Result<Vec<Post>> {
    self.dispatch(|s| s.begin(Operation::LoadPostsPage)).await;
    let request = GetPostsRequest::page(&listing, page);
    match self.source.get_posts(request).await {
      Ok(response) => {
        let posts = response.posts;
        self
          .dispatch(|s| s.posts_page_loaded(&listing, page, posts.clone()))
          .await;
        Ok(posts)
      }
      Err(e) => Err(self.reject(Operation::LoadPostsPage, e).await),
    }
  }

  /// Fetch one post and its preview image.
  pub async fn load_post(&self, id: PostId) -> Result<Post> {
    self.dispatch(|s| s.begin(Operation::LoadPost)).await;
    let response = match self.source.get_posts(GetPostsRequest::post(id.clone())).await {
      Ok(response) => response,
      Err(e) => return Err(self.reject(Operation::LoadPost, e).await),
    };
    let Some(post) = response.posts.into_iter().next() else {
      let error = CoreError::PostNotFound(id);
      self
        .dispatch(|s| s.fail(Operation::LoadPost, &error.to_string()))
        .await;
      return Err(error.into());
    };
    let preview = post.preview_data_url();
    self
      .dispatch(|s| s.post_loaded(post.clone(), preview))
      .await;
    Ok(post)
  }

  /// Fetch the direct replies of the last post on `path` and splice them
  /// into the cached tree. Returns the rebuilt root.
  pub async fn load_post_replies(&self, path: Vec<PostId>) -> Result<Post> {
    let Some(target) = path.last().cloned() else {
      return Err(CoreError::EmptyReplyPath.into());
    };
    self.dispatch(|s| s.begin(Operation::LoadPostReplies)).await;
    match self.source.get_posts(GetPostsRequest::replies(target)).await {
      Ok(response) => {
        self
          .dispatch(|s| s.replies_loaded(&path, response.posts))
          .await
      }
      Err(e) => Err(self.reject(Operation::LoadPostReplies, e).await),
    }
  }

  /// Fetch the preview image of a post. Does not touch `status`.
  pub async fn load_post_preview(&self, id: PostId) -> Result<String> {
    let response = match self.source.get_posts(GetPostsRequest::post(id.clone())).await {
      Ok(response) => response,
      Err(e) => return Err(self.reject(Operation::LoadPostPreview, e).await),
    };
    let preview = response
      .posts
      .first()
      .map(Post::preview_data_url)
      .unwrap_or_default();
    self
      .dispatch(|s| s.preview_loaded(id, preview.clone()))
      .await;
    Ok(preview)
  }

  // ── Fire-and-forget ───────────────────────────────────────────────────────

  /// Run [`Self::load_posts_page`] on its own task. The result is applied
  /// whenever it arrives, however stale.
  pub fn spawn_load_posts_page(
    &self,
    listing: ListingKey,
    page: u32,
  ) -> JoinHandle<Result<Vec<Post>>> {
    let this = self.clone();
    tokio::spawn(async move { this.load_posts_page(listing, page).await })
  }

  /// Run [`Self::load_post_replies`] on its own task.
  pub fn spawn_load_post_replies(
    &self,
    path: Vec<PostId>,
  ) -> JoinHandle<Result<Post>> {
    let this = self.clone();
    tokio::spawn(async move { this.load_post_replies(path).await })
  }

  // ── Selectors ─────────────────────────────────────────────────────────────

  pub async fn post(&self, id: &PostId) -> Option<Post> {
    self.read().await.post(id)
  }

  pub async fn posts_page(&self, listing: &ListingKey, page: usize) -> Vec<Post> {
    self.read().await.posts_page(listing, page)
  }

  pub async fn posts_pages_through(
    &self,
    listing: &ListingKey,
    max_page: usize,
  ) -> Vec<Post> {
    self.read().await.posts_pages_through(listing, max_page)
  }

  // ── Internals ─────────────────────────────────────────────────────────────

  async fn reject(&self, op: Operation, error: S::Error) -> Error {
    let message = error.to_string();
    tracing::warn!(?op, error = %message, "operation failed");
    self.dispatch(|s| s.fail(op, &message)).await;
    Error::from_source(error)
  }
}
