//! Tests for `PostsState` and `PostsController` against an in-memory source.

use std::{
  collections::HashMap,
  sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
  },
};

use chrono::{DateTime, TimeZone, Utc};
use jonline_core::{
  Error as CoreError,
  listing::{ListingKey, PostListingType},
  post::{Post, PostId},
  source::{CreatePostRequest, GetPostsRequest, GetPostsResponse, PostSource},
  status::LoadStatus,
};
use tokio::sync::Notify;

use crate::{Error, PostsController, PostsState, StoreConfig};

// ─── Fake source ─────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("fake source failure")]
struct FakeError;

/// Serves canned listing pages and reply lists. A page can be held back
/// until its `Notify` fires, to simulate a slow response.
#[derive(Default)]
struct FakeSource {
  pages:   HashMap<u32, Vec<Post>>,
  posts:   HashMap<PostId, Post>,
  replies: Mutex<HashMap<PostId, Vec<Post>>>,
  held:    Option<(u32, Arc<Notify>)>,
  failing: AtomicBool,
}

impl FakeSource {
  fn set_replies(&self, id: &str, replies: Vec<Post>) {
    self.replies.lock().unwrap().insert(id.into(), replies);
  }
}

impl PostSource for FakeSource {
  type Error = FakeError;

  async fn get_posts(
    &self,
    request: GetPostsRequest,
  ) -> Result<GetPostsResponse, FakeError> {
    if let Some((page, notify)) = &self.held
      && request.page == Some(*page)
    {
      notify.notified().await;
    }
    if self.failing.load(Ordering::SeqCst) {
      return Err(FakeError);
    }
    let posts = match (request.post_id, request.reply_depth) {
      (Some(id), Some(_)) => self
        .replies
        .lock()
        .unwrap()
        .get(&id)
        .cloned()
        .unwrap_or_default(),
      (Some(id), None) => self.posts.get(&id).cloned().into_iter().collect(),
      (None, _) => self
        .pages
        .get(&request.page.unwrap_or(0))
        .cloned()
        .unwrap_or_default(),
    };
    Ok(GetPostsResponse { posts })
  }

  async fn create_post(
    &self,
    request: CreatePostRequest,
  ) -> Result<Post, FakeError> {
    if self.failing.load(Ordering::SeqCst) {
      return Err(FakeError);
    }
    let mut post = Post::new("created", at(100));
    post.content = request.content;
    Ok(post)
  }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn at(secs: i64) -> DateTime<Utc> { Utc.timestamp_opt(secs, 0).unwrap() }

fn leaf(id: &str) -> Post { Post::new(id, at(0)) }

fn numbered(prefix: &str, n: usize) -> Vec<Post> {
  (0..n)
    .map(|i| Post::new(format!("{prefix}{i}"), at(i as i64)))
    .collect()
}

fn public() -> ListingKey { ListingKey::new(PostListingType::PublicPosts) }

fn path(ids: &[&str]) -> Vec<PostId> {
  ids.iter().map(|s| PostId::from(*s)).collect()
}

fn page_ids(state: &PostsState, page: usize) -> Vec<String> {
  state
    .posts_page(&public(), page)
    .into_iter()
    .map(|p| p.id.to_string())
    .collect()
}

fn child_ids(post: &Post) -> Vec<&str> {
  post.replies.iter().map(|r| r.id.as_str()).collect()
}

fn controller(source: FakeSource) -> PostsController<FakeSource> {
  PostsController::new(source, StoreConfig::default())
}

/// A controller whose public listing holds `root` on page 0.
async fn with_root() -> PostsController<FakeSource> {
  let source = FakeSource {
    pages: HashMap::from([(0, vec![leaf("root")])]),
    ..FakeSource::default()
  };
  let c = controller(source);
  c.load_posts_page(public(), 0).await.unwrap();
  c
}

// ─── Listing pages ───────────────────────────────────────────────────────────

#[tokio::test]
async fn load_page_chunks_into_slots_and_sets_status() {
  let source = FakeSource {
    pages: HashMap::from([(0, numbered("a", 25)), (1, numbered("b", 12))]),
    ..FakeSource::default()
  };
  let c = controller(source);

  assert_eq!(c.read().await.base_status, LoadStatus::Unloaded);
  let posts = c.load_posts_page(public(), 0).await.unwrap();
  assert_eq!(posts.len(), 25);
  c.load_posts_page(public(), 1).await.unwrap();

  let state = c.snapshot().await;
  assert_eq!(state.status, LoadStatus::Loaded);
  assert_eq!(state.base_status, LoadStatus::Loaded);
  assert_eq!(state.success_message.as_deref(), Some("Posts loaded."));
  assert_eq!(state.listings.page_count(&public()), 5);
  assert_eq!(page_ids(&state, 2), ["a20", "a21", "a22", "a23", "a24"]);
  assert_eq!(page_ids(&state, 4), ["b10", "b11"]);
  assert_eq!(c.posts_pages_through(&public(), 4).await.len(), 37);
}

#[tokio::test]
async fn reloading_page_zero_starts_over() {
  let source = FakeSource {
    pages: HashMap::from([(0, numbered("a", 5)), (1, numbered("b", 5))]),
    ..FakeSource::default()
  };
  let c = controller(source);
  c.load_posts_page(public(), 0).await.unwrap();
  c.load_posts_page(public(), 1).await.unwrap();
  c.load_posts_page(public(), 0).await.unwrap();

  let state = c.read().await;
  assert_eq!(state.listings.page_count(&public()), 1);
  assert_eq!(page_ids(&state, 0), ["a0", "a1", "a2", "a3", "a4"]);
}

#[tokio::test]
async fn late_page_lands_in_next_free_slot() {
  let notify = Arc::new(Notify::new());
  let source = FakeSource {
    pages: HashMap::from([
      (0, numbered("a", 10)),
      (1, numbered("b", 10)),
      (2, numbered("c", 10)),
    ]),
    held: Some((1, Arc::clone(&notify))),
    ..FakeSource::default()
  };
  let c = controller(source);

  let slow = c.spawn_load_posts_page(public(), 1);
  c.load_posts_page(public(), 0).await.unwrap();
  c.load_posts_page(public(), 2).await.unwrap();
  notify.notify_one();
  slow.await.unwrap().unwrap();

  let state = c.read().await;
  assert_eq!(page_ids(&state, 1)[0], "c0");
  assert_eq!(page_ids(&state, 2)[0], "b0");
}

#[tokio::test]
async fn failed_fetch_records_error() {
  let source = FakeSource::default();
  source.failing.store(true, Ordering::SeqCst);
  let c = controller(source);

  let err = c.load_posts_page(public(), 0).await.unwrap_err();
  assert!(matches!(err, Error::Source(_)));

  let state = c.read().await;
  assert_eq!(state.status, LoadStatus::Errored);
  assert_eq!(state.base_status, LoadStatus::Errored);
  assert_eq!(state.error_message.as_deref(), Some("fake source failure"));
}

#[tokio::test]
async fn relisting_keeps_loaded_replies() {
  let c = with_root().await;
  c.source().set_replies("root", vec![leaf("r1"), leaf("r2")]);
  c.load_post_replies(path(&["root"])).await.unwrap();

  c.load_posts_page(public(), 0).await.unwrap();

  let root = c.post(&"root".into()).await.unwrap();
  assert_eq!(child_ids(&root), ["r1", "r2"]);
}

// ─── Replies ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn replies_are_merged_along_the_path() {
  let c = with_root().await;
  c.source().set_replies("root", vec![leaf("r1"), leaf("r2")]);
  c.source().set_replies("r1", vec![leaf("r1a")]);

  c.load_post_replies(path(&["root"])).await.unwrap();
  let root = c.load_post_replies(path(&["root", "r1"])).await.unwrap();
  assert_eq!(child_ids(&root.replies[0]), ["r1a"]);

  // A shallow refresh of the root keeps r1's children.
  c.load_post_replies(path(&["root"])).await.unwrap();
  let root = c.post(&"root".into()).await.unwrap();
  assert_eq!(child_ids(&root.replies[0]), ["r1a"]);

  let state = c.read().await;
  assert_eq!(state.success_message.as_deref(), Some("Replies loaded."));
}

#[tokio::test]
async fn replies_for_unknown_root_leave_state_alone() {
  let c = with_root().await;
  c.dispatch(PostsState::clear_alerts).await;
  let before = c.read().await.entities.clone();

  let err = c.load_post_replies(path(&["ghost"])).await.unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::PostNotFound(_))));

  let state = c.read().await;
  assert_eq!(state.entities, before);
  assert_eq!(state.status, LoadStatus::Loaded);
  assert_eq!(state.success_message, None);
}

#[tokio::test]
async fn replies_failure_message_is_prefixed() {
  let c = with_root().await;
  c.source().failing.store(true, Ordering::SeqCst);

  c.load_post_replies(path(&["root"])).await.unwrap_err();

  let state = c.read().await;
  assert_eq!(state.status, LoadStatus::Errored);
  assert_eq!(
    state.error_message.as_deref(),
    Some("Error loading replies: fake source failure")
  );
}

#[tokio::test]
async fn empty_reply_path_is_rejected_up_front() {
  let c = with_root().await;
  let err = c.load_post_replies(vec![]).await.unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::EmptyReplyPath)));
}

// ─── Single posts ────────────────────────────────────────────────────────────

#[tokio::test]
async fn load_post_records_preview() {
  let mut post = leaf("p");
  post.preview_image = Some(vec![1, 2, 3]);
  let source = FakeSource {
    posts: HashMap::from([(PostId::from("p"), post)]),
    ..FakeSource::default()
  };
  let c = controller(source);

  c.load_post("p".into()).await.unwrap();

  let state = c.read().await;
  assert_eq!(state.status, LoadStatus::Loaded);
  assert_eq!(state.success_message.as_deref(), Some("Post data loaded."));
  assert_eq!(
    state.previews.get(&PostId::from("p")).map(String::as_str),
    Some("data:image/png;base64,AQID")
  );
}

#[tokio::test]
async fn load_missing_post_is_not_found() {
  let c = controller(FakeSource::default());
  let err = c.load_post("nope".into()).await.unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::PostNotFound(_))));

  let state = c.read().await;
  assert_eq!(state.status, LoadStatus::Errored);
  assert_eq!(state.error_message.as_deref(), Some("post not found: nope"));
}

#[tokio::test]
async fn preview_load_leaves_status_alone() {
  let mut post = leaf("p");
  post.preview_image = Some(vec![0xff]);
  let source = FakeSource {
    posts: HashMap::from([(PostId::from("p"), post)]),
    ..FakeSource::default()
  };
  let c = controller(source);

  let preview = c.load_post_preview("p".into()).await.unwrap();
  assert_eq!(preview, "data:image/png;base64,/w==");

  let state = c.read().await;
  assert_eq!(state.status, LoadStatus::Unloaded);
  assert_eq!(state.success_message.as_deref(), Some("Preview image loaded."));
}

#[tokio::test]
async fn create_post_upserts() {
  let c = controller(FakeSource::default());
  let post = c
    .create_post(CreatePostRequest {
      content: Some("hello".into()),
      ..CreatePostRequest::default()
    })
    .await
    .unwrap();

  let state = c.read().await;
  assert_eq!(state.success_message.as_deref(), Some("Post created."));
  assert_eq!(state.post(&post.id).unwrap().content.as_deref(), Some("hello"));
}

// ─── Synchronous actions ─────────────────────────────────────────────────────

#[test]
fn clear_alerts_and_reset() {
  let mut state = PostsState::new(StoreConfig { page_size: 3 });
  state.posts_page_loaded(&public(), 0, numbered("a", 7));
  state.fail(jonline_core::status::Operation::LoadPost, "boom");
  assert_eq!(state.listings.page_count(&public()), 3);

  state.clear_alerts();
  assert_eq!(state.error_message, None);
  assert_eq!(state.success_message, None);

  state.reset();
  assert!(state.entities.is_empty());
  assert_eq!(state.status, LoadStatus::Unloaded);
  assert_eq!(state.listings.page_size(), 3);
}

#[test]
fn removed_posts_drop_out_of_pages() {
  let mut state = PostsState::default();
  state.posts_page_loaded(&public(), 0, numbered("a", 3));

  assert!(state.remove_post(&"a1".into()).is_some());
  assert_eq!(page_ids(&state, 0), ["a0", "a2"]);
}

#[test]
fn upsert_posts_adds_every_post() {
  let mut state = PostsState::default();
  state.upsert_posts(numbered("a", 4));
  state.upsert_post(leaf("b"));
  assert_eq!(state.all_posts().len(), 5);
}

#[test]
fn store_config_defaults_page_size() {
  let config: StoreConfig = serde_json::from_str("{}").unwrap();
  assert_eq!(config.page_size, crate::DEFAULT_PAGE_SIZE);
}
