//! [`EntityTable`] — the flat post store and the reply-tree merger.
//!
//! Every post the cache has seen lives in one entry keyed by its id,
//! replies included. An entry stores the post without nested replies plus
//! the ordered ids of its children; nested [`Post`] values are assembled on
//! read. Rewriting a subtree therefore touches one child list instead of
//! copying the path from the root.

use std::collections::{HashMap, HashSet};

use jonline_core::{
  Error,
  post::{Post, PostId, format_path},
};

use crate::Result;

// ─── Entry ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
  /// The post's own fields; `post.replies` is always empty.
  post:    Post,
  replies: Vec<PostId>,
}

// ─── Table ───────────────────────────────────────────────────────────────────

/// Flat identifier-to-post store; the single source of truth for post data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityTable {
  entries: HashMap<PostId, Entry>,
}

impl EntityTable {
  pub fn new() -> Self { Self::default() }

  pub fn len(&self) -> usize { self.entries.len() }

  pub fn is_empty(&self) -> bool { self.entries.is_empty() }

  pub fn contains(&self, id: &PostId) -> bool { self.entries.contains_key(id) }

  /// Ids of the currently known direct replies of `id`.
  pub fn reply_ids(&self, id: &PostId) -> Option<&[PostId]> {
    self.entries.get(id).map(|e| e.replies.as_slice())
  }

  /// The post with its full known reply tree.
  pub fn get(&self, id: &PostId) -> Option<Post> {
    self.assemble(id, &mut HashSet::new())
  }

  /// Every post, newest first.
  pub fn all(&self) -> Vec<Post> {
    let mut entries: Vec<&Entry> = self.entries.values().collect();
    entries.sort_by(|a, b| {
      b.post
        .created_at
        .cmp(&a.post.created_at)
        .then_with(|| a.post.id.cmp(&b.post.id))
    });
    entries
      .into_iter()
      .filter_map(|e| self.get(&e.post.id))
      .collect()
  }

  pub fn clear(&mut self) { self.entries.clear(); }

  // ── Writes ────────────────────────────────────────────────────────────────

  /// Insert or replace a post. The supplied `replies` become the post's
  /// children; a child that was already one of them keeps its cached
  /// replies.
  pub fn upsert(&mut self, mut post: Post) -> PostId {
    let incoming = std::mem::take(&mut post.replies);
    let replies = self.graft(&post.id, incoming);
    self.write(post, replies)
  }

  /// Insert or refresh a post fetched from a listing or a single-post load.
  /// A post already in the table keeps its cached replies; a new one takes
  /// whatever replies the fetch carried.
  pub fn upsert_preserving_replies(&mut self, mut post: Post) -> PostId {
    match self.entries.get(&post.id).map(|e| e.replies.clone()) {
      Some(cached) => {
        post.replies.clear();
        self.write(post, cached)
      }
      None => self.upsert(post),
    }
  }

  /// Remove a post together with its known reply subtree, detaching it from
  /// its parent. Returns the removed tree.
  pub fn remove(&mut self, id: &PostId) -> Option<Post> {
    let removed = self.get(id)?;

    let mut stack = vec![id.clone()];
    while let Some(next) = stack.pop() {
      if let Some(entry) = self.entries.remove(&next) {
        stack.extend(entry.replies);
      }
    }
    for entry in self.entries.values_mut() {
      entry.replies.retain(|child| child != id);
    }
    Some(removed)
  }

  /// Replace the children of the node at `path` with `new_children` and
  /// return the rebuilt root.
  ///
  /// `path[0]` must be in the table and every later segment must be a known
  /// child of the segment before it. The path is validated before anything
  /// is written, so a failed merge leaves the table untouched.
  pub fn merge_replies(
    &mut self,
    path: &[PostId],
    new_children: Vec<Post>,
  ) -> Result<Post> {
    let (root, descendants) = path.split_first().ok_or(Error::EmptyReplyPath)?;
    if !self.contains(root) {
      return Err(Error::PostNotFound(root.clone()).into());
    }

    let mut node = root;
    for segment in descendants {
      let is_child = self
        .reply_ids(node)
        .is_some_and(|children| children.contains(segment));
      if !is_child || !self.contains(segment) {
        return Err(
          Error::ReplyPathSegmentNotFound {
            segment: segment.clone(),
            path:    path.to_vec(),
          }
          .into(),
        );
      }
      node = segment;
    }

    let replies = self.graft(node, new_children);
    tracing::debug!(
      path = %format_path(path),
      replies = replies.len(),
      "merging replies"
    );
    if let Some(entry) = self.entries.get_mut(node) {
      entry.replies = replies;
    }

    self
      .get(root)
      .ok_or_else(|| Error::PostNotFound(root.clone()).into())
  }

  // ── Internals ─────────────────────────────────────────────────────────────

  /// Store `incoming` as the new children of `parent` and return their ids.
  /// A child that was among `parent`'s previous children keeps its cached
  /// replies. Any other child takes its own, resolved the same way one
  /// level down.
  fn graft(&mut self, parent: &PostId, incoming: Vec<Post>) -> Vec<PostId> {
    let previous: HashSet<PostId> = self
      .reply_ids(parent)
      .map(|ids| ids.iter().cloned().collect())
      .unwrap_or_default();

    incoming
      .into_iter()
      .map(|mut child| {
        let cached = previous
          .contains(&child.id)
          .then(|| self.entries.get(&child.id).map(|e| e.replies.clone()))
          .flatten();
        match cached {
          Some(replies) => {
            child.replies.clear();
            self.write(child, replies)
          }
          None => self.upsert(child),
        }
      })
      .collect()
  }

  fn write(&mut self, post: Post, replies: Vec<PostId>) -> PostId {
    let id = post.id.clone();
    self.entries.insert(id.clone(), Entry { post, replies });
    id
  }

  /// Build the nested view of `id`. `visited` holds the ancestors of the
  /// node being built, so a malformed cyclic payload terminates while a post
  /// listed under two parents appears under both.
  fn assemble(&self, id: &PostId, visited: &mut HashSet<PostId>) -> Option<Post> {
    let entry = self.entries.get(id)?;
    if !visited.insert(id.clone()) {
      return None;
    }
    let mut post = entry.post.clone();
    post.replies = entry
      .replies
      .iter()
      .filter_map(|child| self.assemble(child, visited))
      .collect();
    visited.remove(id);
    Some(post)
  }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
