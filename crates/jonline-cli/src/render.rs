//! Plain-text and JSON output for posts and reply trees.

use std::io::{self, Write};

use jonline_core::post::Post;

const SNIPPET_CHARS: usize = 60;

/// One-line summary: id, timestamp, author, and title or content snippet.
pub fn summary(post: &Post) -> String {
  let author = post
    .author
    .as_ref()
    .and_then(|a| a.username.as_deref())
    .unwrap_or("anonymous");
  let text = post
    .title
    .as_deref()
    .or(post.content.as_deref())
    .unwrap_or("");
  let mut snippet: String = text.chars().take(SNIPPET_CHARS).collect();
  if text.chars().count() > SNIPPET_CHARS {
    snippet.push('…');
  }
  format!(
    "{}  {}  @{}  [{} replies]  {}",
    post.id,
    post.created_at.format("%Y-%m-%d %H:%M"),
    author,
    post.reply_count,
    snippet.replace('\n', " ")
  )
}

/// Write `post` and every loaded reply, indented by depth.
pub fn write_tree(out: &mut impl Write, post: &Post, depth: usize) -> io::Result<()> {
  writeln!(out, "{}{}", "  ".repeat(depth), summary(post))?;
  for reply in &post.replies {
    write_tree(out, reply, depth + 1)?;
  }
  Ok(())
}

/// Write a list of posts as trees, or as a pretty JSON array.
pub fn write_posts(out: &mut impl Write, posts: &[Post], json: bool) -> anyhow::Result<()> {
  if json {
    serde_json::to_writer_pretty(&mut *out, posts)?;
    writeln!(out)?;
  } else {
    for post in posts {
      write_tree(out, post, 0)?;
    }
  }
  Ok(())
}
