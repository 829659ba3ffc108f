//! `jonline-feed` — browse a Jonline post fixture through the post cache.
//!
//! # Usage
//!
//! ```
//! jonline-feed --fixture posts.json page --through 2
//! jonline-feed --config feed.toml replies root-id,child-id
//! ```
//!
//! Settings come from the TOML file named by `--config` (optional) and
//! `JONLINE_*` environment variables; flags override both.

mod fixture;
mod render;

use std::{io, path::PathBuf};

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use fixture::FixtureSource;
use jonline_core::{
  listing::{ListingKey, PostListingType},
  post::{PostId, Visibility},
  source::CreatePostRequest,
};
use jonline_store::{DEFAULT_PAGE_SIZE, PostsController, StoreConfig};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(author, version, about = "Browse Jonline posts through the post cache")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "jonline-feed.toml")]
  config: PathBuf,

  /// JSON fixture to serve posts from.
  #[arg(long, env = "JONLINE_FIXTURE")]
  fixture: Option<PathBuf>,

  /// Print posts as JSON instead of indented trees.
  #[arg(long)]
  json: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Load listing pages from 0 through `--through` and print them.
  Page {
    #[arg(long, default_value_t = PostListingType::PublicPosts)]
    listing: PostListingType,

    /// Group id, for the group listings.
    #[arg(long)]
    group: Option<String>,

    /// Last page to load; defaults to `max_page` from the config.
    #[arg(long)]
    through: Option<u32>,
  },

  /// Load a single post.
  Post { id: String },

  /// Expand replies along a comma-separated path, root first.
  Replies {
    #[arg(value_delimiter = ',', required = true)]
    path: Vec<String>,
  },

  /// Create a post, or a reply with `--reply-to`.
  Create {
    #[arg(long)]
    title: Option<String>,

    #[arg(long)]
    content: Option<String>,

    #[arg(long)]
    reply_to: Option<String>,
  },
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize)]
struct FeedConfig {
  fixture_path: Option<PathBuf>,
  #[serde(default = "default_page_size")]
  page_size:    usize,
  #[serde(default)]
  max_page:     u32,
  #[serde(default)]
  json_output:  bool,
}

fn default_page_size() -> usize { DEFAULT_PAGE_SIZE }

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  // Logs go to stderr so stdout stays clean for output.
  tracing_subscriber::fmt()
    .with_writer(io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config.clone()).required(false))
    .add_source(config::Environment::with_prefix("JONLINE"))
    .build()
    .context("failed to read config file")?;
  let feed_cfg: FeedConfig = settings
    .try_deserialize()
    .context("failed to deserialise FeedConfig")?;

  let fixture_path = cli
    .fixture
    .clone()
    .or(feed_cfg.fixture_path.clone())
    .context("no fixture given; pass --fixture or set fixture_path")?;
  let source = FixtureSource::open(&fixture_path)
    .with_context(|| format!("failed to open fixture {fixture_path:?}"))?;

  let controller = PostsController::new(source, StoreConfig {
    page_size: feed_cfg.page_size,
  });
  let json = cli.json || feed_cfg.json_output;
  let mut out = io::stdout().lock();

  match cli.command {
    Command::Page {
      listing,
      group,
      through,
    } => {
      let key = ListingKey {
        listing_type: listing,
        group_id:     group,
      };
      let through = through.unwrap_or(feed_cfg.max_page);
      for page in 0..=through {
        let fetched = controller
          .load_posts_page(key.clone(), page)
          .await
          .with_context(|| format!("loading {key} page {page}"))?;
        if fetched.is_empty() {
          break;
        }
      }
      let state = controller.read().await;
      let pages = state.listings.page_count(&key);
      tracing::info!(listing = %key, pages, "listing cached");
      let posts = state.posts_pages_through(&key, pages.saturating_sub(1));
      render::write_posts(&mut out, &posts, json)?;
    }

    Command::Post { id } => {
      let post = controller
        .load_post(PostId::from(id))
        .await
        .context("loading post")?;
      render::write_posts(&mut out, &[post], json)?;
    }

    Command::Replies { path } => {
      let path: Vec<PostId> = path.into_iter().map(PostId::from).collect();
      let root_id = path.first().cloned().context("empty reply path")?;
      let mut root = controller
        .load_post(root_id)
        .await
        .context("loading root post")?;
      for end in 1..=path.len() {
        root = controller
          .load_post_replies(path[..end].to_vec())
          .await
          .context("loading replies")?;
      }
      render::write_posts(&mut out, &[root], json)?;
    }

    Command::Create {
      title,
      content,
      reply_to,
    } => {
      let post = controller
        .create_post(CreatePostRequest {
          title,
          content,
          reply_to_post_id: reply_to.map(PostId::from),
          visibility: Visibility::GlobalPublic,
          ..CreatePostRequest::default()
        })
        .await
        .context("creating post")?;
      render::write_posts(&mut out, &[post], json)?;
    }
  }

  Ok(())
}
