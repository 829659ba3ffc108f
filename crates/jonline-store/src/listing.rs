//! [`ListingIndex`] — cached feed pages, stored as post ids.
//!
//! Page slots are assigned from occupancy, not from the page the caller asked
//! for: a fetch for page 0 resets the listing, then every fetch is cut into
//! `page_size` chunks written to the lowest unused slots. A late response for
//! page `n` therefore lands after whatever is already cached.

use std::collections::{BTreeMap, HashMap};

use jonline_core::{
  listing::ListingKey,
  post::{Post, PostId},
};

use crate::EntityTable;

/// Number of ids stored per page slot.
pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingIndex {
  page_size: usize,
  listings:  HashMap<ListingKey, BTreeMap<usize, Vec<PostId>>>,
}

impl Default for ListingIndex {
  fn default() -> Self { Self::new(DEFAULT_PAGE_SIZE) }
}

impl ListingIndex {
  /// An empty index chunking fetches into pages of `page_size` (minimum 1).
  pub fn new(page_size: usize) -> Self {
    Self {
      page_size: page_size.max(1),
      listings:  HashMap::new(),
    }
  }

  pub fn page_size(&self) -> usize { self.page_size }

  /// Record the ids returned by a fetch of `requested_page`.
  pub fn apply_page(
    &mut self,
    listing: &ListingKey,
    requested_page: u32,
    ids: Vec<PostId>,
  ) {
    if requested_page == 0 {
      self.listings.insert(listing.clone(), BTreeMap::new());
    }
    let pages = self.listings.entry(listing.clone()).or_default();

    let mut slot = 0;
    while pages.contains_key(&slot) {
      slot += 1;
    }
    if requested_page as usize != slot && requested_page != 0 {
      tracing::debug!(
        %listing,
        requested_page,
        slot,
        "page stored at first free slot"
      );
    }
    for chunk in ids.chunks(self.page_size) {
      pages.insert(slot, chunk.to_vec());
      slot += 1;
    }
  }

  /// The ids stored for `page`, if that slot is occupied.
  pub fn page_ids(&self, listing: &ListingKey, page: usize) -> Option<&[PostId]> {
    self
      .listings
      .get(listing)
      .and_then(|pages| pages.get(&page))
      .map(Vec::as_slice)
  }

  /// Number of occupied page slots for `listing`.
  pub fn page_count(&self, listing: &ListingKey) -> usize {
    self.listings.get(listing).map_or(0, BTreeMap::len)
  }

  /// The posts of one page. Ids that no longer resolve are skipped.
  pub fn get_page(
    &self,
    entities: &EntityTable,
    listing: &ListingKey,
    page: usize,
  ) -> Vec<Post> {
    self
      .page_ids(listing, page)
      .unwrap_or_default()
      .iter()
      .filter_map(|id| entities.get(id))
      .collect()
  }

  /// Pages `0..=max_page` concatenated in order.
  pub fn get_pages_through(
    &self,
    entities: &EntityTable,
    listing: &ListingKey,
    max_page: usize,
  ) -> Vec<Post> {
    (0..=max_page)
      .flat_map(|page| self.get_page(entities, listing, page))
      .collect()
  }

  pub fn clear(&mut self) { self.listings.clear(); }
}
