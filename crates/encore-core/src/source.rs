//! The `SetlistSource` trait: where setlists come from.

use std::future::Future;

use crate::{date::ShowDate, setlist::SetSongList};

/// A provider of setlists, typically a third-party HTTP API.
///
/// While a show is in progress the returned list may be partial; it only
/// ever grows or gets corrected between calls.
pub trait SetlistSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// The setlist for `date`, or `None` when the feed has nothing yet.
  fn fetch_setlist(
    &self,
    date: ShowDate,
  ) -> impl Future<Output = Result<Option<SetSongList>, Self::Error>> + Send + '_;

  /// Whether the feed shows the show as under way. Consulted when the lock
  /// time cannot be computed locally.
  fn is_show_started(
    &self,
    date: ShowDate,
    timezone: Option<String>,
    region: Option<String>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
