//! Async HTTP client for the setlist feed.

use std::time::Duration;

use encore_core::{date::ShowDate, setlist::SetSongList, source::SetlistSource};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{Error, Result, payload::parse_payload};

/// Connection settings for the setlist feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetlistSettings {
  pub base_url:      String,
  pub api_key:       String,
  /// Rows for other artists are ignored.
  pub artist_slug:   String,
  /// Set labels that denote encores, in order.
  pub encore_labels: Vec<String>,
  pub timeout_secs:  u64,
}

impl Default for SetlistSettings {
  fn default() -> Self {
    Self {
      base_url:      "https://api.phish.net/v5".into(),
      api_key:       String::new(),
      artist_slug:   "phish".into(),
      encore_labels: vec!["e".into(), "e2".into(), "e3".into()],
      timeout_secs:  30,
    }
  }
}

/// Async client for the setlist feed.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct SetlistClient {
  client:   Client,
  settings: SetlistSettings,
}

impl SetlistClient {
  pub fn new(settings: SetlistSettings) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(settings.timeout_secs))
      .build()?;
    Ok(Self { client, settings })
  }

  fn url(&self, date: ShowDate) -> String {
    format!(
      "{}/setlists/showdate/{date}.json",
      self.settings.base_url.trim_end_matches('/'),
    )
  }

  /// `GET /setlists/showdate/<date>.json?apikey=<key>`
  async fn fetch(&self, date: ShowDate) -> Result<Option<SetSongList>> {
    let resp = self
      .client
      .get(self.url(date))
      .query(&[("apikey", self.settings.api_key.as_str())])
      .send()
      .await?;

    if !resp.status().is_success() {
      return Err(Error::Status(resp.status()));
    }
    let body = resp.text().await?;
    let list = parse_payload(
      &body,
      date,
      &self.settings.artist_slug,
      &self.settings.encore_labels,
    )?;

    tracing::debug!(
      %date,
      songs = list.as_ref().map_or(0, SetSongList::len),
      "fetched setlist"
    );
    Ok(list)
  }
}

impl SetlistSource for SetlistClient {
  type Error = Error;

  async fn fetch_setlist(&self, date: ShowDate) -> Result<Option<SetSongList>> {
    self.fetch(date).await
  }

  /// The feed has no live status; any reported song means the show started.
  async fn is_show_started(
    &self,
    date: ShowDate,
    timezone: Option<String>,
    region: Option<String>,
  ) -> Result<bool> {
    tracing::debug!(%date, ?timezone, ?region, "asking the feed whether the show started");
    Ok(self.fetch(date).await?.is_some_and(|l| !l.is_empty()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn url_uses_iso_date_and_trims_slash() {
    let client = SetlistClient::new(SetlistSettings {
      base_url: "https://feed.example/v5/".into(),
      ..SetlistSettings::default()
    })
    .unwrap();
    let date = ShowDate::from_ymd(2024, 7, 19).unwrap();
    assert_eq!(client.url(date), "https://feed.example/v5/setlists/showdate/2024-07-19.json");
  }
}
