#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use magnet_feed_api::StubFeed;
use magnet_feed_core::{FileEntry, Location};
use std::time::Duration;

pub const WAIT: Duration = Duration::from_secs(5);

pub fn file(id: &str, location: Option<&str>) -> FileEntry {
    FileEntry {
        id: id.to_string(),
        name: format!("{}.iso", id),
        magnet: format!("magnet:?xt=urn:btih:{}", id),
        original_url: format!("http://tracker.local/{}", id),
        last_comment: String::new(),
        last_sync_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        torrent_updated_at: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
        location: location.map(str::to_string),
    }
}

pub fn location(id: &str, name: &str) -> Location {
    Location {
        id: id.to_string(),
        name: name.to_string(),
    }
}

pub fn stub_with(ids: &[&str]) -> StubFeed {
    StubFeed::new(
        ids.iter().map(|id| file(id, Some("loc1"))).collect(),
        vec![location("loc1", "Downloads"), location("loc2", "TV Shows")],
    )
}

pub fn ids(files: &[FileEntry]) -> Vec<&str> {
    files.iter().map(|f| f.id.as_str()).collect()
}
