use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A torrent entry tracked by the feed service.
///
/// Field names follow the camelCase wire format; the snake_case spelling
/// emitted by the backend store is accepted as well.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub id: String,
    pub name: String,
    pub magnet: String,
    #[serde(alias = "original_url")]
    pub original_url: String,
    #[serde(default, alias = "last_comment")]
    pub last_comment: String,
    #[serde(alias = "last_sync_at")]
    pub last_sync_at: DateTime<Utc>,
    #[serde(alias = "torrent_updated_at")]
    pub torrent_updated_at: DateTime<Utc>,
    /// Location id; missing, `null` and `""` all mean "unset".
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub location: Option<String>,
}

impl FileEntry {
    pub fn has_comment(&self) -> bool {
        !self.last_comment.trim().is_empty()
    }
}

/// A named download destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub name: String,
}

/// Body of `POST /api/file-locations`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationAssignment {
    pub file_id: String,
    pub location: String,
}

impl LocationAssignment {
    pub fn new(file_id: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            file_id: file_id.into(),
            location: location.into(),
        }
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn decodes_camel_case_file() {
        let json = r#"[{
            "id": "f1",
            "name": "ubuntu.iso",
            "magnet": "magnet:?xt=urn:btih:abc",
            "originalUrl": "http://x/ubuntu",
            "lastComment": "",
            "lastSyncAt": "2024-01-01T00:00:00Z",
            "torrentUpdatedAt": "2024-01-02T00:00:00Z",
            "location": "loc1"
        }]"#;

        let files: Vec<FileEntry> = serde_json::from_str(json).unwrap();
        assert_eq!(files.len(), 1);

        let file = &files[0];
        assert_eq!(file.id, "f1");
        assert_eq!(file.original_url, "http://x/ubuntu");
        assert_eq!(file.location.as_deref(), Some("loc1"));
        assert_eq!(
            file.last_sync_at,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        );
        assert!(file.torrent_updated_at > file.last_sync_at);
        assert!(!file.has_comment());
    }

    #[test]
    fn decodes_backend_snake_case_file() {
        let json = r#"{
            "id": "42",
            "name": "Show S01",
            "magnet": "magnet:?xt=urn:btih:def",
            "original_url": "https://tracker/viewtopic.php?t=42",
            "last_comment": "new episode",
            "last_sync_at": "2024-03-05T10:15:30.123456789+03:00",
            "torrent_updated_at": "0001-01-01T00:00:00Z"
        }"#;

        let file: FileEntry = serde_json::from_str(json).unwrap();
        assert_eq!(file.original_url, "https://tracker/viewtopic.php?t=42");
        assert!(file.has_comment());
        assert_eq!(file.location, None);
        assert_eq!(
            file.last_sync_at.format("%H:%M:%S").to_string(),
            "07:15:30"
        );
    }

    #[test]
    fn empty_or_null_location_is_unset() {
        for location in [r#""""#, "null"] {
            let json = format!(
                r#"{{"id":"a","name":"a","magnet":"m","originalUrl":"u",
                "lastSyncAt":"2024-01-01T00:00:00Z","torrentUpdatedAt":"2024-01-01T00:00:00Z",
                "location":{}}}"#,
                location
            );
            let file: FileEntry = serde_json::from_str(&json).unwrap();
            assert_eq!(file.location, None, "location {} should be unset", location);
        }
    }

    #[test]
    fn rejects_malformed_timestamp() {
        let json = r#"{"id":"a","name":"a","magnet":"m","originalUrl":"u",
            "lastSyncAt":"yesterday","torrentUpdatedAt":"2024-01-01T00:00:00Z"}"#;
        assert!(serde_json::from_str::<FileEntry>(json).is_err());
    }

    #[test]
    fn assignment_uses_file_id_key() {
        let body = serde_json::to_value(LocationAssignment::new("f1", "loc2")).unwrap();
        assert_eq!(body, serde_json::json!({"fileId": "f1", "location": "loc2"}));
    }
}
