use magnet_feed_core::protocol::{DirectorySnapshot, RegistrySnapshot};
use magnet_feed_core::{FeedError, FileEntry, Location};

/// Name of the location `location` points at, or the raw id when the
/// registry does not know it (deleted upstream, registry not loaded yet).
pub fn location_label(location: Option<&str>, locations: &[Location]) -> Option<String> {
    let id = location?;
    let label = locations
        .iter()
        .find(|l| l.id == id)
        .map(|l| l.name.clone())
        .unwrap_or_else(|| id.to_string());
    Some(label)
}

/// One file as a view renders it.
#[derive(Debug, Clone, PartialEq)]
pub struct FileRow {
    pub file: FileEntry,
    pub location_label: Option<String>,
    /// A remove/refresh for this file is still in flight.
    pub busy: bool,
}

impl FileRow {
    pub fn build(file: &FileEntry, locations: &[Location], busy: bool) -> Self {
        Self {
            file: file.clone(),
            location_label: location_label(file.location.as_deref(), locations),
            busy,
        }
    }

    pub fn comment_label(&self) -> &str {
        if self.file.has_comment() {
            &self.file.last_comment
        } else {
            "No comments"
        }
    }
}

/// Everything a view needs for one render.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedView {
    pub rows: Vec<FileRow>,
    pub locations: Vec<Location>,
    pub loading: bool,
    /// Directory error first, then registry error.
    pub errors: Vec<FeedError>,
}

impl FeedView {
    pub fn project(directory: &DirectorySnapshot, registry: &RegistrySnapshot) -> Self {
        let rows = directory
            .files
            .iter()
            .map(|f| FileRow::build(f, &registry.locations, directory.is_busy(&f.id)))
            .collect();

        Self {
            rows,
            locations: registry.locations.clone(),
            loading: directory.loading || registry.loading,
            errors: directory
                .error
                .iter()
                .chain(registry.error.iter())
                .cloned()
                .collect(),
        }
    }

    pub fn error(&self) -> Option<&FeedError> {
        self.errors.first()
    }

    pub fn row(&self, id: &str) -> Option<&FileRow> {
        self.rows.iter().find(|r| r.file.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locations() -> Vec<Location> {
        vec![Location {
            id: "loc1".to_string(),
            name: "Downloads".to_string(),
        }]
    }

    #[test]
    fn resolves_known_location() {
        assert_eq!(
            location_label(Some("loc1"), &locations()).as_deref(),
            Some("Downloads")
        );
    }

    #[test]
    fn falls_back_to_raw_id() {
        assert_eq!(
            location_label(Some("/downloads/tv shows"), &locations()).as_deref(),
            Some("/downloads/tv shows")
        );
        assert_eq!(
            location_label(Some("loc1"), &[]).as_deref(),
            Some("loc1")
        );
    }

    #[test]
    fn unset_location_has_no_label() {
        assert_eq!(location_label(None, &locations()), None);
    }

    #[test]
    fn combines_loading_and_errors() {
        let directory = DirectorySnapshot {
            loading: false,
            error: Some(FeedError::Transport("reset".to_string())),
            ..Default::default()
        };
        let registry = RegistrySnapshot {
            loading: true,
            ..Default::default()
        };

        let view = FeedView::project(&directory, &registry);
        assert!(view.loading);
        assert_eq!(view.error(), Some(&FeedError::Transport("reset".to_string())));
        assert!(view.rows.is_empty());
    }
}
