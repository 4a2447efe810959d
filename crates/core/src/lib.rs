pub mod error;
pub mod model;
pub mod protocol;

pub use error::FeedError;
pub use model::{FileEntry, Location, LocationAssignment};
