// reel-data: decoded tag records and the cursor boundary for timeline parsing
pub mod cursor;
pub mod error;
pub mod model;

pub use cursor::{JsonLinesCursor, TagCursor};
pub use error::DecodeError;
