//! Resolved content and the two-tier content cache.

mod cache;
mod lines;

pub use cache::{ContentCache, ContentError};
pub use lines::{ResolvedContent, split_lines};
