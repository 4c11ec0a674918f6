pub mod config;
pub mod discover;
pub mod entry;
pub mod frontmatter;
pub mod metadata;
pub mod sections;
pub mod store;
pub mod warn;
