//! mpa Core Library
//!
//! Core types, configuration, and error handling for the mpa multi-page site generator.

pub mod config;
pub mod error;
pub mod frontmatter;
pub mod page;

pub use config::{BuildMode, Config};
pub use error::{CoreError, Result};
pub use frontmatter::{Attributes, HeadMatter, ScriptMatter};
pub use page::{PageFilter, PageId};
