//! Covau Searcher
//!
//! Decorators that add pagination behaviours to any [`SearchSource`]:
//!
//! - [`Unique`]: never yields the same key twice
//! - [`Saved`]: accumulates pages and yields the whole list
//! - [`Debounced`]: at most one fetch in flight, concurrent callers share it
//! - [`Droppable`]: drag-and-drop edits through an injected handler
//!
//! plus the base sources they usually wrap.
//!
//! # Example
//!
//! ```rust
//! use covau_searcher::{SearcherExt, StaticSource};
//! use covau_core::SearchSource;
//!
//! let source = StaticSource::new(Vec::new()).standard(None);
//! assert!(source.has_next_page());
//! ```
//!
//! [`SearchSource`]: covau_core::SearchSource

#![forbid(unsafe_code)]

pub mod debounce;
pub mod drop;
pub mod ext;
pub mod paged;
pub mod saved;
pub mod sources;
pub mod unique;

pub use debounce::Debounced;
pub use drop::Droppable;
pub use ext::{SearcherExt, Standard};
pub use paged::{Offset, OffsetFetcher, Page, PageFetcher, Paged};
pub use saved::{ItemList, Saved};
pub use sources::{AsyncStaticSource, Fused, StaticSource};
pub use unique::Unique;
