//! Shared schemas
//!
//! Row types for the item store, the feed document, and the structured
//! payloads expected from the text-generation provider.

pub mod enrichment;
pub mod feed;
pub mod news_item;

pub use enrichment::*;
pub use feed::*;
pub use news_item::*;
