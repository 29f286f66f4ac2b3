//! Content transformation pipeline.
//!
//! Turns a raw Markdown content item into the normalized payload the content
//! API accepts: skip filtering, path canonicalization, template-syntax
//! stripping, fenced-code normalization, Markdown rendering, external-link
//! rewriting, and metadata derivation.

pub mod codeblock;
pub mod external_link;
pub mod highlight;
pub mod markdown;
pub mod model;
pub mod path;
pub mod payload;
pub mod robots;
pub mod skip;
pub mod template;

pub use model::{Asset, ContentItem, ContentType, ExternalResources, Payload, ResourceGroup, TagRef};
pub use payload::build_payload;
