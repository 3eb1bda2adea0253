// src/site/mod.rs
// =============================================================================
// The site directory itself: what a site entry looks like and how URLs are
// canonicalized before they become store keys.
// =============================================================================

mod entry;
mod normalize;

pub use entry::{CategoryInfo, EffectiveFlags, Invalid, SiteEntry, SiteStore};
pub use normalize::{normalize, strip_trailing_slash};
