// src/render/readme.rs
// =============================================================================
// Writes the rendered listing into README.md.
//
// The listing region starts at `站点列表(` and runs up to the next
// blank-line-plus-`## ` heading. Everything outside that region is left
// alone. The file is only written when its content actually changes, so
// re-running with an unchanged store is a no-op on disk.
// =============================================================================

use anyhow::{Context, Result};
use regex::{NoExpand, Regex};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use super::{RenderedList, SITE_LIST_MARKER};

/// Replaces the site-list region of `path` with `rendered`.
///
/// Returns whether the file was written.
pub fn update_readme(path: &Path, rendered: &RenderedList) -> Result<bool> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let Some(updated) = replace_site_list(&content, rendered) else {
        warn!(path = %path.display(), "no `{}(` region found, README left untouched", SITE_LIST_MARKER);
        return Ok(false);
    };

    if updated == content {
        debug!(path = %path.display(), "README unchanged");
        return Ok(false);
    }

    fs::write(path, updated).with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), total = rendered.total, "README updated");
    Ok(true)
}

/// The document with every site-list region replaced, or None when the
/// document has no such region.
pub fn replace_site_list(content: &str, rendered: &RenderedList) -> Option<String> {
    let pattern = Regex::new(&format!(r"{}\([\s\S]+?\n\n## ", regex::escape(SITE_LIST_MARKER)))
        .expect("site list pattern is a valid regex");

    if !pattern.is_match(content) {
        return None;
    }

    let replacement = format!("{}\n\n## ", rendered.fragment());
    Some(pattern.replace_all(content, NoExpand(&replacement)).into_owned())
}
