// src/github/links.rs
// =============================================================================
// This module pulls link targets out of Markdown text, e.g. the body of a
// deployment bot's commit comment:
//
//   | Name | Preview |
//   | app  | [Visit Preview](https://app-git-main.vercel.app) |
//
// We use the `pulldown-cmark` crate which:
// - Parses Markdown into events (heading, paragraph, link, etc.)
// - Follows the CommonMark specification
// - Is a streaming parser, so large comment bodies stay cheap
// =============================================================================

use pulldown_cmark::{Event, Parser, Tag};

// Extracts all HTTP/HTTPS link targets from Markdown text, in document order
//
// Example input:
//   "Check out [Rust](https://www.rust-lang.org)!"
//
// Example output:
//   vec!["https://www.rust-lang.org"]
pub fn extract_markdown_links(markdown: &str) -> Vec<String> {
    let mut links = Vec::new();

    // Track the link we're inside. One Markdown link produces
    // Start(Link) -> Text -> End(Link)
    let mut current_link: Option<String> = None;

    for event in Parser::new(markdown) {
        match event {
            // In pulldown-cmark 0.9, Link is Tag::Link(link_type, dest_url, title)
            Event::Start(Tag::Link(_link_type, dest_url, _title)) => {
                let url = dest_url.to_string();

                // Skip mailto:, relative paths, anchors...
                if is_http_link(&url) {
                    current_link = Some(url);
                }
            }

            Event::End(Tag::Link(..)) => {
                if let Some(url) = current_link.take() {
                    links.push(url);
                }
            }

            _ => {}
        }
    }

    links
}

fn is_http_link(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
