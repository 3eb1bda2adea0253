// src/render/mod.rs
// =============================================================================
// Turns the site store into the Markdown listing for README.md.
//
// This is a pure function of the store: same store in, same bytes out.
//
// Ranking (ascending, first difference wins):
//   invalid, needVerify > 2, needVPN, needPwd, needPay, needKey
//       -> flagged entries go after clean ones
//   star (unset or 0 counts as 1)  -> higher first
//   url                            -> lexicographic
//
// Each entry renders as one numbered line:
//   1. [[❌⭐⭐🔐] https://a.com](https://a.com) **Title。** description `errmsg`
// =============================================================================

mod readme;

pub use readme::update_readme;

use std::cmp::Reverse;

use crate::site::{CategoryInfo, EffectiveFlags, SiteEntry, SiteStore};

/// Text that introduces the listing region in README.md.
pub const SITE_LIST_MARKER: &str = "站点列表";

const MAX_STARS: i32 = 3;

/// The rendered listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedList {
    /// Number of visible (non-hidden) entries
    pub total: usize,
    /// Category sections, highest sort weight first
    pub sections: String,
}

impl RenderedList {
    /// `站点列表(N)：` header followed by the sections.
    pub fn fragment(&self) -> String {
        format!("{}({})：\n{}", SITE_LIST_MARKER, self.total, self.sections)
    }
}

/// Visible entries in display order.
pub fn rank(store: &SiteStore) -> Vec<(&str, &SiteEntry)> {
    let mut list: Vec<(&str, &SiteEntry)> = store
        .visible()
        .map(|(url, entry)| (url.as_str(), entry))
        .collect();

    list.sort_by_cached_key(|&(url, entry)| rank_key(url, &entry.flags()));
    list
}

type RankKey<'a> = (bool, bool, bool, bool, bool, bool, Reverse<i32>, &'a str);

fn rank_key<'a>(url: &'a str, flags: &EffectiveFlags<'_>) -> RankKey<'a> {
    // `star || 1`: unset and 0 both rank like a plain 1-star entry
    let star = match flags.star {
        Some(n) if n != 0 => n,
        _ => 1,
    };

    (
        flags.invalid,
        flags.uncertain,
        flags.need_vpn,
        flags.need_pwd,
        flags.need_pay,
        flags.need_key,
        Reverse(star),
        url,
    )
}

pub fn render(store: &SiteStore) -> RenderedList {
    let list = rank(store);

    let mut categories: Vec<(&String, &CategoryInfo)> = store.category_info.iter().collect();
    categories.sort_by_key(|(_, info)| Reverse(info.sort.unwrap_or(0)));

    let sections: Vec<String> = categories
        .into_iter()
        .filter_map(|(tag, _)| {
            let lines: Vec<String> = list
                .iter()
                .filter(|(_, entry)| entry.has_tag(tag))
                .map(|(url, entry)| render_entry(url, entry))
                .collect();

            if lines.is_empty() {
                return None;
            }
            Some(format!("\n### {} ({})\n\n{}", tag, lines.len(), lines.join("\n")))
        })
        .collect();

    RenderedList {
        total: list.len(),
        sections: sections.join("\n"),
    }
}

pub fn render_entry(url: &str, entry: &SiteEntry) -> String {
    let prefix = badges(&entry.flags());
    let prefix = if prefix.is_empty() { "⭐" } else { prefix.as_str() };

    let mut line = format!("1. [[{}] {}]({}) ", prefix, url, url);

    if let Some(title) = entry.title.as_deref().filter(|t| !t.is_empty()) {
        line.push_str(&format!("**{}。** ", title));
    }
    line.push_str(entry.desc.as_deref().unwrap_or(""));
    line.push(' ');
    if let Some(errmsg) = entry.errmsg.as_deref().filter(|e| !e.is_empty()) {
        line.push_str(&format!("`{}`", errmsg));
    }

    line.trim().to_string()
}

// Badge order: status (❌reason or ❓), rating (⭐ x N or ⛔), then
// 🔐 password, 💰 paid, 🔑 API key, 🚀 VPN, 🧑‍💻 login
fn badges(flags: &EffectiveFlags<'_>) -> String {
    let mut prefix = String::new();

    if flags.invalid {
        prefix.push('❌');
        prefix.push_str(flags.invalid_reason.unwrap_or(""));
    } else if flags.uncertain {
        prefix.push('❓');
    }

    match flags.star {
        Some(n) if n > 0 => prefix.push_str(&"⭐".repeat(n.min(MAX_STARS) as usize)),
        Some(0) => prefix.push('⛔'),
        _ => {}
    }

    for (set, badge) in [
        (flags.need_pwd, "🔐"),
        (flags.need_pay, "💰"),
        (flags.need_key, "🔑"),
        (flags.need_vpn, "🚀"),
        (flags.need_login, "🧑‍💻"),
    ] {
        if set {
            prefix.push_str(badge);
        }
    }

    prefix
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::Invalid;

    fn store_of(entries: Vec<(&str, SiteEntry)>, categories: &[(&str, i64)]) -> SiteStore {
        let mut store = SiteStore::default();
        for (url, entry) in entries {
            store.site_info.insert(url.to_string(), entry);
        }
        for (tag, sort) in categories {
            store.category_info.insert(
                tag.to_string(),
                CategoryInfo {
                    sort: Some(*sort),
                    ..Default::default()
                },
            );
        }
        store
    }

    fn tagged(tags: &[&str]) -> SiteEntry {
        SiteEntry {
            tags: tags.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }

    fn urls(store: &SiteStore) -> Vec<&str> {
        rank(store).into_iter().map(|(url, _)| url).collect()
    }

    #[test]
    fn test_invalid_outranks_star() {
        let store = store_of(
            vec![
                (
                    "https://b.com",
                    SiteEntry {
                        invalid: Some(Invalid::Flag(true)),
                        star: Some(3),
                        ..Default::default()
                    },
                ),
                (
                    "https://a.com",
                    SiteEntry {
                        invalid: Some(Invalid::Flag(false)),
                        star: Some(2),
                        ..Default::default()
                    },
                ),
            ],
            &[],
        );
        assert_eq!(urls(&store), vec!["https://a.com", "https://b.com"]);
    }

    #[test]
    fn test_flag_precedence_then_star_then_url() {
        let store = store_of(
            vec![
                ("https://vpn.com", SiteEntry { need_vpn: Some(true), star: Some(3), ..Default::default() }),
                ("https://key.com", SiteEntry { need_key: Some(true), ..Default::default() }),
                ("https://unsure.com", SiteEntry { need_verify: Some(3), ..Default::default() }),
                ("https://flaky.com", SiteEntry { need_verify: Some(2), ..Default::default() }),
                ("https://z.com", SiteEntry { star: Some(2), ..Default::default() }),
                ("https://y.com", SiteEntry::default()),
                ("https://x.com", SiteEntry { star: Some(0), ..Default::default() }),
            ],
            &[],
        );

        assert_eq!(
            urls(&store),
            vec![
                "https://z.com",
                "https://flaky.com",
                "https://x.com",
                "https://y.com",
                "https://key.com",
                "https://vpn.com",
                "https://unsure.com",
            ]
        );
    }

    #[test]
    fn test_badges() {
        let line = |entry: SiteEntry| render_entry("https://a.com", &entry);

        assert_eq!(
            line(SiteEntry { star: Some(0), ..Default::default() }),
            "1. [[⛔] https://a.com](https://a.com)"
        );
        assert_eq!(
            line(SiteEntry { star: Some(3), need_pwd: Some(true), ..Default::default() }),
            "1. [[⭐⭐⭐🔐] https://a.com](https://a.com)"
        );
        assert_eq!(
            line(SiteEntry { star: Some(7), ..Default::default() }),
            "1. [[⭐⭐⭐] https://a.com](https://a.com)"
        );
        assert_eq!(line(SiteEntry::default()), "1. [[⭐] https://a.com](https://a.com)");
        assert_eq!(
            line(SiteEntry {
                invalid: Some(Invalid::Reason("已关站".into())),
                need_verify: Some(9),
                need_login: Some(true),
                need_vpn: Some(true),
                ..Default::default()
            }),
            "1. [[❌已关站🚀🧑‍💻] https://a.com](https://a.com)"
        );
        assert_eq!(
            line(SiteEntry { need_verify: Some(3), ..Default::default() }),
            "1. [[❓] https://a.com](https://a.com)"
        );
    }

    #[test]
    fn test_entry_text_parts() {
        let entry = SiteEntry {
            title: Some("ChatX".into()),
            desc: Some("免费可用".into()),
            errmsg: Some("Not Found".into()),
            ..Default::default()
        };
        assert_eq!(
            render_entry("https://a.com", &entry),
            "1. [[⭐] https://a.com](https://a.com) **ChatX。** 免费可用 `Not Found`"
        );

        let no_desc = SiteEntry {
            errmsg: Some("Not Found".into()),
            ..Default::default()
        };
        assert_eq!(
            render_entry("https://a.com", &no_desc),
            "1. [[⭐] https://a.com](https://a.com)  `Not Found`"
        );
    }

    #[test]
    fn test_grouping_by_category() {
        let store = store_of(
            vec![
                ("https://both.com", tagged(&["ai", "tools"])),
                ("https://ai.com", tagged(&["ai"])),
                ("https://gone.com", SiteEntry { hide: Some(true), ..tagged(&["ai", "tools"]) }),
            ],
            &[("tools", 1), ("ai", 5), ("empty", 9)],
        );

        let rendered = render(&store);
        assert_eq!(rendered.total, 2);
        assert_eq!(
            rendered.sections,
            "\n### ai (2)\n\n\
             1. [[⭐] https://ai.com](https://ai.com)\n\
             1. [[⭐] https://both.com](https://both.com)\n\
             \n### tools (1)\n\n\
             1. [[⭐] https://both.com](https://both.com)"
        );
        assert!(!rendered.sections.contains("gone.com"));
        assert!(!rendered.sections.contains("empty"));
        assert_eq!(
            rendered.fragment(),
            format!("站点列表(2)：\n{}", rendered.sections)
        );
    }

    #[test]
    fn test_render_is_deterministic() {
        let store = store_of(
            vec![
                ("https://b.com", tagged(&["ai"])),
                ("https://a.com", SiteEntry { star: Some(2), ..tagged(&["ai"]) }),
            ],
            &[("ai", 1)],
        );
        assert_eq!(render(&store), render(&store.clone()));
    }
}
