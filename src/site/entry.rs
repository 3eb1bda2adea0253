// src/site/entry.rs
// =============================================================================
// The site directory data model.
//
// - SiteEntry: one record per canonical URL, exactly as persisted
// - CategoryInfo: sort weight for a category section
// - SiteStore: the whole config document (siteInfo + categoryInfo)
// - EffectiveFlags: a read-only view where falsy values count as "absent"
//
// The stored record is never pruned. A `needPay: false` or `star`-less entry
// stays byte-for-byte the same on disk; only the EffectiveFlags view decides
// what a value means for sorting and rendering.
// =============================================================================

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// The `invalid` attribute: either a plain flag or a human-written reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Invalid {
    Flag(bool),
    Reason(String),
}

/// One site in the directory.
///
/// Field names follow the persisted JSON (`needVerify`, `needVPN`, ...).
/// Anything we don't model is kept in `extra` so a load/save cycle never
/// drops curator data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errmsg: Option<String>,
    /// Category tags. Older configs store a single string here.
    #[serde(
        rename = "type",
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub star: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invalid: Option<Invalid>,
    /// Consecutive failed probes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub need_verify: Option<u32>,
    #[serde(rename = "needVPN", default, skip_serializing_if = "Option::is_none")]
    pub need_vpn: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub need_pwd: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub need_pay: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub need_key: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub need_login: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hide: Option<bool>,
    /// `owner/name` of the GitHub repo behind this entry, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Uncertain once a site has failed more than this many probes in a row.
pub const UNCERTAIN_AFTER: u32 = 2;

/// Flags as they matter for ranking and rendering.
///
/// false / 0 / "" in the stored record all read as "not set" here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EffectiveFlags<'a> {
    pub invalid: bool,
    pub invalid_reason: Option<&'a str>,
    /// `needVerify > 2`
    pub uncertain: bool,
    pub need_vpn: bool,
    pub need_pwd: bool,
    pub need_pay: bool,
    pub need_key: bool,
    pub need_login: bool,
    pub hide: bool,
    /// The rating is not a flag: `Some(0)` means "actively discouraged".
    pub star: Option<i32>,
}

impl SiteEntry {
    /// Computes the effective view without touching the stored record.
    pub fn flags(&self) -> EffectiveFlags<'_> {
        let (invalid, invalid_reason) = match &self.invalid {
            Some(Invalid::Flag(flag)) => (*flag, None),
            Some(Invalid::Reason(reason)) if !reason.is_empty() => (true, Some(reason.as_str())),
            _ => (false, None),
        };

        EffectiveFlags {
            invalid,
            invalid_reason,
            uncertain: self.need_verify.unwrap_or(0) > UNCERTAIN_AFTER,
            need_vpn: self.need_vpn.unwrap_or(false),
            need_pwd: self.need_pwd.unwrap_or(false),
            need_pay: self.need_pay.unwrap_or(false),
            need_key: self.need_key.unwrap_or(false),
            need_login: self.need_login.unwrap_or(false),
            hide: self.hide.unwrap_or(false),
            star: self.star,
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// A freshly discovered mirror of `repo`, filed under the parent's tags.
    pub fn mirror_of(repo: &str, tags: Vec<String>) -> Self {
        SiteEntry {
            desc: Some(format!("mirror of {}", repo)),
            tags,
            ..Default::default()
        }
    }
}

/// Section settings for one category tag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<i64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// The persisted directory: every site plus the category table.
///
/// BTreeMap keeps iteration (and therefore the saved file) in URL order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteStore {
    #[serde(default)]
    pub site_info: BTreeMap<String, SiteEntry>,
    #[serde(default)]
    pub category_info: BTreeMap<String, CategoryInfo>,
    /// Run options stored alongside the data; OR-ed with the CLI flags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ci: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<bool>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl SiteStore {
    /// Entries that will show up in the rendered listing.
    pub fn visible(&self) -> impl Iterator<Item = (&String, &SiteEntry)> {
        self.site_info.iter().filter(|(_, entry)| !entry.flags().hide)
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
        Nothing(()),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(tag) if tag.is_empty() => Vec::new(),
        OneOrMany::One(tag) => vec![tag],
        OneOrMany::Many(tags) => tags,
        OneOrMany::Nothing(()) => Vec::new(),
    })
}
