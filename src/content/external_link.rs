//! Post-processing of rendered HTML: external anchors open in a new tab
//! with safe `rel` attributes.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use url::Url;

static ANCHOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<a(?:\s+?|\s+?[^<>]+?\s+?)href=["']((?:https?:|//)[^<>"']+)["'][^<>]*>"#)
        .unwrap()
});

static TARGET_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)target=").unwrap());

static REL_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)rel=").unwrap());

static REL_VALUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)rel=["']([^<>"']*)["']"#).unwrap());

/// Rewrites anchors pointing away from `base_url`'s host to open in a new
/// tab. Anchors already declaring a `target` attribute are left alone; an
/// existing `rel` attribute gains `noopener` (no duplicate), a missing one
/// becomes `rel="noopener external nofollow noreferrer"`. Relative links
/// never match.
pub fn rewrite_external_links(html: &str, base_url: &str) -> String {
    ANCHOR_RE
        .replace_all(html, |caps: &Captures| {
            let tag = caps.get(0).map_or("", |m| m.as_str());
            let href = caps.get(1).map_or("", |m| m.as_str());

            if !is_external_link(href, base_url) || TARGET_ATTR_RE.is_match(tag) {
                return tag.to_string();
            }

            if REL_ATTR_RE.is_match(tag) {
                let updated = REL_VALUE_RE.replace(tag, |rel: &Captures| {
                    let tokens = rel.get(1).map_or("", |m| m.as_str());
                    if tokens.split_whitespace().any(|t| t.eq_ignore_ascii_case("noopener")) {
                        rel.get(0).map_or("", |m| m.as_str()).to_string()
                    } else {
                        format!(r#"rel="{tokens} noopener""#)
                    }
                });
                updated.replacen("href=", r#"target="_blank" href="#, 1)
            } else {
                tag.replacen(
                    "href=",
                    r#"target="_blank" rel="noopener external nofollow noreferrer" href="#,
                    1,
                )
            }
        })
        .into_owned()
}

/// True when `href` resolves to a host different from `base_url`'s.
fn is_external_link(href: &str, base_url: &str) -> bool {
    let normalized = if let Some(rest) = href.strip_prefix("//") {
        format!("https://{rest}")
    } else {
        href.to_string()
    };

    let Ok(parsed) = Url::parse(&normalized) else {
        return false;
    };
    let Ok(base) = Url::parse(base_url) else {
        // an unparseable base gives no host to stay on
        return true;
    };

    match (parsed.host_str(), base.host_str()) {
        (Some(href_host), Some(base_host)) => href_host != base_host,
        _ => true,
    }
}
