//! Branded interstitial page served before redirecting a short URL.
//!
//! The page embeds the destination's preview metadata as Open Graph /
//! Twitter Card / structured-data tags so the short link unfurls nicely in
//! chats and feeds, then redirects client-side: a timed `location.replace`
//! plus a `<meta refresh>` fallback at the same delay for no-script agents.

use maud::{html, Markup, PreEscaped, DOCTYPE};

use crate::metadata::TargetMetadata;
use crate::render::components::{display_destination, display_url, CARD_CSS, REDIRECT_CSS};

/// Everything the interstitial needs, composed by the caller.
#[derive(Debug)]
pub struct RedirectPage<'a> {
    pub keyword: &'a str,
    pub destination: &'a str,
    /// Title of the short URL as stored by the host app.
    pub link_title: &'a str,
    /// Public short link at the root origin (`https://example.com/git`).
    pub short_url: &'a str,
    /// Profile name from settings.
    pub author: &'a str,
    /// Profile avatar URL; OG image fallback. May be empty.
    pub avatar: &'a str,
    pub delay_secs: u32,
    /// Fetched destination metadata; any field may be empty.
    pub metadata: &'a TargetMetadata,
}

pub fn render(page: &RedirectPage) -> Markup {
    // Fetched fields win; stored and configured values fill the gaps.
    let title = pick(&page.metadata.title, pick(page.link_title, page.keyword));
    let description = pick(&page.metadata.description, title);
    let image = pick(&page.metadata.image, page.avatar);
    let kind = pick(&page.metadata.kind, "website");

    let og_title = if page.author.is_empty() {
        title.to_string()
    } else {
        format!("{} \u{2192} {}", page.author, title)
    };

    let refresh = format!("{};url={}", page.delay_secs, page.destination);
    let clean_short = display_url(page.short_url);
    let clean_dest = display_destination(page.destination);

    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (og_title) }

                link rel="canonical" href=(page.short_url);
                meta name="description" content=(description);
                meta name="author" content=(page.author);
                @if !page.metadata.theme_color.is_empty() {
                    meta name="theme-color" content=(page.metadata.theme_color);
                }

                meta property="og:title" content=(og_title);
                meta property="og:url" content=(page.short_url);
                meta property="og:type" content=(kind);
                meta property="og:site_name" content=(page.author);
                meta property="og:description" content=(description);
                @if !image.is_empty() {
                    meta property="og:image" content=(image);
                }

                meta name="twitter:card" content="summary";
                meta name="twitter:title" content=(og_title);
                meta name="twitter:description" content=(description);
                @if !image.is_empty() {
                    meta name="twitter:image" content=(image);
                }

                script type="application/ld+json" { (PreEscaped(json_ld(page, &og_title, image))) }

                meta http-equiv="refresh" content=(refresh);
                style { (PreEscaped(CARD_CSS)) (PreEscaped(REDIRECT_CSS)) }
            }
            body {
                div class="card" {
                    div class="author" { (page.author) }
                    div class="title" { (title) }
                    div class="dest" {
                        a href=(page.short_url) rel="noopener" { (clean_short) }
                        " " span class="arrow" { "\u{2192}" } " "
                        a href=(page.destination) rel="noopener" { (clean_dest) }
                    }
                    div class="dots" { span {} span {} span {} }
                }
                script { (PreEscaped(redirect_script(page.destination, page.delay_secs))) }
            }
        }
    }
}

fn pick<'a>(preferred: &'a str, fallback: &'a str) -> &'a str {
    if preferred.is_empty() {
        fallback
    } else {
        preferred
    }
}

/// Schema.org WebPage description of the short link.
fn json_ld(page: &RedirectPage, og_title: &str, image: &str) -> String {
    let mut doc = serde_json::json!({
        "@context": "https://schema.org",
        "@type": "WebPage",
        "name": og_title,
        "url": page.short_url,
        "author": { "@type": "Person", "name": page.author },
    });
    if !image.is_empty() {
        doc["image"] = serde_json::Value::String(image.to_string());
    }
    embed_json(&doc)
}

fn redirect_script(destination: &str, delay_secs: u32) -> String {
    let target = embed_json(&serde_json::Value::String(destination.to_string()));
    let delay_ms = u64::from(delay_secs) * 1000;
    format!("setTimeout(function () {{ window.location.replace({target}); }}, {delay_ms});")
}

/// Serialize JSON for inline `<script>` embedding. `<` is escaped so a
/// crafted value cannot close the script element.
fn embed_json(value: &serde_json::Value) -> String {
    value.to_string().replace('<', "\\u003c")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page<'a>(metadata: &'a TargetMetadata) -> RedirectPage<'a> {
        RedirectPage {
            keyword: "git",
            destination: "https://github.com/user",
            link_title: "My code",
            short_url: "https://example.com/git",
            author: "Jo",
            avatar: "https://example.com/avatar.png",
            delay_secs: 1,
            metadata,
        }
    }

    #[test]
    fn fetched_metadata_takes_precedence() {
        let metadata = TargetMetadata {
            title: "user (GitHub)".to_string(),
            description: "Repositories".to_string(),
            image: "https://avatars.example/img.png".to_string(),
            kind: "profile".to_string(),
            theme_color: "#0d1117".to_string(),
        };
        let html = render(&page(&metadata)).into_string();
        assert!(html.contains("Jo \u{2192} user (GitHub)"));
        assert!(html.contains(r#"content="profile""#));
        assert!(html.contains("https://avatars.example/img.png"));
        assert!(html.contains(r##"name="theme-color" content="#0d1117""##));
    }

    #[test]
    fn unreachable_destination_falls_back_to_the_stored_title() {
        let metadata = TargetMetadata::default();
        let html = render(&page(&metadata)).into_string();
        assert!(html.contains("Jo \u{2192} My code"));
        assert!(html.contains(r#"property="og:url" content="https://example.com/git""#));
        assert!(html.contains(r#"property="og:type" content="website""#));
        // Avatar steps in for the missing og:image.
        assert!(html.contains(r#"property="og:image" content="https://example.com/avatar.png""#));
    }

    #[test]
    fn both_redirect_mechanisms_use_the_same_delay() {
        let metadata = TargetMetadata::default();
        let html = render(&page(&metadata)).into_string();
        assert!(html.contains(r#"content="1;url=https://github.com/user""#));
        assert!(html.contains("}, 1000);"));
    }

    #[test]
    fn destination_cannot_break_out_of_the_script() {
        let metadata = TargetMetadata::default();
        let mut p = page(&metadata);
        p.destination = "https://example.net/</script><script>alert(1)";
        let html = render(&p).into_string();
        assert!(!html.contains("</script><script>alert(1)"));
    }

    #[test]
    fn short_and_destination_urls_are_shown_schemeless() {
        let metadata = TargetMetadata::default();
        let html = render(&page(&metadata)).into_string();
        assert!(html.contains(">example.com/git<"));
        assert!(html.contains(">github.com/user<"));
    }
}
