//! Page rendering.
//!
//! Turns a [`RedirectOutcome`](crate::resolve::RedirectOutcome) into HTML.
//! All pages use [maud](https://maud.lambda.xyz/) with automatic escaping of
//! dynamic values. Regardless of which template produced a page, every HTML
//! response gets one identifying `<meta>` tag injected immediately before
//! the closing head element — a theme-independent stamping step, applied
//! here rather than in any template.

pub mod components;
pub mod not_found;
pub mod redirect;

/// Identifying tag injected into every rendered page.
pub const GENERATOR_META: &str = concat!(
    r#"<meta name="generator" content="linkfront "#,
    env!("CARGO_PKG_VERSION"),
    r#"">"#
);

/// Inject the generator tag immediately before `</head>`. HTML without a
/// head element passes through unchanged.
pub fn stamp(html: String) -> String {
    let lower = html.to_ascii_lowercase();
    match lower.find("</head>") {
        Some(at) => {
            let mut stamped = String::with_capacity(html.len() + GENERATOR_META.len() + 1);
            stamped.push_str(&html[..at]);
            stamped.push_str(GENERATOR_META);
            stamped.push('\n');
            stamped.push_str(&html[at..]);
            stamped
        }
        None => html,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamp_lands_immediately_before_head_close() {
        let html = "<html><head><title>t</title></head><body></body></html>".to_string();
        let stamped = stamp(html);
        let tag_at = stamped.find(GENERATOR_META).unwrap();
        let head_at = stamped.find("</head>").unwrap();
        assert!(tag_at < head_at);
        assert!(stamped[tag_at + GENERATOR_META.len()..].trim_start().starts_with("</head>"));
    }

    #[test]
    fn stamp_handles_uppercase_head() {
        let stamped = stamp("<HTML><HEAD></HEAD></HTML>".to_string());
        assert!(stamped.contains(GENERATOR_META));
    }

    #[test]
    fn headless_html_passes_through() {
        let html = "<p>fragment</p>".to_string();
        assert_eq!(stamp(html.clone()), html);
    }

    #[test]
    fn rendered_pages_are_stampable() {
        let markup = not_found::render("ghost", "https://example.com/", "Jo");
        let stamped = stamp(markup.into_string());
        assert!(stamped.contains(GENERATOR_META));
    }
}
