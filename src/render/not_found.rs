//! Branded not-found page.

use maud::{html, Markup, PreEscaped, DOCTYPE};

use crate::render::components::{CARD_CSS, NOT_FOUND_CSS};

/// Render the branded 404 card: the requested path and a way back home.
pub fn render(requested_path: &str, home_url: &str, author: &str) -> Markup {
    let shown_path = format!("/{}", requested_path.trim_start_matches('/'));
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { "404 - " (author) }
                meta name="robots" content="noindex";
                style { (PreEscaped(CARD_CSS)) (PreEscaped(NOT_FOUND_CSS)) }
            }
            body {
                div class="card" {
                    div class="code" { "404" }
                    div class="message" { "This link does not exist." }
                    div class="path" { (shown_path) }
                    a href=(home_url) class="home-btn" { "Back to homepage" }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_shows_the_requested_path() {
        let html = render("ghost", "https://example.com/", "Jo").into_string();
        assert!(html.contains("/ghost"));
        assert!(html.contains(r#"href="https://example.com/""#));
    }

    #[test]
    fn hostile_path_is_escaped() {
        let html = render("<script>alert(1)</script>", "https://example.com/", "Jo").into_string();
        assert!(!html.contains("<script>alert(1)"));
    }
}
