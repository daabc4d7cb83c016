//! Shared fragments for the rendered pages.

/// Base card styling shared by the interstitial, not-found, setup-pending
/// and error pages. Dark glass card, centered.
pub const CARD_CSS: &str = r#"
*{margin:0;padding:0;box-sizing:border-box}
body{min-height:100vh;display:flex;align-items:center;justify-content:center;font-family:system-ui,-apple-system,sans-serif;background:#141621;color:#f2f2f2}
.card{max-width:420px;width:90%;background:rgba(255,255,255,.04);backdrop-filter:blur(24px);-webkit-backdrop-filter:blur(24px);border:1px solid rgba(255,255,255,.08);border-radius:1rem;padding:2.5rem 2rem;text-align:center;box-shadow:0 0 80px -20px rgba(124,107,196,.3);animation:card-in .4s ease-out}
@keyframes card-in{from{opacity:0;transform:translateY(12px) scale(.97)}to{opacity:1;transform:translateY(0) scale(1)}}
.author{font-size:.7rem;font-weight:500;color:rgba(255,255,255,.35);text-transform:uppercase;letter-spacing:.12em;margin-bottom:.75rem}
.message{font-size:.9rem;color:rgba(255,255,255,.5);margin-bottom:.5rem}
"#;

/// Additions for the interstitial redirect page.
pub const REDIRECT_CSS: &str = r#"
.title{font-size:1.15rem;font-weight:600;margin-bottom:1.25rem}
.dest{font-size:.72rem;color:rgba(255,255,255,.4);margin-bottom:1.5rem}
.dest .arrow{color:rgba(255,255,255,.25)}
.dest a{color:rgba(255,255,255,.55);text-decoration:none;word-break:break-all}
.dest a:hover{color:#f2f2f2;text-decoration:underline}
.dots{display:flex;justify-content:center;gap:6px;margin-top:.25rem}
.dots span{width:6px;height:6px;border-radius:50%;background:#7c6bc4;animation:dot-pulse 1s ease-in-out infinite}
.dots span:nth-child(2){animation-delay:.15s}
.dots span:nth-child(3){animation-delay:.3s}
@keyframes dot-pulse{0%,100%{opacity:.2;transform:scale(.8)}50%{opacity:1;transform:scale(1.2)}}
"#;

/// Additions for the branded not-found page.
pub const NOT_FOUND_CSS: &str = r#"
.code{font-size:3.5rem;font-weight:700;background:linear-gradient(135deg,#7c6bc4,#a78bfa);-webkit-background-clip:text;-webkit-text-fill-color:transparent;background-clip:text;line-height:1;margin-bottom:.75rem}
.path{font-size:.72rem;color:rgba(255,255,255,.25);font-family:monospace;margin-bottom:2rem;word-break:break-all}
.home-btn{display:inline-block;padding:.6rem 1.8rem;border-radius:.5rem;background:rgba(124,107,196,.15);border:1px solid rgba(124,107,196,.3);color:#a78bfa;text-decoration:none;font-size:.85rem;font-weight:500;transition:background .2s,border-color .2s}
.home-btn:hover{background:rgba(124,107,196,.25);border-color:rgba(124,107,196,.5)}
"#;

/// Strip the scheme from a URL for compact display (`example.com/git`).
pub fn display_url(url: &str) -> String {
    let stripped = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    stripped.trim_end_matches('/').to_string()
}

/// Like [`display_url`], additionally dropping the query string.
pub fn display_destination(url: &str) -> String {
    let shown = display_url(url);
    match shown.split_once('?') {
        Some((before, _)) => before.to_string(),
        None => shown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_url_strips_scheme_and_trailing_slash() {
        assert_eq!(display_url("https://example.com/git/"), "example.com/git");
        assert_eq!(display_url("example.com"), "example.com");
    }

    #[test]
    fn display_destination_drops_the_query() {
        assert_eq!(
            display_destination("https://github.com/user?tab=repos"),
            "github.com/user"
        );
    }
}
