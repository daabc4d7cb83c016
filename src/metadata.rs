//! Social-preview metadata fetch.
//!
//! Best-effort enrichment of the interstitial redirect page: fetch the
//! destination's `<head>`, pull out the usual Open Graph fields, and fall
//! back to all-empty on any failure. The destination URL is
//! operator-supplied but reachable by anyone, so it is treated as untrusted:
//! non-HTTP schemes and hosts resolving into private, loopback, link-local
//! or otherwise reserved address space are refused before any connection is
//! made. Nothing here is ever cached — target pages change independently of
//! the redirector.

use std::collections::HashMap;
use std::net::IpAddr;
use std::time::Duration;

use scraper::{Html, Selector};
use url::Url;

/// Connection establishment timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(1);

/// Whole-request timeout; a hanging destination must never stall a redirect.
const TOTAL_TIMEOUT: Duration = Duration::from_secs(2);

/// Redirect hops followed at most.
const MAX_REDIRECTS: usize = 3;

/// Hard cap on bytes read while looking for the end of `<head>`.
const HEAD_READ_CAP: usize = 128 * 1024;

/// Preview fields extracted from a destination page. All fields default to
/// empty; consumers supply their own fallbacks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetMetadata {
    pub title: String,
    pub description: String,
    pub image: String,
    /// Open Graph object type (`og:type`).
    pub kind: String,
    pub theme_color: String,
}

/// Fetch preview metadata from a destination URL.
///
/// Redirects are followed manually so every hop, not just the first URL,
/// passes the scheme and address-space guards: a public destination must
/// not be able to bounce the fetch into private space.
///
/// Returns [`TargetMetadata::default`] on any guard refusal, network
/// failure, non-success status, or unparsable body. Never errors.
pub async fn fetch_target_metadata(destination: &str, user_agent: &str) -> TargetMetadata {
    let Ok(mut url) = Url::parse(destination) else {
        return TargetMetadata::default();
    };

    let Ok(client) = reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(TOTAL_TIMEOUT)
        .redirect(reqwest::redirect::Policy::none())
        .user_agent(user_agent)
        .build()
    else {
        return TargetMetadata::default();
    };

    for _ in 0..=MAX_REDIRECTS {
        if !hop_allowed(&url).await {
            tracing::debug!(url = %url, "refusing metadata fetch for non-public hop");
            return TargetMetadata::default();
        }

        let response = match client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(err) => {
                tracing::debug!(destination, error = %err, "metadata fetch failed");
                return TargetMetadata::default();
            }
        };

        let status = response.status();
        if status.is_redirection() {
            let Some(next) = response
                .headers()
                .get(reqwest::header::LOCATION)
                .and_then(|value| value.to_str().ok())
                .and_then(|location| url.join(location).ok())
            else {
                return TargetMetadata::default();
            };
            url = next;
            continue;
        }
        if !status.is_success() {
            return TargetMetadata::default();
        }

        let head = read_head(response).await;
        return parse_head(&head);
    }
    TargetMetadata::default()
}

/// Guard applied before every request, first hop and redirects alike.
async fn hop_allowed(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https") && destination_is_public(url).await
}

/// Validate that the destination host resolves into public address space.
///
/// A domain is resolved once through system DNS and the first address is
/// checked; the HTTP client then re-resolves on connect. DESIGN.md covers
/// the re-resolution gap this leaves open.
async fn destination_is_public(url: &Url) -> bool {
    match url.host() {
        Some(url::Host::Ipv4(ip)) => ip_is_public(IpAddr::V4(ip)),
        Some(url::Host::Ipv6(ip)) => ip_is_public(IpAddr::V6(ip)),
        Some(url::Host::Domain(domain)) => {
            let port = url.port_or_known_default().unwrap_or(80);
            match tokio::net::lookup_host((domain, port)).await {
                Ok(mut addrs) => addrs.next().is_some_and(|addr| ip_is_public(addr.ip())),
                Err(_) => false,
            }
        }
        None => false,
    }
}

/// Reject private, loopback, link-local, CGNAT, documentation and otherwise
/// reserved addresses.
fn ip_is_public(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            let octets = v4.octets();
            let shared = octets[0] == 100 && (octets[1] & 0xc0) == 64; // 100.64.0.0/10
            let documentation = matches!(
                (octets[0], octets[1], octets[2]),
                (192, 0, 2) | (198, 51, 100) | (203, 0, 113)
            );
            !(v4.is_private()
                || v4.is_loopback()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast()
                || shared
                || documentation
                || octets[0] == 0
                || octets[0] >= 240)
        }
        IpAddr::V6(v6) => {
            if let Some(mapped) = v6.to_ipv4_mapped() {
                return ip_is_public(IpAddr::V4(mapped));
            }
            let segments = v6.segments();
            let unique_local = (segments[0] & 0xfe00) == 0xfc00; // fc00::/7
            let link_local = (segments[0] & 0xffc0) == 0xfe80; // fe80::/10
            !(v6.is_loopback() || v6.is_unspecified() || unique_local || link_local)
        }
    }
}

/// Read the response body up to the closing `</head>` tag (or the byte cap),
/// whichever comes first.
async fn read_head(mut response: reqwest::Response) -> String {
    let mut buf: Vec<u8> = Vec::new();
    loop {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                buf.extend_from_slice(&chunk);
                if buf.len() >= HEAD_READ_CAP || find_ci(&String::from_utf8_lossy(&buf), "</head>").is_some() {
                    break;
                }
            }
            Ok(None) => break,
            Err(_) => break,
        }
    }
    let text = String::from_utf8_lossy(&buf);
    match find_ci(&text, "</head>") {
        Some(end) => text[..end].to_string(),
        None => text.into_owned(),
    }
}

/// Case-insensitive substring search, byte offset of the first match.
fn find_ci(haystack: &str, needle: &str) -> Option<usize> {
    haystack.to_ascii_lowercase().find(&needle.to_ascii_lowercase())
}

/// Extract `<title>` and the `<meta>` property/name → content map.
///
/// Entity decoding comes from the HTML parser itself; extracted values need
/// no further unescaping.
fn parse_head(html: &str) -> TargetMetadata {
    let document = Html::parse_document(html);
    let mut metadata = TargetMetadata::default();

    if let Ok(selector) = Selector::parse("title") {
        if let Some(title) = document.select(&selector).next() {
            metadata.title = title.text().collect::<String>().trim().to_string();
        }
    }

    let mut tags: HashMap<String, String> = HashMap::new();
    if let Ok(selector) = Selector::parse("meta") {
        for element in document.select(&selector) {
            let key = element
                .value()
                .attr("property")
                .or_else(|| element.value().attr("name"));
            let (Some(key), Some(content)) = (key, element.value().attr("content")) else {
                continue;
            };
            tags.entry(key.to_ascii_lowercase())
                .or_insert_with(|| content.trim().to_string());
        }
    }

    let take = |tags: &HashMap<String, String>, key: &str| {
        tags.get(key).cloned().unwrap_or_default()
    };
    metadata.description = tags
        .get("og:description")
        .or_else(|| tags.get("description"))
        .cloned()
        .unwrap_or_default();
    metadata.image = take(&tags, "og:image");
    metadata.kind = take(&tags, "og:type");
    metadata.theme_color = take(&tags, "theme-color");
    metadata
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn private_and_reserved_addresses_are_refused() {
        for blocked in [
            "10.0.0.5",
            "192.168.1.1",
            "172.16.3.4",
            "127.0.0.1",
            "169.254.10.10",
            "100.64.0.1",
            "0.0.0.0",
            "192.0.2.44",
            "::1",
            "fe80::1",
            "fd12:3456::1",
        ] {
            let ip: IpAddr = blocked.parse().unwrap();
            assert!(!ip_is_public(ip), "{blocked} should be refused");
        }
    }

    #[test]
    fn public_addresses_are_accepted() {
        for allowed in ["93.184.216.34", "8.8.8.8", "2606:4700::1111"] {
            let ip: IpAddr = allowed.parse().unwrap();
            assert!(ip_is_public(ip), "{allowed} should be accepted");
        }
    }

    #[test]
    fn mapped_ipv6_inherits_the_ipv4_verdict() {
        let mapped: IpAddr = "::ffff:10.0.0.5".parse().unwrap();
        assert!(!ip_is_public(mapped));
    }

    #[tokio::test]
    async fn private_ip_destination_yields_empty_without_connecting() {
        // Nothing listens at this address; an attempted connection would at
        // minimum burn the connect timeout. The guard returns immediately.
        let started = std::time::Instant::now();
        let metadata = fetch_target_metadata("http://10.0.0.5/secret", "test-agent").await;
        assert_eq!(metadata, TargetMetadata::default());
        assert!(started.elapsed() < CONNECT_TIMEOUT);
    }

    #[tokio::test]
    async fn redirect_hops_into_private_space_are_refused() {
        // The same guard runs before every hop, so a Location header
        // pointing into private or link-local space is refused exactly like
        // a first-hop private destination.
        for hop in [
            "http://10.0.0.5/latest/meta-data/",
            "http://169.254.169.254/",
            "file:///etc/passwd",
        ] {
            let url = Url::parse(hop).unwrap();
            assert!(!hop_allowed(&url).await, "{hop} should be refused");
        }
        let public = Url::parse("http://93.184.216.34/page").unwrap();
        assert!(hop_allowed(&public).await);
    }

    #[tokio::test]
    async fn non_http_scheme_yields_empty() {
        let metadata = fetch_target_metadata("ftp://example.com/file", "test-agent").await;
        assert_eq!(metadata, TargetMetadata::default());

        let metadata = fetch_target_metadata("file:///etc/passwd", "test-agent").await;
        assert_eq!(metadata, TargetMetadata::default());
    }

    #[tokio::test]
    async fn unparsable_destination_yields_empty() {
        let metadata = fetch_target_metadata("not a url", "test-agent").await;
        assert_eq!(metadata, TargetMetadata::default());
    }

    #[test]
    fn parse_head_extracts_all_fields() {
        let html = r##"<html><head>
            <title> The &amp; Page </title>
            <meta property="og:description" content="OG description">
            <meta name="description" content="plain description">
            <meta property="og:image" content="https://cdn.example.com/img.png">
            <meta property="og:type" content="article">
            <meta name="theme-color" content="#141621">
        </head><body>ignored</body></html>"##;
        let metadata = parse_head(html);
        assert_eq!(metadata.title, "The & Page");
        assert_eq!(metadata.description, "OG description");
        assert_eq!(metadata.image, "https://cdn.example.com/img.png");
        assert_eq!(metadata.kind, "article");
        assert_eq!(metadata.theme_color, "#141621");
    }

    #[test]
    fn parse_head_falls_back_to_plain_description() {
        let html = r#"<head><meta name="Description" content="fallback"></head>"#;
        let metadata = parse_head(html);
        assert_eq!(metadata.description, "fallback");
    }

    #[test]
    fn parse_head_handles_truncated_input() {
        let html = "<head><title>cut off mid";
        let metadata = parse_head(html);
        // html5ever recovers; worst case everything stays empty.
        assert!(metadata.image.is_empty());
    }

    #[test]
    fn meta_keys_are_case_insensitive() {
        let html = r#"<head><meta property="OG:Image" content="https://x.example/i.png"></head>"#;
        assert_eq!(parse_head(html).image, "https://x.example/i.png");
    }

    #[test]
    fn find_ci_locates_mixed_case_head_end() {
        assert_eq!(find_ci("<HEAD>x</HeAd><body>", "</head>"), Some(7));
        assert_eq!(find_ci("no end", "</head>"), None);
    }
}
