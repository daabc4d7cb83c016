//! Rewrite rule generation.
//!
//! Produces the mod_rewrite rule set installed at the document root. Rule
//! order is significant: canonicalization first (a redirect must be issued
//! before any serving decision), then the host-app passthrough (its
//! subdirectory must never be shadowed), then the static-file passthrough and
//! the catch-all fallback into the generated front controller.

use crate::identity::SiteIdentity;

/// Version of the generated rule set. Bumping this makes the artifact
/// manager regenerate the rules on the next install.
pub const RULESET_VERSION: u32 = 3;

/// First line of the marker-delimited block in the rewrite-rules file.
pub const BLOCK_BEGIN: &str = "# BEGIN linkfront";

/// Last line of the marker-delimited block.
pub const BLOCK_END: &str = "# END linkfront";

/// Canonicalization settings for the rule set.
#[derive(Debug, Clone, Copy, Default)]
pub struct RewriteOptions {
    /// Redirect plain-HTTP requests to HTTPS.
    pub force_https: bool,

    /// Redirect the off-variant host (`www.` or bare) to the configured one.
    /// Direction is auto-detected from whether the configured root host
    /// already carries a `www.` prefix.
    pub force_www: bool,
}

/// Build the complete rewrite-rules block, framed by the ownership markers.
pub fn build_rules(identity: &SiteIdentity, opts: &RewriteOptions) -> String {
    let host = identity.root_origin.host_str().unwrap_or("localhost");
    let scheme = identity.root_origin.scheme();
    let mut lines: Vec<String> = vec![
        BLOCK_BEGIN.to_string(),
        format!("# Ruleset v{RULESET_VERSION}. Managed by linkfront; edits inside this block are overwritten."),
        "<IfModule mod_rewrite.c>".to_string(),
        "RewriteEngine On".to_string(),
        "RewriteBase /".to_string(),
    ];

    match (opts.force_https, opts.force_www) {
        (true, true) => {
            // One combined rule: non-HTTPS OR off-variant host, a single 301
            // hop straight to the fully canonical origin. Two separate rules
            // would chain http+off-host requests through two redirects.
            lines.push("RewriteCond %{HTTPS} !=on [OR]".to_string());
            lines.push(format!(
                "RewriteCond %{{HTTP_HOST}} ^{}$ [NC]",
                escape_pattern(&off_variant(host))
            ));
            lines.push(format!("RewriteRule ^(.*)$ https://{host}/$1 [R=301,L]"));
        }
        (false, true) => {
            lines.push(format!(
                "RewriteCond %{{HTTP_HOST}} ^{}$ [NC]",
                escape_pattern(&off_variant(host))
            ));
            lines.push(format!("RewriteRule ^(.*)$ {scheme}://{host}/$1 [R=301,L]"));
        }
        (true, false) => {
            lines.push("RewriteCond %{HTTPS} !=on".to_string());
            lines.push("RewriteRule ^(.*)$ https://%{HTTP_HOST}/$1 [R=301,L]".to_string());
        }
        (false, false) => {}
    }

    if !identity.base_path.is_empty() {
        // Anything under the host app's subdirectory falls through untouched.
        let base = identity.base_path.trim_start_matches('/');
        lines.push(format!(
            "RewriteRule ^{}(/.*)?$ - [L]",
            escape_pattern(base)
        ));
    }

    // Existing files and directories are served as-is; everything else goes
    // to the generated front controller.
    lines.push("RewriteCond %{REQUEST_FILENAME} -f [OR]".to_string());
    lines.push("RewriteCond %{REQUEST_FILENAME} -d".to_string());
    lines.push("RewriteRule ^ - [L]".to_string());
    lines.push("RewriteRule ^ index.php [L]".to_string());

    lines.push("</IfModule>".to_string());
    lines.push(BLOCK_END.to_string());

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// The host variant we redirect away from: `www.`-prefixed if the configured
/// host is bare, bare if the configured host carries `www.`.
fn off_variant(host: &str) -> String {
    match host.strip_prefix("www.") {
        Some(bare) => bare.to_string(),
        None => format!("www.{host}"),
    }
}

/// Escape a literal hostname or path segment for use in a rewrite pattern.
fn escape_pattern(literal: &str) -> String {
    let mut out = String::with_capacity(literal.len());
    for c in literal.chars() {
        if matches!(c, '.' | '+' | '?' | '*' | '(' | ')' | '[' | ']' | '^' | '$' | '|') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
