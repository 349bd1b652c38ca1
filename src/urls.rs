use url::Url;

/// Canonicalize a user-entered URL: trim whitespace, default the scheme to
/// https, drop the trailing slash. Empty input stays empty. Total function:
/// malformed input comes back normalized best-effort, never an error —
/// downstream consumers signal absence by checking for emptiness.
pub fn normalize(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };
    // Strip trailing slashes only after the scheme separator, so a bare
    // scheme like "https://" survives renormalization intact.
    match with_scheme.find("://") {
        Some(pos) => {
            let (head, tail) = with_scheme.split_at(pos + 3);
            format!("{}{}", head, tail.trim_end_matches('/'))
        }
        None => with_scheme.trim_end_matches('/').to_string(),
    }
}

/// Extract the hostname of a URL: lowercased, no port, no path, no trailing
/// dot. Returns an empty string when no host can be found.
pub fn host_of(raw: &str) -> String {
    let norm = normalize(raw);
    if norm.is_empty() {
        return String::new();
    }
    if let Ok(parsed) = Url::parse(&norm) {
        if let Some(host) = parsed.host_str() {
            return host.trim_end_matches('.').to_string();
        }
    }
    // Fallback for inputs the url crate rejects: strip scheme, path, userinfo
    // and port by hand. Nothing after the separator means no host at all.
    let after_scheme = norm.split("://").nth(1).unwrap_or("");
    let authority = after_scheme.split('/').next().unwrap_or("");
    let host = authority.split('@').last().unwrap_or("");
    let host = host.split(':').next().unwrap_or("");
    host.trim_end_matches('.').to_lowercase()
}

/// Scheme of a normalized URL; anything that is not explicitly http is https.
pub fn scheme_of(raw: &str) -> &'static str {
    if normalize(raw).starts_with("http://") {
        "http"
    } else {
        "https"
    }
}
