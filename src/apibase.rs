//! Instance-host to API-host derivation.
//!
//! Best-effort and unverified against real tenant naming: the result must
//! always be shown to the operator before use, and an explicit override wins
//! unconditionally. When no rule matches we return an empty string instead of
//! guessing a host.

use regex::Regex;
use std::sync::OnceLock;

use crate::urls;

/// `hcm41.sapsf.com`, `hcm41preview.sapsf.com` and friends.
fn hcm_host() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^hcm(\d+)(preview)?\.sapsf\.com$").expect("hcm host pattern"))
}

/// Derive the companion API base URL for a tenant instance URL.
///
/// Rules, first match wins:
/// 1. host already starts with `api` -> returned unchanged (idempotent)
/// 2. `hcm<digits>[preview].sapsf.com` -> `api<digits>[preview].sapsf.com`
/// 3. host contains `.successfactors.` -> prefix leftmost label with `api`
/// 4. anything else -> `""`, caller must require an explicit override
pub fn derive(instance_url: &str) -> String {
    let norm = urls::normalize(instance_url);
    if norm.is_empty() {
        return String::new();
    }
    let host = urls::host_of(&norm);
    if host.is_empty() {
        return String::new();
    }
    let scheme = urls::scheme_of(&norm);

    if host.starts_with("api") {
        return format!("{}://{}", scheme, host);
    }
    if let Some(caps) = hcm_host().captures(&host) {
        let preview = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        return format!("{}://api{}{}.sapsf.com", scheme, &caps[1], preview);
    }
    if host.contains(".successfactors.") {
        return format!("{}://api{}", scheme, host);
    }
    String::new()
}

/// Effective API base: a non-empty override always wins over derivation.
/// A bare-host override gets the https scheme via normalization.
pub fn effective_api_base(instance_url: &str, api_override: &str) -> String {
    let ov = urls::normalize(api_override);
    if !ov.is_empty() {
        return ov;
    }
    derive(instance_url)
}
