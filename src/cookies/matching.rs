//! Domain and path matching rules.

use std::net::IpAddr;

/// Check if a cookie domain applies to `target`.
///
/// An absent cookie domain matches everything. A literal IP target only
/// matches an identical cookie domain.
pub fn match_domain(cookie_domain: Option<&str>, target: &str) -> bool {
    let cookie_domain = match cookie_domain {
        Some(d) if !d.is_empty() => d.trim_start_matches('.'),
        _ => return true,
    };

    if cookie_domain.eq_ignore_ascii_case(target) {
        return true;
    }

    let bare = target.trim_start_matches('[').trim_end_matches(']');
    if bare.parse::<IpAddr>().is_ok() {
        return false;
    }

    if target.len() > cookie_domain.len() {
        let split = target.len() - cookie_domain.len();
        return target.is_char_boundary(split)
            && target[split..].eq_ignore_ascii_case(cookie_domain)
            && target[..split].ends_with('.');
    }

    false
}

/// Check if a cookie path applies to `target`.
///
/// `/to` matches `/to` and `/to/path` but not `/together`.
pub fn match_path(cookie_path: &str, target: &str) -> bool {
    let cookie_path = normalize(cookie_path);
    let target = normalize(target);

    if cookie_path == "/" || cookie_path == target {
        return true;
    }

    target.starts_with(cookie_path) && target[cookie_path.len()..].starts_with('/')
}

/// Directory of a request path, used when a cookie has no usable Path.
pub fn default_path(request_path: &str) -> String {
    if !request_path.starts_with('/') {
        return "/".to_string();
    }
    match request_path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(idx) => request_path[..idx].to_string(),
    }
}

fn normalize(path: &str) -> &str {
    if path.is_empty() {
        return "/";
    }
    if path == "/" {
        return path;
    }
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}
