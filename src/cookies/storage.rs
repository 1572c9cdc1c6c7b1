use crate::cookies::cookie::Cookie;
use crate::cookies::matching::{match_domain, match_path};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use time::OffsetDateTime;

/// Ordered cookie jar.
///
/// A cookie is identified by (name, domain, path). Adding a cookie whose
/// identity already exists replaces the old entry only when the value
/// changed, the expiry moved forward or the session flag flipped; an
/// identical add is a no-op.
#[derive(Debug, Default)]
pub struct CookieStorage {
    cookies: RwLock<Vec<Cookie>>,
}

impl Clone for CookieStorage {
    fn clone(&self) -> Self {
        Self::from_cookies(self.all())
    }
}

impl CookieStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_cookies(cookies: Vec<Cookie>) -> Self {
        Self {
            cookies: RwLock::new(cookies),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Cookie>> {
        self.cookies.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Cookie>> {
        self.cookies.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Add a cookie. Returns `false` if it was invalid or already stored.
    pub fn add_cookie(&self, cookie: Cookie) -> bool {
        if !cookie.is_valid() {
            tracing::debug!("Rejected cookie with empty name");
            return false;
        }

        let mut cookies = self.write();
        let mut idx = 0;
        while idx < cookies.len() {
            let existing = &cookies[idx];
            if existing.path != cookie.path
                || existing.domain != cookie.domain
                || existing.name != cookie.name
            {
                idx += 1;
                continue;
            }

            let replaces = existing.session != cookie.session
                || cookie.expires > existing.expires
                || existing.value != cookie.value;
            if !replaces {
                return false;
            }

            tracing::trace!(name = %cookie.name, "Replacing cookie");
            cookies.remove(idx);
        }

        tracing::trace!(name = %cookie.name, domain = ?cookie.domain, path = %cookie.path, "Stored cookie");
        cookies.push(cookie);
        true
    }

    /// Remove every cookie with `name`, optionally narrowed by domain and path.
    ///
    /// Returns how many cookies were removed.
    pub fn delete_cookie(&self, name: &str, domain: Option<&str>, path: Option<&str>) -> usize {
        let mut cookies = self.write();
        let before = cookies.len();
        cookies.retain(|c| {
            let hit = c.name == name
                && domain.map_or(true, |d| match_domain(c.domain.as_deref(), d))
                && path.map_or(true, |p| match_path(&c.path, p));
            !hit
        });
        before - cookies.len()
    }

    /// Cookies that apply to a request for `domain` + `path`.
    ///
    /// Expired cookies are skipped. Secure cookies are only returned when
    /// `scheme` is `https` or unspecified.
    pub fn get_cookies_with_condition(
        &self,
        domain: &str,
        path: &str,
        scheme: Option<&str>,
    ) -> Vec<Cookie> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let secure_ok = scheme.map_or(true, |s| s.eq_ignore_ascii_case("https"));

        self.read()
            .iter()
            .filter(|c| match_domain(c.domain.as_deref(), domain))
            .filter(|c| match_path(&c.path, path))
            .filter(|c| !c.is_expired(now))
            .filter(|c| !c.secure || secure_ok)
            .cloned()
            .collect()
    }

    /// Snapshot of every stored cookie, in insertion order.
    pub fn all(&self) -> Vec<Cookie> {
        self.read().clone()
    }

    /// Swap the whole set, returning the previous one.
    pub fn replace(&self, cookies: Vec<Cookie>) -> Vec<Cookie> {
        std::mem::replace(&mut *self.write(), cookies)
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}
