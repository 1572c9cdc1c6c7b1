//! MIME shortcuts.

pub const JSON: &str = "application/json";
pub const FORM: &str = "application/x-www-form-urlencoded";
pub const MULTIPART: &str = "multipart/form-data";
pub const TEXT: &str = "text/plain";
pub const HTML: &str = "text/html";
pub const XML: &str = "application/xml";

/// Expand a shortcut (`json`, `form`, ...) to its MIME type.
///
/// Anything else is returned lower-cased with parameters removed.
pub fn resolve(mime: &str) -> String {
    let base = mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
    match base.as_str() {
        "json" => JSON.to_string(),
        "form" => FORM.to_string(),
        "multipart" => MULTIPART.to_string(),
        "text" => TEXT.to_string(),
        "html" => HTML.to_string(),
        "xml" => XML.to_string(),
        _ => base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve() {
        assert_eq!(resolve("json"), JSON);
        assert_eq!(resolve("JSON"), JSON);
        assert_eq!(resolve("multipart"), MULTIPART);
        assert_eq!(resolve("Application/JSON; charset=utf-8"), JSON);
        assert_eq!(resolve("image/png"), "image/png");
    }
}
