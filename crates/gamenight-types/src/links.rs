use url::Url;
use uuid::Uuid;

/// The only catalog host whose links are accepted.
pub const CATALOG_HOST: &str = "boardgamegeek.com";

/// True iff `s` is a well-formed event id.
pub fn validate_event_id(s: &str) -> bool {
    Uuid::parse_str(s).is_ok()
}

/// Extracts the catalog item id from `https://boardgamegeek.com/boardgame/<digits>/<slug>`.
///
/// Anything else (other scheme, host, port or path shape) yields `None`.
pub fn extract_catalog_id(input: &str) -> Option<i64> {
    let url = Url::parse(input.trim()).ok()?;
    if url.scheme() != "https" || url.host_str() != Some(CATALOG_HOST) || url.port().is_some() {
        return None;
    }

    let rest = url.path().strip_prefix("/boardgame/")?;
    let (id, slug) = rest.split_once('/')?;

    let digits = !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit());
    let slug_ok = !slug.is_empty() && slug.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-');
    if !digits || !slug_ok {
        return None;
    }

    id.parse().ok()
}

/// Cheap prefix test used to route chat replies before full validation.
pub fn looks_like_catalog_url(text: &str) -> bool {
    text.trim_start()
        .starts_with(&format!("https://{}/boardgame/", CATALOG_HOST))
}

/// Canonical link for a catalog item.
pub fn catalog_url(id: i64) -> String {
    format!("https://{}/boardgame/{}", CATALOG_HOST, id)
}

/// The catalog CDN escapes the parentheses of its `filters:format(png)` suffix,
/// which breaks the image; store them literally.
pub fn decode_image_url(url: &str) -> String {
    url.replace("%28", "(").replace("%29", ")")
}
