use tracing::debug;
use url::Url;

/// Canonicalize a URL string into the form used as the frontier's unique key.
///
/// Drops the fragment, strips trailing slashes and rebuilds
/// `scheme://host[:port]/path[?query]`. Normalization never fails: input that
/// the `url` crate cannot parse degrades to naive fragment stripping so the
/// crawl keeps progressing. The result is idempotent, so
/// `normalize(normalize(u)) == normalize(u)`.
pub fn normalize(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) if parsed.host_str().is_some() => {
            let mut normalized = format!("{}://", parsed.scheme());
            if let Some(host) = parsed.host_str() {
                normalized.push_str(host);
            }
            if let Some(port) = parsed.port() {
                normalized.push_str(&format!(":{}", port));
            }
            normalized.push_str(parsed.path());
            if let Some(query) = parsed.query() {
                if !query.is_empty() {
                    normalized.push('?');
                    normalized.push_str(query);
                }
            }
            normalized.trim_end_matches('/').to_string()
        }
        _ => {
            debug!("Could not parse URL for normalization, stripping naively: {}", url);
            let without_fragment = match url.split_once('#') {
                Some((before, _)) => before,
                None => url,
            };
            without_fragment.trim_end_matches('/').to_string()
        }
    }
}

/// Resolve a possibly-relative link against the page it was discovered on.
///
/// Returns `None` when the link cannot be turned into an absolute URL; the
/// caller skips it and moves on to the rest of the batch.
pub fn make_absolute(base_url: &str, link: &str) -> Option<String> {
    if let Ok(absolute) = Url::parse(link) {
        return Some(absolute.to_string());
    }

    match Url::parse(base_url).and_then(|base| base.join(link)) {
        Ok(resolved) => Some(resolved.to_string()),
        Err(e) => {
            debug!("Dropping unresolvable link '{}' on {}: {}", link, base_url, e);
            None
        }
    }
}

/// First non-empty path segment of a URL, if it has one.
pub fn first_path_segment(url: &Url) -> Option<String> {
    url.path_segments()
        .and_then(|mut segments| segments.next().map(String::from))
        .filter(|segment| !segment.is_empty())
}
