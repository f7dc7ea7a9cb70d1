// Share-link check for clipboard imports

use crate::error::ImportError;
use tracing::warn;

/// Accept `text` if it is a link into this application
///
/// The link must start with the origin's scheme and host. A port, path,
/// query or fragment may follow, but not more host characters, so
/// `https://app.example.com.evil` does not pass for `https://app.example.com`.
pub fn check_share_link(text: &str, origin: &str) -> Result<String, ImportError> {
    let link = text.trim();
    let accepted = origin_prefix(origin).is_some_and(|prefix| {
        link.strip_prefix(prefix.as_str())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with(['/', ':', '?', '#']))
    });

    if accepted {
        Ok(link.to_string())
    } else {
        warn!(link, origin, "Rejected share link from another origin");
        Err(ImportError::Clipboard { link: link.to_string() })
    }
}

/// `scheme://host` of an origin, dropping any port, path or trailing slash
///
/// Bracketed IPv6 hosts keep their brackets. `None` when there is no host.
fn origin_prefix(origin: &str) -> Option<String> {
    let origin = origin.trim();
    let (scheme, rest) = origin.split_once("://").unwrap_or(("http", origin));
    let host = if rest.starts_with('[') {
        let end = rest.find(']')?;
        &rest[..=end]
    } else {
        rest.split(['/', ':', '?', '#']).next().unwrap_or_default()
    };
    if host.is_empty() || host == "[]" {
        return None;
    }
    Some(format!("{}://{}", scheme, host))
}
