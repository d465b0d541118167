use scraper::{Html, Selector};

use crate::join_url;

/// Extract the target of a `<meta http-equiv="refresh">` directive.
///
/// Only the first `<meta>` element of the document is considered. Its
/// `content` must look like `"<delay>; url=<target>"`; the target is resolved
/// against `base_url`.
pub fn check_for_meta(content: &str, base_url: &str) -> Option<String> {
    let document = Html::parse_document(content);
    let selector = Selector::parse("meta").ok()?;
    let meta = document.select(&selector).next()?;

    let directive = meta.value().attr("content")?;
    let http_equiv = meta.value().attr("http-equiv")?;
    if !http_equiv.trim().eq_ignore_ascii_case("refresh") {
        return None;
    }

    let parts: Vec<&str> = directive.split(';').collect();
    let [_delay, target] = parts.as_slice() else {
        return None;
    };

    let target = refresh_target(target)?;
    Some(join_url(base_url, target))
}

fn refresh_target(part: &str) -> Option<&str> {
    // ASCII lowercasing keeps byte offsets intact.
    let start = part.to_ascii_lowercase().find("url=")? + "url=".len();
    let target = part[start..]
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim();
    (!target.is_empty()).then_some(target)
}
