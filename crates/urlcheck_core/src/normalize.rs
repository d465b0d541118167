use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::{Host, Url};

/// Bytes escaped in the path: everything except unreserved characters,
/// existing escapes and the sub-delimiters browsers leave alone.
const PATH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/')
    .remove(b'%')
    .remove(b'+')
    .remove(b'$')
    .remove(b'!')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b',');

/// Bytes escaped in params and query strings; `=` and `&` stay separators.
const FORM_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b':')
    .remove(b'&')
    .remove(b'%')
    .remove(b'=')
    .remove(b'+')
    .remove(b'$')
    .remove(b'!')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b',');

/// Prepare a raw URL for re-requesting.
///
/// `None` and blank input mean there is nothing to normalize and yield `None`.
pub fn normalize(url: Option<&str>) -> Option<String> {
    url.filter(|raw| !raw.trim().is_empty()).map(normalize_url)
}

/// Percent-encode the path, form-encode params and query, and convert a
/// non-ASCII host to its IDNA form. Idempotent.
pub fn normalize_url(url: &str) -> String {
    let parts = UrlParts::split(url);
    let mut out = String::with_capacity(url.len() + 16);

    if let Some(scheme) = parts.scheme {
        out.push_str(&scheme.to_ascii_lowercase());
        out.push(':');
    }
    if let Some(netloc) = parts.netloc {
        out.push_str("//");
        out.push_str(&encode_netloc(netloc));
    }
    out.extend(utf8_percent_encode(parts.path, PATH_ENCODE_SET));
    if let Some(params) = parts.params {
        out.push(';');
        out.push_str(&encode_form(params));
    }
    if let Some(query) = parts.query {
        out.push('?');
        out.push_str(&encode_form(query));
    }
    if let Some(fragment) = parts.fragment {
        out.push('#');
        out.push_str(fragment);
    }
    out
}

/// Resolve `reference` against `base` the way a browser follows a link.
///
/// An absolute reference is returned verbatim. When `base` is not an
/// absolute URL the reference is returned as-is.
pub fn join_url(base: &str, reference: &str) -> String {
    let reference = reference.trim();
    if split_scheme(reference).0.is_some() && Url::parse(reference).is_ok() {
        return reference.to_string();
    }
    match Url::parse(base).and_then(|base| base.join(reference)) {
        Ok(joined) => joined.to_string(),
        Err(_) => reference.to_string(),
    }
}

struct UrlParts<'a> {
    scheme: Option<&'a str>,
    netloc: Option<&'a str>,
    path: &'a str,
    params: Option<&'a str>,
    query: Option<&'a str>,
    fragment: Option<&'a str>,
}

impl<'a> UrlParts<'a> {
    fn split(url: &'a str) -> Self {
        let (scheme, rest) = split_scheme(url);

        let (netloc, rest) = match rest.strip_prefix("//") {
            Some(after) => {
                let end = after.find(['/', '?', '#']).unwrap_or(after.len());
                (Some(&after[..end]), &after[end..])
            }
            None => (None, rest),
        };

        let (rest, fragment) = match rest.split_once('#') {
            Some((before, fragment)) => (before, Some(fragment)),
            None => (rest, None),
        };
        let (path, query) = match rest.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (rest, None),
        };

        // Params only attach to the last path segment.
        let segment_start = path.rfind('/').unwrap_or(0);
        let (path, params) = match path[segment_start..].find(';') {
            Some(offset) => {
                let at = segment_start + offset;
                (&path[..at], Some(&path[at + 1..]))
            }
            None => (path, None),
        };

        Self {
            scheme,
            netloc,
            path,
            params,
            query,
            fragment,
        }
    }
}

fn split_scheme(url: &str) -> (Option<&str>, &str) {
    if let Some((candidate, rest)) = url.split_once(':') {
        let mut chars = candidate.chars();
        let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
            && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
        if valid {
            return (Some(candidate), rest);
        }
    }
    (None, url)
}

fn encode_form(raw: &str) -> String {
    raw.split(' ')
        .map(|part| utf8_percent_encode(part, FORM_ENCODE_SET).to_string())
        .collect::<Vec<_>>()
        .join("+")
}

fn encode_netloc(netloc: &str) -> String {
    if netloc.is_ascii() {
        return netloc.to_string();
    }

    let (userinfo, host_port) = match netloc.rsplit_once('@') {
        Some((userinfo, host_port)) => (Some(userinfo), host_port),
        None => (None, netloc),
    };
    let (host, port) = match host_port.rsplit_once(':') {
        Some((host, port)) if port.chars().all(|c| c.is_ascii_digit()) => (host, Some(port)),
        _ => (host_port, None),
    };

    let host = match Host::parse(host) {
        Ok(Host::Domain(domain)) => domain,
        Ok(other) => other.to_string(),
        Err(_) => host.to_string(),
    };

    let mut out = String::with_capacity(netloc.len() + 8);
    if let Some(userinfo) = userinfo {
        out.push_str(userinfo);
        out.push('@');
    }
    out.push_str(&host);
    if let Some(port) = port {
        out.push(':');
        out.push_str(port);
    }
    out
}
