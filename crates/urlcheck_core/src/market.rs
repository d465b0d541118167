/// Web storefront that `market://` links are rewritten onto.
pub const MARKET_WEB_PREFIX: &str = "http://play.google.com/store/apps/";

const MARKET_SCHEME_PREFIX: &str = "market://";

/// Rewrite a `market://` app-store link into the equivalent web URL.
///
/// Everything after `market://` is kept verbatim; any other URL is returned
/// unchanged.
pub fn fix_market_url(url: &str) -> String {
    match url.strip_prefix(MARKET_SCHEME_PREFIX) {
        Some(rest) => format!("{MARKET_WEB_PREFIX}{rest}"),
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::fix_market_url;

    #[test]
    fn market_scheme_is_rewritten() {
        assert_eq!(
            fix_market_url("market://apps-url"),
            "http://play.google.com/store/apps/apps-url"
        );
        assert_eq!(
            fix_market_url("market://details?id=com.example&ref=x"),
            "http://play.google.com/store/apps/details?id=com.example&ref=x"
        );
    }

    #[test]
    fn other_schemes_pass_through() {
        for url in [
            "http://apps-url",
            "https://market.example/market://x",
            "marketing://x",
            "",
        ] {
            assert_eq!(fix_market_url(url), url);
        }
    }
}
