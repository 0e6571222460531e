use url::Url;

/// Resolve a configured locator against the site base URL. Absolute locators
/// are returned as-is; the empty locator names the base itself.
pub fn resolve_locator(base: &Url, locator: &str) -> Result<String, url::ParseError> {
    Ok(base.join(locator)?.to_string())
}
