/// Headers passed through to the application by default.
pub const FORWARDED_HEADERS: [(&str, &str); 4] = [
    ("Host", "$host"),
    ("X-Real-IP", "$remote_addr"),
    ("X-Forwarded-For", "$proxy_add_x_forwarded_for"),
    ("X-Forwarded-Proto", "$scheme"),
];

/// An Nginx site with a single `server` block forwarding `/` to an
/// application listening on the host's loopback interface.
///
/// # Example
///
/// ```
/// use dropship::ProxySite;
///
/// let site = ProxySite::new("app", 8000);
///
/// assert_eq!(site.listen, 80);
/// assert_eq!(site.server_name, "_");
/// assert_eq!(site.upstream, "http://127.0.0.1:8000");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxySite {
    pub name: String,
    pub listen: u16,
    pub server_name: String,
    pub upstream: String,
    pub headers: Vec<(String, String)>,
}

impl ProxySite {
    #[must_use]
    pub fn new(name: &str, app_port: u16) -> Self {
        Self {
            name: name.to_string(),
            listen: 80,
            server_name: "_".to_string(),
            upstream: format!("http://127.0.0.1:{app_port}"),
            headers: FORWARDED_HEADERS
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let site = ProxySite::new("app", 3000);

        assert_eq!(site.name, "app");
        assert_eq!(site.listen, 80);
        assert_eq!(site.server_name, "_");
        assert_eq!(site.upstream, "http://127.0.0.1:3000");
        assert_eq!(site.headers.len(), 4);
        assert_eq!(site.headers[0], ("Host".into(), "$host".into()));
    }
}
