//! Shared-secret gate for the gateway and push-channel handshake.

use axum::http::HeaderMap;

/// Header carrying the shared secret.
pub const TOKEN_HEADER: &str = "x-app-token";

/// Optional shared-secret check.
///
/// With no secret configured every request passes (open access). With a
/// secret configured, a missing or mismatched credential fails.
#[derive(Debug, Clone, Default)]
pub struct TokenGate {
    token: Option<String>,
}

impl TokenGate {
    /// Build from configuration; an empty string disables the gate, same as
    /// an unset value.
    pub fn new(token: Option<String>) -> Self {
        let token = token.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
        Self { token }
    }

    pub fn enabled(&self) -> bool {
        self.token.is_some()
    }

    /// Check a presented credential.
    pub fn check(&self, presented: Option<&str>) -> bool {
        match &self.token {
            None => true,
            Some(expected) => presented.map(str::trim) == Some(expected.as_str()),
        }
    }

    /// Check the `X-App-Token` request header.
    pub fn check_headers(&self, headers: &HeaderMap) -> bool {
        let presented = headers.get(TOKEN_HEADER).and_then(|v| v.to_str().ok());
        self.check(presented)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_access_without_secret() {
        let gate = TokenGate::new(None);
        assert!(!gate.enabled());
        assert!(gate.check(None));
        assert!(gate.check(Some("anything")));

        let empty = TokenGate::new(Some("  ".to_string()));
        assert!(!empty.enabled());
        assert!(empty.check(None));
    }

    #[test]
    fn test_configured_secret_must_match() {
        let gate = TokenGate::new(Some("s3cret".to_string()));
        assert!(gate.enabled());
        assert!(gate.check(Some("s3cret")));
        assert!(gate.check(Some(" s3cret ")));
        assert!(!gate.check(Some("wrong")));
        assert!(!gate.check(None));
    }
}
