//! Delegated identity support.
//!
//! The wire protocol of the handshake lives outside this crate; the gateway
//! canonicalizes the submitted identifier into the stable identity URL the
//! provider asserts, and exposes whatever profile claims came with it.

use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("identifier is not a valid identity URL")]
    Identifier(#[from] url::ParseError),

    #[error("identity URL is outside the trusted roots")]
    UntrustedRoot,
}

/// Outcome of a completed handshake.
#[derive(Clone, Debug, PartialEq)]
pub struct Assertion {
    /// Stable external identifier, join key to local user records.
    pub identity_url: String,
    /// Display name claim, when the provider supplies one.
    pub name: Option<String>,
    /// Email claim, when the provider supplies one.
    pub email: Option<String>,
}

/// Identity gateway manager.
#[derive(Clone, Debug, Default)]
pub struct Gateway {
    safe_roots: Vec<String>,
}

impl Gateway {
    /// Create a new [`Gateway`].
    ///
    /// An empty `safe_roots` list accepts any identity URL.
    pub fn new(safe_roots: Vec<String>) -> Self {
        Self { safe_roots }
    }

    /// Complete the handshake for `identifier`.
    ///
    /// Canonicalization matches provider-side identifier rules: a missing
    /// scheme defaults to `https`, then the URL is parsed and re-serialized.
    pub fn assert(&self, identifier: &str) -> Result<Assertion, IdentityError> {
        let identifier = identifier.trim();
        let with_scheme = if identifier.starts_with("http://")
            || identifier.starts_with("https://")
        {
            identifier.to_string()
        } else {
            format!("https://{identifier}")
        };

        let identity_url = Url::parse(&with_scheme)?.to_string();

        if !self.safe_roots.is_empty()
            && !self.safe_roots.iter().any(|root| identity_url.starts_with(root))
        {
            return Err(IdentityError::UntrustedRoot);
        }

        Ok(Assertion {
            identity_url,
            name: None,
            email: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assert_defaults_scheme() {
        let assertion = Gateway::default().assert("alice.example.com").unwrap();
        assert_eq!(assertion.identity_url, "https://alice.example.com/");
        assert_eq!(assertion.name, None);
        assert_eq!(assertion.email, None);
    }

    #[test]
    fn test_assert_keeps_explicit_scheme() {
        let assertion =
            Gateway::default().assert("http://bob.example.com/id").unwrap();
        assert_eq!(assertion.identity_url, "http://bob.example.com/id");
    }

    #[test]
    fn test_assert_canonicalizes() {
        // Same identity whether or not the trailing slash is typed.
        let short = Gateway::default().assert("alice.example.com").unwrap();
        let slash = Gateway::default().assert("alice.example.com/").unwrap();
        assert_eq!(short.identity_url, slash.identity_url);
    }

    #[test]
    fn test_assert_rejects_garbage() {
        assert!(Gateway::default().assert("not a url").is_err());
    }

    #[test]
    fn test_assert_enforces_safe_roots() {
        let gateway = Gateway::new(vec!["https://id.example.com/".to_owned()]);

        assert!(gateway.assert("id.example.com/alice").is_ok());
        assert!(matches!(
            gateway.assert("elsewhere.example.org/alice"),
            Err(IdentityError::UntrustedRoot)
        ));
    }
}
