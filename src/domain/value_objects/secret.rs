use regex::Regex;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::sync::OnceLock;

/// Opaque credential value.
///
/// `Debug` and `Display` never print the wrapped token, so a `Secret` can sit
/// inside configuration structs that end up in logs or error messages.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Wrap a raw token
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into().trim().to_string())
    }

    /// Access the raw token for building an `Authorization` header
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether no token was provided
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("Secret(<empty>)")
        } else {
            f.write_str("Secret(***)")
        }
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

impl<'de> Deserialize<'de> for Secret {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Secret::new(String::deserialize(deserializer)?))
    }
}

/// Replace every occurrence of the given secrets in `text` with `***`.
///
/// Upstream error bodies may echo request headers back; this runs before such a
/// body is stored in an error.
pub fn redact(text: &str, secrets: &[&Secret]) -> String {
    let mut redacted = text.to_string();
    for secret in secrets {
        if !secret.is_empty() {
            redacted = redacted.replace(secret.expose(), "***");
        }
    }
    redacted
}

/// Mask the userinfo part of every URL in `text` (`https://user:pw@host` becomes
/// `https://***@host`).
///
/// git echoes remote URLs in its stderr, credentials included.
pub fn redact_url_credentials(text: &str) -> String {
    static USERINFO: OnceLock<Regex> = OnceLock::new();
    let re = USERINFO.get_or_init(|| {
        Regex::new(r"(?P<scheme>[A-Za-z][A-Za-z0-9+.-]*://)[^/@\s]+@").expect("static regex is valid")
    });
    re.replace_all(text, "${scheme}***@").into_owned()
}
