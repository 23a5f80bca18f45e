//! Credentials read from the environment, never from the config file.

use std::fmt;

/// OKX API credentials.
#[derive(Clone)]
pub struct OkxCredentials {
    pub api_key: String,
    pub secret: String,
    pub passphrase: String,
}

impl fmt::Debug for OkxCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OkxCredentials")
            .field("api_key", &self.api_key)
            .field("secret", &"<redacted>")
            .field("passphrase", &"<redacted>")
            .finish()
    }
}

/// Every secret the run may need.
#[derive(Debug, Clone, Default)]
pub struct Secrets {
    pub okx: Option<OkxCredentials>,
    pub zerox_api_key: Option<String>,
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Secrets {
    /// Read `OKX_API_KEY`, `OKX_API_SECRET`, `OKX_API_PASSPHRASE` and
    /// `ZEROX_API_KEY`. OKX credentials count only when all three are set.
    #[must_use]
    pub fn from_env() -> Self {
        let okx = match (
            non_empty_var("OKX_API_KEY"),
            non_empty_var("OKX_API_SECRET"),
            non_empty_var("OKX_API_PASSPHRASE"),
        ) {
            (Some(api_key), Some(secret), Some(passphrase)) => Some(OkxCredentials {
                api_key,
                secret,
                passphrase,
            }),
            _ => None,
        };

        Self {
            okx,
            zerox_api_key: non_empty_var("ZEROX_API_KEY"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_secret_parts() {
        let creds = OkxCredentials {
            api_key: "key".into(),
            secret: "s3cret".into(),
            passphrase: "pass".into(),
        };
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("key"));
        assert!(!rendered.contains("s3cret"));
        assert!(!rendered.contains("pass\""));
    }
}
