//! Session ownership for the storefront token.
//! - `AuthSession` is created once at startup and reads the credentials file once
//! - Components receive an `AuthContext` handle instead of reading storage themselves
//! - `teardown` (logout) clears memory and the persisted file
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::User;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
}

/// Shared, read-mostly view of the current credentials.
#[derive(Clone, Debug, Default)]
pub struct AuthContext {
    inner: Arc<RwLock<Credentials>>,
}

impl AuthContext {
    /// Context with no token, for tests and anonymous browsing.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let ctx = Self::default();
        ctx.replace(Credentials {
            token: Some(token.into()),
            user: None,
            saved_at: None,
        });
        ctx
    }

    pub fn snapshot(&self) -> Credentials {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(_) => Credentials::default(),
        }
    }

    pub fn token(&self) -> Option<String> {
        self.snapshot().token.filter(|t| !t.is_empty())
    }

    pub fn user(&self) -> Option<User> {
        self.snapshot().user
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.user().is_some_and(|u| u.is_admin)
    }

    /// Attach `Authorization: Bearer` when a token is present.
    pub fn attach(&self, rb: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.token() {
            Some(tk) => rb.bearer_auth(tk),
            None => rb,
        }
    }

    fn replace(&self, creds: Credentials) {
        if let Ok(mut guard) = self.inner.write() {
            *guard = creds;
        }
    }
}

/// Process-wide owner of the persisted credentials.
#[derive(Debug)]
pub struct AuthSession {
    path: PathBuf,
    ctx: AuthContext,
}

impl AuthSession {
    /// Read persisted credentials once. A missing, unreadable or malformed
    /// file starts an anonymous session; only the last two are logged.
    pub fn init(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let ctx = AuthContext::default();
        match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<Credentials>(&raw) {
                Ok(creds) => {
                    log::info!(
                        "[auth] session restored (user={})",
                        creds.user.as_ref().map(|u| u.name.as_str()).unwrap_or("-")
                    );
                    ctx.replace(creds);
                }
                Err(e) => log::warn!("[auth] ignoring malformed credentials file: {e}"),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("[auth] no credentials at {}", path.display());
            }
            Err(e) => log::warn!("[auth] cannot read {}, continuing signed out: {e}", path.display()),
        }
        Self { path, ctx }
    }

    pub fn context(&self) -> AuthContext {
        self.ctx.clone()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Store a token (and user, if the backend returned one) and persist it.
    pub fn login(&self, token: String, user: Option<User>) -> Result<()> {
        let creds = Credentials {
            token: Some(token),
            user,
            saved_at: Some(Utc::now()),
        };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
        }
        let body = serde_json::to_string_pretty(&creds)?;
        std::fs::write(&self.path, body)
            .with_context(|| format!("writing credentials to {}", self.path.display()))?;
        self.ctx.replace(creds);
        log::info!("[auth] token stored");
        Ok(())
    }

    /// Logout: forget the token everywhere it was handed out.
    pub fn teardown(&self) -> Result<()> {
        self.ctx.replace(Credentials::default());
        if self.path.exists() {
            std::fs::remove_file(&self.path)
                .with_context(|| format!("removing {}", self.path.display()))?;
        }
        log::info!("[auth] token cleared");
        Ok(())
    }
}

/// Pull a token out of an auth callback query string (`token=...&...`).
pub fn token_from_callback_query(qs: &str) -> Option<String> {
    for kv in qs.trim_start_matches('?').split('&') {
        let mut it = kv.splitn(2, '=');
        let k = it.next().unwrap_or_default().trim().to_ascii_lowercase();
        let v = it.next().unwrap_or_default();
        if k == "token" && !v.is_empty() {
            let v = urlencoding::decode(v)
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| v.to_string());
            return Some(v);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callback_query_extracts_decoded_token() {
        assert_eq!(
            token_from_callback_query("?foo=1&token=abc%7C123"),
            Some("abc|123".to_string())
        );
        assert_eq!(token_from_callback_query("code=xyz"), None);
        assert_eq!(token_from_callback_query("token="), None);
    }

    #[test]
    fn anonymous_context_has_no_token() {
        let ctx = AuthContext::anonymous();
        assert!(!ctx.is_authenticated());
        assert!(!ctx.is_admin());
        assert!(AuthContext::with_token("t").is_authenticated());
    }
}
