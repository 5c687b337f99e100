// src/identity.rs
use crate::{config::Config, sink::rest::rest_url};
use anyhow::{bail, Context, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, warn};

/// The authenticated user every imported service is attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
}

impl Identity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

#[derive(Deserialize)]
struct AuthUser {
    id: String,
}

/// Work out who is importing.
///
/// A configured `user_id` wins. Otherwise the access token is exchanged for the
/// user at `/auth/v1/user`. `Ok(None)` means nobody is logged in.
pub async fn resolve_identity(client: &Client, config: &Config) -> Result<Option<Identity>> {
    if let Some(id) = config.user_id.as_deref() {
        return Ok(Some(Identity::new(id)));
    }
    let Some(token) = config.access_token.as_deref() else {
        warn!("no user id or access token configured");
        return Ok(None);
    };
    let (base_url, api_key) = config.rest_credentials()?;
    fetch_user(client, base_url, api_key, token).await
}

/// Ask the auth service who owns `token`. Client errors (expired or invalid token) yield `None`.
pub async fn fetch_user(
    client: &Client,
    base_url: &str,
    api_key: &str,
    token: &str,
) -> Result<Option<Identity>> {
    let url = rest_url(base_url, "auth/v1/user")?;
    let resp = client
        .get(url.clone())
        .header("apikey", api_key)
        .bearer_auth(token)
        .send()
        .await
        .with_context(|| format!("requesting {}", url))?;

    let status = resp.status();
    if status.is_client_error() {
        warn!(%status, "access token rejected");
        return Ok(None);
    }
    if !status.is_success() {
        bail!("auth service answered {}", status);
    }

    let user: AuthUser = resp.json().await.context("decoding auth user")?;
    info!(user_id = %user.id, "authenticated");
    Ok(Some(Identity::new(user.id)))
}
