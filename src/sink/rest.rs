use super::ServiceSink;
use crate::{config::Config, process::ServiceRecord};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

/// Inserts batches through the backend's PostgREST endpoint (`/rest/v1/<table>`).
///
/// Row ownership and visibility are enforced server-side from the bearer token.
#[derive(Debug, Clone)]
pub struct RestSink {
    client: Client,
    endpoint: Url,
    api_key: String,
    access_token: Option<String>,
}

impl RestSink {
    pub fn new(
        client: Client,
        base_url: &str,
        table: &str,
        api_key: impl Into<String>,
        access_token: Option<String>,
    ) -> Result<Self> {
        let endpoint = rest_url(base_url, &format!("rest/v1/{}", table))?;
        Ok(Self {
            client,
            endpoint,
            api_key: api_key.into(),
            access_token,
        })
    }

    pub fn from_config(client: Client, config: &Config) -> Result<Self> {
        let (base_url, api_key) = config.rest_credentials()?;
        Self::new(
            client,
            base_url,
            &config.table,
            api_key,
            config.access_token.clone(),
        )
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

/// Join `path` onto `base_url`, keeping any path the base already has.
pub(crate) fn rest_url(base_url: &str, path: &str) -> Result<Url> {
    let mut base = base_url.trim().to_string();
    if !base.ends_with('/') {
        base.push('/');
    }
    let base = Url::parse(&base).with_context(|| format!("invalid base url `{}`", base_url))?;
    base.join(path)
        .with_context(|| format!("joining `{}` onto `{}`", path, base))
}

#[async_trait]
impl ServiceSink for RestSink {
    async fn insert_batch(&self, records: &[ServiceRecord]) -> Result<()> {
        // without a user session the anon key doubles as bearer token
        let token = self.access_token.as_deref().unwrap_or(&self.api_key);

        let resp = self
            .client
            .post(self.endpoint.clone())
            .header("apikey", &self.api_key)
            .header("Prefer", "return=minimal")
            .bearer_auth(token)
            .json(records)
            .send()
            .await
            .with_context(|| format!("sending {} rows to {}", records.len(), self.endpoint))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!("insert rejected ({}): {}", status, body);
        }
        debug!(rows = records.len(), %status, "batch inserted");
        Ok(())
    }
}
