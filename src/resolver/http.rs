//! HTTP resolver
//!
//! Form-encoded POSTs against the signup endpoints, JSON responses.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use super::{normalize_aircraft, normalize_bases, Aircraft, Base, Mode, Resolver, ResolverError};
use crate::config::SignupConfig;
use crate::context::CampaignContext;

#[derive(Debug, Deserialize)]
struct BasesResponse {
    bases: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct AircraftResponse {
    aircraft: Vec<Aircraft>,
}

/// Resolver backed by the signup web endpoints
pub struct HttpResolver {
    client: Client,
    base_url: String,
    bases_path: String,
    aircraft_path: String,
    context: Arc<CampaignContext>,
}

impl HttpResolver {
    pub fn new(config: &SignupConfig, context: Arc<CampaignContext>) -> Self {
        Self {
            client: Client::builder()
                .user_agent(config.user_agent.clone())
                .build()
                .unwrap_or_default(),
            base_url: config.resolver_url.clone(),
            bases_path: config.bases_path.clone(),
            aircraft_path: config.aircraft_path.clone(),
            context,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, &str)],
    ) -> Result<T, ResolverError> {
        let url = self.endpoint(path);
        debug!("POST {} {:?}", url, form);

        let response = self
            .client
            .post(&url)
            .form(form)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ResolverError::NetworkFailure(e.to_string()))?;

        response.json::<T>().await.map_err(|e| {
            if e.is_decode() {
                ResolverError::MalformedResponse(format!("{}: {}", path, e))
            } else {
                ResolverError::NetworkFailure(e.to_string())
            }
        })
    }
}

#[async_trait]
impl Resolver for HttpResolver {
    async fn resolve_bases(
        &self,
        squadron: &str,
        persistent: bool,
        campaign_id: &str,
    ) -> Result<Vec<Base>, ResolverError> {
        if squadron.is_empty() {
            return Err(ResolverError::MissingSquadron);
        }
        let form = [
            ("squadron", squadron),
            ("persistent", if persistent { "1" } else { "0" }),
            ("campaign_id", campaign_id),
        ];
        let body: BasesResponse = self.post_form(&self.bases_path, &form).await?;
        Ok(normalize_bases(&body.bases, self.context.bases()))
    }

    async fn resolve_aircraft(
        &self,
        squadron: &str,
        base: Option<&str>,
        campaign_id: &str,
        mode: Mode,
    ) -> Result<Vec<Aircraft>, ResolverError> {
        if squadron.is_empty() {
            return Err(ResolverError::MissingSquadron);
        }
        let mut form = vec![("squadron", squadron)];
        if mode == Mode::Lead {
            form.push(("base", base.unwrap_or("")));
        }
        form.push(("campaign_id", campaign_id));
        form.push(("mode", mode.as_str()));

        let body: AircraftResponse = self.post_form(&self.aircraft_path, &form).await?;
        normalize_aircraft(body.aircraft, self.context.bases())
    }
}
