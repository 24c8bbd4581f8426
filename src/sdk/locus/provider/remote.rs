use super::types::{GeocodeReply, LocusRequest};
use crate::sdk::config::ServiceConfig;
use crate::sdk::locus::constraint::Constraint;
use crate::sdk::locus::error::{ErrorPayload, LocusError};
use crate::sdk::locus::result::LocusResponse;
use crate::sdk::locus::service::LocusService;
use crate::sdk::locus::suggest::SuggestionCandidate;
use crate::sdk::util::rate_limit::{geocode_limiter, Limiter};
use reqwest::{Client, Response};

/// HTTP client for the locus service (`POST /locus`, `GET /geocode`).
pub struct RemoteLocusService {
    client: Client,
    base_url: String,
    limiter: Limiter,
}

impl RemoteLocusService {
    pub fn new(config: &ServiceConfig) -> Result<Self, LocusError> {
        Ok(Self {
            client: Client::builder().timeout(config.timeout).build()?,
            base_url: config.base_url.clone(),
            limiter: geocode_limiter(config.geocode_per_second),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Reads the body of a reply, turning non-success statuses into errors.
async fn read_body(response: Response, url: &str) -> Result<String, LocusError> {
    let status = response.status();
    let text = response.text().await?;
    if status.is_success() {
        return Ok(text);
    }
    // Try to parse the structured error first
    if let Ok(payload) = serde_json::from_str::<ErrorPayload>(&text) {
        return Err(payload.into());
    }
    log::error!(
        "API returned non-success status: {}. URL: {}\nUnparseable Body: {}",
        status,
        url,
        text
    );
    Err(LocusError::RawApiError(format!("{}: {}", status, text)))
}

impl LocusService for RemoteLocusService {
    async fn compute_locus(&self, constraints: &[Constraint]) -> Result<LocusResponse, LocusError> {
        let url = format!("{}/locus", self.base_url);
        let body = LocusRequest::new(constraints);
        log::debug!(
            "[PROVIDER] Requesting locus for {} constraint(s)",
            constraints.len()
        );

        let response = match self.client.post(&url).json(&body).send().await {
            Ok(resp) => resp,
            Err(e) => {
                log::error!(
                    "Failed to send POST request. URL: {}\nBody: {}\nError: {}",
                    url,
                    serde_json::to_string_pretty(&body).unwrap_or_default(),
                    e
                );
                return Err(e.into());
            }
        };

        let text = read_body(response, &url).await?;
        let locus: LocusResponse = serde_json::from_str(&text).map_err(|e| {
            log::error!(
                "Failed to parse LocusResponse. URL: {}\nError: {}. Body: {}",
                url,
                e,
                text
            );
            e
        })?;
        Ok(locus)
    }

    async fn geocode(&self, query: &str) -> Result<Vec<SuggestionCandidate>, LocusError> {
        log::debug!("Waiting for geocode limiter before looking up \"{}\"", query);
        self.limiter.until_ready().await;

        let url = format!("{}/geocode", self.base_url);
        let response = self.client.get(&url).query(&[("q", query)]).send().await?;
        let text = read_body(response, &url).await?;

        match serde_json::from_str::<GeocodeReply>(&text)? {
            GeocodeReply::Candidates(candidates) => Ok(candidates),
            GeocodeReply::Error(payload) => Err(payload.into()),
        }
    }
}
