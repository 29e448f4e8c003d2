//! Review-count lookup against the public app-metadata endpoint.

use serde::Deserialize;

use crate::services::ServiceResult;

/// External review-count lookup, injectable so coordinator tests need no
/// network.
pub trait ReviewLookup {
    /// Fetch the current-version rating count for `app_id`.
    fn review_count(&self, lookup_url: &str, app_id: &str) -> ServiceResult<u64>;
}

/// Production lookup client issuing a blocking HTTP GET.
#[derive(Debug, Default)]
pub struct HttpReviewClient {
    http: reqwest::blocking::Client,
}

impl HttpReviewClient {
    /// Build a client with default transport settings.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReviewLookup for HttpReviewClient {
    fn review_count(&self, lookup_url: &str, app_id: &str) -> ServiceResult<u64> {
        let response = self
            .http
            .get(lookup_url)
            .query(&[("id", app_id)])
            .send()?
            .error_for_status()?;
        let body = response.text()?;

        Ok(parse_review_count(&body))
    }
}

/// Extract `results[0].userRatingCountForCurrentVersion` from a lookup
/// response body. Any parse or shape failure is logged and yields zero,
/// indistinguishable from an app with no reviews.
pub fn parse_review_count(body: &str) -> u64 {
    let response: LookupResponse = match serde_json::from_str(body) {
        Ok(response) => response,
        Err(err) => {
            log::warn!("Failed to deserialize review lookup response: {err}");
            return 0;
        }
    };

    let Some(entry) = response.results.first() else {
        log::warn!("Review lookup response contains no results");
        return 0;
    };

    match entry.user_rating_count_for_current_version {
        Some(count) => count,
        None => {
            log::warn!("Review lookup result carries no current-version rating count");
            0
        }
    }
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    results: Vec<LookupEntry>,
}

#[derive(Debug, Deserialize)]
struct LookupEntry {
    #[serde(rename = "userRatingCountForCurrentVersion")]
    user_rating_count_for_current_version: Option<u64>,
}
