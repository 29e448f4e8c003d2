use std::collections::BTreeSet;

/// Default public app-metadata lookup endpoint used for review counts.
pub const DEFAULT_LOOKUP_URL: &str = "https://itunes.apple.com/lookup";

/// Static configuration supplied by the embedding application.
#[derive(Debug, Clone)]
pub struct PatronConfig {
    /// Product identifiers offered as patronage tiers. Each identifier is
    /// expected to end with a dot-separated month count, e.g.
    /// `com.example.patronage.3`.
    pub product_identifiers: BTreeSet<String>,
    /// Store identifier of the app, required for the review-count lookup.
    pub app_id: Option<String>,
    /// Base URL of the review-count lookup endpoint.
    pub lookup_url: String,
}

impl PatronConfig {
    /// Build a configuration for the given patronage product identifiers.
    pub fn new<I, S>(product_identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            product_identifiers: product_identifiers
                .into_iter()
                .map(|id| id.into())
                .collect(),
            app_id: None,
            lookup_url: DEFAULT_LOOKUP_URL.to_string(),
        }
    }

    /// Attach the app identifier used for review-count lookups.
    pub fn with_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = Some(app_id.into());
        self
    }

    /// Override the lookup endpoint, mainly useful in tests.
    pub fn with_lookup_url(mut self, url: impl Into<String>) -> Self {
        self.lookup_url = url.into();
        self
    }
}
