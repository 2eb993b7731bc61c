use serde::Serialize;
use thiserror::Error;

const TRANSPORT_DETAIL_LIMIT: usize = 350;
const DIAGNOSTIC_DETAIL_LIMIT: usize = 180;

/// Failure reported by the JSON transport for a single upstream call.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("upstream error ({status}) on {endpoint}")]
pub struct TransportError {
    pub status: u16,
    pub endpoint: String,
    pub detail: String,
}

impl TransportError {
    pub fn new(status: u16, endpoint: &str, detail: impl Into<String>) -> Self {
        TransportError {
            status,
            endpoint: endpoint.to_string(),
            detail: truncate(&detail.into(), TRANSPORT_DETAIL_LIMIT),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Player not found: {0}")]
    PlayerNotFound(String),

    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("Ranking service returned no cohort rows for this champion")]
    EmptyCohort,

    #[error("Ranking service returned no build details for player {0}")]
    EmptyBuild(String),

    #[error("Reference catalog unavailable: {0}")]
    CatalogUnavailable(String),

    #[error("Missing cohort player key")]
    MissingPlayerKey,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("JSON parsing error on {endpoint}: {detail}")]
    JsonError { endpoint: String, detail: String },
}

impl AppError {
    pub fn json(endpoint: &str, err: serde_json::Error) -> Self {
        AppError::JsonError {
            endpoint: endpoint.to_string(),
            detail: err.to_string(),
        }
    }

    /// Upstream status to report in diagnostics; 0 when the failure was not an HTTP one.
    pub fn status(&self) -> u16 {
        match self {
            AppError::Transport(e) => e.status,
            _ => 0,
        }
    }
}

/// One upstream call that degraded instead of aborting the request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub endpoint: String,
    pub status: u16,
    pub detail: String,
}

#[derive(Debug, Default, Clone, Serialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics::default()
    }

    pub fn record(&mut self, endpoint: &str, status: u16, detail: &str) {
        tracing::warn!(endpoint, status, "upstream call degraded");
        self.0.push(Diagnostic {
            endpoint: endpoint.to_string(),
            status,
            detail: truncate(detail, DIAGNOSTIC_DETAIL_LIMIT),
        });
    }

    pub fn record_transport(&mut self, err: &TransportError) {
        self.record(&err.endpoint, err.status, &err.detail);
    }

    /// Transport failures keep their own endpoint; anything else is filed under `endpoint`.
    pub fn record_error(&mut self, endpoint: &str, err: &AppError) {
        match err {
            AppError::Transport(t) => self.record_transport(t),
            other => self.record(endpoint, other.status(), &other.to_string()),
        }
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.0
    }
}

/// Cut `text` to at most `limit` characters without splitting a code point.
pub fn truncate(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_detail_is_truncated() {
        let err = TransportError::new(500, "match_detail", "x".repeat(1000));
        assert_eq!(err.detail.len(), TRANSPORT_DETAIL_LIMIT);
    }

    #[test]
    fn diagnostics_keep_status_and_short_detail() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.record("match_ids", 503, &"é".repeat(400));

        let entry = &diagnostics.entries()[0];
        assert_eq!(entry.status, 503);
        assert_eq!(entry.detail.chars().count(), DIAGNOSTIC_DETAIL_LIMIT);
    }

    #[test]
    fn non_transport_errors_report_status_zero() {
        assert_eq!(AppError::EmptyCohort.status(), 0);
        let err: AppError = TransportError::new(404, "account_by_riot_id", "").into();
        assert_eq!(err.status(), 404);
    }

    #[test]
    fn recorded_errors_keep_transport_endpoint() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.record_error("match_ids", &TransportError::new(429, "match_timeline", "slow down").into());
        diagnostics.record_error("match_ids", &AppError::json("match_ids", serde_json::from_str::<u8>("x").unwrap_err()));

        assert_eq!(diagnostics.entries()[0].endpoint, "match_timeline");
        assert_eq!(diagnostics.entries()[0].status, 429);
        assert_eq!(diagnostics.entries()[1].endpoint, "match_ids");
        assert_eq!(diagnostics.entries()[1].status, 0);
    }
}
