use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("Invalid color gradient: {0}")]
    InvalidGradient(String),

    #[error("Invalid marker radius scale: base {base}, cap {cap}")]
    InvalidRadiusScale { base: f64, cap: f64 },

    #[error("Invalid date range: {0}")]
    InvalidRange(String),

    // Transport failures and non-success HTTP statuses
    #[error("Request to '{endpoint}' failed: {reason}")]
    NetworkFailure { endpoint: String, reason: String },

    #[error("Request was superseded by a newer one")]
    Cancelled,

    #[error("Unexpected response from '{endpoint}': {reason}")]
    MalformedResponse { endpoint: String, reason: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error for file '{0}': {1}")]
    FileIO(String, #[source] std::io::Error),

    #[error("Failed to parse YAML from '{0}': {1}")]
    YamlParsing(String, #[source] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("Failed to write CSV file '{0}': {1}")]
    CsvError(String, #[source] csv::Error),
}

impl DashboardError {
    /// Superseded requests are not failures and are never shown to the user.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DashboardError::Cancelled)
    }

    pub fn network(endpoint: &str, reason: impl ToString) -> Self {
        DashboardError::NetworkFailure {
            endpoint: endpoint.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn malformed(endpoint: &str, reason: impl ToString) -> Self {
        DashboardError::MalformedResponse {
            endpoint: endpoint.to_string(),
            reason: reason.to_string(),
        }
    }
}
