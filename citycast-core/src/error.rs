use reqwest::StatusCode;

/// Failures raised by a [`crate::WeatherProvider`].
///
/// These never reach the view: [`crate::WeatherClient`] logs them and turns
/// them into absent data.
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} responded with status {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("failed to parse {endpoint} response: {source}")]
    Parse {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Failures of a single-shot position request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    #[error("geolocation is not supported")]
    Unsupported,
    #[error("location unavailable: {0}")]
    Unavailable(String),
}
