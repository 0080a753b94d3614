#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Request to {url} failed")]
    Http { url: String, details: String },
    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("Unexpected response body from {url}")]
    Decode { url: String, details: String },
    #[error("Missing configuration value {key}")]
    MissingConfig { key: String },
    #[error("Configuration parse error")]
    ConfigRon {
        path: Option<String>,
        #[source]
        source: ron::error::SpannedError,
    },
    #[error("Configuration read error")]
    ConfigIo {
        path: Option<String>,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn user_summary(&self) -> String {
        match self {
            Error::Http { url, .. } => format!("Could not reach {url}."),
            Error::Status { status, .. } => format!("Server list request failed (HTTP {status})."),
            Error::Decode { .. } => "Server list response was not understood.".to_string(),
            Error::MissingConfig { key } => format!("Set {key} before starting."),
            Error::ConfigRon { .. } => "Failed to parse configuration file.".to_string(),
            Error::ConfigIo { .. } => "Failed to read configuration file.".to_string(),
        }
    }

    pub fn technical_detail(&self) -> String {
        match self {
            Error::Http { url, details } => format!("HTTP transport failure for {url}: {details}"),
            Error::Status { url, status } => format!("Non-success status {status} from {url}."),
            Error::Decode { url, details } => format!("JSON decode failure for {url}: {details}"),
            Error::MissingConfig { key } => format!("Configuration key {key} is not set."),
            Error::ConfigRon { path, source } => {
                let path = path
                    .as_ref()
                    .map(|value| format!(" path={value}."))
                    .unwrap_or_default();
                format!("RON load error.{path} {source}")
            }
            Error::ConfigIo { path, source } => {
                let path = path
                    .as_ref()
                    .map(|value| format!(" path={value}."))
                    .unwrap_or_default();
                format!("Config load error.{path} {source}")
            }
        }
    }
}
