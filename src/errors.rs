//! Errors for the tide publisher
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TidePublisherError {
    #[error("MQTT connection failed")]
    MqttConnectionError(#[from] rumqttc::ConnectionError),

    #[error("MQTT client error")]
    MqttClientError(#[from] rumqttc::ClientError),

    #[error("Serialization error")]
    SerdeError(#[from] serde_json::Error),

    #[error("Configuration error")]
    ConfigError(#[from] config::ConfigError),

    #[error("HTTP request failed")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Tide table not found: {0}")]
    TableNotFound(String),

    #[error("Malformed table row: {0}")]
    MalformedRow(String),

    #[error("Invalid tide height: {0}")]
    InvalidHeight(String),
}
