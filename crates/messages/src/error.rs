use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum MessagesError {
    #[error("Failed to read messages file {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML in {origin}")]
    Yaml {
        origin: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid JSON in {origin}")]
    Json {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unsupported messages file format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("Invalid messages layout: {0}")]
    InvalidShape(String),

    #[error("Invalid value for {name}: {reason}")]
    InvalidEnv { name: &'static str, reason: String },
}
