#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("failed to encode report: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no password given on the command line or stdin")]
    MissingPassword,
}
