#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("config ({context}): {detail}")]
    Config { context: &'static str, detail: String },

    #[error("source: {0}")]
    Source(String),

    #[error("api: {0}")]
    Api(String),

    #[error("{0}")]
    Table(#[from] table_engine::TableError),

    #[error("output: {0}")]
    Output(#[from] serde_json::Error),

    #[error("signal: {0}")]
    Signal(#[from] std::io::Error),
}
