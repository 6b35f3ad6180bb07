/// Ошибки data-access слоя.
///
/// До filtering core не доходят: [`crate::AdminClient::fetch_all`]
/// логирует их и подставляет пустой список.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request {endpoint}: {detail}")]
    Request { endpoint: String, detail: String },

    #[error("API error {status} on {endpoint}")]
    Status { endpoint: String, status: u16, body: String },

    #[error("invalid JSON from {endpoint}: {detail}")]
    Decode { endpoint: String, detail: String },

    #[error("interaction window of {days} days is out of range 1..={max}")]
    Window { days: i64, max: i64 },
}
