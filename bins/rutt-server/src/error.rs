#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("{0}")]
    Engine(#[from] rutt_engine::EngineError),

    #[error("store: {0}")]
    Store(#[from] rutt_engine::StoreError),

    #[error("api: {0}")]
    Api(String),

    #[error("api task: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("signal: {0}")]
    Signal(#[from] std::io::Error),
}
