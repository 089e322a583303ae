use quest_graph::{GraphError, QuestAssetId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuestError {
    #[error("config not found: {0}")]
    ConfigNotFound(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("unknown quest asset: {0}")]
    UnknownAsset(QuestAssetId),
}

pub type Result<T> = std::result::Result<T, QuestError>;
