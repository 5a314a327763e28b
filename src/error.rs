use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetgraphError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unknown component type: {0}")]
    UnknownType(String),

    #[error("Shape mismatch: graph needs {required} entities but batch holds {available}")]
    ShapeMismatch { required: usize, available: usize },

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, NetgraphError>;
