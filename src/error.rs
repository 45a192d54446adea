use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("`{0}` is not a #rgb or #rrggbb color")]
    InvalidColor(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
    #[error("link {source_id} -> {target_id} references unknown node `{missing}`")]
    UnknownNode {
        source_id: String,
        target_id: String,
        missing: String,
    },
    #[error("simulation was created with {actual} bodies for {expected} nodes")]
    BodyCountMismatch { expected: usize, actual: usize },
}
