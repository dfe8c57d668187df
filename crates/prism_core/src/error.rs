use thiserror::Error;

use crate::scene::NodeId;

/// Errors from scene graph edits.
#[derive(Error, Debug, PartialEq)]
pub enum SceneError {
    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("Node {0} is not a group")]
    NotAGroup(NodeId),

    #[error("Node {0} is not a camera")]
    NotACamera(NodeId),

    #[error("Node {0} has no texture")]
    NotTextured(NodeId),

    #[error("Failed to serialize scene: {0}")]
    Serialize(String),
}

pub type SceneResult<T> = Result<T, SceneError>;
