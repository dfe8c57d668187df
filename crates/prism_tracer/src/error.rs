use prism_core::SceneError;
use thiserror::Error;

/// Errors from rendering and picking.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("No active camera in scene")]
    NoActiveCamera,

    #[error("Failed to write image: {0}")]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Scene(#[from] SceneError),
}

pub type RenderResult<T> = Result<T, RenderError>;
