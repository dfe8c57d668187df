//! Prism Core - scene graph, visitors and animation.
//!
//! This crate provides:
//!
//! - **Scene graph types**: `SceneGraph`, `NodeKind`, `Group`, `NodeId`
//! - **Visitor protocol**: `Visitor`, `TransformStack`, `traverse`, `survey`
//! - **Animation**: rotation, jumper, scaler and driver nodes
//! - **Configuration**: `PhongValues`
//! - **Shapes**: corner layouts of the built-in box and pyramid
//!
//! # Example
//!
//! ```ignore
//! use prism_core::{NodeKind, SceneGraph};
//! use prism_math::{Transformation, Vec3};
//!
//! let mut scene = SceneGraph::new();
//! let group = scene.add_group(scene.root(), Transformation::translation(Vec3::Z))?;
//! scene.add_child(group, NodeKind::sphere(Vec3::new(1.0, 0.0, 0.0)))?;
//! ```

pub mod animation;
pub mod config;
pub mod dump;
pub mod error;
pub mod scene;
pub mod shapes;
pub mod survey;
pub mod visitor;

// Re-export commonly used types
pub use animation::{simulate_all, AnimationNode, DriverNode, JumperNode, RotationNode, ScalerNode};
pub use config::PhongValues;
pub use dump::dump_scene;
pub use error::{SceneError, SceneResult};
pub use scene::{CustomShape, Group, Node, NodeId, NodeKind, SceneGraph, Texture, TextureShape};
pub use survey::{survey, SceneSurvey};
pub use visitor::{accept, traverse, walk_group, TransformStack, Visitor};
