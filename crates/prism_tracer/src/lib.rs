//! Prism Tracer - CPU ray tracing and picking
//!
//! Casts one primary ray per pixel through the scene graph and shades the
//! closest hit with Phong. Buckets are traced in parallel with rayon. The same
//! intersection code answers mouse picks.

mod bucket;
mod error;
mod framebuffer;
mod intersection;
mod phong;
mod picking;
mod plane;
mod polygon;
mod ray_visitor;
mod sphere;

pub use bucket::{generate_buckets, render_bucket, Bucket, BucketResult, DEFAULT_BUCKET_SIZE};
pub use error::{RenderError, RenderResult};
pub use framebuffer::{color_to_rgba, ImageBuffer};
pub use intersection::{Intersect, Intersection};
pub use phong::{phong, LIGHT_COLOR};
pub use picking::{pick, pick_ray, MouseRayVisitor, PickSurface, RASTER_SURFACE_SIZE};
pub use plane::{has_consistent_winding, Plane};
pub use polygon::PolygonMesh;
pub use ray_visitor::{Hit, RayTracer, RayVisitor, RenderConfig, SceneView, UnitShapes};
pub use sphere::Sphere;
