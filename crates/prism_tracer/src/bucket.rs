//! Tiled tracing.
//!
//! The frame is cut into square buckets that are traced independently, so
//! rayon can hand them to any worker. Buckets are ordered centre-out.

use prism_core::{PhongValues, SceneGraph};

use crate::ray_visitor::{RayTracer, SceneView};

/// Default bucket edge in pixels.
pub const DEFAULT_BUCKET_SIZE: u32 = 32;

/// A rectangle of the frame. Edge buckets may be smaller than the bucket size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Position in render order
    pub index: usize,
}

impl Bucket {
    pub fn new(x: u32, y: u32, width: u32, height: u32, index: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
            index,
        }
    }

    pub fn pixel_count(&self) -> u32 {
        self.width * self.height
    }

    /// Frame coordinates of every pixel, row by row.
    pub fn pixels(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        (self.y..self.y + self.height).flat_map(move |y| (self.x..self.x + self.width).map(move |x| (x, y)))
    }

    /// Squared distance between the bucket centre and the frame centre, in
    /// half pixels so it stays integral.
    fn centre_distance(&self, width: u32, height: u32) -> u64 {
        let dx = (2 * self.x + self.width) as i64 - width as i64;
        let dy = (2 * self.y + self.height) as i64 - height as i64;
        (dx * dx + dy * dy) as u64
    }
}

/// Cut a `width` x `height` frame into buckets, nearest to the centre first.
pub fn generate_buckets(width: u32, height: u32, bucket_size: u32) -> Vec<Bucket> {
    let size = bucket_size.max(1);
    let mut buckets: Vec<Bucket> = (0..height)
        .step_by(size as usize)
        .flat_map(|y| {
            (0..width).step_by(size as usize).map(move |x| {
                Bucket::new(x, y, size.min(width - x), size.min(height - y), 0)
            })
        })
        .collect();

    // stable, so equidistant buckets keep scanline order
    buckets.sort_by_key(|bucket| bucket.centre_distance(width, height));
    for (index, bucket) in buckets.iter_mut().enumerate() {
        bucket.index = index;
    }
    buckets
}

/// Pixels traced for one bucket.
#[derive(Debug, Clone)]
pub struct BucketResult {
    pub bucket: Bucket,
    /// RGBA, row-major within the bucket
    pub pixels: Vec<[u8; 4]>,
}

impl BucketResult {
    pub fn new(bucket: Bucket, pixels: Vec<[u8; 4]>) -> Self {
        Self { bucket, pixels }
    }
}

/// Trace and shade every pixel of `bucket`.
pub fn render_bucket(
    tracer: &RayTracer,
    bucket: &Bucket,
    graph: &SceneGraph,
    view: &SceneView,
    phong: &PhongValues,
) -> BucketResult {
    let pixels = bucket
        .pixels()
        .map(|(x, y)| tracer.shade_pixel(graph, view, phong, x, y))
        .collect();
    BucketResult::new(*bucket, pixels)
}
