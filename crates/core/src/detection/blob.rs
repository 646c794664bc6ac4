use crate::shared::bbox::BoundingBox;

/// A detected foreground region for one frame.
///
/// Blobs are ephemeral: recomputed every frame and referenced by tracks only
/// through match results, never held across frames.
#[derive(Clone, Debug)]
pub struct Blob {
    pub bbox: BoundingBox,
    /// Sub-pixel centroid of the region's pixels.
    pub centroid: (f64, f64),
    /// Pixel count.
    pub area: f64,
    /// 4*pi*area / perimeter^2, clamped to [0, 1].
    pub circularity: f64,
    /// Area divided by convex hull area, in [0, 1].
    pub convexity: f64,
    /// Minor/major axis ratio from central moments, in [0, 1]:
    /// ~0 for a line, 1 for a circle.
    pub inertia_ratio: f64,
}
