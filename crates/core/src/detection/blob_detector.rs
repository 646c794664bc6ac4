//! Connected-component blob extraction with shape filtering.
//!
//! Components are 8-connected and discovered in row-major order, so the
//! output sequence is stable for a given mask. Descriptors follow the usual
//! definitions: circularity from a traced contour perimeter, convexity
//! against the convex hull of the boundary, inertia ratio from central
//! second moments.

use std::f64::consts::PI;

use crate::detection::blob::Blob;
use crate::detection::preprocess::BinaryMask;
use crate::shared::bbox::BoundingBox;
use crate::shared::config::DetectorConfig;

/// Clockwise 8-neighborhood starting north, y pointing down.
const NEIGHBORS: [(i64, i64); 8] = [
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
];

#[derive(Clone, Debug, Default)]
pub struct BlobDetector {
    config: DetectorConfig,
}

impl BlobDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// Extracts all components passing the configured shape filters.
    pub fn detect(&self, mask: &BinaryMask) -> Vec<Blob> {
        extract_components(mask)
            .into_iter()
            .map(|pixels| describe(&pixels))
            .filter(|blob| self.passes(blob))
            .collect()
    }

    fn passes(&self, blob: &Blob) -> bool {
        let c = &self.config;
        in_range(blob.area, c.min_area, c.max_area)
            && in_range(blob.circularity, c.min_circularity, c.max_circularity)
            && in_range(blob.convexity, c.min_convexity, c.max_convexity)
            && in_range(blob.inertia_ratio, c.min_inertia_ratio, c.max_inertia_ratio)
    }
}

fn in_range(value: f64, min: Option<f64>, max: Option<f64>) -> bool {
    min.map_or(true, |m| value >= m) && max.map_or(true, |m| value <= m)
}

/// Labels 8-connected components; each is returned as its pixel list in
/// discovery order.
fn extract_components(mask: &BinaryMask) -> Vec<Vec<(i64, i64)>> {
    let w = mask.width() as i64;
    let h = mask.height() as i64;
    let mut visited = vec![false; (w * h) as usize];
    let mut components = Vec::new();

    for y in 0..h {
        for x in 0..w {
            let idx = (y * w + x) as usize;
            if visited[idx] || !mask.is_set(x as u32, y as u32) {
                continue;
            }

            let mut pixels = Vec::new();
            let mut stack = vec![(x, y)];
            visited[idx] = true;
            while let Some((px, py)) = stack.pop() {
                pixels.push((px, py));
                for (dx, dy) in NEIGHBORS {
                    let nx = px + dx;
                    let ny = py + dy;
                    if nx < 0 || ny < 0 || nx >= w || ny >= h {
                        continue;
                    }
                    let nidx = (ny * w + nx) as usize;
                    if !visited[nidx] && mask.is_set(nx as u32, ny as u32) {
                        visited[nidx] = true;
                        stack.push((nx, ny));
                    }
                }
            }
            components.push(pixels);
        }
    }

    components
}

/// Computes the full descriptor set for one component.
fn describe(pixels: &[(i64, i64)]) -> Blob {
    let area = pixels.len() as f64;

    let (mut min_x, mut min_y) = pixels[0];
    let (mut max_x, mut max_y) = pixels[0];
    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    for &(x, y) in pixels {
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
        sum_x += x as f64;
        sum_y += y as f64;
    }
    let mean_x = sum_x / area;
    let mean_y = sum_y / area;

    // Central second moments for the inertia (elongation) ratio.
    let mut mu20 = 0.0;
    let mut mu02 = 0.0;
    let mut mu11 = 0.0;
    for &(x, y) in pixels {
        let dx = x as f64 - mean_x;
        let dy = y as f64 - mean_y;
        mu20 += dx * dx;
        mu02 += dy * dy;
        mu11 += dx * dy;
    }
    let spread = ((mu20 - mu02).powi(2) + 4.0 * mu11 * mu11).sqrt();
    let major = (mu20 + mu02 + spread) / 2.0;
    let minor = (mu20 + mu02 - spread) / 2.0;
    let inertia_ratio = if major > 0.0 {
        (minor / major).clamp(0.0, 1.0)
    } else {
        1.0
    };

    // The start pixel of the component is its topmost-leftmost pixel, the
    // anchor the contour tracer requires.
    let start = *pixels
        .iter()
        .min_by_key(|&&(x, y)| (y, x))
        .expect("component is never empty");
    let set: std::collections::HashSet<(i64, i64)> = pixels.iter().copied().collect();
    let (contour, perimeter) = trace_contour(&set, start);

    let circularity = if perimeter > 0.0 {
        (4.0 * PI * area / (perimeter * perimeter)).clamp(0.0, 1.0)
    } else {
        1.0
    };

    let hull_area = convex_hull_area(&contour);
    let convexity = if hull_area > 0.0 {
        (area / hull_area).clamp(0.0, 1.0)
    } else {
        1.0
    };

    Blob {
        bbox: BoundingBox::new(
            min_x as f64,
            min_y as f64,
            (max_x - min_x + 1) as f64,
            (max_y - min_y + 1) as f64,
        ),
        centroid: (mean_x + 0.5, mean_y + 0.5),
        area,
        circularity,
        convexity,
        inertia_ratio,
    }
}

/// Moore-neighbor boundary following with Jacob's stopping criterion.
///
/// Returns the boundary pixels in traversal order and the chain perimeter
/// (unit steps for 4-neighbors, sqrt(2) for diagonals). A single-pixel
/// component has perimeter 0.
fn trace_contour(
    set: &std::collections::HashSet<(i64, i64)>,
    start: (i64, i64),
) -> (Vec<(i64, i64)>, f64) {
    let next_from = |pixel: (i64, i64), backtrack: usize| -> Option<((i64, i64), usize)> {
        for step in 1..=8 {
            let dir = (backtrack + step) % 8;
            let (dx, dy) = NEIGHBORS[dir];
            let candidate = (pixel.0 + dx, pixel.1 + dy);
            if set.contains(&candidate) {
                return Some((candidate, dir));
            }
        }
        None
    };

    // Entered the start pixel from the west during the row-major scan.
    let Some((first, first_dir)) = next_from(start, 6) else {
        return (vec![start], 0.0);
    };

    let mut contour = vec![start, first];
    let mut perimeter = step_length(first_dir);
    let mut current = first;
    let mut backtrack = (first_dir + 6) % 8;
    let cap = 8 * set.len() + 8;

    for _ in 0..cap {
        let Some((next, dir)) = next_from(current, backtrack) else {
            break;
        };
        if current == start && dir == first_dir {
            break;
        }
        perimeter += step_length(dir);
        current = next;
        backtrack = (dir + 6) % 8;
        if current != start {
            contour.push(current);
        }
    }

    (contour, perimeter)
}

fn step_length(dir: usize) -> f64 {
    if dir % 2 == 0 {
        1.0
    } else {
        std::f64::consts::SQRT_2
    }
}

/// Area of the convex hull over the corner points of the boundary pixels.
///
/// Corner points (rather than centers) make a single pixel contribute its
/// full unit square, so convexity never exceeds 1 spuriously.
fn convex_hull_area(contour: &[(i64, i64)]) -> f64 {
    let mut points: Vec<(i64, i64)> = Vec::with_capacity(contour.len() * 4);
    for &(x, y) in contour {
        points.push((x, y));
        points.push((x + 1, y));
        points.push((x, y + 1));
        points.push((x + 1, y + 1));
    }
    points.sort();
    points.dedup();

    if points.len() < 3 {
        return 0.0;
    }

    // Andrew's monotone chain: lower and upper chains built separately.
    let cross = |o: (i64, i64), a: (i64, i64), b: (i64, i64)| -> i64 {
        (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
    };

    let mut lower: Vec<(i64, i64)> = Vec::new();
    for &p in &points {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0 {
            lower.pop();
        }
        lower.push(p);
    }
    let mut upper: Vec<(i64, i64)> = Vec::new();
    for &p in points.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0 {
            upper.pop();
        }
        upper.push(p);
    }
    lower.pop();
    upper.pop();
    let hull: Vec<(i64, i64)> = lower.into_iter().chain(upper).collect();

    // Shoelace formula.
    let mut twice_area = 0i64;
    for i in 0..hull.len() {
        let (x1, y1) = hull[i];
        let (x2, y2) = hull[(i + 1) % hull.len()];
        twice_area += x1 * y2 - x2 * y1;
    }
    (twice_area.abs() as f64) / 2.0
}
