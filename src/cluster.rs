//! k-means over HSL points.
//!
//! Centroids are seeded by drawing input points uniformly with replacement.
//! Each round assigns every point to its nearest centroid (ties go to the lower
//! index), moves each centroid to the mean of its points and reseeds centroids
//! that received nothing. The run stops once no centroid moves more than the
//! configured tolerance, or at the iteration cap, in which case the assignment
//! with the lowest inertia seen so far is returned.

use rand::Rng;
use tracing::debug;

use crate::color::HslPoint;
use crate::config::ClusterConfig;
use crate::error::ExtractionError;

/// Result of one clustering run.
#[derive(Debug, Clone, PartialEq)]
pub struct Clustering {
    /// Exactly `k` groups, in centroid order. Some may be empty.
    pub groups: Vec<Vec<HslPoint>>,
    /// Number of assignment rounds performed.
    pub iterations: usize,
    /// `false` when the iteration cap was hit.
    pub converged: bool,
}

/// Partition `points` into `config.k` groups.
pub fn cluster<R: Rng + ?Sized>(
    points: &[HslPoint],
    config: &ClusterConfig,
    rng: &mut R,
) -> Result<Clustering, ExtractionError> {
    let k = config.k;
    if k == 0 {
        return Err(ExtractionError::InvalidClusterCount);
    }
    if points.is_empty() {
        return Ok(Clustering { groups: vec![Vec::new(); k], iterations: 0, converged: true });
    }

    // Never run more centroids than there are points; the surplus groups stay empty.
    let active = k.min(points.len());
    if active < k {
        debug!(k, points = points.len(), "fewer points than clusters, capping k");
    }

    let mut centroids: Vec<HslPoint> = (0..active).map(|_| random_point(points, rng)).collect();
    let mut assignment = vec![0usize; points.len()];
    let mut best_inertia = f64::INFINITY;
    let mut best_assignment = assignment.clone();
    let max_iterations = config.max_iterations.max(1);

    for iteration in 1..=max_iterations {
        let inertia = assign(points, &centroids, &mut assignment);
        let next = recompute(points, &assignment, active, rng);

        let shift = centroids
            .iter()
            .zip(&next)
            .map(|(old, new)| old.distance(new))
            .fold(0.0_f64, f64::max);

        if shift <= config.tolerance {
            debug!(iterations = iteration, inertia, "k-means converged");
            return Ok(Clustering {
                groups: group(points, &assignment, k),
                iterations: iteration,
                converged: true,
            });
        }

        if inertia < best_inertia {
            best_inertia = inertia;
            best_assignment.copy_from_slice(&assignment);
        }
        centroids = next;
    }

    debug!(max_iterations, best_inertia, shift_limit = config.tolerance, "k-means hit iteration cap");
    Ok(Clustering {
        groups: group(points, &best_assignment, k),
        iterations: max_iterations,
        converged: false,
    })
}

#[inline]
fn random_point<R: Rng + ?Sized>(points: &[HslPoint], rng: &mut R) -> HslPoint {
    points[rng.random_range(0..points.len())]
}

/// Assign each point to its nearest centroid and return the total squared distance.
fn assign(points: &[HslPoint], centroids: &[HslPoint], assignment: &mut [usize]) -> f64 {
    let mut inertia = 0.0;
    for (point, slot) in points.iter().zip(assignment.iter_mut()) {
        let mut best = 0;
        let mut best_dist = f64::INFINITY;
        for (idx, centroid) in centroids.iter().enumerate() {
            let d = point.distance_squared(centroid);
            if d < best_dist {
                best_dist = d;
                best = idx;
            }
        }
        *slot = best;
        inertia += best_dist;
    }
    inertia
}

fn recompute<R: Rng + ?Sized>(
    points: &[HslPoint],
    assignment: &[usize],
    active: usize,
    rng: &mut R,
) -> Vec<HslPoint> {
    let mut sums = vec![(0.0_f64, 0.0_f64, 0.0_f64, 0usize); active];
    for (p, &c) in points.iter().zip(assignment) {
        let s = &mut sums[c];
        s.0 += p.hue;
        s.1 += p.saturation;
        s.2 += p.lightness;
        s.3 += 1;
    }

    sums.into_iter()
        .map(|(h, s, l, n)| {
            if n == 0 {
                random_point(points, rng)
            } else {
                let n = n as f64;
                HslPoint::new(h / n, s / n, l / n)
            }
        })
        .collect()
}

fn group(points: &[HslPoint], assignment: &[usize], k: usize) -> Vec<Vec<HslPoint>> {
    let mut groups = vec![Vec::new(); k];
    for (p, &c) in points.iter().zip(assignment) {
        groups[c].push(*p);
    }
    groups
}
