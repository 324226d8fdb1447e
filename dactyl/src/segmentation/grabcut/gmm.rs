//! Full-covariance Gaussian mixture over RGB colours.

use glam::{DMat3, DVec3};

/// Added to the covariance diagonal when a component collapses.
const COVARIANCE_REGULARIZATION: f64 = 0.01;
const DET_EPSILON: f64 = f64::EPSILON;
const KMEANS_ITERATIONS: usize = 10;

#[derive(Debug, Clone, Copy)]
struct Component {
    weight: f64,
    mean: DVec3,
    inverse: DMat3,
    /// `1 / sqrt(det(cov))`.
    norm: f64,
}

impl Component {
    const EMPTY: Self = Self {
        weight: 0.0,
        mean: DVec3::ZERO,
        inverse: DMat3::IDENTITY,
        norm: 0.0,
    };

    #[inline]
    fn density(&self, color: DVec3) -> f64 {
        if self.weight <= 0.0 {
            return 0.0;
        }
        let d = color - self.mean;
        self.norm * (-0.5 * d.dot(self.inverse * d)).exp()
    }
}

#[derive(Debug, Clone)]
pub(super) struct Gmm {
    components: Vec<Component>,
}

/// Running sums for one component while learning.
#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    count: usize,
    sum: DVec3,
    /// Sum of outer products `c · cᵀ`.
    prod: DMat3,
}

impl Accumulator {
    fn add(&mut self, c: DVec3) {
        self.count += 1;
        self.sum += c;
        self.prod += DMat3::from_cols(c * c.x, c * c.y, c * c.z);
    }
}

impl Gmm {
    pub(super) fn new(k: usize) -> Self {
        Self {
            components: vec![Component::EMPTY; k],
        }
    }

    #[inline]
    pub(super) fn len(&self) -> usize {
        self.components.len()
    }

    /// Mixture density at `color`.
    pub(super) fn probability(&self, color: DVec3) -> f64 {
        self.components
            .iter()
            .map(|c| c.weight * c.density(color))
            .sum()
    }

    /// Index of the component that explains `color` best.
    pub(super) fn most_likely_component(&self, color: DVec3) -> usize {
        let mut best = 0;
        let mut best_p = f64::NEG_INFINITY;
        for (i, c) in self.components.iter().enumerate() {
            let p = c.density(color);
            if p > best_p {
                best_p = p;
                best = i;
            }
        }
        best
    }

    /// Re-estimate every component from `(colour, component)` assignments.
    pub(super) fn learn(&mut self, samples: &[DVec3], assignments: &[usize]) {
        debug_assert_eq!(samples.len(), assignments.len());
        let k = self.len();
        let mut acc = vec![Accumulator::default(); k];
        for (&c, &ci) in samples.iter().zip(assignments) {
            acc[ci].add(c);
        }

        let total = samples.len().max(1) as f64;
        for (component, a) in self.components.iter_mut().zip(&acc) {
            if a.count == 0 {
                *component = Component::EMPTY;
                continue;
            }
            let n = a.count as f64;
            let mean = a.sum / n;
            let mut cov = a.prod * (1.0 / n) - DMat3::from_cols(mean * mean.x, mean * mean.y, mean * mean.z);
            let mut det = cov.determinant();
            if det <= DET_EPSILON {
                cov += DMat3::from_diagonal(DVec3::splat(COVARIANCE_REGULARIZATION));
                det = cov.determinant();
            }
            *component = Component {
                weight: n / total,
                mean,
                inverse: cov.inverse(),
                norm: 1.0 / det.max(DET_EPSILON).sqrt(),
            };
        }
    }

    /// Deterministic k-means initialisation: seeds are spread evenly over the
    /// samples ordered by brightness, then refined by Lloyd iterations.
    pub(super) fn init_kmeans(&mut self, samples: &[DVec3]) -> Vec<usize> {
        let k = self.len();
        if samples.is_empty() {
            return Vec::new();
        }

        let mut order: Vec<usize> = (0..samples.len()).collect();
        order.sort_by(|&a, &b| samples[a].element_sum().total_cmp(&samples[b].element_sum()));
        let mut centers: Vec<DVec3> = (0..k)
            .map(|i| samples[order[(2 * i + 1) * samples.len() / (2 * k)]])
            .collect();

        let mut assignments = vec![0usize; samples.len()];
        for _ in 0..KMEANS_ITERATIONS {
            let mut changed = false;
            for (a, &c) in assignments.iter_mut().zip(samples) {
                let nearest = nearest_center(&centers, c);
                if nearest != *a {
                    *a = nearest;
                    changed = true;
                }
            }

            let mut sums = vec![(DVec3::ZERO, 0usize); k];
            for (&a, &c) in assignments.iter().zip(samples) {
                sums[a].0 += c;
                sums[a].1 += 1;
            }
            for (center, (sum, count)) in centers.iter_mut().zip(sums) {
                if count > 0 {
                    *center = sum / count as f64;
                }
            }

            if !changed {
                break;
            }
        }

        self.learn(samples, &assignments);
        assignments
    }
}

fn nearest_center(centers: &[DVec3], c: DVec3) -> usize {
    centers
        .iter()
        .enumerate()
        .map(|(i, &m)| (i, (c - m).length_squared()))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map_or(0, |(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_clusters_separate() {
        let mut samples = Vec::new();
        for i in 0..50 {
            let jitter = (i % 5) as f64;
            samples.push(DVec3::new(20.0 + jitter, 30.0, 40.0 - jitter));
            samples.push(DVec3::new(200.0 - jitter, 180.0, 160.0 + jitter));
        }
        let mut gmm = Gmm::new(2);
        let assignments = gmm.init_kmeans(&samples);
        assert_ne!(assignments[0], assignments[1]);

        let dark = DVec3::new(22.0, 30.0, 38.0);
        let bright = DVec3::new(198.0, 180.0, 162.0);
        assert_eq!(gmm.most_likely_component(dark), assignments[0]);
        assert_eq!(gmm.most_likely_component(bright), assignments[1]);
        assert!(gmm.probability(dark) > gmm.probability(DVec3::new(110.0, 105.0, 100.0)));
    }

    #[test]
    fn test_constant_colour_is_regularised() {
        let samples = vec![DVec3::new(100.0, 100.0, 100.0); 20];
        let mut gmm = Gmm::new(3);
        gmm.init_kmeans(&samples);
        let p = gmm.probability(DVec3::new(100.0, 100.0, 100.0));
        assert!(p.is_finite() && p > 0.0);
    }

    #[test]
    fn test_weights_follow_counts() {
        let mut samples = vec![DVec3::new(0.0, 0.0, 0.0); 30];
        samples.extend(vec![DVec3::new(255.0, 255.0, 255.0); 10]);
        let mut gmm = Gmm::new(2);
        gmm.init_kmeans(&samples);
        let weights: Vec<f64> = gmm.components.iter().map(|c| c.weight).collect();
        assert!(weights.contains(&0.75) && weights.contains(&0.25));
    }
}
