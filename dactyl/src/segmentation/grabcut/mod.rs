//! Iterative colour-model graph cut initialised from a rectangle.
//!
//! Pixels outside the rectangle are definite background, pixels inside start
//! as probable foreground. Each iteration assigns pixels to Gaussian mixture
//! components, re-learns both colour models, and relabels the probable pixels
//! with a minimum s-t cut over an 8-connected pixel graph.

mod gmm;
mod maxflow;


use glam::DVec3;
use thiserror::Error;

use self::gmm::Gmm;
use self::maxflow::FlowGraph;
use crate::config::GrabCutConfig;
use crate::image::{ColorImage, Mask, Roi};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrabCutError {
    #[error("Image is empty")]
    EmptyImage,

    #[error("Seed rectangle leaves no background samples")]
    NoBackgroundSamples,

    #[error("Seed rectangle contains no foreground samples")]
    NoForegroundSamples,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Label {
    Background,
    Foreground,
    ProbableBackground,
    ProbableForeground,
}

impl Label {
    #[inline]
    fn is_foreground(self) -> bool {
        matches!(self, Label::Foreground | Label::ProbableForeground)
    }
}

/// Neighbour offsets `(dx, dy)` covering each undirected 8-neighbour pair once.
const NEIGHBOURS: [(isize, isize); 4] = [(-1, 0), (-1, -1), (0, -1), (1, -1)];

/// Run graph cut on `image` seeded by `rect`. The result marks definite and
/// probable foreground.
pub fn grab_cut(image: &ColorImage, rect: Roi, config: &GrabCutConfig) -> Result<Mask, GrabCutError> {
    let (width, height) = image.dimensions();
    if image.is_empty() {
        return Err(GrabCutError::EmptyImage);
    }

    let mut labels: Vec<Label> = (0..width * height)
        .map(|i| {
            if rect.contains(i % width, i / width) {
                Label::ProbableForeground
            } else {
                Label::Background
            }
        })
        .collect();

    let colors: Vec<DVec3> = image
        .iter()
        .map(|&[r, g, b]| DVec3::new(r as f64, g as f64, b as f64))
        .collect();

    let (mut bgd, mut fgd) = init_models(&colors, &labels, config.components)?;

    let beta = compute_beta(&colors, width, height);
    let links = neighbour_weights(&colors, width, height, beta, config.gamma);
    let lambda = 9.0 * config.gamma;

    for iteration in 0..config.iterations {
        let (bgd_samples, bgd_assign, fgd_samples, fgd_assign) =
            assign_components(&colors, &labels, &bgd, &fgd);
        if bgd_samples.is_empty() {
            return Err(GrabCutError::NoBackgroundSamples);
        }
        if fgd_samples.is_empty() {
            return Err(GrabCutError::NoForegroundSamples);
        }
        bgd.learn(&bgd_samples, &bgd_assign);
        fgd.learn(&fgd_samples, &fgd_assign);

        let mut graph = FlowGraph::new(width * height, (width * height) * 10);
        for (i, (&label, &c)) in labels.iter().zip(&colors).enumerate() {
            let (from_source, to_sink) = match label {
                Label::ProbableBackground | Label::ProbableForeground => (
                    -bgd.probability(c).max(f64::MIN_POSITIVE).ln(),
                    -fgd.probability(c).max(f64::MIN_POSITIVE).ln(),
                ),
                Label::Background => (0.0, lambda),
                Label::Foreground => (lambda, 0.0),
            };
            graph.add_terminal(i, from_source, to_sink);
        }
        for &(a, b, w) in &links {
            graph.add_edge(a, b, w);
        }

        let flow = graph.max_flow();
        let source_side = graph.source_side();
        let mut changed = 0usize;
        for (label, &fg) in labels.iter_mut().zip(&source_side) {
            if matches!(label, Label::ProbableBackground | Label::ProbableForeground) {
                let next = if fg {
                    Label::ProbableForeground
                } else {
                    Label::ProbableBackground
                };
                if next != *label {
                    changed += 1;
                    *label = next;
                }
            }
        }
        tracing::trace!(
            "GrabCut iteration {}: flow {:.1}, {} labels changed",
            iteration,
            flow,
            changed
        );
    }

    Ok(Mask::from_fn(width, height, |x, y| {
        labels[y * width + x].is_foreground()
    }))
}

fn init_models(colors: &[DVec3], labels: &[Label], k: usize) -> Result<(Gmm, Gmm), GrabCutError> {
    let (bgd_samples, fgd_samples): (Vec<(DVec3, bool)>, Vec<(DVec3, bool)>) = colors
        .iter()
        .zip(labels)
        .map(|(&c, &l)| (c, l.is_foreground()))
        .partition(|&(_, fg)| !fg);

    if bgd_samples.is_empty() {
        return Err(GrabCutError::NoBackgroundSamples);
    }
    if fgd_samples.is_empty() {
        return Err(GrabCutError::NoForegroundSamples);
    }

    let bgd_colors: Vec<DVec3> = bgd_samples.into_iter().map(|(c, _)| c).collect();
    let fgd_colors: Vec<DVec3> = fgd_samples.into_iter().map(|(c, _)| c).collect();

    let mut bgd = Gmm::new(k);
    let mut fgd = Gmm::new(k);
    bgd.init_kmeans(&bgd_colors);
    fgd.init_kmeans(&fgd_colors);
    Ok((bgd, fgd))
}

type Assignment = (Vec<DVec3>, Vec<usize>, Vec<DVec3>, Vec<usize>);

fn assign_components(colors: &[DVec3], labels: &[Label], bgd: &Gmm, fgd: &Gmm) -> Assignment {
    let mut out: Assignment = Default::default();
    for (&c, &label) in colors.iter().zip(labels) {
        if label.is_foreground() {
            out.2.push(c);
            out.3.push(fgd.most_likely_component(c));
        } else {
            out.0.push(c);
            out.1.push(bgd.most_likely_component(c));
        }
    }
    out
}

/// `1 / (2 · mean ‖Δc‖²)` over every 8-neighbour pair; 0 for a flat image.
fn compute_beta(colors: &[DVec3], width: usize, height: usize) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for_each_pair(width, height, |a, b, _| {
        sum += (colors[a] - colors[b]).length_squared();
        count += 1;
    });
    if count == 0 || sum <= f64::EPSILON {
        0.0
    } else {
        1.0 / (2.0 * sum / count as f64)
    }
}

/// N-link weights `gamma / dist · exp(-beta · ‖Δc‖²)`.
fn neighbour_weights(colors: &[DVec3], width: usize, height: usize, beta: f64, gamma: f64) -> Vec<(usize, usize, f64)> {
    let mut links = Vec::with_capacity(width * height * 4);
    for_each_pair(width, height, |a, b, dist| {
        let diff = (colors[a] - colors[b]).length_squared();
        links.push((a, b, gamma / dist * (-beta * diff).exp()));
    });
    links
}

fn for_each_pair(width: usize, height: usize, mut f: impl FnMut(usize, usize, f64)) {
    for y in 0..height as isize {
        for x in 0..width as isize {
            let a = y as usize * width + x as usize;
            for &(dx, dy) in &NEIGHBOURS {
                let (nx, ny) = (x + dx, y + dy);
                if nx < 0 || ny < 0 || nx >= width as isize {
                    continue;
                }
                let b = ny as usize * width + nx as usize;
                let dist = if dx != 0 && dy != 0 {
                    std::f64::consts::SQRT_2
                } else {
                    1.0
                };
                f(a, b, dist);
            }
        }
    }
}
