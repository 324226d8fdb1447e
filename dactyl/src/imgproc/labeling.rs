//! 8-connected component labeling using run-length encoding and union-find.

use common::Buffer2;

use crate::image::Mask;

/// A horizontal run of foreground pixels in one row.
#[derive(Debug, Clone, Copy)]
struct Run {
    y: usize,
    start: usize, // inclusive
    end: usize,   // exclusive
    label: u32,
}

/// Size and extent of one component. Bounds are half-open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentStats {
    pub label: u32,
    pub area: usize,
    pub left: usize,
    pub top: usize,
    pub right: usize,
    pub bottom: usize,
}

impl ComponentStats {
    #[inline]
    pub fn width(&self) -> usize {
        self.right - self.left
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.bottom - self.top
    }
}

/// Labeled image (0 = background, components numbered from 1) and per-component stats.
#[derive(Debug, Clone)]
pub struct Components {
    pub labels: Buffer2<u32>,
    /// `stats[i]` describes label `i + 1`.
    pub stats: Vec<ComponentStats>,
}

impl Components {
    /// Mask of every pixel whose component satisfies `keep`.
    pub fn select(&self, mut keep: impl FnMut(&ComponentStats) -> bool) -> Mask {
        let kept: Vec<bool> = self.stats.iter().map(&mut keep).collect();
        let (width, height) = self.labels.dimensions();
        Mask::from_fn(width, height, |x, y| {
            let label = self.labels[(x, y)];
            label != 0 && kept[label as usize - 1]
        })
    }

    /// The component with the largest area, first label wins ties.
    pub fn largest(&self) -> Option<&ComponentStats> {
        self.stats
            .iter()
            .reduce(|best, s| if s.area > best.area { s } else { best })
    }
}

fn find(parent: &mut [u32], mut x: u32) -> u32 {
    while parent[x as usize] != x {
        parent[x as usize] = parent[parent[x as usize] as usize];
        x = parent[x as usize];
    }
    x
}

fn union(parent: &mut [u32], a: u32, b: u32) {
    let ra = find(parent, a);
    let rb = find(parent, b);
    if ra != rb {
        let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
        parent[hi as usize] = lo;
    }
}

fn extract_runs(mask: &Mask, y: usize, runs: &mut Vec<Run>) {
    let width = mask.width();
    let mut x = 0;
    while x < width {
        if !mask.get_xy(x, y) {
            x += 1;
            continue;
        }
        let start = x;
        while x < width && mask.get_xy(x, y) {
            x += 1;
        }
        runs.push(Run {
            y,
            start,
            end: x,
            label: 0,
        });
    }
}

/// Label the 8-connected components of `mask`.
///
/// Labels are assigned in raster order of each component's first pixel.
pub fn label_components(mask: &Mask) -> Components {
    let (width, height) = mask.dimensions();
    let mut runs: Vec<Run> = Vec::new();
    // parent[0] is the unused background slot
    let mut parent: Vec<u32> = vec![0];
    let mut prev_range = 0..0;

    for y in 0..height {
        let row_start = runs.len();
        extract_runs(mask, y, &mut runs);
        let row_end = runs.len();

        for i in row_start..row_end {
            let (start, end) = (runs[i].start, runs[i].end);
            let mut label = 0u32;
            for j in prev_range.clone() {
                let prev = runs[j];
                // 8-connectivity: runs touch when they overlap including diagonals
                if prev.start <= end && prev.end + 1 > start {
                    if label == 0 {
                        label = prev.label;
                    } else {
                        union(&mut parent, label, prev.label);
                    }
                }
            }
            if label == 0 {
                label = parent.len() as u32;
                parent.push(label);
            }
            runs[i].label = label;
        }
        prev_range = row_start..row_end;
    }

    // Resolve provisional labels to compact final labels in raster order.
    let mut final_label = vec![0u32; parent.len()];
    let mut next = 0u32;
    let mut labels = Buffer2::new_default(width, height);
    let mut stats: Vec<ComponentStats> = Vec::new();

    for run in &runs {
        let root = find(&mut parent, run.label);
        if final_label[root as usize] == 0 {
            next += 1;
            final_label[root as usize] = next;
            stats.push(ComponentStats {
                label: next,
                area: 0,
                left: run.start,
                top: run.y,
                right: run.end,
                bottom: run.y + 1,
            });
        }
        let label = final_label[root as usize];
        let s = &mut stats[label as usize - 1];
        s.area += run.end - run.start;
        s.left = s.left.min(run.start);
        s.right = s.right.max(run.end);
        s.top = s.top.min(run.y);
        s.bottom = s.bottom.max(run.y + 1);
        labels.row_mut(run.y)[run.start..run.end].fill(label);
    }

    Components { labels, stats }
}
