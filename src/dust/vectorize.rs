//! Mask to polygon tracing
//!
//! Connected regions of set pixels are labelled, then the pixel edges on
//! each region's boundary are chained into rings. Rings are traced with
//! the region on the right-hand side in (column, row) space, so the
//! exterior has positive shoelace area there and holes negative.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

use super::mask::Mask;

/// A pixel-corner position (column, row)
pub type Vertex = (i64, i64);

/// Which neighbours join pixels into one region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Connectivity {
    /// Edge neighbours only
    #[default]
    #[serde(rename = "4")]
    Four,
    /// Edge and corner neighbours
    #[serde(rename = "8")]
    Eight,
}

impl Connectivity {
    fn offsets(&self) -> &'static [(i64, i64)] {
        match self {
            Connectivity::Four => &[(1, 0), (-1, 0), (0, 1), (0, -1)],
            Connectivity::Eight => &[(1, 0), (-1, 0), (0, 1), (0, -1), (1, 1), (1, -1), (-1, 1), (-1, -1)],
        }
    }
}

impl std::str::FromStr for Connectivity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, String> {
        match s.trim() {
            "4" => Ok(Connectivity::Four),
            "8" => Ok(Connectivity::Eight),
            other => Err(format!("Connectivity must be 4 or 8, got '{}'", other)),
        }
    }
}

/// One region traced in pixel-corner coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct PixelPolygon {
    /// Closed ring, first vertex repeated last
    pub exterior: Vec<Vertex>,
    pub holes: Vec<Vec<Vertex>>,
    /// Number of pixels in the region
    pub pixel_count: usize,
}

impl PixelPolygon {
    /// Shoelace area in pixels, holes subtracted
    pub fn area(&self) -> f64 {
        ring_area(&self.exterior) - self.holes.iter().map(|h| ring_area(h).abs()).sum::<f64>()
    }
}

/// Signed shoelace area of a closed ring in (column, row) space
pub fn ring_area(ring: &[Vertex]) -> f64 {
    let twice: i64 = ring.windows(2).map(|p| p[0].0 * p[1].1 - p[1].0 * p[0].1).sum();
    twice as f64 / 2.0
}

/// Label connected regions; 0 is background, regions count from 1
pub fn label_regions(mask: &Mask, connectivity: Connectivity) -> (Vec<u32>, u32) {
    let (width, height) = (mask.width as i64, mask.height as i64);
    let mut labels = vec![0u32; mask.data.len()];
    let mut next = 0u32;
    let mut queue = VecDeque::new();

    for start in 0..mask.data.len() {
        if mask.data[start] == 0 || labels[start] != 0 {
            continue;
        }
        next += 1;
        labels[start] = next;
        queue.push_back(start);

        while let Some(index) = queue.pop_front() {
            let (col, row) = ((index as i64) % width, (index as i64) / width);
            for (dc, dr) in connectivity.offsets() {
                let (c, r) = (col + dc, row + dr);
                if c < 0 || r < 0 || c >= width || r >= height {
                    continue;
                }
                let neighbour = (r * width + c) as usize;
                if mask.data[neighbour] != 0 && labels[neighbour] == 0 {
                    labels[neighbour] = next;
                    queue.push_back(neighbour);
                }
            }
        }
    }
    (labels, next)
}

/// Trace every region of set pixels, in label (scan) order
pub fn trace_polygons(mask: &Mask, connectivity: Connectivity) -> Vec<PixelPolygon> {
    let (labels, count) = label_regions(mask, connectivity);
    let (width, height) = (mask.width as i64, mask.height as i64);

    let mut edges: Vec<Vec<(Vertex, Vertex)>> = vec![Vec::new(); count as usize];
    let mut pixel_counts = vec![0usize; count as usize];
    let label_at = |c: i64, r: i64| -> u32 {
        if c < 0 || r < 0 || c >= width || r >= height { 0 } else { labels[(r * width + c) as usize] }
    };

    for r in 0..height {
        for c in 0..width {
            let label = label_at(c, r);
            if label == 0 {
                continue;
            }
            let region = (label - 1) as usize;
            pixel_counts[region] += 1;
            if label_at(c, r - 1) != label {
                edges[region].push(((c, r), (c + 1, r)));
            }
            if label_at(c + 1, r) != label {
                edges[region].push(((c + 1, r), (c + 1, r + 1)));
            }
            if label_at(c, r + 1) != label {
                edges[region].push(((c + 1, r + 1), (c, r + 1)));
            }
            if label_at(c - 1, r) != label {
                edges[region].push(((c, r + 1), (c, r)));
            }
        }
    }

    edges
        .into_iter()
        .zip(pixel_counts)
        .map(|(region_edges, pixel_count)| assemble(region_edges, pixel_count))
        .collect()
}

/// Chain boundary edges into rings and split exterior from holes
fn assemble(edges: Vec<(Vertex, Vertex)>, pixel_count: usize) -> PixelPolygon {
    let mut outgoing: HashMap<Vertex, Vec<usize>> = HashMap::new();
    for (i, (from, _)) in edges.iter().enumerate() {
        outgoing.entry(*from).or_default().push(i);
    }

    let mut used = vec![false; edges.len()];
    let mut rings = Vec::new();

    for start in 0..edges.len() {
        if used[start] {
            continue;
        }
        let mut ring = vec![edges[start].0];
        let mut current = start;
        used[start] = true;

        loop {
            let next = next_edge(&edges, &outgoing, current);
            if next == start || used[next] {
                break;
            }
            used[next] = true;
            ring.push(edges[next].0);
            current = next;
        }
        ring.push(edges[start].0);
        rings.push(simplify(ring));
    }

    // The exterior is the single ring with positive area
    rings.sort_by(|a, b| ring_area(b).total_cmp(&ring_area(a)));
    let mut rings = rings.into_iter();
    PixelPolygon {
        exterior: rings.next().unwrap_or_default(),
        holes: rings.collect(),
        pixel_count,
    }
}

/// The edge that continues a ring after `current`
///
/// A vertex with two outgoing edges is a corner where two diagonal pixels
/// of the region meet. The ring turns left there, so it wraps each of the
/// two background pixels separately and no ring touches itself, except
/// where the region itself is only joined through that corner.
fn next_edge(edges: &[(Vertex, Vertex)], outgoing: &HashMap<Vertex, Vec<usize>>, current: usize) -> usize {
    let (from, to) = edges[current];
    let candidates = match outgoing.get(&to) {
        Some(candidates) if !candidates.is_empty() => candidates,
        _ => return current,
    };
    if candidates.len() == 1 {
        return candidates[0];
    }

    // Left of (dx, dy) with rows growing downward
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let left = (dy, -dx);
    candidates
        .iter()
        .copied()
        .find(|&i| {
            let (a, b) = edges[i];
            (b.0 - a.0, b.1 - a.1) == left
        })
        .unwrap_or(candidates[0])
}

/// Drop vertices where the ring continues straight on
fn simplify(ring: Vec<Vertex>) -> Vec<Vertex> {
    // ring is closed: last == first
    let open = &ring[..ring.len() - 1];
    let n = open.len();
    let mut kept: Vec<Vertex> = (0..n)
        .filter(|&i| {
            let prev = open[(i + n - 1) % n];
            let here = open[i];
            let next = open[(i + 1) % n];
            (here.0 - prev.0) * (next.1 - here.1) != (here.1 - prev.1) * (next.0 - here.0)
        })
        .map(|i| open[i])
        .collect();
    if let Some(first) = kept.first().copied() {
        kept.push(first);
    }
    kept
}
