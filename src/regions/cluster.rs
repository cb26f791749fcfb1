//! k-means clustering of tessellation sites and contiguity repair.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use glam::DVec2;
use tracing::debug;

use crate::error::WorldGenError;
use crate::geometry::Tessellation;
use crate::random::RandomStream;

/// Output of [`kmeans`].
#[derive(Debug, Clone)]
pub struct KMeansResult {
    /// Cluster index per input point.
    pub assignments: Vec<usize>,
    /// Final centroid per cluster.
    pub centroids: Vec<DVec2>,
    /// Assignment passes performed.
    pub iterations: usize,
}

/// Groups `points` into `k` clusters.
///
/// Centroids are seeded with k-means++ using the stream, then refined with
/// Lloyd iterations until no assignment changes or `max_iterations` passes
/// have run. Distance ties go to the lowest centroid index. A cluster that
/// ends up empty is re-seeded on the point farthest from its centroid.
pub fn kmeans(
    points: &[DVec2],
    k: usize,
    max_iterations: usize,
    rng: &mut dyn RandomStream,
) -> Result<KMeansResult, WorldGenError> {
    let n = points.len();
    if k == 0 {
        return Err(WorldGenError::config("cluster count must be positive"));
    }
    if k > n {
        return Err(WorldGenError::config(format!(
            "cluster count {} exceeds point count {}",
            k, n
        )));
    }
    if max_iterations == 0 {
        return Err(WorldGenError::config("k-means iteration cap must be positive"));
    }

    let mut centroids = seed_centroids(points, k, rng)?;
    let mut assignments = vec![usize::MAX; n];
    let mut iterations = 0;

    for _ in 0..max_iterations {
        iterations += 1;
        let mut changed = false;
        for (i, p) in points.iter().enumerate() {
            let c = nearest(*p, &centroids);
            if assignments[i] != c {
                assignments[i] = c;
                changed = true;
            }
        }
        if !changed {
            break;
        }

        let mut sums = vec![DVec2::ZERO; k];
        let mut counts = vec![0usize; k];
        for (p, &c) in points.iter().zip(&assignments) {
            sums[c] += *p;
            counts[c] += 1;
        }

        let mut reseeded: BTreeSet<usize> = BTreeSet::new();
        for c in 0..k {
            if counts[c] > 0 {
                centroids[c] = sums[c] / counts[c] as f64;
            }
        }
        for c in 0..k {
            if counts[c] == 0 {
                if let Some(far) = farthest_point(points, &assignments, &centroids, &reseeded) {
                    reseeded.insert(far);
                    centroids[c] = points[far];
                }
            }
        }
    }

    debug!(k, iterations, "k-means finished");
    Ok(KMeansResult {
        assignments,
        centroids,
        iterations,
    })
}

fn seed_centroids(
    points: &[DVec2],
    k: usize,
    rng: &mut dyn RandomStream,
) -> Result<Vec<DVec2>, WorldGenError> {
    let mut chosen: Vec<usize> = Vec::with_capacity(k);
    chosen.push(rng.array_index(points.len())?);

    let mut nearest_sq: Vec<f64> = points
        .iter()
        .map(|p| p.distance_squared(points[chosen[0]]))
        .collect();

    while chosen.len() < k {
        let total: f64 = nearest_sq.iter().sum();
        let pick = if total > 0.0 {
            let target = rng.next_f64() * total;
            let mut cumulative = 0.0;
            let mut pick = None;
            for (i, &w) in nearest_sq.iter().enumerate() {
                cumulative += w;
                if w > 0.0 && target < cumulative {
                    pick = Some(i);
                    break;
                }
            }
            // Rounding can leave the target just past the last bucket.
            pick.or_else(|| nearest_sq.iter().rposition(|&w| w > 0.0))
        } else {
            None
        };
        let pick = match pick {
            Some(i) => i,
            None => (0..points.len())
                .find(|i| !chosen.contains(i))
                .ok_or_else(|| WorldGenError::config("not enough distinct points for k-means"))?,
        };
        chosen.push(pick);
        for (d, p) in nearest_sq.iter_mut().zip(points) {
            *d = d.min(p.distance_squared(points[pick]));
        }
    }

    Ok(chosen.into_iter().map(|i| points[i]).collect())
}

fn nearest(p: DVec2, centroids: &[DVec2]) -> usize {
    let mut best = 0;
    let mut best_d = f64::INFINITY;
    for (i, c) in centroids.iter().enumerate() {
        let d = p.distance_squared(*c);
        if d < best_d {
            best_d = d;
            best = i;
        }
    }
    best
}

fn farthest_point(
    points: &[DVec2],
    assignments: &[usize],
    centroids: &[DVec2],
    exclude: &BTreeSet<usize>,
) -> Option<usize> {
    let mut best: Option<(f64, usize)> = None;
    for (i, p) in points.iter().enumerate() {
        if exclude.contains(&i) {
            continue;
        }
        let d = p.distance_squared(centroids[assignments[i]]);
        if best.map_or(true, |(bd, _)| d > bd) {
            best = Some((d, i));
        }
    }
    best.map(|(_, i)| i)
}

/// Groups point indices by cluster.
///
/// Groups are ordered by the first point that belongs to them; members keep
/// point order. Empty clusters produce no group.
pub fn group_by_cluster(assignments: &[usize]) -> Vec<Vec<usize>> {
    let mut slot: BTreeMap<usize, usize> = BTreeMap::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for (point, &cluster) in assignments.iter().enumerate() {
        let g = *slot.entry(cluster).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[g].push(point);
    }
    groups
}

/// Rewrites `assignments` so every cluster is one edge-connected patch of
/// cells without holes.
///
/// Stray components of a cluster move to the neighbouring cluster they share
/// the most cell edges with (lowest cluster index on ties). Any group of
/// cells that a cluster completely encloses is absorbed into it. Returns the
/// number of cells that changed cluster.
pub fn enforce_contiguity(tessellation: &Tessellation, assignments: &mut [usize]) -> usize {
    let n = tessellation.len();
    debug_assert_eq!(assignments.len(), n);
    let mut moved = 0;

    loop {
        let mut changed = false;

        let clusters: BTreeSet<usize> = assignments.iter().copied().collect();
        for &c in &clusters {
            let members: Vec<usize> = (0..n).filter(|&i| assignments[i] == c).collect();
            let components = components_where(tessellation, &members, |i| assignments[i] == c);
            if components.len() <= 1 {
                continue;
            }
            let keep = largest(&components);
            for (ci, comp) in components.iter().enumerate() {
                if ci == keep {
                    continue;
                }
                if let Some(target) = dominant_neighbor_cluster(tessellation, comp, assignments, c) {
                    for &cell in comp {
                        assignments[cell] = target;
                    }
                    moved += comp.len();
                    changed = true;
                }
            }
        }

        let clusters: BTreeSet<usize> = assignments.iter().copied().collect();
        for &c in &clusters {
            let outside: Vec<usize> = (0..n).filter(|&i| assignments[i] != c).collect();
            if outside.is_empty() {
                continue;
            }
            let components = components_where(tessellation, &outside, |i| assignments[i] != c);
            for comp in components {
                let enclosed = !comp.iter().any(|&cell| tessellation.touches_border(cell));
                if enclosed {
                    for &cell in &comp {
                        assignments[cell] = c;
                    }
                    moved += comp.len();
                    changed = true;
                }
            }
        }

        if !changed {
            break;
        }
    }

    if moved > 0 {
        debug!(moved, "cells reassigned to keep regions contiguous");
    }
    moved
}

/// Edge-connected components among `members`, each in BFS order from its
/// lowest cell index.
fn components_where<F>(tessellation: &Tessellation, members: &[usize], belongs: F) -> Vec<Vec<usize>>
where
    F: Fn(usize) -> bool,
{
    let mut visited = vec![false; tessellation.len()];
    let mut components = Vec::new();
    for &start in members {
        if visited[start] {
            continue;
        }
        let mut comp = Vec::new();
        let mut queue = VecDeque::from([start]);
        visited[start] = true;
        while let Some(cell) = queue.pop_front() {
            comp.push(cell);
            for &nb in tessellation.neighbors(cell) {
                if !visited[nb] && belongs(nb) {
                    visited[nb] = true;
                    queue.push_back(nb);
                }
            }
        }
        components.push(comp);
    }
    components
}

fn largest(components: &[Vec<usize>]) -> usize {
    let mut best = 0;
    for (i, c) in components.iter().enumerate() {
        if c.len() > components[best].len() {
            best = i;
        }
    }
    best
}

fn dominant_neighbor_cluster(
    tessellation: &Tessellation,
    component: &[usize],
    assignments: &[usize],
    own: usize,
) -> Option<usize> {
    let mut shared: BTreeMap<usize, usize> = BTreeMap::new();
    for &cell in component {
        for &nb in tessellation.neighbors(cell) {
            let other = assignments[nb];
            if other != own {
                *shared.entry(other).or_insert(0) += 1;
            }
        }
    }
    let mut best: Option<(usize, usize)> = None;
    for (cluster, count) in shared {
        if best.map_or(true, |(_, bc)| count > bc) {
            best = Some((cluster, count));
        }
    }
    best.map(|(cluster, _)| cluster)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Bounds;
    use crate::random::{ScriptedStream, SeededStream};

    fn two_blobs() -> Vec<DVec2> {
        vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(0.0, 1.0),
            DVec2::new(100.0, 100.0),
            DVec2::new(101.0, 100.0),
            DVec2::new(100.0, 101.0),
        ]
    }

    #[test]
    fn separates_obvious_blobs() {
        let mut rng = SeededStream::new("blobs");
        let res = kmeans(&two_blobs(), 2, 50, &mut rng).unwrap();
        let a = res.assignments[0];
        let b = res.assignments[3];
        assert_ne!(a, b);
        assert!(res.assignments[..3].iter().all(|&c| c == a));
        assert!(res.assignments[3..].iter().all(|&c| c == b));
    }

    #[test]
    fn every_cluster_is_used() {
        let mut rng = SeededStream::new("full");
        let points: Vec<DVec2> = (0..40).map(|i| DVec2::new((i % 8) as f64, (i / 8) as f64)).collect();
        let res = kmeans(&points, 7, 100, &mut rng).unwrap();
        let used: BTreeSet<usize> = res.assignments.iter().copied().collect();
        assert_eq!(used.len(), 7);
    }

    #[test]
    fn deterministic_for_same_stream() {
        let points = two_blobs();
        let r1 = kmeans(&points, 3, 50, &mut SeededStream::new("k")).unwrap();
        let r2 = kmeans(&points, 3, 50, &mut SeededStream::new("k")).unwrap();
        assert_eq!(r1.assignments, r2.assignments);
    }

    #[test]
    fn rejects_bad_k() {
        let mut rng = ScriptedStream::constant(0.5);
        assert!(kmeans(&two_blobs(), 0, 10, &mut rng).is_err());
        assert!(kmeans(&two_blobs(), 7, 10, &mut rng).is_err());
        assert!(kmeans(&two_blobs(), 2, 0, &mut rng).is_err());
    }

    #[test]
    fn k_equal_to_n_gives_singletons() {
        let mut rng = SeededStream::new("singletons");
        let res = kmeans(&two_blobs(), 6, 50, &mut rng).unwrap();
        let used: BTreeSet<usize> = res.assignments.iter().copied().collect();
        assert_eq!(used.len(), 6);
    }

    #[test]
    fn groups_follow_first_seen_order() {
        let groups = group_by_cluster(&[2, 0, 2, 1, 0]);
        assert_eq!(groups, vec![vec![0, 2], vec![1, 4], vec![3]]);
    }

    fn strip() -> Tessellation {
        // Five cells in a row: 0 1 2 3 4
        let points = (0..5).map(|i| DVec2::new(10.0 * i as f64 + 5.0, 5.0)).collect();
        Tessellation::new(Bounds::new(50.0, 10.0).unwrap(), points).unwrap()
    }

    #[test]
    fn stray_component_joins_neighbor() {
        let t = strip();
        let mut assignments = vec![0, 0, 1, 1, 0];
        let moved = enforce_contiguity(&t, &mut assignments);
        assert_eq!(moved, 1);
        assert_eq!(assignments, vec![0, 0, 1, 1, 1]);
    }

    #[test]
    fn enclosed_cluster_is_absorbed() {
        // 3x3 grid of cells; the centre cell alone is cluster 1.
        let mut points = Vec::new();
        for y in 0..3 {
            for x in 0..3 {
                points.push(DVec2::new(10.0 * x as f64 + 5.0, 10.0 * y as f64 + 5.0));
            }
        }
        let t = Tessellation::new(Bounds::new(30.0, 30.0).unwrap(), points).unwrap();
        let mut assignments = vec![0; 9];
        assignments[4] = 1;
        enforce_contiguity(&t, &mut assignments);
        assert!(assignments.iter().all(|&c| c == 0));
    }

    #[test]
    fn contiguous_clusters_are_untouched() {
        let t = strip();
        let mut assignments = vec![0, 0, 1, 1, 2];
        assert_eq!(enforce_contiguity(&t, &mut assignments), 0);
        assert_eq!(assignments, vec![0, 0, 1, 1, 2]);
    }
}
