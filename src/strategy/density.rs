//! HDBSCAN over haversine distance.
//!
//! Steps:
//! 1. Core distance of every point: distance to its `min_samples`-th nearest
//!    other point, clamped to the batch (`min_samples + 1` neighbors with the
//!    point itself as the first)
//! 2. Minimum spanning tree of the mutual reachability graph,
//!    `MR(a, b) = max(core(a), core(b), dist(a, b))`, using Prim's algorithm
//! 3. Single-linkage hierarchy from the sorted MST edges
//! 4. Condensed tree: splits where both sides reach `min_cluster_size` create
//!    new clusters, smaller sides "fall out" of their parent
//! 5. Excess-of-mass selection over cluster stabilities. The root is never
//!    selected, so a batch with no inner structure comes back as all noise.

use std::collections::VecDeque;

use log::debug;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::{ClusterStrategy, Labels, NOISE};
use crate::spatial::PoiIndex;
use crate::{PoiPoint, StrategyKind};

/// Cap on `1 / distance` so coincident points get a finite density.
const MAX_LAMBDA: f64 = 1e9;

/// Root of the condensed cluster tree.
const ROOT_CLUSTER: usize = 0;

/// Minimum cluster size for a batch of `n` points.
///
/// Small batches would otherwise come back as one blob, large ones as
/// hundreds of tiny clusters.
pub fn scaled_min_cluster_size(n: usize) -> usize {
    if n < 10 {
        2
    } else if n < 50 {
        3
    } else {
        (n / 50).max(3)
    }
}

/// Density-based clustering that adapts to local POI density.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityClusterer {
    min_samples: usize,
    min_cluster_size: Option<usize>,
}

impl Default for DensityClusterer {
    fn default() -> Self {
        Self::new(2, None)
    }
}

impl DensityClusterer {
    /// Create a clusterer. `min_cluster_size = None` uses [`scaled_min_cluster_size`].
    pub fn new(min_samples: usize, min_cluster_size: Option<usize>) -> Self {
        Self {
            min_samples: min_samples.max(1),
            min_cluster_size: min_cluster_size.map(|s| s.max(2)),
        }
    }

    /// Effective minimum cluster size for a batch of `n` points.
    pub fn min_cluster_size_for(&self, n: usize) -> usize {
        self.min_cluster_size
            .unwrap_or_else(|| scaled_min_cluster_size(n))
    }
}

impl ClusterStrategy for DensityClusterer {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Density
    }

    fn min_points(&self) -> usize {
        3
    }

    fn cluster(&self, points: &[PoiPoint]) -> Labels {
        let n = points.len();
        if n < 2 {
            return Labels::all_noise(n);
        }

        let min_cluster_size = self.min_cluster_size_for(n);
        let k = (self.min_samples + 1).min(n);

        let index = PoiIndex::build(points);
        let core = core_distances(&index, k);
        let mut mst = mutual_reachability_mst(&index, &core);
        let merges = single_linkage(n, &mut mst);
        let tree = CondensedTree::build(&merges, n, min_cluster_size);
        let selected = tree.select_clusters();
        let labels = tree.label_points(n, &selected);

        debug!(
            "[Density] {} points, min_cluster_size={}, min_samples={}: {} clusters, {} noise",
            n,
            min_cluster_size,
            k - 1,
            labels.cluster_count(),
            labels.noise_count()
        );

        labels
    }
}

// ============================================================================
// Mutual reachability MST
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct Edge {
    a: usize,
    b: usize,
    weight: f64,
}

fn core_distances(index: &PoiIndex<'_>, k: usize) -> Vec<f64> {
    let core_of = |i: usize| {
        index
            .k_nearest(i, k)
            .last()
            .map(|n| n.distance_km)
            .unwrap_or(0.0)
    };

    #[cfg(feature = "parallel")]
    let core = (0..index.len()).into_par_iter().map(core_of).collect();

    #[cfg(not(feature = "parallel"))]
    let core = (0..index.len()).map(core_of).collect();

    core
}

/// Prim's algorithm on the dense mutual reachability graph. O(n²) distance
/// evaluations, no n×n matrix.
fn mutual_reachability_mst(index: &PoiIndex<'_>, core: &[f64]) -> Vec<Edge> {
    let n = index.len();
    let mut in_tree = vec![false; n];
    let mut best = vec![f64::INFINITY; n];
    let mut best_from = vec![0usize; n];
    let mut edges = Vec::with_capacity(n.saturating_sub(1));

    let mut current = 0;
    in_tree[current] = true;

    for _ in 1..n {
        for j in 0..n {
            if in_tree[j] {
                continue;
            }
            let reach = index.distance(current, j).max(core[current]).max(core[j]);
            if reach < best[j] {
                best[j] = reach;
                best_from[j] = current;
            }
        }

        // Lowest index wins ties
        let mut next = usize::MAX;
        for j in 0..n {
            if !in_tree[j] && (next == usize::MAX || best[j] < best[next]) {
                next = j;
            }
        }

        edges.push(Edge {
            a: best_from[next],
            b: next,
            weight: best[next],
        });
        in_tree[next] = true;
        current = next;
    }

    edges
}

// ============================================================================
// Single-linkage hierarchy
// ============================================================================

/// Internal node `n + i` of the hierarchy, merging two nodes at `distance`.
#[derive(Debug, Clone, Copy)]
struct Merge {
    left: usize,
    right: usize,
    distance: f64,
    size: usize,
}

fn single_linkage(n: usize, edges: &mut [Edge]) -> Vec<Merge> {
    edges.sort_by(|x, y| {
        x.weight
            .total_cmp(&y.weight)
            .then(x.a.cmp(&y.a))
            .then(x.b.cmp(&y.b))
    });

    let total = 2 * n - 1;
    let mut parent: Vec<usize> = (0..total).collect();
    let mut size = vec![1usize; total];
    let mut merges = Vec::with_capacity(n - 1);

    for (i, edge) in edges.iter().enumerate() {
        let root_a = find_root(&mut parent, edge.a);
        let root_b = find_root(&mut parent, edge.b);
        let node = n + i;

        size[node] = size[root_a] + size[root_b];
        parent[root_a] = node;
        parent[root_b] = node;

        merges.push(Merge {
            left: root_a,
            right: root_b,
            distance: edge.weight,
            size: size[node],
        });
    }

    merges
}

fn find_root(parent: &mut [usize], mut x: usize) -> usize {
    let mut root = x;
    while parent[root] != root {
        root = parent[root];
    }
    while parent[x] != root {
        let next = parent[x];
        parent[x] = root;
        x = next;
    }
    root
}

// ============================================================================
// Condensed tree and cluster selection
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
enum Child {
    Point(usize),
    Cluster(usize),
}

#[derive(Debug, Clone, Copy)]
struct CondensedEntry {
    parent: usize,
    child: Child,
    lambda: f64,
    size: usize,
}

#[derive(Debug)]
struct CondensedTree {
    entries: Vec<CondensedEntry>,
    cluster_count: usize,
}

fn lambda_for(distance: f64) -> f64 {
    if distance > 0.0 {
        (1.0 / distance).min(MAX_LAMBDA)
    } else {
        MAX_LAMBDA
    }
}

impl CondensedTree {
    fn build(merges: &[Merge], n: usize, min_cluster_size: usize) -> Self {
        let node_size = |node: usize| if node < n { 1 } else { merges[node - n].size };

        let root = 2 * n - 2;
        let mut relabel = vec![ROOT_CLUSTER; 2 * n - 1];
        let mut next_cluster = ROOT_CLUSTER + 1;
        let mut entries = Vec::with_capacity(2 * n);

        let mut queue = VecDeque::from([root]);
        while let Some(node) = queue.pop_front() {
            if node < n {
                continue;
            }
            let merge = merges[node - n];
            let lambda = lambda_for(merge.distance);
            let parent = relabel[node];
            let left_big = node_size(merge.left) >= min_cluster_size;
            let right_big = node_size(merge.right) >= min_cluster_size;

            match (left_big, right_big) {
                (true, true) => {
                    for child in [merge.left, merge.right] {
                        relabel[child] = next_cluster;
                        entries.push(CondensedEntry {
                            parent,
                            child: Child::Cluster(next_cluster),
                            lambda,
                            size: node_size(child),
                        });
                        next_cluster += 1;
                        queue.push_back(child);
                    }
                }
                (false, false) => {
                    for child in [merge.left, merge.right] {
                        fall_out(child, parent, lambda, n, merges, &mut entries);
                    }
                }
                (false, true) => {
                    fall_out(merge.left, parent, lambda, n, merges, &mut entries);
                    relabel[merge.right] = parent;
                    queue.push_back(merge.right);
                }
                (true, false) => {
                    fall_out(merge.right, parent, lambda, n, merges, &mut entries);
                    relabel[merge.left] = parent;
                    queue.push_back(merge.left);
                }
            }
        }

        Self {
            entries,
            cluster_count: next_cluster,
        }
    }

    fn child_clusters(&self) -> Vec<Vec<usize>> {
        let mut children = vec![Vec::new(); self.cluster_count];
        for entry in &self.entries {
            if let Child::Cluster(c) = entry.child {
                children[entry.parent].push(c);
            }
        }
        children
    }

    fn stabilities(&self) -> Vec<f64> {
        let mut births = vec![0.0; self.cluster_count];
        for entry in &self.entries {
            if let Child::Cluster(c) = entry.child {
                births[c] = entry.lambda;
            }
        }

        let mut stability = vec![0.0; self.cluster_count];
        for entry in &self.entries {
            stability[entry.parent] += (entry.lambda - births[entry.parent]) * entry.size as f64;
        }
        stability
    }

    /// Excess-of-mass selection. Children are numbered after their parents,
    /// so walking ids downwards visits every subtree before its root.
    fn select_clusters(&self) -> Vec<bool> {
        let children = self.child_clusters();
        let mut stability = self.stabilities();
        let mut selected = vec![true; self.cluster_count];
        selected[ROOT_CLUSTER] = false;

        for cluster in (ROOT_CLUSTER + 1..self.cluster_count).rev() {
            let subtree: f64 = children[cluster].iter().map(|&c| stability[c]).sum();
            if subtree > stability[cluster] {
                selected[cluster] = false;
                stability[cluster] = subtree;
            } else {
                let mut stack = children[cluster].clone();
                while let Some(descendant) = stack.pop() {
                    selected[descendant] = false;
                    stack.extend(children[descendant].iter().copied());
                }
            }
        }

        selected
    }

    fn label_points(&self, n: usize, selected: &[bool]) -> Labels {
        let mut cluster_parent = vec![ROOT_CLUSTER; self.cluster_count];
        let mut point_cluster = vec![ROOT_CLUSTER; n];
        for entry in &self.entries {
            match entry.child {
                Child::Cluster(c) => cluster_parent[c] = entry.parent,
                Child::Point(p) => point_cluster[p] = entry.parent,
            }
        }

        let mut label_of = vec![NOISE; self.cluster_count];
        let mut next_label = 0;
        for (cluster, &is_selected) in selected.iter().enumerate() {
            if is_selected {
                label_of[cluster] = next_label;
                next_label += 1;
            }
        }

        let labels = point_cluster
            .into_iter()
            .map(|mut cluster| loop {
                if selected[cluster] {
                    break label_of[cluster];
                }
                if cluster == ROOT_CLUSTER {
                    break NOISE;
                }
                cluster = cluster_parent[cluster];
            })
            .collect();

        Labels::new(labels)
    }
}

/// Record every point under `node` as leaving cluster `parent` at `lambda`.
fn fall_out(
    node: usize,
    parent: usize,
    lambda: f64,
    n: usize,
    merges: &[Merge],
    entries: &mut Vec<CondensedEntry>,
) {
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        if current < n {
            entries.push(CondensedEntry {
                parent,
                child: Child::Point(current),
                lambda,
                size: 1,
            });
        } else {
            let merge = merges[current - n];
            stack.push(merge.right);
            stack.push(merge.left);
        }
    }
}
