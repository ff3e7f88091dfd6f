use crate::tree::EventTree;
use crate::tree::Path;
use crate::tree::PathAndLeaves;
use crate::tree::PathPartition;
use crate::Index;
use crate::TARGET_QUALITY_FACTOR;
use anyhow::bail;
use anyhow::Result;

/// Partitions an event tree into `n_splits` roughly leaf-balanced groups
/// of path prefixes, one group per worker thread.
pub struct TreeSplitter;

impl TreeSplitter {
    /// The one entry point: pick the shallowest depth at which the tree's
    /// nodes can be split into `n_splits` groups with leaf counts within
    /// `TARGET_QUALITY_FACTOR` of each other.
    pub fn get_path_partition<T: EventTree>(event_tree: &T, n_splits: Index) -> Result<PathPartition> {
        assert!(n_splits >= 1, "n_splits must be at least 1");

        if n_splits == 1 {
            let n_root_children = event_tree.root_children_count();
            let paths = (0..n_root_children).map(|i| Path::new(vec![i])).collect();
            return Ok(vec![paths]);
        }

        let n_leaves = event_tree.n_leaves();
        let thresholds: Vec<Index> = (0..n_splits).map(|k| k * n_leaves / n_splits).collect();

        for depth in 0..event_tree.depth() {
            if let Some(partition) = try_split_at_depth(event_tree, n_splits, depth, &thresholds) {
                return Ok(partition);
            }
        }

        bail!("TreeSplitter could not find a splitting strategy. Try reducing the number of threads.")
    }
}

fn try_split_at_depth<T: EventTree>(
    event_tree: &T,
    n_splits: Index,
    depth: Index,
    thresholds: &[Index],
) -> Option<PathPartition> {
    let breadth = event_tree.breadth_at_depth(depth);
    if breadth < n_splits {
        return None;
    }

    let paths_and_leaves = collect_paths_and_leaves(event_tree, depth, breadth);
    debug_assert_eq!(paths_and_leaves.len(), breadth);

    let splits = find_splits(&paths_and_leaves, n_splits, thresholds)?;

    let mut leaves_per_split = vec![0; n_splits];
    for (split_index, window) in splits.windows(2).enumerate() {
        let (start, end) = (window[0], window[1]);
        leaves_per_split[split_index] = paths_and_leaves[start..end]
            .iter()
            .map(|pl| pl.n_leaves)
            .sum();
    }

    let min_leaves = *leaves_per_split.iter().min().unwrap();
    let max_leaves = *leaves_per_split.iter().max().unwrap();
    let quality_factor = max_leaves as f64 / min_leaves as f64;
    if quality_factor > TARGET_QUALITY_FACTOR {
        return None;
    }

    log::info!("Found a satisfactory split at depth {depth}.");
    let permill = ((quality_factor - 1.0) * 1000.0) as i64;
    log::info!(
        "The slowest thread has {}.{}% more leaves to process than the fastest thread.",
        permill / 10,
        permill % 10
    );

    let mut partition: PathPartition = Vec::with_capacity(n_splits);
    for (split_index, window) in splits.windows(2).enumerate() {
        let (start, end) = (window[0], window[1]);
        log::debug!(
            "Thread {} gets the range [{start},{end}) with {} leaves",
            split_index + 1,
            leaves_per_split[split_index]
        );
        partition.push(
            paths_and_leaves[start..end]
                .iter()
                .map(|pl| pl.path.clone())
                .collect(),
        );
    }
    Some(partition)
}

fn collect_paths_and_leaves<T: EventTree>(event_tree: &T, depth: Index, breadth: Index) -> Vec<PathAndLeaves> {
    let mut paths_and_leaves: Vec<PathAndLeaves> = (0..breadth)
        .map(|_| PathAndLeaves {
            path: Path::new(vec![0; depth + 1]),
            n_leaves: 0,
        })
        .collect();

    let mut path_index = 0;
    let mut queue = event_tree.root_children_queue();
    while let Some(node_pos) = queue.pop() {
        for other in path_index..breadth {
            paths_and_leaves[other].path[node_pos.depth] = node_pos.node_index;
        }

        if node_pos.depth == depth {
            paths_and_leaves[path_index].n_leaves = event_tree.count_leaves_from(node_pos);
            path_index += 1;
        } else {
            event_tree.add_children_to_queue(&mut queue, node_pos);
        }
    }

    paths_and_leaves.sort_by_key(|pl| pl.n_leaves);
    paths_and_leaves
}

/// `splits[k]` is the index into `paths_and_leaves` where cell `k` begins;
/// `splits[n_splits]` is `paths_and_leaves.len()`. Returns `None` if the
/// thresholds cannot be met without leaving a cell empty.
fn find_splits(paths_and_leaves: &[PathAndLeaves], n_splits: Index, thresholds: &[Index]) -> Option<Vec<Index>> {
    let breadth = paths_and_leaves.len();
    let mut splits = vec![0; n_splits + 1];
    splits[n_splits] = breadth;

    let mut accumulated = 0;
    let mut split_index = 1;

    for (path_index, pl) in paths_and_leaves.iter().enumerate() {
        accumulated += pl.n_leaves;

        if accumulated > thresholds[split_index] {
            if path_index == 0 {
                return None;
            }
            splits[split_index] = path_index;
            split_index += 1;
            if split_index == n_splits {
                break;
            }
        }
    }

    (split_index == n_splits).then_some(splits)
}
