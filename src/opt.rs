use crate::collab::ConstraintSet;
use crate::collab::EvaluatorSet;
use crate::collab::Inflation;
use crate::minimum::GlobalMinimum;
use crate::splitter::TreeSplitter;
use crate::tree::Event;
use crate::tree::EventTree;
use crate::tree::NodePos;
use crate::tree::Path;
use crate::tree::PathPartition;
use crate::Index;
use crate::Num;
use crate::StopMode;

type Tree<C> = <<C as ConstraintSet>::Infl as Inflation>::Tree;

/// Per-worker mutable state: an owned evaluator clone, the worker's own
/// best-so-far score, and a LIFO queue of nodes still to visit.
struct ThreadWorker<E: EvaluatorSet> {
    evaluators: E,
    current_minimum: Num,
    current_best_event: Event,
    last_depth_processed: Index,
    queue: Vec<NodePos>,
    n_leaves_effective: Index,
}

impl<E: EvaluatorSet> ThreadWorker<E> {
    fn new(evaluators: E) -> Self {
        Self {
            evaluators,
            current_minimum: Num::MAX,
            current_best_event: Event::new(),
            last_depth_processed: 0,
            queue: Vec::new(),
            n_leaves_effective: 0,
        }
    }
}

struct ThreadReturn {
    score: Num,
    best_event: Event,
    n_leaves_effective: Index,
}

/// Parallel branch-and-bound minimiser over a symmetry-reduced event tree.
///
/// Construction eagerly computes the path partition (see `TreeSplitter`)
/// so that a failure to find a balanced split surfaces before any worker
/// is spawned.
pub struct TreeOpt<C: ConstraintSet> {
    constraints: C,
    store_bounds: bool,
    n_parties: Index,
    outcome_unknown: crate::Outcome,
    n_threads: Index,
    path_partition: PathPartition,
    global_minimum: GlobalMinimum,
    stop_mode: StopMode,
    n_leaves_effective: Index,
}

impl<C: ConstraintSet> TreeOpt<C> {
    pub fn new(constraints: C, n_threads: Index) -> anyhow::Result<Self> {
        assert!(n_threads >= 1, "n_threads must be at least 1");
        log::info!("constructing TreeOpt with {n_threads} worker(s)");

        let store_bounds = constraints.store_bounds();
        let n_parties = constraints.inflation().n_parties();
        let outcome_unknown = constraints.inflation().outcome_unknown();
        let path_partition =
            TreeSplitter::get_path_partition(constraints.inflation().symtree(), n_threads)?;

        Ok(Self {
            constraints,
            store_bounds,
            n_parties,
            outcome_unknown,
            n_threads,
            path_partition,
            global_minimum: GlobalMinimum::new(),
            stop_mode: StopMode::Exhaustive,
            n_leaves_effective: 0,
        })
    }

    pub fn with_stop_mode(mut self, stop_mode: StopMode) -> Self {
        self.stop_mode = stop_mode;
        self
    }

    pub fn n_leaves_effective(&self) -> Index {
        self.n_leaves_effective
    }
}

#[cfg(feature = "server")]
impl<C: ConstraintSet> TreeOpt<C> {
    /// Convenience constructor matching this crate's worker-pool siblings:
    /// size the thread count to the machine rather than requiring the
    /// caller to pick one. Never used internally; tests that need
    /// determinism always pass an explicit count to `new`.
    pub fn with_available_parallelism(constraints: C) -> anyhow::Result<Self> {
        Self::new(constraints, num_cpus::get())
    }
}

impl<C> TreeOpt<C>
where
    C: ConstraintSet + Sync,
    C::Evaluators: Send,
    C::Infl: Sync,
    Tree<C>: Sync,
{
    /// Run the minimisation once. Resets the shared global minimum first,
    /// so repeated calls are independent.
    pub fn get_pre_solution(&mut self) -> (Num, Event) {
        self.n_leaves_effective = 0;
        self.global_minimum.reset();

        let tree = self.constraints.inflation().symtree();

        if self.n_threads == 1 {
            let thread_ret = self.thread_opt(&self.path_partition[0], tree);
            self.n_leaves_effective = thread_ret.n_leaves_effective;
            return (thread_ret.score, thread_ret.best_event);
        }

        let this: &Self = self;
        let results: Vec<ThreadReturn> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..this.n_threads)
                .map(|k| {
                    let paths = &this.path_partition[k];
                    scope.spawn(move || this.thread_opt(paths, tree))
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().expect("TreeOpt worker thread panicked"))
                .collect()
        });

        let mut n_leaves_effective = 0;
        let mut best: Option<(Num, Event)> = None;
        for thread_ret in results {
            n_leaves_effective += thread_ret.n_leaves_effective;
            log::debug!("worker visited {} leaves", thread_ret.n_leaves_effective);
            let improves = match &best {
                None => true,
                Some((best_score, _)) => thread_ret.score < *best_score,
            };
            if improves {
                best = Some((thread_ret.score, thread_ret.best_event));
            }
        }
        self.n_leaves_effective = n_leaves_effective;
        log::info!("TreeOpt visited {n_leaves_effective} leaves total");

        let (score, best_event) = best.expect("n_threads >= 1 guarantees at least one worker result");
        assert_eq!(
            score,
            self.global_minimum.get(),
            "the selected score must match the shared global minimum"
        );
        (score, best_event)
    }

    fn thread_opt(&self, paths: &[Path], tree: &Tree<C>) -> ThreadReturn {
        let mut worker = ThreadWorker::new(self.constraints.marg_evaluators());

        for path in paths {
            let end_of_path = path.len() - 1;

            for depth in 0..self.n_parties {
                if depth <= end_of_path {
                    let node_pos = NodePos::new(depth, path[depth]);
                    if depth < end_of_path {
                        let node = tree.get_node(node_pos);
                        worker.evaluators.set_outcome(depth, node.outcome);
                    } else {
                        worker.queue = vec![node_pos];
                    }
                } else if !self.store_bounds {
                    break;
                } else {
                    worker.evaluators.set_outcome(depth, self.outcome_unknown);
                }
            }

            while let Some(node_pos) = worker.queue.pop() {
                self.go_down_from(&mut worker, node_pos, tree);
            }
        }

        ThreadReturn {
            score: worker.current_minimum,
            best_event: worker.current_best_event,
            n_leaves_effective: worker.n_leaves_effective,
        }
    }

    fn go_down_from(&self, worker: &mut ThreadWorker<C::Evaluators>, node_pos: NodePos, tree: &Tree<C>) {
        if self.stop_mode == StopMode::Sat && self.global_minimum.get() <= 0 {
            worker.queue.clear();
            return;
        }

        if self.store_bounds {
            for depth in (node_pos.depth + 1)..=worker.last_depth_processed {
                worker.evaluators.set_outcome(depth, self.outcome_unknown);
            }
            worker.last_depth_processed = node_pos.depth;
        }

        let node = tree.get_node(node_pos);
        worker.evaluators.set_outcome(node_pos.depth, node.outcome);

        if node_pos.depth < self.n_parties - 1 {
            let mut keep_branch = true;

            if self.store_bounds {
                let lower_bound = worker.evaluators.evaluate_dual_vector();
                keep_branch = lower_bound < self.global_minimum.get();
            }

            if keep_branch {
                tree.add_children_to_queue(&mut worker.queue, node_pos);
            } else {
                worker.n_leaves_effective += 1;
            }
        } else {
            worker.n_leaves_effective += 1;
            let score = worker.evaluators.evaluate_dual_vector();

            if score < self.global_minimum.get() {
                worker.current_minimum = score;
                worker.current_best_event = worker.evaluators.get_inflation_event();
                self.global_minimum.set_if_smaller(score);
            }
        }
    }
}
