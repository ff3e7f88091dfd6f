//! Interfaces this crate consumes but does not implement. A feasibility
//! driver built on top of this crate supplies these: the symmetry-group
//! engine, the inflation / network model, and the actual marginal-evaluator
//! arithmetic all live outside this crate's scope.

use crate::tree::Event;
use crate::tree::EventTree;
use crate::Index;
use crate::Num;
use crate::Outcome;

/// Per-worker mutable evaluator state. Each `TreeOpt` worker owns one
/// clone and feeds it outcomes as it descends; `evaluate_dual_vector`
/// reads back the current score (or a lower bound on it, if the
/// assignment is still partial).
pub trait EvaluatorSet: Clone {
    /// Record (or overwrite) the outcome at `depth`, including the
    /// reserved "unknown" outcome used to blank out a position.
    fn set_outcome(&mut self, depth: Index, outcome: Outcome);

    /// The dual-vector inner product under the current (possibly partial)
    /// assignment. For a fully specified event this is the true score;
    /// for a partial one, a lower bound on every completion's score.
    fn evaluate_dual_vector(&self) -> Num;

    /// The fully specified event underlying the current assignment.
    /// Only meaningful once every position has a concrete outcome.
    fn get_inflation_event(&self) -> Event;
}

/// The inflation / network descriptor: party count, the sentinel outcome
/// used for "not yet assigned", and the symmetry-reduced event tree to
/// search.
pub trait Inflation {
    type Tree: EventTree;

    fn n_parties(&self) -> Index;
    fn outcome_unknown(&self) -> Outcome;
    fn symtree(&self) -> &Self::Tree;
}

/// The constraint problem `TreeOpt` minimises over: a dual vector encoded
/// as marginal evaluators, whether partial-assignment bounds should be
/// computed at all, and the inflation descriptor that pins down the tree.
pub trait ConstraintSet {
    type Evaluators: EvaluatorSet;
    type Infl: Inflation;

    fn marg_evaluators(&self) -> Self::Evaluators;
    fn store_bounds(&self) -> bool;
    fn inflation(&self) -> &Self::Infl;
}
