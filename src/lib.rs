pub mod collab;
pub mod frac;
pub mod minimum;
pub mod opt;
pub mod splitter;
pub mod tensor;
pub mod tree;

/// dimensional analysis types
pub type Index = usize;
pub type Num = i64;
pub type Outcome = u16;

pub use collab::ConstraintSet;
pub use collab::EvaluatorSet;
pub use collab::Inflation;
pub use frac::Frac;
pub use minimum::GlobalMinimum;
pub use opt::TreeOpt;
pub use splitter::TreeSplitter;
pub use tensor::EventTensor;
pub use tree::Event;
pub use tree::EventTree;
pub use tree::NodePos;
pub use tree::Path;
pub use tree::PathAndLeaves;
pub use tree::PathPartition;

/// branch-and-bound stop conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopMode {
    /// keep searching until every leaf has been visited (or pruned)
    Exhaustive,
    /// stop as soon as any worker observes a non-positive score
    Sat,
}

/// the splitter's maximum tolerated ratio between the busiest and
/// idlest worker's leaf count
pub const TARGET_QUALITY_FACTOR: f64 = 1.10;
