//! Signal evaluation: the entry conjunction and the exit disjunction for the
//! latest candle, parameterized by the active regime's rules.

pub mod entry;
pub mod exit;

pub use entry::{evaluate_entry, EntryEvaluation, Predicate, PredicateOutcome};
pub use exit::{evaluate_exits, ExitInputs};
