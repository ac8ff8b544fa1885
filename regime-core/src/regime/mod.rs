//! Regime classification.

pub mod classifier;

pub use classifier::{Classification, ClassifierConfig, Indeterminate, RegimeClassifier};
