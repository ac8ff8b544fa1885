//! Risk management: protective stop levels, the stop ratchet, the ROI table
//! and time-based forced exits.

pub mod hold;
pub mod ratchet;
pub mod roi;
pub mod stop;

pub use hold::MaxHoldingPeriod;
pub use ratchet::RatchetState;
pub use roi::roi_threshold;
pub use stop::{propose_stop, StopProposal};
