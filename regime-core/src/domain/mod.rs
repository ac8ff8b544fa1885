//! Domain types for the regime engine.

pub mod candle;
pub mod decision;
pub mod position;
pub mod regime;
pub mod timeframe;

pub use candle::{Candle, CandleSeries, SeriesError};
pub use decision::{Decision, ExitReason};
pub use position::PositionState;
pub use regime::{Regime, RegimeState};
pub use timeframe::{Timeframe, TimeframeError};

/// Trading pair identifier, e.g. `"ETH/USDT"`.
pub type Pair = String;
