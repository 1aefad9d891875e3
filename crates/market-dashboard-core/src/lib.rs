pub mod candle;
pub mod classifier;
pub mod error;
pub mod format;
pub mod indicator;
pub mod sparkline;
pub mod symbol;
pub mod timeframe;
