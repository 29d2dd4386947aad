pub mod candle;
pub mod config;
pub mod env;
pub mod progress_bars;
