pub mod average_rate;
pub mod combined;
pub mod constants;
pub mod delta;
pub mod error;
pub mod fixed_point;
pub mod generator;
pub mod interval;
pub mod period_total;
pub mod pipeline;
pub mod sample;
pub mod series_key;
pub mod units;
pub mod wraparound;
