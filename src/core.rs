pub mod chart;
pub mod energy;
pub mod raw;
pub mod request;
pub mod sample;
pub mod split;
