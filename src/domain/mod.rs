// Domain layer - Pure types, no I/O
pub mod crop;
pub mod dashboard;
pub mod readout;
pub mod sample;
pub mod series;
