pub mod energyledger;

pub use energyledger::*;
