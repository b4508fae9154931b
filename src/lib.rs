//! Tax lot matching: reconstructs which lots each sale disposed of (FIFO or
//! LIFO), emits one taxable event per lot touched and estimates flat-rate tax
//! on the resulting gains.

pub mod core;
pub mod exchanges;
