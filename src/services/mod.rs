// Work-order lifecycle rules
pub mod lifecycle;

// Status tallies for the stats endpoint
pub mod stats;

pub mod work_orders;
