// Domain layer: records and the upstream port. No network code here.

pub mod model;
pub mod ports;
