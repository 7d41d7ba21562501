// Domain layer: records, tables and the ports the core depends on.

pub mod model;
pub mod ports;
