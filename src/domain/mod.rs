// Domain layer: records, inputs and the ports the core talks through.

pub mod model;
pub mod ports;
