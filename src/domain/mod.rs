// Domain layer: sales models and ports (interfaces).

pub mod model;
pub mod ports;
