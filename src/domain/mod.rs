// Domain layer: entities and the ports (store / payment interfaces) the core depends on.

pub mod model;
pub mod ports;
