// Domain layer: typed records, grouping tables and the ports the stages are written against.

pub mod mapping;
pub mod model;
pub mod ports;
