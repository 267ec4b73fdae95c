pub mod coerce;
pub mod forecast;
pub mod observation;
pub mod plan;
pub mod series;
pub mod stats;
pub mod time;
pub mod window;
