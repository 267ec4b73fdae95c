pub mod assistant;
