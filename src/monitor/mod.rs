pub mod runner;
pub mod scheduler;
pub mod store;
pub mod types;
