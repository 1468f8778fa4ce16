pub mod alerting;
pub mod bootstrap;
pub mod config;
pub mod executor;
pub mod monitor;
pub mod notifications;
pub mod probes;
