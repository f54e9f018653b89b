pub mod agent;
pub mod connection;
pub mod constants;
