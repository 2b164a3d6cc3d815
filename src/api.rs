pub mod client;
pub mod entsoe;
pub mod heartbeat;
