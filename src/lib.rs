pub mod config;
pub mod error;
pub mod net;
pub mod policy;
pub mod report;
pub mod sim;
pub mod topo;

pub use config::SimConfig;
pub use error::SimError;

#[cfg(test)]
mod test;
