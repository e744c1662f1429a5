pub mod backend_fetch;
pub mod config;
pub mod demo_backend;
pub mod error;
pub mod http_client;
pub mod identity;
pub mod lineup;
pub mod percentiles;
pub mod provider;
pub mod roster;
pub mod state;
pub mod tiers;
