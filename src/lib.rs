pub mod config;
pub mod http_client;
pub mod ingest;
pub mod normalize;
pub mod provider;
pub mod retry;
pub mod store;
