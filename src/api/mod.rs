pub mod client;
pub mod models;
pub mod rpc;

pub use client::DnsApiClient;
pub use rpc::RpcClient;
