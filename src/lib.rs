pub mod catalog;
pub mod config;
pub mod headers;
pub mod matcher;
pub mod migrate;
pub mod observer;
pub mod server;
pub mod spotify;
pub mod types;
pub mod ytmusic;

#[cfg(test)]
mod test_support;
