pub mod access;
pub mod credentials;
pub mod error;
pub mod notify;
pub mod ports;
pub mod repo;
pub mod service;
