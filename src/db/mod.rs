pub mod connection;
pub mod label_repository;
pub mod repository;
