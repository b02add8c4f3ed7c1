pub mod drive;
pub mod group;
pub mod ingestion;
pub mod password_reset;
pub mod postgres_service;
pub mod session;
pub mod user;
