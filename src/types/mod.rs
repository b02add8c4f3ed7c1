pub mod booking;
pub mod error;
pub mod folder;
pub mod mail;
pub mod response;
pub mod token;
pub mod user;
