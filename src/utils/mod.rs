pub mod mail;
pub mod password;
pub mod timefmt;
pub mod token;
pub mod webutils;
