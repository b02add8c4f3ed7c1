pub mod bookings;
pub mod ingest;
pub mod manage;
pub mod runs;
