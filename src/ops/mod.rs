//! Operational tasks run from the command line: backups, database waits,
//! static asset collection and the container entrypoint.

pub mod backup;
pub mod collectstatic;
pub mod entrypoint;
pub mod wait;
