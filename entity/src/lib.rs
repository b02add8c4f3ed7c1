pub mod user;
pub mod auth_group;
pub mod user_group;
pub mod group_permission;
pub mod auth_token;
pub mod password_reset;
pub mod google_drive_folder;
pub mod google_drive_watch_config;
pub mod booking;
pub mod ingestion_run;
pub mod processed_file;
pub mod raw_row;
pub mod quarantined_row;
pub mod booking_conflict;

/*
 Bookings arrive as spreadsheet exports dropped into a watched Drive folder.
 Every export is an ingestion_run. Rows are audited in raw_row, merged into booking
 (newest file wins, immutable facts never change), or parked in quarantined_row.
 Attempts to change an immutable fact are written to booking_conflict instead.
 */
