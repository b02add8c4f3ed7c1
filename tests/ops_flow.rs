#![cfg(unix)]

use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;
use std::time::Duration;

use chrono::NaiveDate;
use flate2::read::GzDecoder;
use flowtels::ops::backup::{
    backup_filename, parse_backup_stamp, prune_backups, restore, run_backup_at, BackupError, BackupSettings,
    DbCommand, RestoreOutcome,
};
use flowtels::ops::collectstatic::collect;
use flowtels::ops::wait::{wait_for_tcp, WaitError};
use tempfile::TempDir;

fn settings(dir: &Path, restore_target: &Path) -> BackupSettings {
    let restore_script = format!("cat > '{}'", restore_target.display());
    BackupSettings {
        backup_dir: dir.to_path_buf(),
        dump: DbCommand::new("sh", &["-c", "echo 'CREATE TABLE bookings ();'"]),
        restore: DbCommand::new("sh", &["-c", &restore_script]),
        retention: chrono::Duration::days(7),
    }
}

fn gunzip(path: &Path) -> String {
    let mut out = String::new();
    GzDecoder::new(fs::File::open(path).unwrap()).read_to_string(&mut out).unwrap();
    out
}

#[test]
fn test_backup_writes_gzip_and_prunes_old_dumps() {
    println!("\n\n[+] Running test: test_backup_writes_gzip_and_prunes_old_dumps");
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("backups");
    fs::create_dir_all(&dir).unwrap();

    let now = NaiveDate::from_ymd_opt(2025, 10, 10).unwrap().and_hms_opt(3, 0, 0).unwrap();
    let old = now - chrono::Duration::days(8);
    let recent = now - chrono::Duration::days(2);
    fs::write(dir.join(backup_filename(old)), b"old").unwrap();
    fs::write(dir.join(backup_filename(recent)), b"recent").unwrap();
    fs::write(dir.join("notes.txt"), b"keep me").unwrap();

    let path = run_backup_at(&settings(&dir, &tmp.path().join("unused")), now).unwrap();
    println!("[<] Backup written to {}", path.display());

    assert_eq!(path.file_name().unwrap(), "backup_20251010_030000.sql.gz");
    assert_eq!(gunzip(&path), "CREATE TABLE bookings ();\n");
    assert!(!dir.join(backup_filename(old)).exists());
    assert!(dir.join(backup_filename(recent)).exists());
    assert!(dir.join("notes.txt").exists());
    println!("[/] Test passed.");
}

#[test]
fn test_failed_dump_leaves_no_file() {
    let tmp = TempDir::new().unwrap();
    let mut settings = settings(tmp.path(), &tmp.path().join("unused"));
    settings.dump = DbCommand::new("sh", &["-c", "echo partial; exit 3"]);

    let now = NaiveDate::from_ymd_opt(2025, 10, 10).unwrap().and_hms_opt(3, 0, 0).unwrap();
    let err = run_backup_at(&settings, now).unwrap_err();
    assert!(matches!(err, BackupError::CommandFailed { .. }));
    assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 0);
}

#[test]
fn test_prune_ignores_foreign_names() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("backup_garbage.sql.gz"), b"").unwrap();
    let now = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();

    let removed = prune_backups(tmp.path(), now, chrono::Duration::days(7)).unwrap();
    assert!(removed.is_empty());
    assert_eq!(parse_backup_stamp("backup_garbage.sql.gz"), None);
}

#[test]
fn test_restore_requires_confirmation() {
    println!("\n\n[+] Running test: test_restore_requires_confirmation");
    let tmp = TempDir::new().unwrap();
    let target = tmp.path().join("restored.sql");
    let settings = settings(tmp.path(), &target);

    let missing = tmp.path().join("backup_20250101_000000.sql.gz");
    let err = restore(&settings, &missing, true, Cursor::new(""), Vec::new()).unwrap_err();
    assert_eq!(err.to_string(), format!("Backup file not found: {}", missing.display()));

    let now = NaiveDate::from_ymd_opt(2025, 10, 10).unwrap().and_hms_opt(3, 0, 0).unwrap();
    let dump = run_backup_at(&settings, now).unwrap();

    println!("[>] Declining the prompt");
    let mut output = Vec::new();
    let outcome = restore(&settings, &dump, false, Cursor::new("no\n"), &mut output).unwrap();
    assert_eq!(outcome, RestoreOutcome::Cancelled);
    let shown = String::from_utf8(output).unwrap();
    assert!(shown.contains("Type 'yes' to continue: "));
    assert!(shown.contains("Restore cancelled."));
    assert!(!target.exists());

    println!("[>] Confirming the prompt");
    let mut output = Vec::new();
    let outcome = restore(&settings, &dump, false, Cursor::new("yes\n"), &mut output).unwrap();
    assert_eq!(outcome, RestoreOutcome::Restored);
    let shown = String::from_utf8(output).unwrap();
    assert_eq!(shown.matches("Restore complete").count(), 1);
    assert_eq!(fs::read_to_string(&target).unwrap(), "CREATE TABLE bookings ();\n");
    println!("[/] Test passed.");
}

#[tokio::test]
async fn test_wait_for_tcp() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let attempts = wait_for_tcp("127.0.0.1", port, Duration::from_millis(50), Some(Duration::from_secs(2)))
        .await
        .unwrap();
    assert_eq!(attempts, 1);

    drop(listener);
    let err = wait_for_tcp("127.0.0.1", port, Duration::from_millis(50), Some(Duration::from_millis(200)))
        .await
        .unwrap_err();
    let WaitError::TimedOut { port: timed_out, .. } = err;
    assert_eq!(timed_out, port);
}

#[tokio::test]
async fn test_wait_for_tcp_holds_until_port_opens() {
    let probe = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = probe.local_addr().unwrap().port();
    drop(probe);

    let delay = Duration::from_millis(300);
    let opener = tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await.unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;
        drop(listener);
    });

    println!("[>] Waiting on a port that opens after {delay:?}");
    let started = std::time::Instant::now();
    let attempts = wait_for_tcp("127.0.0.1", port, Duration::from_millis(50), Some(Duration::from_secs(5)))
        .await
        .unwrap();
    assert!(attempts > 1);
    assert!(started.elapsed() >= delay);

    opener.abort();
    println!("[/] Test passed.");
}

#[test]
fn test_collectstatic_first_directory_wins() {
    let tmp = TempDir::new().unwrap();
    let app_static = tmp.path().join("static");
    let vendor = tmp.path().join("vendor");
    let root = tmp.path().join("staticfiles");
    fs::create_dir_all(app_static.join("css")).unwrap();
    fs::create_dir_all(&vendor).unwrap();
    fs::write(app_static.join("css/site.css"), "body {}").unwrap();
    fs::write(app_static.join("logo.png"), [0u8, 1, 2]).unwrap();
    fs::write(vendor.join("logo.png"), [9u8]).unwrap();

    let report = collect(&[app_static, vendor, tmp.path().join("missing")], &root, true).unwrap();

    assert_eq!(report.copied, 2);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.compressed, 1);
    assert_eq!(fs::read(root.join("logo.png")).unwrap(), vec![0u8, 1, 2]);
    assert_eq!(gunzip(&root.join("css/site.css.gz")), "body {}");
}
