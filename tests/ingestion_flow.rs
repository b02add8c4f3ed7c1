mod common;

use std::sync::Arc;

use actix_web::{http::StatusCode, test};
use chrono::{NaiveDate, Utc};
use common::{client::TestClient, test_data, FakeDrive, TestContext};
use entity::google_drive_folder;
use flowtels::db::drive::{DBFolderCreate, DBWatchCreate};
use flowtels::ingest::BookingIngestor;
use serde_json::json;

const FOLDER: &str = "folder-abc";

async fn watched_folder(ctx: &TestContext, client: &TestClient) -> google_drive_folder::Model {
    let (user_id, _) = client.create_test_user("owner", "owner-pass").await.unwrap();
    ctx.db
        .upsert_folder_with_watch(
            DBFolderCreate {
                folder_id: FOLDER.to_string(),
                folder_name: "Bookings".to_string(),
                owner_email: "owner@flowtels.com".to_string(),
                user_id,
            },
            DBWatchCreate {
                notification_type: Default::default(),
                webhook_url: None,
                email_notifications: true,
            },
        )
        .await
        .expect("Failed to watch folder")
}

fn ingestor(ctx: &TestContext, drive: &Arc<FakeDrive>) -> BookingIngestor {
    BookingIngestor::new(ctx.db.as_ref().clone(), drive.clone())
}

#[tokio::test]
async fn test_folder_registration_and_ingest_over_http() {
    println!("\n\n[+] Running test: test_folder_registration_and_ingest_over_http");
    let ctx = TestContext::new().await;
    let client = TestClient::new(ctx.db.clone());
    let app = test::init_service(client.create_app()).await;
    let (_user_id, token) = client.create_test_user("manager", "manager-pass").await.unwrap();
    let auth = ("Authorization", format!("Bearer {}", token));

    println!("[>] Registering a folder the service account cannot see");
    let req = test::TestRequest::post()
        .uri("/api/folders/")
        .insert_header(auth.clone())
        .set_json(json!({ "folder_id": "missing" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    client.drive.add_folder(FOLDER, "Bookings");
    client.drive.add_sheet(
        FOLDER,
        "file-1",
        "bookings_2025-09-01",
        "2025-09-01T08:00:00Z",
        vec![
            test_data::header(),
            test_data::booking("1001", "Confirmed", "01/10/2025", "12", "$200.00"),
            test_data::booking("1002", "Confirmed", "03/10/2025", "7", "$150.00"),
            test_data::booking("ABC", "Confirmed", "03/10/2025", "8", "$0.00"),
        ],
    );

    println!("[>] Registering a shared folder");
    let req = test::TestRequest::post()
        .uri("/api/folders/")
        .insert_header(auth.clone())
        .set_json(json!({ "folder_id": FOLDER }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["folder"]["folder_name"], "Bookings");
    assert_eq!(body["file_count"], 1);
    assert_eq!(body["watch"]["watch_type"], "polling");

    let req = test::TestRequest::get().uri("/api/folders/").insert_header(auth.clone()).to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    println!("[>] Ingesting now");
    let req = test::TestRequest::post()
        .uri(&format!("/api/folders/{}/ingest/", FOLDER))
        .insert_header(auth.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let report: serde_json::Value = test::read_body_json(resp).await;
    println!("[<] Report: {}", report);
    assert_eq!(report["files_processed"], 1);
    assert_eq!(report["total_bookings_inserted"], 2);
    assert_eq!(report["total_quarantined"], 1);
    assert_eq!(report["ingestion_runs"][0]["status"], "partial");

    let req = test::TestRequest::post()
        .uri(&format!("/api/folders/{}/ingest/", FOLDER))
        .insert_header(auth.clone())
        .to_request();
    let report: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(report["message"], "No new files found");

    let req = test::TestRequest::get()
        .uri(&format!("/api/folders/{}/bookings/", FOLDER))
        .insert_header(auth.clone())
        .to_request();
    let bookings: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let bookings = bookings.as_array().unwrap();
    assert_eq!(bookings.len(), 2);
    assert_eq!(bookings[0]["booking_number"], "1001");
    assert_eq!(bookings[0]["email"], "jane.smith@example.com");

    let req = test::TestRequest::get()
        .uri(&format!("/api/folders/{}/runs/", FOLDER))
        .insert_header(auth)
        .to_request();
    let runs: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(runs.as_array().unwrap().len(), 1);
    assert!(runs[0]["started_at_local"].as_str().unwrap().ends_with("AEST"));
    println!("[/] Test passed.");
}

#[tokio::test]
async fn test_other_users_cannot_read_folder() {
    println!("\n\n[+] Running test: test_other_users_cannot_read_folder");
    let ctx = TestContext::new().await;
    let client = TestClient::new(ctx.db.clone());
    let app = test::init_service(client.create_app()).await;
    watched_folder(&ctx, &client).await;
    let (_id, token) = client.create_test_user("stranger", "stranger-pass").await.unwrap();

    let req = test::TestRequest::get()
        .uri(&format!("/api/folders/{}/bookings/", FOLDER))
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    println!("[/] Test passed.");
}

#[tokio::test]
async fn test_newest_file_wins_and_immutable_fields_hold() {
    println!("\n\n[+] Running test: test_newest_file_wins_and_immutable_fields_hold");
    let ctx = TestContext::new().await;
    let client = TestClient::new(ctx.db.clone());
    let folder = watched_folder(&ctx, &client).await;
    let drive = client.drive.clone();
    let ingestor = ingestor(&ctx, &drive);

    drive.add_sheet(
        FOLDER,
        "file-1",
        "bookings_2025-09-01",
        "2025-09-01T08:00:00Z",
        vec![test_data::header(), test_data::booking("1001", "Confirmed", "01/10/2025", "12", "$200.00")],
    );
    drive.add_sheet(
        FOLDER,
        "file-2",
        "bookings_2025-09-03",
        "2025-09-03T08:00:00Z",
        vec![test_data::header(), test_data::booking("1001", "Checked In", "02/10/2025", "14", "200")],
    );

    let report = ingestor.process_folder(&folder).await;
    println!("[<] First pass: {:?}", report.ingestion_runs.len());
    assert_eq!(report.files_processed, 2);
    assert_eq!(report.total_bookings_inserted, 1);
    assert_eq!(report.total_bookings_updated, 1);
    assert_eq!(report.total_conflicts, 1);

    let booking = ctx.db.get_booking("1001").await.unwrap().unwrap();
    assert_eq!(booking.status, "Checked In");
    assert_eq!(booking.room_number, "14");
    assert_eq!(booking.arrive_date, NaiveDate::from_ymd_opt(2025, 10, 1));
    assert_eq!(booking.source_file_id, "file-2");

    let conflicts = ctx.db.list_booking_conflicts("1001").await.unwrap();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].field_name, "arrive_date");
    assert_eq!(conflicts[0].existing_value, "2025-10-01");
    assert_eq!(conflicts[0].incoming_value, "2025-10-02");

    println!("[>] Adding an export with older data");
    drive.add_sheet(
        FOLDER,
        "file-3",
        "bookings_2025-09-02",
        "2025-09-04T08:00:00Z",
        vec![test_data::header(), test_data::booking("1001", "Cancelled", "01/10/2025", "9", "$200.00")],
    );
    let report = ingestor.process_folder(&folder).await;
    assert_eq!(report.files_processed, 1);
    assert_eq!(report.total_bookings_ignored, 1);

    let booking = ctx.db.get_booking("1001").await.unwrap().unwrap();
    assert_eq!(booking.status, "Checked In");
    println!("[/] Test passed.");
}

#[tokio::test]
async fn test_empty_sheet_fails_run() {
    println!("\n\n[+] Running test: test_empty_sheet_fails_run");
    let ctx = TestContext::new().await;
    let client = TestClient::new(ctx.db.clone());
    let folder = watched_folder(&ctx, &client).await;
    client.drive.add_sheet(FOLDER, "empty", "empty export", "2025-09-01T08:00:00Z", Vec::new());

    let report = ingestor(&ctx, &client.drive).process_folder(&folder).await;
    assert_eq!(report.files_failed, 1);
    assert_eq!(report.errors[0].error, "Sheet is empty");

    let runs = ctx.db.list_folder_runs(folder.id, 10).await.unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].error_message.as_deref(), Some("Sheet is empty"));

    // a failed file is retried on the next pass
    let report = ingestor(&ctx, &client.drive).process_folder(&folder).await;
    assert_eq!(report.files_discovered, 1);
    println!("[/] Test passed.");
}

#[tokio::test]
async fn test_poller_dry_run_then_import() {
    println!("\n\n[+] Running test: test_poller_dry_run_then_import");
    let ctx = TestContext::new().await;
    let client = TestClient::new(ctx.db.clone());
    watched_folder(&ctx, &client).await;
    let now = Utc::now().to_rfc3339();
    client.drive.add_sheet(
        FOLDER,
        "fresh",
        "todays export",
        &now,
        vec![test_data::header(), test_data::booking("2001", "Confirmed", "01/11/2025", "3", "$50.00")],
    );
    let ingestor = ingestor(&ctx, &client.drive);

    let report = ingestor.poll_folders(true).await.unwrap();
    assert_eq!(report.folders_checked, 1);
    assert_eq!(report.new_files_found, 1);
    assert_eq!(report.files_imported, 0);
    assert!(ctx.db.get_booking("2001").await.unwrap().is_none());

    let report = ingestor.poll_folders(false).await.unwrap();
    assert_eq!(report.files_imported, 1);
    assert!(report.errors.is_empty());
    assert!(ctx.db.get_booking("2001").await.unwrap().is_some());

    let report = ingestor.poll_folders(false).await.unwrap();
    assert_eq!(report.new_files_found, 0);
    println!("[/] Test passed.");
}
