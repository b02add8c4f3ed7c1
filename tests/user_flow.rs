mod common;

use common::{client::TestClient, TestContext};
use flowtels::types::error::AppError;

#[tokio::test]
async fn test_superuser_and_regular_user_flags() {
    println!("\n\n[+] Running test: test_superuser_and_regular_user_flags");
    let ctx = TestContext::new().await;

    let admin_id = ctx.db.create_superuser("root", "root@Flowtels.COM", "root-pass").await.unwrap();
    let admin = ctx.db.get_user_by_id(&admin_id).await.unwrap();
    assert!(admin.is_staff && admin.is_superuser && admin.is_active);
    assert_eq!(admin.email, "root@flowtels.com");
    assert_ne!(admin.password, "root-pass");

    let user_id = ctx
        .db
        .create_user_with_password("plain", "plain@test.com", "plain-pass", "Plain", "User")
        .await
        .unwrap();
    let user = ctx.db.get_user_by_email("plain@TEST.com").await.unwrap();
    assert_eq!(user.id, user_id);
    assert!(!user.is_staff && !user.is_superuser);

    let dup = ctx.db.create_superuser("other", "root@FLOWTELS.com", "x").await;
    assert!(matches!(dup, Err(AppError::AlreadyExists)));

    assert_eq!(ctx.db.list_users().await.unwrap().len(), 2);
    println!("[/] Test passed.");
}

#[tokio::test]
async fn test_inactive_user_cannot_authenticate() {
    println!("\n\n[+] Running test: test_inactive_user_cannot_authenticate");
    let ctx = TestContext::new().await;
    let client = TestClient::new(ctx.db.clone());
    let (user_id, token) = client.create_test_user("sleepy", "sleepy-pass").await.unwrap();

    assert!(ctx.db.authenticate("sleepy", "sleepy-pass").await.is_ok());
    assert!(matches!(
        ctx.db.authenticate("nobody", "sleepy-pass").await,
        Err(AppError::InvalidCredentials)
    ));

    ctx.db.set_user_active(&user_id, false).await.unwrap();
    assert!(matches!(
        ctx.db.authenticate("sleepy", "sleepy-pass").await,
        Err(AppError::InvalidCredentials)
    ));
    assert!(matches!(ctx.db.resolve_session(&token).await, Err(AppError::Unauthorized)));
    println!("[/] Test passed.");
}

#[tokio::test]
async fn test_group_permissions() {
    println!("\n\n[+] Running test: test_group_permissions");
    let ctx = TestContext::new().await;
    let client = TestClient::new(ctx.db.clone());
    let (staff_id, _) = client.create_test_user("frontdesk", "frontdesk-pass").await.unwrap();
    let (admin_id, _) = client.create_test_admin().await;

    let group = ctx.db.create_group("Front desk").await.unwrap();
    ctx.db.grant_group_permission(group, "view_booking").await.unwrap();
    ctx.db.add_user_to_group(staff_id, group).await.unwrap();
    ctx.db.add_user_to_group(staff_id, group).await.unwrap();

    let groups = ctx.db.list_user_groups(staff_id).await.unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].name, "Front desk");

    assert!(ctx.db.has_perm(&staff_id, "view_booking").await.unwrap());
    assert!(!ctx.db.has_perm(&staff_id, "delete_booking").await.unwrap());
    assert!(ctx.db.has_perm(&admin_id, "delete_booking").await.unwrap());

    ctx.db.set_user_active(&staff_id, false).await.unwrap();
    assert!(!ctx.db.has_perm(&staff_id, "view_booking").await.unwrap());
    println!("[/] Test passed.");
}

#[tokio::test]
async fn test_expired_sessions_are_purged() {
    println!("\n\n[+] Running test: test_expired_sessions_are_purged");
    let ctx = TestContext::new().await;
    let client = TestClient::new(ctx.db.clone());
    let (user_id, live) = client.create_test_user("visitor", "visitor-pass").await.unwrap();
    let (stale, _) = ctx.db.create_session(&user_id, chrono::Duration::seconds(-60)).await.unwrap();

    assert!(matches!(ctx.db.resolve_session(&stale).await, Err(AppError::Unauthorized)));
    assert_eq!(ctx.db.purge_expired_sessions().await.unwrap(), 1);
    assert!(ctx.db.resolve_session(&live).await.is_ok());
    println!("[/] Test passed.");
}
