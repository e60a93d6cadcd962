//! Permission snapshots as the presentation layer consumes them.

use crate::common::{ADMIN, ALICE, AccessHarness, BOB, MANAGE_USERS};

#[tokio::test]
async fn test_admin_with_manage_users_snapshot() {
    let h = AccessHarness::new();
    h.seed().await;
    h.admin.grant_ability(ADMIN, MANAGE_USERS).await.unwrap();
    h.admin.assign_role(ALICE, ADMIN).await.unwrap();

    let snapshot = h.publisher.build_snapshot(ALICE).await;
    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"roles": ["admin"], "permissions": {"manage-users": true}})
    );
}

#[tokio::test]
async fn test_principal_without_roles_gets_empty_projection() {
    let h = AccessHarness::new();
    h.seed().await;
    let json = serde_json::to_value(h.publisher.build_snapshot(BOB).await).unwrap();
    assert_eq!(json, serde_json::json!({"roles": [], "permissions": {}}));
}

#[tokio::test]
async fn test_snapshot_follows_role_retraction() {
    let h = AccessHarness::new();
    h.seed().await;
    h.admin.grant_ability(ADMIN, MANAGE_USERS).await.unwrap();
    h.admin.assign_role(ALICE, ADMIN).await.unwrap();
    assert!(h.publisher.build_snapshot(ALICE).await.can("manage-users"));

    h.admin.retract_role(ALICE, ADMIN).await.unwrap();
    let snapshot = h.publisher.build_snapshot(ALICE).await;
    assert!(snapshot.roles.is_empty());
    assert!(!snapshot.can("manage-users"));
}
