use crate::fixtures::test_app::TestApp;
use serde_json::Value;

#[tokio::test]
async fn creator_becomes_project_admin() {
    let app = TestApp::spawn().await;
    let alice = app.register_user("alice", "Alice").await;

    let resp = app
        .auth_post("/api/project", &alice.access_token)
        .json(&serde_json::json!({ "name": "Alpha" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);
    let project: Value = resp.json().await.unwrap();
    let project_id = project["id"].as_str().unwrap();
    assert_eq!(project["creator_id"], alice.id);

    let fetched = app
        .get_json(&format!("/api/project/{project_id}"), &alice.access_token)
        .await;
    assert_eq!(fetched["my_role"], "ADMIN");

    let members = app
        .get_json(
            &format!("/api/project/{project_id}/member"),
            &alice.access_token,
        )
        .await;
    let members = members.as_array().unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0]["user_id"], alice.id);
    assert_eq!(members[0]["role"], "ADMIN");
}

#[tokio::test]
async fn blank_project_name_is_rejected() {
    let app = TestApp::spawn().await;
    let alice = app.register_user("alice", "Alice").await;

    let resp = app
        .auth_post("/api/project", &alice.access_token)
        .json(&serde_json::json!({ "name": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 422);
}

#[tokio::test]
async fn projects_are_visible_to_members_only() {
    let app = TestApp::spawn().await;
    let seed = app.seed_project().await;
    let outsider = app.register_user("dave", "Dave").await;

    let listed = app
        .get_json("/api/project", &seed.viewer.access_token)
        .await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["name"], "Alpha");

    let listed = app.get_json("/api/project", &outsider.access_token).await;
    assert!(listed.as_array().unwrap().is_empty());

    let resp = app
        .auth_get(&seed.path(""), &outsider.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    let viewers = app
        .get_json(&seed.path("/member?role=VIEWER"), &seed.member.access_token)
        .await;
    let viewers = viewers.as_array().unwrap();
    assert_eq!(viewers.len(), 1);
    assert_eq!(viewers[0]["user_id"], seed.viewer.id);
    assert_eq!(viewers[0]["display_name"], "Carol");
}

#[tokio::test]
async fn adding_a_member_notifies_and_posts_to_chat() {
    let app = TestApp::spawn().await;
    let seed = app.seed_project().await;

    let inbox = app
        .get_json("/api/notification", &seed.viewer.access_token)
        .await;
    assert!(
        inbox["items"]
            .as_array()
            .unwrap()
            .iter()
            .any(|n| n["notification_type"] == "PROJECT_MEMBER_ADDED")
    );

    let chat = app
        .get_json(&seed.path("/message"), &seed.admin.access_token)
        .await;
    let texts: Vec<&str> = chat["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["content"].as_str().unwrap())
        .collect();
    assert!(texts.contains(&"Bob joined the project as MEMBER"), "{texts:?}");
    assert!(texts.contains(&"Carol joined the project as VIEWER"), "{texts:?}");
}

#[tokio::test]
async fn duplicate_membership_conflicts() {
    let app = TestApp::spawn().await;
    let seed = app.seed_project().await;

    let resp = app
        .auth_post(&seed.path("/member"), &seed.admin.access_token)
        .json(&serde_json::json!({ "user_id": seed.member.id, "role": "ADMIN" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);
}

#[tokio::test]
async fn only_admins_manage_members() {
    let app = TestApp::spawn().await;
    let seed = app.seed_project().await;
    let dave = app.register_user("dave", "Dave").await;

    let resp = app
        .auth_post(&seed.path("/member"), &seed.member.access_token)
        .json(&serde_json::json!({ "user_id": dave.id }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    let resp = app
        .auth_put(
            &seed.path(&format!("/member/{}", seed.viewer.id)),
            &seed.member.access_token,
        )
        .json(&serde_json::json!({ "role": "ADMIN" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);
}

#[tokio::test]
async fn promoting_a_viewer_unlocks_writes() {
    let app = TestApp::spawn().await;
    let seed = app.seed_project().await;

    let resp = app
        .auth_put(
            &seed.path(&format!("/member/{}", seed.viewer.id)),
            &seed.admin.access_token,
        )
        .json(&serde_json::json!({ "role": "MEMBER" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let member: Value = resp.json().await.unwrap();
    assert_eq!(member["role"], "MEMBER");

    let resp = app
        .auth_post(&seed.path("/task"), &seed.viewer.access_token)
        .json(&serde_json::json!({ "title": "Now allowed" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);

    let inbox = app
        .get_json("/api/notification", &seed.viewer.access_token)
        .await;
    assert!(
        inbox["items"]
            .as_array()
            .unwrap()
            .iter()
            .any(|n| n["notification_type"] == "PROJECT_ROLE_CHANGED")
    );
}

#[tokio::test]
async fn creator_cannot_be_demoted_or_removed() {
    let app = TestApp::spawn().await;
    let seed = app.seed_project().await;
    let creator_path = seed.path(&format!("/member/{}", seed.admin.id));

    let resp = app
        .auth_put(&creator_path, &seed.admin.access_token)
        .json(&serde_json::json!({ "role": "VIEWER" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 422);

    let resp = app
        .auth_delete(&creator_path, &seed.admin.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 422);
}

#[tokio::test]
async fn removed_member_loses_access() {
    let app = TestApp::spawn().await;
    let seed = app.seed_project().await;

    let resp = app
        .auth_delete(
            &seed.path(&format!("/member/{}", seed.member.id)),
            &seed.admin.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 204);

    let resp = app
        .auth_get(&seed.path("/task"), &seed.member.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    let inbox = app
        .get_json("/api/notification", &seed.member.access_token)
        .await;
    assert!(
        inbox["items"]
            .as_array()
            .unwrap()
            .iter()
            .any(|n| n["notification_type"] == "PROJECT_MEMBER_REMOVED")
    );

    let resp = app
        .auth_delete(
            &seed.path(&format!("/member/{}", seed.member.id)),
            &seed.admin.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}

#[tokio::test]
async fn deleted_project_disappears() {
    let app = TestApp::spawn().await;
    let seed = app.seed_project().await;

    let resp = app
        .auth_delete(&seed.path(""), &seed.member.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    let resp = app
        .auth_delete(&seed.path(""), &seed.admin.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 204);

    let resp = app
        .auth_get(&seed.path(""), &seed.admin.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);

    let listed = app.get_json("/api/project", &seed.admin.access_token).await;
    assert!(listed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn admin_updates_project_details() {
    let app = TestApp::spawn().await;
    let seed = app.seed_project().await;

    let resp = app
        .auth_put(&seed.path(""), &seed.admin.access_token)
        .json(&serde_json::json!({ "name": "Alpha v2", "description": "Renamed" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let project: Value = resp.json().await.unwrap();
    assert_eq!(project["name"], "Alpha v2");
    assert_eq!(project["description"], "Renamed");
}

#[tokio::test]
async fn removing_a_member_unassigns_their_tasks() {
    let app = TestApp::spawn().await;
    let seed = app.seed_project().await;

    let resp = app
        .auth_put(&seed.task_path(""), &seed.admin.access_token)
        .json(&serde_json::json!({ "assignee_ids": [seed.member.id] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let resp = app
        .auth_delete(
            &seed.path(&format!("/member/{}", seed.member.id)),
            &seed.admin.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 204);

    let task = app
        .get_json(&seed.task_path(""), &seed.admin.access_token)
        .await;
    assert!(task["assignee_id"].is_null());
    assert!(task["assignee_ids"].as_array().unwrap().is_empty());

    let resp = app
        .auth_post(&seed.task_path("/status"), &seed.admin.access_token)
        .json(&serde_json::json!({ "status": "COMPLETED" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let inbox = app
        .get_json("/api/notification", &seed.member.access_token)
        .await;
    assert!(
        !inbox["items"]
            .as_array()
            .unwrap()
            .iter()
            .any(|n| n["notification_type"] == "TASK_STATUS_CHANGED")
    );
}
