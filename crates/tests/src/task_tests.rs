use crate::fixtures::test_app::TestApp;
use serde_json::Value;

#[tokio::test]
async fn members_create_and_list_tasks() {
    let app = TestApp::spawn().await;
    let seed = app.seed_project().await;

    let resp = app
        .auth_post(&seed.path("/task"), &seed.member.access_token)
        .json(&serde_json::json!({
            "title": "Add logging",
            "deadline": "2030-01-15T12:00:00Z",
            "assignee_ids": [seed.admin.id],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);
    let task: Value = resp.json().await.unwrap();
    assert_eq!(task["status"], "NEW");
    assert_eq!(task["priority"], "MEDIUM");
    assert_eq!(task["creator_id"], seed.member.id);
    assert!(task["deadline"].as_str().unwrap().starts_with("2030-01-15"));

    let all = app
        .get_json(&seed.path("/task"), &seed.viewer.access_token)
        .await;
    assert_eq!(all.as_array().unwrap().len(), 2);

    let mine = app
        .get_json(
            &seed.path(&format!("/task?assignee_id={}", seed.member.id)),
            &seed.viewer.access_token,
        )
        .await;
    let mine = mine.as_array().unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["title"], "Fix bug");

    let new_tasks = app
        .get_json(&seed.path("/task?status=NEW"), &seed.viewer.access_token)
        .await;
    assert_eq!(new_tasks.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn assignees_must_be_project_members() {
    let app = TestApp::spawn().await;
    let seed = app.seed_project().await;
    let outsider = app.register_user("dave", "Dave").await;

    let resp = app
        .auth_post(&seed.path("/task"), &seed.admin.access_token)
        .json(&serde_json::json!({ "title": "Secret", "assignee_id": outsider.id }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 422);
}

#[tokio::test]
async fn viewers_cannot_create_or_edit() {
    let app = TestApp::spawn().await;
    let seed = app.seed_project().await;

    let resp = app
        .auth_post(&seed.path("/task"), &seed.viewer.access_token)
        .json(&serde_json::json!({ "title": "Sneaky" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    let resp = app
        .auth_put(&seed.task_path(""), &seed.viewer.access_token)
        .json(&serde_json::json!({ "title": "Renamed" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);
}

#[tokio::test]
async fn update_ignores_status_and_reassigns() {
    let app = TestApp::spawn().await;
    let seed = app.seed_project().await;

    let resp = app
        .auth_put(&seed.task_path(""), &seed.member.access_token)
        .json(&serde_json::json!({
            "title": "Fix the login bug",
            "status": "COMPLETED",
            "assignee_id": seed.admin.id,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let task: Value = resp.json().await.unwrap();
    assert_eq!(task["title"], "Fix the login bug");
    assert_eq!(task["status"], "NEW");
    assert_eq!(task["assignee_id"], seed.admin.id);

    let inbox = app
        .get_json("/api/notification", &seed.admin.access_token)
        .await;
    assert!(
        inbox["items"]
            .as_array()
            .unwrap()
            .iter()
            .any(|n| n["notification_type"] == "TASK_ASSIGNED")
    );

    let resp = app
        .auth_put(&seed.task_path(""), &seed.member.access_token)
        .json(&serde_json::json!({ "assignee_id": null }))
        .send()
        .await
        .unwrap();
    let task: Value = resp.json().await.unwrap();
    assert!(task["assignee_id"].is_null());
}

#[tokio::test]
async fn deleting_a_task_drops_its_comments_and_requests() {
    let app = TestApp::spawn().await;
    let seed = app.seed_project().await;

    let resp = app
        .auth_post(&seed.task_path("/comment"), &seed.member.access_token)
        .json(&serde_json::json!({ "content": "On it" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);
    let resp = app
        .auth_post(&seed.task_path("/status"), &seed.member.access_token)
        .json(&serde_json::json!({ "status": "IN_PROGRESS" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);

    let resp = app
        .auth_delete(&seed.task_path(""), &seed.admin.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 204);

    let resp = app
        .auth_get(&seed.task_path(""), &seed.admin.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);

    let pending = app
        .get_json("/api/status-request/pending", &seed.admin.access_token)
        .await;
    assert!(pending.as_array().unwrap().is_empty());

    use bson::doc;
    let comments = app
        .db
        .collection::<bson::Document>("comments")
        .count_documents(doc! {})
        .await
        .unwrap();
    assert_eq!(comments, 0);
}

#[tokio::test]
async fn comments_can_be_removed_by_author_or_admin_only() {
    let app = TestApp::spawn().await;
    let seed = app.seed_project().await;
    let extra = app.register_user("erin", "Erin").await;
    app.add_member(&seed.project_id, &seed.admin.access_token, &extra.id, "MEMBER")
        .await;

    let resp = app
        .auth_post(&seed.task_path("/comment"), &seed.member.access_token)
        .json(&serde_json::json!({ "content": "Repro steps attached" }))
        .send()
        .await
        .unwrap();
    let comment: Value = resp.json().await.unwrap();
    let comment_path = seed.task_path(&format!("/comment/{}", comment["id"].as_str().unwrap()));

    let resp = app
        .auth_delete(&comment_path, &extra.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    let resp = app
        .auth_delete(&comment_path, &seed.admin.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 204);

    let comments = app
        .get_json(&seed.task_path("/comment"), &seed.viewer.access_token)
        .await;
    assert!(comments.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn task_from_another_project_is_not_found() {
    let app = TestApp::spawn().await;
    let seed = app.seed_project().await;

    let resp = app
        .auth_post("/api/project", &seed.admin.access_token)
        .json(&serde_json::json!({ "name": "Beta" }))
        .send()
        .await
        .unwrap();
    let other: Value = resp.json().await.unwrap();
    let other_id = other["id"].as_str().unwrap();

    let resp = app
        .auth_get(
            &format!("/api/project/{other_id}/task/{}", seed.task_id),
            &seed.admin.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}
