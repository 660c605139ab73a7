use crate::fixtures::test_app::TestApp;
use serde_json::Value;

async fn request_status(app: &TestApp, path: &str, token: &str, status: &str) -> (u16, Value) {
    let resp = app
        .auth_post(path, token)
        .json(&serde_json::json!({ "status": status }))
        .send()
        .await
        .unwrap();
    let code = resp.status().as_u16();
    (code, resp.json().await.unwrap_or(Value::Null))
}

async fn notifications(app: &TestApp, token: &str) -> Vec<Value> {
    app.get_json("/api/notification", token).await["items"]
        .as_array()
        .unwrap()
        .clone()
}

fn has_type(list: &[Value], kind: &str) -> bool {
    list.iter().any(|n| n["notification_type"] == kind)
}

#[tokio::test]
async fn member_request_waits_for_admin_approval() {
    let app = TestApp::spawn().await;
    let seed = app.seed_project().await;

    let (code, body) = request_status(
        &app,
        &seed.task_path("/status"),
        &seed.member.access_token,
        "IN_PROGRESS",
    )
    .await;
    assert_eq!(code, 201, "{body}");
    assert_eq!(body["outcome"], "requested");
    assert_eq!(body["request"]["status"], "PENDING");
    assert_eq!(body["request"]["current_status"], "NEW");
    assert_eq!(body["request"]["requested_status"], "IN_PROGRESS");

    // Task is untouched until an admin decides.
    let task = app
        .get_json(&seed.task_path(""), &seed.member.access_token)
        .await;
    assert_eq!(task["status"], "NEW");

    let admin_inbox = notifications(&app, &seed.admin.access_token).await;
    assert!(has_type(&admin_inbox, "STATUS_CHANGE_PENDING"));

    let pending = app
        .get_json("/api/status-request/pending", &seed.admin.access_token)
        .await;
    let pending = pending.as_array().unwrap();
    assert_eq!(pending.len(), 1);
    let request_id = pending[0]["id"].as_str().unwrap().to_string();

    let resp = app
        .auth_post(
            &format!("/api/status-request/{request_id}/approve"),
            &seed.admin.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let approved: Value = resp.json().await.unwrap();
    assert_eq!(approved["status"], "APPROVED");
    assert_eq!(approved["reviewed_by"], seed.admin.id);

    let task = app
        .get_json(&seed.task_path(""), &seed.member.access_token)
        .await;
    assert_eq!(task["status"], "IN_PROGRESS");

    let member_inbox = notifications(&app, &seed.member.access_token).await;
    assert!(has_type(&member_inbox, "STATUS_CHANGE_APPROVED"));

    let chat = app
        .get_json(&seed.path("/message"), &seed.member.access_token)
        .await;
    let system_note = chat["items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|m| m["is_system"] == true && m["content"].as_str().unwrap().contains("approved by Alice"));
    assert!(system_note.is_some(), "missing system message: {chat}");

    let pending = app
        .get_json("/api/status-request/pending", &seed.admin.access_token)
        .await;
    assert!(pending.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn admin_change_applies_immediately_and_informs_assignee() {
    let app = TestApp::spawn().await;
    let seed = app.seed_project().await;

    let (code, body) = request_status(
        &app,
        &seed.task_path("/status"),
        &seed.admin.access_token,
        "COMPLETED",
    )
    .await;
    assert_eq!(code, 200, "{body}");
    assert_eq!(body["outcome"], "applied");
    assert_eq!(body["task"]["status"], "COMPLETED");

    let pending = app
        .get_json("/api/status-request/pending", &seed.admin.access_token)
        .await;
    assert!(pending.as_array().unwrap().is_empty());

    let history = app
        .get_json(&seed.task_path("/status-request"), &seed.admin.access_token)
        .await;
    assert!(history.as_array().unwrap().is_empty());

    let member_inbox = notifications(&app, &seed.member.access_token).await;
    assert!(has_type(&member_inbox, "TASK_STATUS_CHANGED"));
}

#[tokio::test]
async fn rejection_needs_a_reason_and_leaves_task_alone() {
    let app = TestApp::spawn().await;
    let seed = app.seed_project().await;

    let (_, body) = request_status(
        &app,
        &seed.task_path("/status"),
        &seed.member.access_token,
        "COMPLETED",
    )
    .await;
    let request_id = body["request"]["id"].as_str().unwrap().to_string();
    let reject_path = format!("/api/status-request/{request_id}/reject");

    let resp = app
        .auth_post(&reject_path, &seed.admin.access_token)
        .json(&serde_json::json!({ "reason": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 422);

    let history = app
        .get_json(&seed.task_path("/status-request"), &seed.member.access_token)
        .await;
    assert_eq!(history[0]["status"], "PENDING");

    let resp = app
        .auth_post(&reject_path, &seed.admin.access_token)
        .json(&serde_json::json!({ "reason": "  Tests are still failing " }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let rejected: Value = resp.json().await.unwrap();
    assert_eq!(rejected["status"], "REJECTED");
    assert_eq!(rejected["rejection_reason"], "  Tests are still failing ");

    let task = app
        .get_json(&seed.task_path(""), &seed.member.access_token)
        .await;
    assert_eq!(task["status"], "NEW");

    let inbox = notifications(&app, &seed.member.access_token).await;
    let notice = inbox
        .iter()
        .find(|n| n["notification_type"] == "STATUS_CHANGE_REJECTED")
        .expect("rejection notice");
    assert!(
        notice["message"]
            .as_str()
            .unwrap()
            .contains("Tests are still failing")
    );
}

#[tokio::test]
async fn resolved_requests_stay_resolved() {
    let app = TestApp::spawn().await;
    let seed = app.seed_project().await;

    let (_, body) = request_status(
        &app,
        &seed.task_path("/status"),
        &seed.member.access_token,
        "IN_PROGRESS",
    )
    .await;
    let request_id = body["request"]["id"].as_str().unwrap().to_string();
    let approve = format!("/api/status-request/{request_id}/approve");

    let first = app
        .auth_post(&approve, &seed.admin.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(first.status().as_u16(), 200);

    let again = app
        .auth_post(&approve, &seed.admin.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(again.status().as_u16(), 409);

    let reject = app
        .auth_post(
            &format!("/api/status-request/{request_id}/reject"),
            &seed.admin.access_token,
        )
        .json(&serde_json::json!({ "reason": "changed my mind" }))
        .send()
        .await
        .unwrap();
    assert_eq!(reject.status().as_u16(), 409);

    let history = app
        .get_json(&seed.task_path("/status-request"), &seed.admin.access_token)
        .await;
    assert_eq!(history[0]["status"], "APPROVED");
    assert!(history[0]["rejection_reason"].is_null());
}

#[tokio::test]
async fn concurrent_approvals_resolve_exactly_once() {
    let app = TestApp::spawn().await;
    let seed = app.seed_project().await;

    let (_, body) = request_status(
        &app,
        &seed.task_path("/status"),
        &seed.member.access_token,
        "IN_PROGRESS",
    )
    .await;
    let request_id = body["request"]["id"].as_str().unwrap().to_string();
    let approve = format!("/api/status-request/{request_id}/approve");

    let (a, b) = tokio::join!(
        app.auth_post(&approve, &seed.admin.access_token).send(),
        app.auth_post(&approve, &seed.admin.access_token).send(),
    );
    let mut codes = vec![a.unwrap().status().as_u16(), b.unwrap().status().as_u16()];
    codes.sort();
    assert_eq!(codes, vec![200, 409]);

    let inbox = notifications(&app, &seed.member.access_token).await;
    let approvals = inbox
        .iter()
        .filter(|n| n["notification_type"] == "STATUS_CHANGE_APPROVED")
        .count();
    assert_eq!(approvals, 1);
}

#[tokio::test]
async fn viewers_and_outsiders_cannot_request_changes() {
    let app = TestApp::spawn().await;
    let seed = app.seed_project().await;
    let outsider = app.register_user("dave", "Dave").await;

    let (code, _) = request_status(
        &app,
        &seed.task_path("/status"),
        &seed.viewer.access_token,
        "IN_PROGRESS",
    )
    .await;
    assert_eq!(code, 403);

    let (code, _) = request_status(
        &app,
        &seed.task_path("/status"),
        &outsider.access_token,
        "IN_PROGRESS",
    )
    .await;
    assert_eq!(code, 403);

    let history = app
        .get_json(&seed.task_path("/status-request"), &seed.admin.access_token)
        .await;
    assert!(history.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn members_cannot_review_requests() {
    let app = TestApp::spawn().await;
    let seed = app.seed_project().await;

    let (_, body) = request_status(
        &app,
        &seed.task_path("/status"),
        &seed.member.access_token,
        "CANCELLED",
    )
    .await;
    let request_id = body["request"]["id"].as_str().unwrap().to_string();

    let resp = app
        .auth_post(
            &format!("/api/status-request/{request_id}/approve"),
            &seed.member.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    let pending = app
        .get_json("/api/status-request/pending", &seed.member.access_token)
        .await;
    assert!(pending.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn unknown_status_is_rejected() {
    let app = TestApp::spawn().await;
    let seed = app.seed_project().await;

    let (code, _) = request_status(
        &app,
        &seed.task_path("/status"),
        &seed.member.access_token,
        "ARCHIVED",
    )
    .await;
    assert_eq!(code, 422);
}

#[tokio::test]
async fn super_admin_reviews_without_membership() {
    let app = TestApp::spawn().await;
    let seed = app.seed_project().await;
    let root = app.register_super_admin().await;

    let (_, body) = request_status(
        &app,
        &seed.task_path("/status"),
        &seed.member.access_token,
        "IN_PROGRESS",
    )
    .await;
    let request_id = body["request"]["id"].as_str().unwrap().to_string();

    let pending = app
        .get_json("/api/status-request/pending", &root.access_token)
        .await;
    assert_eq!(pending.as_array().unwrap().len(), 1);

    let resp = app
        .auth_post(
            &format!("/api/status-request/{request_id}/approve"),
            &root.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let task = app.get_json(&seed.task_path(""), &root.access_token).await;
    assert_eq!(task["status"], "IN_PROGRESS");
}

#[tokio::test]
async fn history_lists_requests_oldest_first() {
    let app = TestApp::spawn().await;
    let seed = app.seed_project().await;

    for status in ["IN_PROGRESS", "COMPLETED"] {
        let (code, _) = request_status(
            &app,
            &seed.task_path("/status"),
            &seed.member.access_token,
            status,
        )
        .await;
        assert_eq!(code, 201);
    }

    let history = app
        .get_json(&seed.task_path("/status-request"), &seed.viewer.access_token)
        .await;
    let requested: Vec<&str> = history
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["requested_status"].as_str().unwrap())
        .collect();
    assert_eq!(requested, vec!["IN_PROGRESS", "COMPLETED"]);
}

#[tokio::test]
async fn approval_tells_other_assignees_about_the_new_status() {
    let app = TestApp::spawn().await;
    let seed = app.seed_project().await;
    let dave = app.register_user("dave", "Dave").await;
    app.add_member(&seed.project_id, &seed.admin.access_token, &dave.id, "MEMBER")
        .await;

    let resp = app
        .auth_put(&seed.task_path(""), &seed.admin.access_token)
        .json(&serde_json::json!({ "assignee_ids": [dave.id] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let (_, body) = request_status(
        &app,
        &seed.task_path("/status"),
        &seed.member.access_token,
        "IN_PROGRESS",
    )
    .await;
    let request_id = body["request"]["id"].as_str().unwrap().to_string();

    let resp = app
        .auth_post(
            &format!("/api/status-request/{request_id}/approve"),
            &seed.admin.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let dave_inbox = notifications(&app, &dave.access_token).await;
    let changed: Vec<&Value> = dave_inbox
        .iter()
        .filter(|n| n["notification_type"] == "TASK_STATUS_CHANGED")
        .collect();
    assert_eq!(changed.len(), 1);
    assert!(changed[0]["message"].as_str().unwrap().contains("IN_PROGRESS"));
    assert!(!has_type(&dave_inbox, "STATUS_CHANGE_APPROVED"));

    let bob_inbox = notifications(&app, &seed.member.access_token).await;
    assert!(has_type(&bob_inbox, "STATUS_CHANGE_APPROVED"));
    assert!(!has_type(&bob_inbox, "TASK_STATUS_CHANGED"));
}
