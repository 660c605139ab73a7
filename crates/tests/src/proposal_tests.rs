use crate::fixtures::test_app::TestApp;
use serde_json::Value;

async fn propose(app: &TestApp, path: &str, token: &str, title: &str) -> (u16, Value) {
    let resp = app
        .auth_post(path, token)
        .json(&serde_json::json!({
            "title": title,
            "description": "From the retro",
            "priority": "LOW",
        }))
        .send()
        .await
        .unwrap();
    let code = resp.status().as_u16();
    (code, resp.json().await.unwrap_or(Value::Null))
}

#[tokio::test]
async fn member_proposal_becomes_task_on_approval() {
    let app = TestApp::spawn().await;
    let seed = app.seed_project().await;

    let (code, body) = propose(
        &app,
        &seed.path("/proposal"),
        &seed.member.access_token,
        "Write docs",
    )
    .await;
    assert_eq!(code, 201, "{body}");
    assert_eq!(body["outcome"], "proposed");
    assert_eq!(body["proposal"]["status"], "PENDING");
    let proposal_id = body["proposal"]["id"].as_str().unwrap().to_string();

    let tasks = app
        .get_json(&seed.path("/task"), &seed.admin.access_token)
        .await;
    assert_eq!(tasks.as_array().unwrap().len(), 1);

    let pending = app
        .get_json("/api/proposal/pending", &seed.admin.access_token)
        .await;
    assert_eq!(pending.as_array().unwrap().len(), 1);

    let resp = app
        .auth_post(
            &format!("/api/proposal/{proposal_id}/approve"),
            &seed.admin.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let approved: Value = resp.json().await.unwrap();
    assert_eq!(approved["proposal"]["status"], "APPROVED");
    assert_eq!(approved["task"]["title"], "Write docs");
    assert_eq!(approved["task"]["status"], "NEW");
    assert_eq!(approved["task"]["priority"], "LOW");
    assert_eq!(approved["task"]["creator_id"], seed.member.id);
    assert_eq!(
        approved["proposal"]["created_task_id"],
        approved["task"]["id"]
    );

    let tasks = app
        .get_json(&seed.path("/task"), &seed.admin.access_token)
        .await;
    assert_eq!(tasks.as_array().unwrap().len(), 2);

    let inbox = app
        .get_json("/api/notification", &seed.member.access_token)
        .await;
    assert!(
        inbox["items"]
            .as_array()
            .unwrap()
            .iter()
            .any(|n| n["notification_type"] == "TASK_PROPOSAL_APPROVED")
    );
}

#[tokio::test]
async fn admin_proposal_creates_task_directly() {
    let app = TestApp::spawn().await;
    let seed = app.seed_project().await;

    let (code, body) = propose(
        &app,
        &seed.path("/proposal"),
        &seed.admin.access_token,
        "Plan sprint",
    )
    .await;
    assert_eq!(code, 201);
    assert_eq!(body["outcome"], "created");
    assert_eq!(body["task"]["title"], "Plan sprint");

    let proposals = app
        .get_json(&seed.path("/proposal"), &seed.admin.access_token)
        .await;
    assert!(proposals.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn rejected_proposal_creates_nothing() {
    let app = TestApp::spawn().await;
    let seed = app.seed_project().await;

    let (_, body) = propose(
        &app,
        &seed.path("/proposal"),
        &seed.member.access_token,
        "Rewrite in COBOL",
    )
    .await;
    let proposal_id = body["proposal"]["id"].as_str().unwrap().to_string();
    let reject = format!("/api/proposal/{proposal_id}/reject");

    let resp = app
        .auth_post(&reject, &seed.admin.access_token)
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 422);

    let resp = app
        .auth_post(&reject, &seed.admin.access_token)
        .json(&serde_json::json!({ "reason": "Out of scope" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let rejected: Value = resp.json().await.unwrap();
    assert_eq!(rejected["status"], "REJECTED");
    assert_eq!(rejected["rejection_reason"], "Out of scope");
    assert!(rejected["created_task_id"].is_null());

    let resp = app
        .auth_post(
            &format!("/api/proposal/{proposal_id}/approve"),
            &seed.admin.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);

    let tasks = app
        .get_json(&seed.path("/task"), &seed.admin.access_token)
        .await;
    assert_eq!(tasks.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn viewers_cannot_propose() {
    let app = TestApp::spawn().await;
    let seed = app.seed_project().await;

    let (code, _) = propose(
        &app,
        &seed.path("/proposal"),
        &seed.viewer.access_token,
        "Nope",
    )
    .await;
    assert_eq!(code, 403);
}

async fn inbox_of(app: &TestApp, token: &str, kind: &str) -> Vec<Value> {
    app.get_json("/api/notification", token).await["items"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|n| n["notification_type"] == kind)
        .cloned()
        .collect()
}

#[tokio::test]
async fn proposal_notifies_every_admin_and_nobody_else() {
    let app = TestApp::spawn().await;
    let seed = app.seed_project().await;
    let erin = app.register_user("erin", "Erin").await;
    app.add_member(&seed.project_id, &seed.admin.access_token, &erin.id, "ADMIN")
        .await;

    let (code, _) = propose(
        &app,
        &seed.path("/proposal"),
        &seed.member.access_token,
        "Write docs",
    )
    .await;
    assert_eq!(code, 201);

    for admin in [&seed.admin, &erin] {
        let pending = inbox_of(&app, &admin.access_token, "TASK_PROPOSAL_PENDING").await;
        assert_eq!(pending.len(), 1, "{} should be told once", admin.username);
        assert!(pending[0]["message"].as_str().unwrap().contains("Write docs"));
    }
    for other in [&seed.member, &seed.viewer] {
        let pending = inbox_of(&app, &other.access_token, "TASK_PROPOSAL_PENDING").await;
        assert!(pending.is_empty(), "{} got an admin notice", other.username);
    }
}

#[tokio::test]
async fn rejection_reaches_the_proposer_with_reason() {
    let app = TestApp::spawn().await;
    let seed = app.seed_project().await;

    let (_, body) = propose(
        &app,
        &seed.path("/proposal"),
        &seed.member.access_token,
        "Rewrite in COBOL",
    )
    .await;
    let proposal_id = body["proposal"]["id"].as_str().unwrap().to_string();

    let resp = app
        .auth_post(
            &format!("/api/proposal/{proposal_id}/reject"),
            &seed.admin.access_token,
        )
        .json(&serde_json::json!({ "reason": "Out of scope" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let rejected = inbox_of(&app, &seed.member.access_token, "TASK_PROPOSAL_REJECTED").await;
    assert_eq!(rejected.len(), 1);
    assert!(rejected[0]["message"].as_str().unwrap().contains("Out of scope"));
    assert_eq!(rejected[0]["related_entity_id"], proposal_id.as_str());

    let leaked = inbox_of(&app, &seed.viewer.access_token, "TASK_PROPOSAL_REJECTED").await;
    assert!(leaked.is_empty());
}

#[tokio::test]
async fn members_cannot_review_proposals() {
    let app = TestApp::spawn().await;
    let seed = app.seed_project().await;

    let (_, body) = propose(
        &app,
        &seed.path("/proposal"),
        &seed.member.access_token,
        "Write docs",
    )
    .await;
    let proposal_id = body["proposal"]["id"].as_str().unwrap().to_string();

    let resp = app
        .auth_post(
            &format!("/api/proposal/{proposal_id}/approve"),
            &seed.member.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    let resp = app
        .auth_post(
            &format!("/api/proposal/{proposal_id}/reject"),
            &seed.member.access_token,
        )
        .json(&serde_json::json!({ "reason": "Changed my mind" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    let proposals = app
        .get_json(&seed.path("/proposal"), &seed.admin.access_token)
        .await;
    assert_eq!(proposals[0]["status"], "PENDING");
}

#[tokio::test]
async fn concurrent_proposal_approvals_create_one_task() {
    let app = TestApp::spawn().await;
    let seed = app.seed_project().await;

    let (_, body) = propose(
        &app,
        &seed.path("/proposal"),
        &seed.member.access_token,
        "Write docs",
    )
    .await;
    let proposal_id = body["proposal"]["id"].as_str().unwrap().to_string();
    let approve = format!("/api/proposal/{proposal_id}/approve");

    let (a, b) = tokio::join!(
        app.auth_post(&approve, &seed.admin.access_token).send(),
        app.auth_post(&approve, &seed.admin.access_token).send(),
    );
    let mut codes = vec![a.unwrap().status().as_u16(), b.unwrap().status().as_u16()];
    codes.sort();
    assert_eq!(codes, vec![200, 409]);

    let tasks = app
        .get_json(&seed.path("/task"), &seed.admin.access_token)
        .await;
    let titles: Vec<&str> = tasks
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Fix bug", "Write docs"]);
}
