/// Integration tests for the SoftDesk API
///
/// These run against a real PostgreSQL database and are skipped when
/// `DATABASE_URL` is not set:
/// - Signup and login
/// - Project, contributor, issue and comment flows
/// - Contributor and author permissions
/// - List/detail projections and privacy redaction

mod common;

use axum::http::StatusCode;
use common::TestContext;
use serde_json::json;
use uuid::Uuid;

macro_rules! context_or_skip {
    () => {
        match TestContext::new().await {
            Some(ctx) => ctx,
            None => {
                eprintln!("DATABASE_URL not set, skipping");
                return;
            }
        }
    };
}

#[tokio::test]
async fn test_signup_and_login() {
    let ctx = context_or_skip!();
    let username = format!("ada_{}", Uuid::new_v4().simple());

    let (status, body) = common::send(
        &ctx.app,
        "POST",
        "/signup/",
        None,
        Some(json!({
            "username": username,
            "password": "orbital-rendezvous",
            "password2": "orbital-rendezvous",
            "age": 15,
            "can_be_contacted": false,
            "can_data_be_shared": false
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["username"], username.as_str());
    assert!(body.get("password").is_none());

    let (status, tokens) = common::send(
        &ctx.app,
        "POST",
        "/login/",
        None,
        Some(json!({ "username": username, "password": "orbital-rendezvous" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let access = tokens["access"].as_str().unwrap().to_string();
    let refresh = tokens["refresh"].as_str().unwrap().to_string();

    let (status, _) = common::send(&ctx.app, "GET", "/projects/", Some(&access), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = common::send(
        &ctx.app,
        "POST",
        "/refresh/",
        None,
        Some(json!({ "refresh": refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["access"].is_string());

    let (status, _) = common::send(
        &ctx.app,
        "POST",
        "/login/",
        None,
        Some(json!({ "username": username, "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_duplicate_username_rejected() {
    let ctx = context_or_skip!();
    let existing = ctx.user(true, true).await;

    let (status, body) = common::send(
        &ctx.app,
        "POST",
        "/signup/",
        None,
        Some(json!({
            "username": existing.user.username,
            "password": "orbital-rendezvous",
            "password2": "orbital-rendezvous",
            "age": 40
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "username");
}

#[tokio::test]
async fn test_project_author_is_contributor() {
    let ctx = context_or_skip!();
    let author = ctx.user(true, true).await;

    let project_id = ctx.project(&author).await;

    let (status, body) = ctx
        .send("GET", &format!("/projects/{}/contributors/", project_id), &author, None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let contributors = body.as_array().unwrap();
    assert_eq!(contributors.len(), 1);
    assert_eq!(contributors[0]["user"], author.id());
}

#[tokio::test]
async fn test_project_list_scoped_to_contributor() {
    let ctx = context_or_skip!();
    let author = ctx.user(true, true).await;
    let outsider = ctx.user(true, true).await;

    let project_id = ctx.project(&author).await;

    let (_, body) = ctx.send("GET", "/projects/", &outsider, None).await;
    let ids: Vec<i64> = body
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|p| p["id"].as_i64())
        .collect();
    assert!(!ids.contains(&project_id));

    let (_, body) = ctx.send("GET", "/projects/", &author, None).await;
    let listed = body
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["id"] == project_id)
        .cloned()
        .unwrap();
    assert!(listed.get("description").is_none());
    assert!(listed.get("issues").is_none());

    let (status, body) = ctx
        .send("GET", &format!("/projects/{}/", project_id), &author, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["description"], "Customer facing app");
    assert!(body["issues"].is_array());
}

#[tokio::test]
async fn test_outsider_forbidden() {
    let ctx = context_or_skip!();
    let author = ctx.user(true, true).await;
    let outsider = ctx.user(true, true).await;

    let project_id = ctx.project(&author).await;
    let issue_id = ctx.issue(project_id, &author).await;

    let uris = [
        format!("/projects/{}/", project_id),
        format!("/projects/{}/contributors/", project_id),
        format!("/projects/{}/issues/", project_id),
        format!("/projects/{}/issues/{}/", project_id, issue_id),
        format!("/projects/{}/issues/{}/comments/", project_id, issue_id),
    ];

    for uri in &uris {
        let (status, _) = ctx.send("GET", uri, &outsider, None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{}", uri);
    }

    let (status, _) = ctx
        .send(
            "POST",
            &format!("/projects/{}/issues/", project_id),
            &outsider,
            Some(json!({ "title": "Sneaky", "priority": "LOW", "tag": "TASK" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_only_issue_author_can_modify() {
    let ctx = context_or_skip!();
    let author = ctx.user(true, true).await;
    let colleague = ctx.user(true, true).await;

    let project_id = ctx.project(&author).await;
    ctx.add_contributor(project_id, &author, &colleague).await;
    let issue_id = ctx.issue(project_id, &author).await;
    let uri = format!("/projects/{}/issues/{}/", project_id, issue_id);

    // Reading is open to every contributor
    let (status, _) = ctx.send("GET", &uri, &colleague, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = ctx
        .send("PATCH", &uri, &colleague, Some(json!({ "status": "Finished" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .send(
            "PUT",
            &uri,
            &colleague,
            Some(json!({
                "title": "Renamed",
                "description": "",
                "priority": "LOW",
                "tag": "TASK",
                "status": "To Do",
                "assigned_to": colleague.id()
            })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // An incomplete PUT is refused for ownership, not for its missing fields
    let (status, body) = ctx
        .send("PUT", &uri, &colleague, Some(json!({ "title": "Renamed" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{}", body);

    let (status, _) = ctx.send("DELETE", &uri, &colleague, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = ctx
        .send(
            "PATCH",
            &uri,
            &author,
            Some(json!({ "status": "In Progress", "assigned_to": colleague.id() })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["status"], "In Progress");
    assert_eq!(body["assigned_to"], colleague.id());

    let (status, _) = ctx.send("DELETE", &uri, &author, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = ctx.send("GET", &uri, &author, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_issue_create_ignores_client_project_and_author() {
    let ctx = context_or_skip!();
    let author = ctx.user(true, true).await;
    let other = ctx.user(true, true).await;

    let project_id = ctx.project(&author).await;
    let other_project = ctx.project(&other).await;

    let (status, body) = ctx
        .send(
            "POST",
            &format!("/projects/{}/issues/", project_id),
            &author,
            Some(json!({
                "title": "Dark mode",
                "priority": "LOW",
                "tag": "FEATURE",
                "project": other_project,
                "author": other.id()
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["project"], project_id);
    assert_eq!(body["author"], author.id());
    assert_eq!(body["assigned_to"], author.id());
    assert_eq!(body["status"], "To Do");
}

#[tokio::test]
async fn test_assignee_must_be_contributor() {
    let ctx = context_or_skip!();
    let author = ctx.user(true, true).await;
    let outsider = ctx.user(true, true).await;

    let project_id = ctx.project(&author).await;

    let (status, body) = ctx
        .send(
            "POST",
            &format!("/projects/{}/issues/", project_id),
            &author,
            Some(json!({
                "title": "Broken build",
                "priority": "HIGH",
                "tag": "BUG",
                "assigned_to": outsider.id()
            })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "assigned_to");
}

#[tokio::test]
async fn test_issue_from_other_project_not_found() {
    let ctx = context_or_skip!();
    let author = ctx.user(true, true).await;

    let first = ctx.project(&author).await;
    let second = ctx.project(&author).await;
    let issue_id = ctx.issue(first, &author).await;

    let (status, _) = ctx
        .send("GET", &format!("/projects/{}/issues/{}/", second, issue_id), &author, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .send(
            "GET",
            &format!("/projects/{}/issues/{}/comments/", second, issue_id),
            &author,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_comment_projection_and_ownership() {
    let ctx = context_or_skip!();
    let author = ctx.user(true, true).await;
    let colleague = ctx.user(true, true).await;

    let project_id = ctx.project(&author).await;
    ctx.add_contributor(project_id, &author, &colleague).await;
    let issue_id = ctx.issue(project_id, &author).await;
    let comments_uri = format!("/projects/{}/issues/{}/comments/", project_id, issue_id);

    let (status, created) = ctx
        .send(
            "POST",
            &comments_uri,
            &colleague,
            Some(json!({ "text": "Reproduced on staging", "author": author.id() })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", created);
    assert_eq!(created["author"], colleague.id());
    assert_eq!(created["issue"], issue_id);
    assert!(created["unique_identifier"].is_string());

    let comment_id = created["id"].as_i64().unwrap();
    let comment_uri = format!("{}{}/", comments_uri, comment_id);

    let (_, listed) = ctx.send("GET", &comments_uri, &author, None).await;
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert!(listed[0].get("text").is_none());
    assert_eq!(listed[0]["unique_identifier"], created["unique_identifier"]);

    let (status, detail) = ctx.send("GET", &comment_uri, &author, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["text"], "Reproduced on staging");

    let (status, _) = ctx
        .send("PATCH", &comment_uri, &author, Some(json!({ "text": "Hijacked" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx.send("PUT", &comment_uri, &author, Some(json!({}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = ctx.send("PUT", &comment_uri, &colleague, Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "text");

    let (status, body) = ctx
        .send("PUT", &comment_uri, &colleague, Some(json!({ "text": "Fixed in 1.2" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], "Fixed in 1.2");

    let (status, _) = ctx.send("DELETE", &comment_uri, &colleague, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_contributor_management() {
    let ctx = context_or_skip!();
    let author = ctx.user(true, true).await;
    let colleague = ctx.user(true, true).await;
    let newcomer = ctx.user(true, true).await;

    let project_id = ctx.project(&author).await;
    ctx.add_contributor(project_id, &author, &colleague).await;

    // Any contributor may add members
    ctx.add_contributor(project_id, &colleague, &newcomer).await;

    let contributors_uri = format!("/projects/{}/contributors/", project_id);

    let (status, body) = ctx
        .send("POST", &contributors_uri, &author, Some(json!({ "user": newcomer.id() })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "user");

    let (status, body) = ctx
        .send("POST", &contributors_uri, &author, Some(json!({ "user": i64::MAX })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "user");

    let (_, listed) = ctx.send("GET", &contributors_uri, &author, None).await;
    let rows = listed.as_array().unwrap().clone();
    assert_eq!(rows.len(), 3);

    let row_of = |user_id: i64| {
        rows.iter()
            .find(|row| row["user"] == user_id)
            .and_then(|row| row["id"].as_i64())
            .unwrap()
    };

    let newcomer_uri = format!("{}{}/", contributors_uri, row_of(newcomer.id()));
    let (status, _) = ctx.send("DELETE", &newcomer_uri, &colleague, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx.send("DELETE", &newcomer_uri, &author, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let author_uri = format!("{}{}/", contributors_uri, row_of(author.id()));
    let (status, _) = ctx.send("DELETE", &author_uri, &author, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = ctx
        .send("GET", &format!("/projects/{}/", project_id), &newcomer, None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_only_project_author_can_modify_project() {
    let ctx = context_or_skip!();
    let author = ctx.user(true, true).await;
    let colleague = ctx.user(true, true).await;

    let project_id = ctx.project(&author).await;
    ctx.add_contributor(project_id, &author, &colleague).await;
    let uri = format!("/projects/{}/", project_id);

    let (status, _) = ctx
        .send("PATCH", &uri, &colleague, Some(json!({ "name": "Taken over" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .send("PUT", &uri, &colleague, Some(json!({ "name": "Taken over" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = ctx
        .send("PUT", &uri, &author, Some(json!({ "name": "Renamed" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let missing: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|d| d["field"].as_str())
        .collect();
    assert_eq!(missing, vec!["description", "project_type"]);

    let (status, body) = ctx
        .send("PATCH", &uri, &author, Some(json!({ "project_type": "ANDROID" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["project_type"], "ANDROID");
    assert_eq!(body["name"], "Mobile app");

    let (status, _) = ctx.send("DELETE", &uri, &author, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_user_redaction_and_self_service() {
    let ctx = context_or_skip!();
    let private = ctx.user(false, false).await;
    let viewer = ctx.user(true, true).await;
    let uri = format!("/users/{}/", private.id());

    let (status, body) = ctx.send("GET", &uri, &viewer, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["username"].is_null());
    assert!(body["age"].is_null());
    assert!(body["email"].is_null());

    let (_, body) = ctx.send("GET", &uri, &private, None).await;
    assert_eq!(body["username"], private.user.username.as_str());
    assert!(body["email"].is_string());

    let (status, _) = ctx
        .send("PATCH", &uri, &viewer, Some(json!({ "age": 50 })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx.send("PUT", &uri, &viewer, Some(json!({}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = ctx
        .send("PATCH", &uri, &private, Some(json!({ "age": 14 })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "age");

    let (status, body) = ctx
        .send("PATCH", &uri, &private, Some(json!({ "can_data_be_shared": true })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], private.id());

    let (_, body) = ctx.send("GET", &uri, &viewer, None).await;
    assert_eq!(body["username"], private.user.username.as_str());
    assert!(body["email"].is_null());
}

#[tokio::test]
async fn test_superuser_reads_without_membership_but_cannot_edit() {
    let ctx = context_or_skip!();
    let author = ctx.user(true, true).await;
    let admin = ctx.superuser().await;

    let project_id = ctx.project(&author).await;
    let issue_id = ctx.issue(project_id, &author).await;
    let issues_uri = format!("/projects/{}/issues/", project_id);
    let issue_uri = format!("/projects/{}/issues/{}/", project_id, issue_id);

    let (status, _) = ctx.send("GET", &format!("/projects/{}/", project_id), &admin, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = ctx.send("GET", &issues_uri, &admin, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = ctx.send("GET", &issue_uri, &admin, None).await;
    assert_eq!(status, StatusCode::OK);

    // Membership is waived, authorship is not
    let (status, _) = ctx
        .send("PATCH", &issue_uri, &admin, Some(json!({ "status": "Finished" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Not a contributor, so the issue falls to the project author
    let (status, body) = ctx
        .send(
            "POST",
            &issues_uri,
            &admin,
            Some(json!({ "title": "Audit", "priority": "LOW", "tag": "TASK" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["author"], admin.id());
    assert_eq!(body["assigned_to"], author.id());

    let (status, body) = ctx
        .send(
            "POST",
            &issues_uri,
            &admin,
            Some(json!({ "title": "Audit", "priority": "LOW", "tag": "TASK", "assigned_to": admin.id() })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "assigned_to");
}
