mod common;

use axum::http::StatusCode;
use serde_json::json;
use std::sync::Arc;
use yamdb::domain::Role;

use common::{CapturingMailer, FailingMailer, spawn_app, spawn_app_with};

#[tokio::test]
async fn test_signup_then_activate_issues_working_token() {
    let app = spawn_app().await;

    let (status, json) = app
        .post(
            "/api/v1/auth/email",
            None,
            json!({ "email": "Neo@Zion.org", "username": "neo" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"], json!({ "email": "neo@zion.org", "username": "neo" }));
    assert_eq!(app.mailer.count(), 1);

    let sent = app.mailer.sent.lock().unwrap().last().cloned().unwrap();
    assert_eq!(sent.to, "neo@zion.org");

    let code = app.mailer.last_code().unwrap();
    let (status, json) = app
        .post(
            "/api/v1/auth/token",
            None,
            json!({ "email": "neo@zion.org", "confirmation_code": code }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = json["data"]["token"].as_str().unwrap().to_string();

    let (status, json) = app.get("/api/v1/users/me", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["username"], "neo");
    assert_eq!(json["data"]["role"], "user");

    // Codes are single use: activation changes what they are derived from.
    let (status, json) = app
        .post(
            "/api/v1/auth/token",
            None,
            json!({ "email": "neo@zion.org", "confirmation_code": code }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["field"], "confirmation_code");
}

#[tokio::test]
async fn test_wrong_code_keeps_account_inactive() {
    let app = spawn_app().await;
    app.post(
        "/api/v1/auth/email",
        None,
        json!({ "email": "trinity@zion.org", "username": "trinity" }),
    )
    .await;

    let (status, json) = app
        .post(
            "/api/v1/auth/token",
            None,
            json!({ "email": "trinity@zion.org", "confirmation_code": "000000000000000000000000" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["field"], "confirmation_code");

    let user = app
        .state
        .shared
        .store
        .get_user_by_email("trinity@zion.org")
        .await
        .unwrap()
        .unwrap();
    assert!(!user.is_active);

    let (status, _) = app
        .post(
            "/api/v1/auth/token",
            None,
            json!({ "email": "nobody@zion.org", "confirmation_code": "abc" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_repeated_signup_resends_and_clashes_conflict() {
    let app = spawn_app().await;
    let body = json!({ "email": "morpheus@zion.org", "username": "morpheus" });

    let (status, _) = app.post("/api/v1/auth/email", None, body.clone()).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.post("/api/v1/auth/email", None, body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.mailer.count(), 2);

    let (status, _) = app
        .post(
            "/api/v1/auth/email",
            None,
            json!({ "email": "morpheus@zion.org", "username": "other" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .post(
            "/api/v1/auth/email",
            None,
            json!({ "email": "other@zion.org", "username": "morpheus" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(app.mailer.count(), 2);
}

#[tokio::test]
async fn test_signup_validation_and_reserved_username() {
    let app = spawn_app().await;

    let (status, json) = app
        .post(
            "/api/v1/auth/email",
            None,
            json!({ "email": "me@zion.org", "username": "me" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["field"], "username");

    let (status, json) = app
        .post(
            "/api/v1/auth/email",
            None,
            json!({ "email": "not-an-email", "username": "tank" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["field"], "email");
    assert_eq!(app.mailer.count(), 0);
}

#[tokio::test]
async fn test_signup_reports_mail_failure() {
    let app = spawn_app_with(Arc::new(CapturingMailer::default()), Arc::new(FailingMailer)).await;

    let (status, json) = app
        .post(
            "/api/v1/auth/email",
            None,
            json!({ "email": "dozer@zion.org", "username": "dozer" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn test_authenticated_signup_is_forbidden() {
    let app = spawn_app().await;
    let token = app.user_with_role("apoc", Role::User).await;

    let (status, _) = app
        .post(
            "/api/v1/auth/email",
            Some(&token),
            json!({ "email": "switch@zion.org", "username": "switch" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_me_endpoints() {
    let app = spawn_app().await;
    let token = app.user_with_role("niobe", Role::User).await;

    let (status, _) = app.get("/api/v1/users/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, json) = app
        .patch(
            "/api/v1/users/me",
            Some(&token),
            json!({ "first_name": "Niobe", "bio": "Captain" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["first_name"], "Niobe");
    assert_eq!(json["data"]["bio"], "Captain");

    let (status, _) = app
        .patch("/api/v1/users/me", Some(&token), json!({ "role": "admin" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Sending the current role back is not an escalation.
    let (status, _) = app
        .patch("/api/v1/users/me", Some(&token), json!({ "role": "user" }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.delete("/api/v1/users/me", Some(&token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.delete("/api/v1/users/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get("/api/v1/users/me", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_admin_manages_users() {
    let app = spawn_app().await;
    let admin = app.admin().await;

    let (status, json) = app
        .post(
            "/api/v1/users",
            Some(&admin),
            json!({ "email": "ghost@zion.org", "username": "ghost", "role": "moderator" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["role"], "moderator");

    let (status, _) = app
        .post(
            "/api/v1/users",
            Some(&admin),
            json!({ "email": "ghost@zion.org", "username": "ghost2" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, json) = app.get("/api/v1/users", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"].as_array().unwrap().len(), 2);

    let (status, json) = app
        .patch("/api/v1/users/ghost", Some(&admin), json!({ "role": "user" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["role"], "user");

    let (status, json) = app.get("/api/v1/users/ghost", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["email"], "ghost@zion.org");

    let (status, _) = app.delete("/api/v1/users/ghost", Some(&admin)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.get("/api/v1/users/ghost", Some(&admin)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.delete("/api/v1/users/admin", Some(&admin)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_user_directory_is_admin_only() {
    let app = spawn_app().await;
    let user = app.user_with_role("cypher", Role::User).await;
    let moderator = app.user_with_role("link", Role::Moderator).await;

    for token in [&user, &moderator] {
        let (status, _) = app.get("/api/v1/users", Some(token)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = app.get("/api/v1/users/cypher", Some(token)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = app
            .post(
                "/api/v1/users",
                Some(token),
                json!({ "email": "x@zion.org", "username": "x" }),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    let (status, _) = app.get("/api/v1/users", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_password_login_and_token_refresh() {
    let app = spawn_app().await;
    app.state
        .accounts()
        .bootstrap_admin("oracle@zion.org", "oracle", "cookies-and-tea")
        .await
        .unwrap();

    let (status, _) = app
        .post(
            "/api/v1/token",
            None,
            json!({ "username": "oracle", "password": "wrong-password" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, json) = app
        .post(
            "/api/v1/token",
            None,
            json!({ "username": "oracle", "password": "cookies-and-tea" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = json["data"]["token"].as_str().unwrap().to_string();

    let (status, json) = app.get("/api/v1/users/me", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["role"], "admin");

    let (status, json) = app.post("/api/v1/auth/token/refresh", Some(&token), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let rotated = json["data"]["token"].as_str().unwrap().to_string();
    assert_ne!(rotated, token);

    let (status, _) = app.get("/api/v1/users/me", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.get("/api/v1/users/me", Some(&rotated)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.post("/api/v1/auth/token/refresh", None, json!({})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
