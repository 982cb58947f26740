use anyhow::Result;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use wiremock::{
    matchers::{header, method, path},
    Mock, ResponseTemplate,
};

use crate::helpers::{TestApp, COMMIT_PATH, TOKEN_PATH};

async fn message(res: reqwest::Response) -> Result<String> {
    let body: Value = res.json().await?;
    let message = body["message"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("response without a message: {body}"))?;
    Ok(message.to_string())
}

async fn mount_commit_ok(app: &TestApp, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path(COMMIT_PATH))
        .and(header("Authorization", "Bearer ya29.test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "writeResults": [{ "updateTime": "2026-10-18T10:00:00.000000Z" }],
            "commitTime": "2026-10-18T10:00:00.000000Z"
        })))
        .expect(expected_calls)
        .mount(&app.store_server)
        .await;
}

#[tokio::test]
async fn submit_form_valid_email_ok() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.mount_token_endpoint().await;
    mount_commit_ok(&app, 1).await;

    let res = app
        .post_submit_form(&json!({ "email": "user@example.com" }))
        .await?;

    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(message(res).await?, "Email saved successfully");

    assert_eq!(app.committed_emails().await?, vec!["user@example.com"]);

    Ok(())
}

#[tokio::test]
async fn submit_form_writes_a_server_timestamp() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.mount_token_endpoint().await;
    mount_commit_ok(&app, 1).await;

    let res = app
        .post_submit_form(&json!({ "email": "user@example.com" }))
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let requests = app
        .store_server
        .received_requests()
        .await
        .unwrap_or_default();
    let commit = requests
        .iter()
        .find(|r| r.url.path() == COMMIT_PATH)
        .ok_or_else(|| anyhow::anyhow!("no commit request"))?;
    let body: Value = serde_json::from_slice(&commit.body)?;
    let write = &body["writes"][0];

    assert_eq!(
        write["updateTransforms"],
        json!([{ "fieldPath": "timestamp", "setToServerValue": "REQUEST_TIME" }])
    );
    assert_eq!(write["currentDocument"], json!({ "exists": false }));
    assert!(write["update"]["name"]
        .as_str()
        .is_some_and(|name| name.contains("/documents/emails/")));

    Ok(())
}

#[tokio::test]
async fn submit_form_non_post_is_405() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.mount_token_endpoint().await;
    mount_commit_ok(&app, 0).await;

    for method in [Method::GET, Method::PUT, Method::PATCH, Method::DELETE] {
        let res = app.request_submit_form(method.clone()).await?;

        assert_eq!(
            res.status(),
            StatusCode::METHOD_NOT_ALLOWED,
            "Wrong response StatusCode for: {method}"
        );
        assert_eq!(message(res).await?, "Method Not Allowed");
    }

    Ok(())
}

#[tokio::test]
async fn submit_form_missing_email_is_400() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.mount_token_endpoint().await;
    mount_commit_ok(&app, 0).await;

    let cases = [
        (json!({}), "Empty json"),
        (json!({ "email": "" }), "Empty email"),
        (json!({ "email": null }), "Null email"),
        (json!({ "name": "Ursula Le Guin" }), "Missing email"),
    ];

    for (body, description) in cases {
        let res = app.post_submit_form(&body).await?;
        assert_eq!(
            res.status(),
            StatusCode::BAD_REQUEST,
            "The API did not return a 400 BAD REQUEST when the payload was: {description}"
        );
        assert_eq!(message(res).await?, "Email is required", "{description}");
    }

    for raw in ["", "not json"] {
        let res = app.post_raw_submit_form(raw).await?;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "raw body: {raw:?}");
        assert_eq!(message(res).await?, "Email is required");
    }

    for email in [json!(false), json!(0)] {
        let res = app.post_submit_form(&json!({ "email": email })).await?;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "email: {email}");
        assert_eq!(message(res).await?, "Email is required", "{email}");
    }

    Ok(())
}

#[tokio::test]
async fn submit_form_body_not_declared_as_json_is_400() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.mount_token_endpoint().await;
    mount_commit_ok(&app, 0).await;

    let body = r#"{"email": "user@example.com"}"#;
    for content_type in ["text/plain", "application/x-www-form-urlencoded"] {
        let res = app.post_submit_form_as(content_type, body).await?;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{content_type}");
        assert_eq!(message(res).await?, "Email is required", "{content_type}");
    }

    Ok(())
}

#[tokio::test]
async fn submit_form_invalid_email_is_400() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.mount_token_endpoint().await;
    mount_commit_ok(&app, 0).await;

    let cases = [
        "no-at-sign.com",
        "missing-domain@",
        "has space@x.com",
        "@example.com",
        "user@localhost",
    ];

    for email in cases {
        let res = app.post_submit_form(&json!({ "email": email })).await?;
        assert_eq!(
            res.status(),
            StatusCode::BAD_REQUEST,
            "The API did not return a 400 BAD REQUEST for: {email}"
        );
        assert_eq!(message(res).await?, "Invalid email format", "{email}");
    }

    for email in [json!(42), json!(true)] {
        let res = app.post_submit_form(&json!({ "email": email })).await?;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "email: {email}");
        assert_eq!(message(res).await?, "Invalid email format", "{email}");
    }

    Ok(())
}

#[tokio::test]
async fn submit_form_missing_service_account_key_is_500() -> Result<()> {
    let app = TestApp::spawn_without_key().await?;
    Mock::given(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.store_server)
        .await;
    mount_commit_ok(&app, 0).await;

    let res = app
        .post_submit_form(&json!({ "email": "user@example.com" }))
        .await?;

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        message(res).await?,
        "Firebase service account key is missing."
    );
    assert!(app.committed_emails().await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn submit_form_checks_input_before_the_key() -> Result<()> {
    let app = TestApp::spawn_without_key().await?;

    let res = app.post_submit_form(&json!({ "email": "nope" })).await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app.request_submit_form(Method::GET).await?;
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);

    Ok(())
}

#[tokio::test]
async fn submit_form_store_failure_is_500() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.mount_token_endpoint().await;

    Mock::given(path(COMMIT_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": { "code": 403, "status": "PERMISSION_DENIED" }
        })))
        .expect(1)
        .mount(&app.store_server)
        .await;

    let res = app
        .post_submit_form(&json!({ "email": "user@example.com" }))
        .await?;

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let message = message(res).await?;
    assert_eq!(message, "Internal Server Error");
    assert!(!message.contains("PERMISSION_DENIED"));

    Ok(())
}

#[tokio::test]
async fn submit_form_token_failure_is_500() -> Result<()> {
    let app = TestApp::spawn().await?;

    Mock::given(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant"
        })))
        .mount(&app.store_server)
        .await;
    mount_commit_ok(&app, 0).await;

    let res = app
        .post_submit_form(&json!({ "email": "user@example.com" }))
        .await?;

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(message(res).await?, "Internal Server Error");

    Ok(())
}

#[tokio::test]
async fn submit_form_recovers_after_a_store_failure() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.mount_token_endpoint().await;

    Mock::given(path(COMMIT_PATH))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&app.store_server)
        .await;
    mount_commit_ok(&app, 1).await;

    let body = json!({ "email": "user@example.com" });
    let first = app.post_submit_form(&body).await?;
    let second = app.post_submit_form(&body).await?;

    // No retry inside the app, the caller has to resubmit.
    assert_eq!(first.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(second.status(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn submit_form_same_email_twice_writes_two_records() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.mount_token_endpoint().await;
    mount_commit_ok(&app, 2).await;

    let body = json!({ "email": "user@example.com" });
    for _ in 0..2 {
        let res = app.post_submit_form(&body).await?;
        assert_eq!(res.status(), StatusCode::OK);
    }

    assert_eq!(
        app.committed_emails().await?,
        vec!["user@example.com", "user@example.com"]
    );
    let names = app.committed_document_names().await?;
    assert_eq!(names.len(), 2);
    assert_ne!(names[0], names[1], "Both submissions went to the same document");

    Ok(())
}
