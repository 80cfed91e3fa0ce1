//! E2E tests for the upload form, password check and upload flow

mod common;

use common::{DOMAIN, TestServer, UPLOAD_PASSWORD, test_config};

#[tokio::test]
async fn test_upload_form_is_served() {
    let server = TestServer::new().await;

    let response = server.client.get(&server.url("/upload")).send().await.unwrap();

    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert_eq!(body, bucketgate::api::pages::UPLOAD_HTML);
}

#[tokio::test]
async fn test_upload_redirects_and_round_trips() {
    let server = TestServer::new().await;
    let data: Vec<u8> = (0u8..10).collect();

    let response = server
        .post_upload(Some(UPLOAD_PASSWORD), Some(("a.png", data.clone())))
        .await;

    assert_eq!(response.status(), 303);
    assert_eq!(
        response.headers()["location"],
        format!("https://{DOMAIN}/public/a.png").as_str()
    );

    let response = server
        .client
        .get(&server.url("/public/a.png"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["content-type"], "text/plain");
    assert_eq!(response.bytes().await.unwrap().as_ref(), data.as_slice());
}

#[tokio::test]
async fn test_reupload_overwrites() {
    let server = TestServer::new().await;

    server
        .post_upload(Some(UPLOAD_PASSWORD), Some(("f.txt", b"first".to_vec())))
        .await;
    server
        .post_upload(Some(UPLOAD_PASSWORD), Some(("f.txt", b"second".to_vec())))
        .await;

    let body = server
        .client
        .get(&server.url("/public/f.txt"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, "second");
}

#[tokio::test]
async fn test_upload_wrong_password_rerenders_form() {
    let server = TestServer::new().await;

    let response = server
        .post_upload(Some("nope"), Some(("a.png", vec![1, 2, 3])))
        .await;

    assert_eq!(response.status(), 400);
    let body = response.text().await.unwrap();
    assert_eq!(body, bucketgate::api::pages::UPLOAD_HTML);
    assert_eq!(server.store.object_count("public").await, 0);
}

#[tokio::test]
async fn test_upload_wrong_password_does_not_touch_limiter() {
    let server = TestServer::new().await;

    for _ in 0..6 {
        server
            .post_upload(Some("nope"), Some(("a.png", vec![1])))
            .await;
    }

    assert_eq!(server.state.limiter.tracked_clients().await, 0);
    assert_eq!(server.validate(UPLOAD_PASSWORD).await, "true");
}

#[tokio::test]
async fn test_upload_missing_fields_rerenders_form() {
    let server = TestServer::new().await;

    let response = server.post_upload(None, Some(("a.png", vec![1]))).await;
    assert_eq!(response.status(), 400);

    let response = server.post_upload(Some(UPLOAD_PASSWORD), None).await;
    assert_eq!(response.status(), 400);
    let body = response.text().await.unwrap();
    assert_eq!(body, bucketgate::api::pages::UPLOAD_HTML);
}

#[tokio::test]
async fn test_upload_without_multipart_body_is_rejected() {
    let server = TestServer::new().await;

    let response = server
        .client
        .post(&server.url("/upload"))
        .body("pass=pass2")
        .header("content-type", "application/x-www-form-urlencoded")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_upload_store_failure_returns_plain_message() {
    let server = TestServer::new().await;

    // Names with '/' cannot be addressed by /public/:file and are refused.
    let response = server
        .post_upload(Some(UPLOAD_PASSWORD), Some(("dir/a.txt", vec![1])))
        .await;

    assert_eq!(response.status(), 400);
    assert!(
        response.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/plain")
    );
    assert_eq!(response.text().await.unwrap(), "Failed to upload file.");
}

#[tokio::test]
async fn test_upload_over_body_limit_is_rejected() {
    let mut config = test_config();
    config.upload.max_bytes = 1024;
    let server = TestServer::with_config(config).await;

    let response = server
        .post_upload(Some(UPLOAD_PASSWORD), Some(("big.bin", vec![0; 4096])))
        .await;

    assert!(response.status().is_client_error());
    assert_eq!(server.store.object_count("public").await, 0);
}

#[tokio::test]
async fn test_validate_blocks_after_five_wrong_guesses() {
    let server = TestServer::new().await;

    for _ in 0..5 {
        assert_eq!(server.validate("wrong").await, "false");
    }
    assert_eq!(server.validate(UPLOAD_PASSWORD).await, "blocked");
    assert_eq!(server.validate("wrong").await, "blocked");
}

#[tokio::test]
async fn test_validate_correct_password_resets_attempts() {
    let server = TestServer::new().await;

    for _ in 0..4 {
        assert_eq!(server.validate("wrong").await, "false");
    }
    assert_eq!(server.validate(UPLOAD_PASSWORD).await, "true");

    for _ in 0..5 {
        assert_eq!(server.validate("wrong").await, "false");
    }
    assert_eq!(server.validate("wrong").await, "blocked");
}

#[tokio::test]
async fn test_validate_without_password_is_false_and_free() {
    let server = TestServer::new().await;

    for _ in 0..10 {
        let response = server
            .client
            .get(&server.url("/validate"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(response.text().await.unwrap(), "false");
    }
    assert_eq!(server.validate(UPLOAD_PASSWORD).await, "true");
}

async fn validate_undecodable(server: &TestServer) -> String {
    let response = server
        .client
        .get(&server.url("/validate/%FF"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert!(
        response.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/plain")
    );
    response.text().await.unwrap()
}

#[tokio::test]
async fn test_validate_undecodable_password_is_false_then_blocked() {
    let server = TestServer::new().await;

    assert_eq!(validate_undecodable(&server).await, "false");
    assert_eq!(server.validate(UPLOAD_PASSWORD).await, "true");

    for _ in 0..5 {
        assert_eq!(server.validate("wrong").await, "false");
    }
    assert_eq!(validate_undecodable(&server).await, "blocked");
}

#[tokio::test]
async fn test_validate_uses_forwarded_for_when_trusted() {
    let mut config = test_config();
    config.server.trust_forwarded_for = true;
    let server = TestServer::with_config(config).await;

    for _ in 0..5 {
        server
            .client
            .get(&server.url("/validate/wrong"))
            .header("x-forwarded-for", "203.0.113.9")
            .send()
            .await
            .unwrap();
    }

    let blocked = server
        .client
        .get(&server.url("/validate/pass2"))
        .header("x-forwarded-for", "203.0.113.9")
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(blocked, "blocked");

    // A different forwarded client is unaffected.
    let other = server
        .client
        .get(&server.url("/validate/pass2"))
        .header("x-forwarded-for", "198.51.100.1")
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(other, "true");
}
