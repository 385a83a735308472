#![allow(clippy::unwrap_used)]
// Integration tests for the Account facade using wiremock.

mod common;

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::*;
use simplisafe_core::Account;

#[tokio::test]
async fn test_login_resolves_user_id() {
    let server = MockServer::start().await;
    mount_auth(&server).await;

    let account = login(&server).await;
    assert_eq!(account.user_id(), TEST_USER_ID);
}

#[tokio::test]
async fn test_credentials_snapshot_for_persistence() {
    let server = MockServer::start().await;
    mount_auth(&server).await;

    let account = login(&server).await;
    let creds = account.credentials().await.expect("credentials stored");
    assert_eq!(creds.refresh_token().expose_secret(), "qrstu98765");
}

#[tokio::test]
async fn test_login_via_token() {
    let server = MockServer::start().await;
    mount_auth(&server).await;

    let account = Account::login_via_token(
        &SecretString::from("qrstu98765".to_owned()),
        account_config(&server),
    )
    .await
    .expect("token login succeeds");
    assert_eq!(account.user_id(), TEST_USER_ID);
}

#[tokio::test]
async fn test_get_systems() {
    let server = MockServer::start().await;
    mount_v3_account(&server, "OFF").await;

    let account = login(&server).await;
    let systems = account.get_systems().await.unwrap();

    assert_eq!(systems.len(), 1);
    assert!(systems.contains_key(&TEST_SUBSCRIPTION_ID));
}

#[tokio::test]
async fn test_deactivated_subscription_is_filtered() {
    let server = MockServer::start().await;
    mount_auth(&server).await;

    let mut deactivated = subscription(3, "OFF", json!([]));
    deactivated["activated"] = json!(0);
    Mock::given(method("GET"))
        .and(path(format!("/v1/users/{TEST_USER_ID}/subscriptions")))
        .and(query_param("activeOnly", "true"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(subscriptions_response(vec![deactivated])),
        )
        .mount(&server)
        .await;

    let account = login(&server).await;
    let systems = account.get_systems().await.unwrap();
    assert!(systems.is_empty());
}

#[tokio::test]
async fn test_subscription_with_missing_system_data_is_skipped() {
    let server = MockServer::start().await;
    mount_auth(&server).await;

    // No `location.system` block at all -- skipped, not an error, and
    // no settings fetch is attempted for it.
    let broken = json!({
        "uid": TEST_USER_ID,
        "sid": TEST_SUBSCRIPTION_ID,
        "activated": 1_585_000_000u64,
        "location": { "street1": "1234 Main Street" },
    });
    Mock::given(method("GET"))
        .and(path(format!("/v1/users/{TEST_USER_ID}/subscriptions")))
        .and(query_param("activeOnly", "true"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(subscriptions_response(vec![broken])),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!(
            "/v1/ss3/subscriptions/{TEST_SUBSCRIPTION_ID}/settings/normal"
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(v3_settings_response()))
        .expect(0)
        .mount(&server)
        .await;

    let account = login(&server).await;
    let systems = account.get_systems().await.unwrap();
    assert!(systems.is_empty());
}

#[tokio::test]
async fn test_subscription_with_unknown_version_is_skipped() {
    let server = MockServer::start().await;
    mount_auth(&server).await;

    Mock::given(method("GET"))
        .and(path(format!("/v1/users/{TEST_USER_ID}/subscriptions")))
        .and(query_param("activeOnly", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(subscriptions_response(vec![
            subscription(9, "OFF", json!([])),
        ])))
        .mount(&server)
        .await;

    let account = login(&server).await;
    let systems = account.get_systems().await.unwrap();
    assert!(systems.is_empty());
}

#[tokio::test]
async fn test_mixed_generations_load_together() {
    let server = MockServer::start().await;
    mount_auth(&server).await;

    let mut v2_sub = subscription(2, "OFF", json!([]));
    v2_sub["sid"] = json!(TEST_SUBSCRIPTION_ID + 1);
    Mock::given(method("GET"))
        .and(path(format!("/v1/users/{TEST_USER_ID}/subscriptions")))
        .and(query_param("activeOnly", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(subscriptions_response(vec![
            subscription(3, "OFF", json!([])),
            v2_sub,
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!(
            "/v1/ss3/subscriptions/{TEST_SUBSCRIPTION_ID}/settings/normal"
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(v3_settings_response()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!(
            "/v1/ss3/subscriptions/{TEST_SUBSCRIPTION_ID}/sensors"
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(v3_sensors_response()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!(
            "/v1/subscriptions/{}/settings",
            TEST_SUBSCRIPTION_ID + 1
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(v2_settings_response()))
        .mount(&server)
        .await;

    let account = login(&server).await;
    let systems = account.get_systems().await.unwrap();

    assert_eq!(systems.len(), 2);
    assert_eq!(systems[&TEST_SUBSCRIPTION_ID].version(), 3);
    assert_eq!(systems[&(TEST_SUBSCRIPTION_ID + 1)].version(), 2);
}
