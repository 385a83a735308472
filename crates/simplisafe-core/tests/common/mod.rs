#![allow(dead_code, clippy::unwrap_used)]
// Shared fixtures and setup for the integration tests.

use std::time::Duration;

use secrecy::SecretString;
use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use simplisafe_core::{Account, AccountConfig, System};

pub const TEST_CLIENT_ID: &str = "12345DEFG";
pub const TEST_EMAIL: &str = "user@email.com";
pub const TEST_PASSWORD: &str = "12345";
pub const TEST_SUBSCRIPTION_ID: u64 = 12345;
pub const TEST_USER_ID: u64 = 12345;
pub const TEST_SYSTEM_SERIAL: &str = "1234ABCD";
pub const TEST_LOCK_ID: &str = "987";
pub const TEST_LOCK_ID_2: &str = "654";
pub const TEST_CAMERA_ID: &str = "1234567890";

// ── Wire fixtures ───────────────────────────────────────────────────

pub fn token_response() -> Value {
    json!({
        "access_token": "abcde12345",
        "refresh_token": "qrstu98765",
        "expires_in": 3600,
        "token_type": "Bearer",
    })
}

pub fn auth_check_response() -> Value {
    json!({ "userId": TEST_USER_ID })
}

pub fn camera_record() -> Value {
    json!({
        "uuid": TEST_CAMERA_ID,
        "model": "SS001",
        "status": "online",
        "subscription": { "enabled": true },
        "cameraSettings": {
            "cameraName": "Front Hall",
            "shutterAway": "open",
            "shutterHome": "closed",
            "shutterOff": "closed",
        },
    })
}

pub fn subscription(version: u64, alarm_state: &str, messages: Value) -> Value {
    json!({
        "uid": TEST_USER_ID,
        "sid": TEST_SUBSCRIPTION_ID,
        "activated": 1_585_000_000u64,
        "location": {
            "street1": "1234 Main Street",
            "system": {
                "alarmState": alarm_state,
                "isAlarming": false,
                "isOffline": false,
                "connType": "wifi",
                "serial": TEST_SYSTEM_SERIAL,
                "temperature": 67,
                "version": version,
                "messages": messages,
                "cameras": [camera_record()],
            },
        },
    })
}

pub fn subscriptions_response(subscriptions: Vec<Value>) -> Value {
    json!({ "subscriptions": subscriptions })
}

/// V3 settings payload: normal settings plus the nested PIN slots
/// (master `1234`, duress `9876`, two user PINs).
pub fn v3_settings_response() -> Value {
    v3_settings_with_users(vec![
        json!({ "name": "Test 1", "pin": "3456" }),
        json!({ "name": "Test 2", "pin": "5423" }),
        json!({ "name": "", "pin": "" }),
        json!({ "name": "", "pin": "" }),
    ])
}

/// V3 settings payload with every user PIN slot occupied.
pub fn v3_settings_full_pins_response() -> Value {
    v3_settings_with_users(vec![
        json!({ "name": "Test 1", "pin": "3456" }),
        json!({ "name": "Test 2", "pin": "5423" }),
        json!({ "name": "Test 3", "pin": "6723" }),
        json!({ "name": "Test 4", "pin": "7865" }),
    ])
}

pub fn v3_settings_with_users(users: Vec<Value>) -> Value {
    json!({
        "account": TEST_SUBSCRIPTION_ID.to_string(),
        "settings": {
            "normal": {
                "alarmDuration": 240,
                "alarmVolume": 3,
                "doorChime": 2,
                "entryDelayAway": 30,
                "entryDelayHome": 30,
                "exitDelayAway": 60,
                "exitDelayHome": 0,
                "light": true,
                "voicePrompts": 2,
                "batteryBackupPowerLevel": 5293,
                "wallPowerLevel": 5933,
                "gsmRssi": -73,
                "wifiRssi": -49,
                "wifiSSID": "MY_WIFI",
            },
            "pins": {
                "pin1": { "value": "1234" },
                "duress": { "value": "9876" },
                "users": users,
            },
        },
    })
}

pub fn v3_sensors_response() -> Value {
    json!({
        "account": TEST_SUBSCRIPTION_ID.to_string(),
        "sensors": [
            {
                "serial": "825-0001",
                "name": "Front Door",
                "type": 5,
                "status": { "triggered": false },
                "setting": { "instantTrigger": false },
                "flags": { "offline": false, "lowBattery": false },
            },
            {
                "serial": "825-0002",
                "name": "Hallway",
                "type": 4,
                "status": { "triggered": false },
                "setting": { "instantTrigger": false },
                "flags": { "offline": false, "lowBattery": false },
            },
            {
                "serial": "825-0003",
                "name": "Basement",
                "type": 10,
                "status": { "temperature": 67 },
                "setting": {},
                "flags": { "offline": false, "lowBattery": false },
            },
            {
                "serial": "825-0004",
                "name": "Keypad",
                "type": 1,
                "status": {},
                "setting": {},
                "flags": { "offline": false, "lowBattery": false },
            },
            {
                "serial": TEST_LOCK_ID,
                "name": "Front Door Lock",
                "type": 16,
                "status": {
                    "lockState": 1,
                    "lockDisabled": false,
                    "lockError": false,
                    "lockLowBattery": false,
                    "pinPadLowBattery": false,
                },
                "flags": { "offline": false },
            },
            {
                "serial": TEST_LOCK_ID_2,
                "name": "Back Door Lock",
                "type": 16,
                "status": { "lockState": 2 },
                "flags": { "offline": false },
            },
        ],
    })
}

/// V2 settings payload: sensor data rides along in the settings.
pub fn v2_settings_response() -> Value {
    json!({
        "account": TEST_SUBSCRIPTION_ID.to_string(),
        "settings": {
            "sensors": [
                {
                    "serial": "195-0001",
                    "name": "Kitchen Window",
                    "type": 5,
                    "triggered": false,
                    "instant": false,
                    "battery": "ok",
                    "error": false,
                    "offline": false,
                },
                {
                    "serial": "195-0002",
                    "name": "Living Room",
                    "type": 4,
                    "triggered": false,
                    "instant": false,
                    "battery": "ok",
                    "error": false,
                    "offline": false,
                },
            ],
        },
    })
}

pub fn v2_pins_response() -> Value {
    json!({
        "pins": {
            "master": "1234",
            "duress": "9876",
            "Mother": "3456",
            "Father": "4567",
        }
    })
}

pub fn events_response(events: Vec<Value>) -> Value {
    json!({ "events": events })
}

pub fn event_record(event_id: u64) -> Value {
    json!({
        "eventId": event_id,
        "eventTimestamp": 1_585_000_000u64,
        "eventType": "activity",
        "info": "System Disarmed by Master PIN",
    })
}

// ── Server setup ────────────────────────────────────────────────────

pub fn account_config(server: &MockServer) -> AccountConfig {
    let mut config = AccountConfig::new(TEST_CLIENT_ID);
    config.api.base_url = Url::parse(&format!("{}/v1/", server.uri())).unwrap();
    config.api.retry.conflict_delay = Duration::ZERO;
    config
}

/// Mount the auth endpoints (token + authCheck).
pub async fn mount_auth(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1/api/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_response()))
        .up_to_n_times(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/api/authCheck"))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_check_response()))
        .mount(server)
        .await;
}

/// Mount the full V3 account surface: auth, subscription listing,
/// cached settings, and cached sensors.
pub async fn mount_v3_account(server: &MockServer, alarm_state: &str) {
    mount_auth(server).await;

    Mock::given(method("GET"))
        .and(path(format!("/v1/users/{TEST_USER_ID}/subscriptions")))
        .and(query_param("activeOnly", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(subscriptions_response(vec![
            subscription(3, alarm_state, json!([])),
        ])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!(
            "/v1/ss3/subscriptions/{TEST_SUBSCRIPTION_ID}/settings/normal"
        )))
        .and(query_param("forceUpdate", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(v3_settings_response()))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!(
            "/v1/ss3/subscriptions/{TEST_SUBSCRIPTION_ID}/sensors"
        )))
        .and(query_param("forceUpdate", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(v3_sensors_response()))
        .mount(server)
        .await;
}

/// Mount the full V2 account surface: auth, subscription listing, and
/// cached settings (which carry the V2 sensor data).
pub async fn mount_v2_account(server: &MockServer) {
    mount_auth(server).await;

    Mock::given(method("GET"))
        .and(path(format!("/v1/users/{TEST_USER_ID}/subscriptions")))
        .and(query_param("activeOnly", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(subscriptions_response(vec![
            subscription(2, "OFF", json!([])),
        ])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!(
            "/v1/subscriptions/{TEST_SUBSCRIPTION_ID}/settings"
        )))
        .and(query_param("cached", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(v2_settings_response()))
        .mount(server)
        .await;
}

/// Opt-in log output for debugging test failures (`RUST_LOG=debug`).
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub async fn login(server: &MockServer) -> Account {
    init_tracing();
    Account::login_via_credentials(
        TEST_EMAIL,
        &SecretString::from(TEST_PASSWORD.to_owned()),
        account_config(server),
    )
    .await
    .expect("login succeeds")
}

/// Log in and pull out the one system the fixtures describe.
pub async fn login_and_get_system(server: &MockServer) -> System {
    let account = login(server).await;
    let mut systems = account.get_systems().await.expect("systems load");
    systems
        .remove(&TEST_SUBSCRIPTION_ID)
        .expect("fixture system present")
}
