//! Integration tests for the Yahoo client
//!
//! Every test runs against a local wiremock server; nothing leaves the
//! machine.

mod common;

use common::api_responses;
use fantasy_manager::common::errors::FantasyError;
use fantasy_manager::common::traits::PlatformClient;
use fantasy_manager::common::types::{Platform, PlayerId, TransactionRequest};
use fantasy_manager::config::types::{LeagueConfig, YahooConfig};
use fantasy_manager::yahoo::YahooClient;
use pretty_assertions::assert_eq;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// base64("id:secret")
const BASIC_AUTH: &str = "Basic aWQ6c2VjcmV0";

fn league(locked: &[&str]) -> LeagueConfig {
    LeagueConfig {
        id: "31175".to_string(),
        name: Some("Work League".to_string()),
        team_id: 4,
        team_name: Some("Larkin Around".to_string()),
        platform: Platform::Yahoo,
        locked_players: locked.iter().map(|p| PlayerId::from(*p)).collect(),
    }
}

/// Helper function to create a client pointed at the mock server
fn create_test_client(server: &MockServer, locked: &[&str]) -> YahooClient {
    let config = YahooConfig {
        fantasy_url: format!("{}/hockey", server.uri()),
        api_url: format!("{}/fantasy/v2", server.uri()),
        oauth_url: format!("{}/oauth2", server.uri()),
        game_key: "nhl".to_string(),
        cookie: Some("T=cookie".to_string()),
        crumb: Some("crumb123".to_string()),
        client_id: Some("id".to_string()),
        client_secret: Some("secret".to_string()),
        refresh_token: Some("refresh".to_string()),
    };
    YahooClient::new(&config, league(locked), Duration::from_secs(5))
        .expect("Failed to create Yahoo client")
}

async fn mount_token(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/oauth2/get_token"))
        .and(header("authorization", BASIC_AUTH))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=refresh"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(api_responses::TOKEN, "application/json"),
        )
        .expect(expected_calls)
        .mount(server)
        .await;
}

// ============================================================================
// Roster and players
// ============================================================================

#[tokio::test]
async fn test_fetch_roster() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/fantasy/v2/team/nhl.l.31175.t.4/roster"))
        .and(query_param("format", "json"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(api_responses::ROSTER, "application/json"),
        )
        .expect(2)
        .mount(&server)
        .await;

    let client = create_test_client(&server, &[]);
    let roster = client.fetch_roster().await.expect("roster fetch failed");

    assert_eq!(roster.team_key, "nhl.l.31175.t.4");
    assert_eq!(
        roster.players,
        vec![PlayerId::from("6744"), PlayerId::from("6751")]
    );
    assert_eq!(roster.team_name.as_deref(), Some("Larkin Around"));
    assert_eq!(roster.faab_balance, Some(87));

    // token is reused until it nears expiry
    client.fetch_roster().await.expect("second fetch failed");
}

#[tokio::test]
async fn test_fetch_roster_unauthorized() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/fantasy/v2/team/nhl.l.31175.t.4/roster"))
        .respond_with(ResponseTemplate::new(401).set_body_string(
            r#"{"error":{"description":"Please provide valid credentials."}}"#,
        ))
        .mount(&server)
        .await;

    let client = create_test_client(&server, &[]);
    let result = client.fetch_roster().await;

    match result {
        Err(FantasyError::Authentication(msg)) => {
            assert!(msg.contains("Please provide valid credentials"), "{}", msg)
        }
        other => panic!("expected Authentication, got {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_roster_payload_is_invalid() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/fantasy/v2/team/nhl.l.31175.t.4/roster"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
        .mount(&server)
        .await;

    let client = create_test_client(&server, &[]);
    let err = client.fetch_roster().await.unwrap_err();

    assert!(matches!(err, FantasyError::InvalidResponse(_)));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_resolve_player_name() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/fantasy/v2/league/nhl.l.31175/players;player_keys=nhl.p.8290"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(api_responses::PLAYER, "application/json"),
        )
        .mount(&server)
        .await;

    let client = create_test_client(&server, &[]);
    let name = client
        .resolve_player_name(&PlayerId::from("8290"))
        .await
        .expect("lookup failed");

    assert_eq!(name, "Matt Boldy");
}

#[tokio::test]
async fn test_refresh_always_exchanges() {
    let server = MockServer::start().await;
    mount_token(&server, 2).await;

    let client = create_test_client(&server, &[]);
    client.refresh_credentials().await.expect("first refresh");
    client.refresh_credentials().await.expect("second refresh");
}

#[tokio::test]
async fn test_rejected_refresh_token_is_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth2/get_token"))
        .respond_with(ResponseTemplate::new(400).set_body_string(
            r#"{"error":{"description":"invalid_grant"}}"#,
        ))
        .mount(&server)
        .await;

    let client = create_test_client(&server, &[]);
    let result = client.refresh_credentials().await;

    assert!(matches!(result, Err(FantasyError::Authentication(_))));
}

// ============================================================================
// Session check
// ============================================================================

#[tokio::test]
async fn test_check_auth_finds_locked_players() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/hockey/31175/4"))
        .and(header("cookie", "T=cookie"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<table><tr data-pid=\"6744\"></tr><tr data-pid=\"6751\"></tr></table>",
        ))
        .mount(&server)
        .await;

    let client = create_test_client(&server, &["6744", "6751"]);
    assert!(client.check_auth().await.is_ok());
}

#[tokio::test]
async fn test_check_auth_missing_player_means_logged_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/hockey/31175/4"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>Sign in</html>"))
        .mount(&server)
        .await;

    let client = create_test_client(&server, &["6744"]);
    let result = client.check_auth().await;

    assert!(matches!(result, Err(FantasyError::Authentication(_))));
}

#[tokio::test]
async fn test_check_auth_forbidden() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/hockey/31175/4"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let client = create_test_client(&server, &[]);
    assert!(matches!(
        client.check_auth().await,
        Err(FantasyError::Authentication(_))
    ));
}

// ============================================================================
// Transactions
// ============================================================================

#[tokio::test]
async fn test_submit_replace_posts_addplayer_form() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hockey/31175/4/addplayer"))
        .and(header("cookie", "T=cookie"))
        .and(body_string_contains("stage=3"))
        .and(body_string_contains("crumb=crumb123"))
        .and(body_string_contains("apid=300"))
        .and(body_string_contains("dpid=200"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>done</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_test_client(&server, &[]);
    let response = client
        .submit_transaction(&TransactionRequest::replace("300", "200"))
        .await
        .expect("submit failed");

    assert_eq!(response.status, 200);
    assert_eq!(response.body, "<html>done</html>");
}

#[tokio::test]
async fn test_submit_waiver_claim_carries_bid() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hockey/31175/4/addplayer"))
        .and(body_string_contains("apid=8290"))
        .and(body_string_contains("faab=25"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("You created a waiver claim for Matt Boldy"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = create_test_client(&server, &[]);
    let request = TransactionRequest::new(Some("8290".into()), None, true, Some(25)).unwrap();
    let response = client.submit_transaction(&request).await.expect("submit failed");

    assert!(response.body.contains("waiver claim"));
}

#[tokio::test]
async fn test_submit_drop_posts_dropplayer_form() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hockey/31175/4/dropplayer"))
        .and(body_string_contains("stage=2"))
        .and(body_string_contains("dpid=200"))
        .respond_with(ResponseTemplate::new(200).set_body_string("dropped"))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_test_client(&server, &[]);
    let response = client
        .submit_transaction(&TransactionRequest::drop("200"))
        .await
        .expect("submit failed");

    assert!(response.is_success());
}

#[tokio::test]
async fn test_submit_passes_server_errors_through() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hockey/31175/4/addplayer"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let client = create_test_client(&server, &[]);
    let response = client
        .submit_transaction(&TransactionRequest::add("300"))
        .await
        .expect("a 502 is an answer, not an error");

    assert_eq!(response.status, 502);
    assert!(!response.is_success());
}

#[tokio::test]
async fn test_cancel_waiver() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hockey/31175/4/editwaiver"))
        .and(body_string_contains("claim_id=1_300_0"))
        .and(body_string_contains("mode=edit"))
        .and(body_string_contains("s=Cancel+Waiver"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_test_client(&server, &[]);
    assert!(client.cancel_waiver(&PlayerId::from("300")).await.is_ok());
}

#[tokio::test]
async fn test_cancel_waiver_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hockey/31175/4/editwaiver"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = create_test_client(&server, &[]);
    let result = client.cancel_waiver(&PlayerId::from("300")).await;

    assert!(matches!(result, Err(FantasyError::InvalidResponse(_))));
}
