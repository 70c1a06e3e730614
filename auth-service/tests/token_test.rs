mod common;

use auth_service::models::{Token, PROFILE_VIEW_PURPOSE};
use auth_service::services::{ServiceError, TokenRepository};
use chrono::{Duration, Utc};
use common::{test_config, TestApp};

#[tokio::test]
async fn token_is_single_use() {
    let app = TestApp::new();
    let session = app.state.coordinator.sessions().create("U1").await.unwrap();
    let tokens = app.state.coordinator.tokens();

    let token = tokens.issue(&session.id, PROFILE_VIEW_PURPOSE).await.unwrap();
    assert_eq!(token.session_id, session.id);
    assert_eq!(token.expires_at - token.issued_at, Duration::seconds(300));

    assert_eq!(tokens.validate(&token.id, PROFILE_VIEW_PURPOSE).await.unwrap(), session.id);
    assert!(matches!(
        tokens.validate(&token.id, PROFILE_VIEW_PURPOSE).await,
        Err(ServiceError::InvalidToken)
    ));
}

#[tokio::test]
async fn unknown_token_is_invalid() {
    let app = TestApp::new();
    assert!(matches!(
        app.state.coordinator.tokens().validate("nope", PROFILE_VIEW_PURPOSE).await,
        Err(ServiceError::InvalidToken)
    ));
}

#[tokio::test]
async fn issue_for_missing_session_is_not_found() {
    let app = TestApp::new();
    assert!(matches!(
        app.state.coordinator.tokens().issue("missing", "any").await,
        Err(ServiceError::NotFound(_))
    ));
    assert_eq!(app.store.token_count(), 0);
}

#[tokio::test]
async fn ttl_follows_configuration() {
    let app = TestApp::with_config(test_config(&[("TOKEN_TTL_SECONDS", "42")]));
    let session = app.state.coordinator.sessions().create("U1").await.unwrap();
    let token = app
        .state
        .coordinator
        .tokens()
        .issue(&session.id, "purpose")
        .await
        .unwrap();
    assert_eq!(token.expires_at - token.issued_at, Duration::seconds(42));
}

#[tokio::test]
async fn expired_token_is_invalid_and_consumed() {
    let app = TestApp::new();
    let session = app.state.coordinator.sessions().create("U1").await.unwrap();
    let issued_at = Utc::now() - Duration::minutes(10);
    let expired = Token {
        id: "expired".to_string(),
        session_id: session.id.clone(),
        purpose: PROFILE_VIEW_PURPOSE.to_string(),
        issued_at,
        expires_at: issued_at + Duration::minutes(5),
    };
    app.store.insert_token(&expired).await.unwrap();

    assert!(matches!(
        app.state.coordinator.tokens().validate("expired", PROFILE_VIEW_PURPOSE).await,
        Err(ServiceError::InvalidToken)
    ));
    assert_eq!(app.store.token_count(), 0);
}

#[tokio::test]
async fn token_for_deleted_session_is_invalid() {
    let app = TestApp::new();
    let sessions = app.state.coordinator.sessions();
    let session = sessions.create("U1").await.unwrap();
    let token = app
        .state
        .coordinator
        .tokens()
        .issue(&session.id, PROFILE_VIEW_PURPOSE)
        .await
        .unwrap();

    sessions.delete(&session.id).await.unwrap();

    assert!(matches!(
        app.state.coordinator.tokens().validate(&token.id, PROFILE_VIEW_PURPOSE).await,
        Err(ServiceError::InvalidToken)
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_validations_have_one_winner() {
    let app = TestApp::new();
    let session = app.state.coordinator.sessions().create("U1").await.unwrap();

    for _ in 0..20 {
        let tokens = app.state.coordinator.tokens().clone();
        let token = tokens.issue(&session.id, PROFILE_VIEW_PURPOSE).await.unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let tokens = tokens.clone();
                let id = token.id.clone();
                tokio::spawn(async move { tokens.validate(&id, PROFILE_VIEW_PURPOSE).await })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(session_id) => {
                    assert_eq!(session_id, session.id);
                    successes += 1;
                }
                Err(err) => assert!(matches!(err, ServiceError::InvalidToken)),
            }
        }
        assert_eq!(successes, 1);
    }
}

#[tokio::test]
async fn purge_expired_drops_only_expired_tokens() {
    let app = TestApp::new();
    let session = app.state.coordinator.sessions().create("U1").await.unwrap();
    let tokens = app.state.coordinator.tokens();
    let live = tokens.issue(&session.id, "live").await.unwrap();

    let issued_at = Utc::now() - Duration::hours(1);
    app.store
        .insert_token(&Token {
            id: "stale".to_string(),
            session_id: session.id.clone(),
            purpose: "stale".to_string(),
            issued_at,
            expires_at: issued_at + Duration::minutes(5),
        })
        .await
        .unwrap();

    assert_eq!(tokens.purge_expired(Utc::now()).await.unwrap(), 1);
    assert_eq!(tokens.purge_expired(Utc::now()).await.unwrap(), 0);
    assert_eq!(tokens.validate(&live.id, "live").await.unwrap(), session.id);
}

#[tokio::test]
async fn purpose_mismatch_is_invalid_and_spends_the_token() {
    let app = TestApp::new();
    let session = app.state.coordinator.sessions().create("U1").await.unwrap();
    let tokens = app.state.coordinator.tokens();
    let token = tokens.issue(&session.id, "billing-approve").await.unwrap();

    assert!(matches!(
        tokens.validate(&token.id, PROFILE_VIEW_PURPOSE).await,
        Err(ServiceError::InvalidToken)
    ));
    assert!(matches!(
        tokens.validate(&token.id, "billing-approve").await,
        Err(ServiceError::InvalidToken)
    ));
    assert_eq!(app.store.token_count(), 0);
}
