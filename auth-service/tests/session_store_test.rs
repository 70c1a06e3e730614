mod common;

use auth_service::models::Session;
use auth_service::services::{ServiceError, SessionRepository};
use chrono::{Duration, Utc};
use common::TestApp;

async fn insert_aged(app: &TestApp, id: &str, user_id: &str, age: Duration) -> Session {
    let session = Session {
        id: id.to_string(),
        user_id: user_id.to_string(),
        created_at: Utc::now() - age,
    };
    app.store.insert_session(&session).await.unwrap();
    session
}

#[tokio::test]
async fn create_get_delete() {
    let app = TestApp::new();
    let sessions = app.state.coordinator.sessions();

    let session = sessions.create("U1").await.unwrap();
    assert_eq!(session.id.len(), 64);
    assert_eq!(sessions.get(&session.id).await.unwrap(), session);

    sessions.delete(&session.id).await.unwrap();
    assert!(matches!(
        sessions.get(&session.id).await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        sessions.delete(&session.id).await,
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn purge_removes_only_sessions_strictly_before_cutoff() {
    let app = TestApp::new();
    let sessions = app.state.coordinator.sessions();

    let cutoff = Utc::now() - Duration::hours(1);
    insert_aged(&app, "old-1", "U1", Duration::hours(3)).await;
    insert_aged(&app, "old-2", "U2", Duration::hours(2)).await;
    let at_cutoff = Session {
        id: "edge".to_string(),
        user_id: "U1".to_string(),
        created_at: cutoff,
    };
    app.store.insert_session(&at_cutoff).await.unwrap();
    let fresh = sessions.create("U1").await.unwrap();

    assert_eq!(sessions.purge_older_than(cutoff).await.unwrap(), 2);

    assert!(matches!(sessions.get("old-1").await, Err(ServiceError::NotFound(_))));
    assert!(matches!(sessions.get("old-2").await, Err(ServiceError::NotFound(_))));
    assert_eq!(sessions.get("edge").await.unwrap(), at_cutoff);
    assert_eq!(sessions.get(&fresh.id).await.unwrap(), fresh);

    assert_eq!(sessions.purge_older_than(cutoff).await.unwrap(), 0);
}

#[tokio::test]
async fn delete_for_user_leaves_other_users_alone() {
    let app = TestApp::new();
    let sessions = app.state.coordinator.sessions();

    sessions.create("U1").await.unwrap();
    sessions.create("U1").await.unwrap();
    let other = sessions.create("U2").await.unwrap();

    assert_eq!(sessions.delete_for_user("U1").await.unwrap(), 2);
    assert_eq!(sessions.delete_for_user("U1").await.unwrap(), 0);
    assert!(sessions.get(&other.id).await.is_ok());
    assert_eq!(app.store.session_count(), 1);
}

#[tokio::test]
async fn reads_during_purge_see_whole_sessions_or_nothing() {
    let app = TestApp::new();
    let sessions = app.state.coordinator.sessions().clone();

    let mut ids = Vec::new();
    for i in 0..50 {
        let session = insert_aged(&app, &format!("s{i}"), "U1", Duration::hours(2)).await;
        ids.push(session.id);
    }

    let purger = {
        let sessions = sessions.clone();
        tokio::spawn(async move { sessions.purge_older_than(Utc::now() - Duration::hours(1)).await })
    };

    for id in &ids {
        match sessions.get(id).await {
            Ok(session) => assert_eq!(&session.id, id),
            Err(ServiceError::NotFound(_)) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(purger.await.unwrap().unwrap(), 50);
}
