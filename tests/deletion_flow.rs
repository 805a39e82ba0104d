use quizdom_account_portal::config::PortalConfig;
use quizdom_account_portal::credentials::Credentials;
use quizdom_account_portal::error::Error;
use quizdom_account_portal::Portal;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DOCS: &str = "/v1/projects/quizdom/databases/(default)/documents";

fn portal(server: &MockServer) -> Portal {
    let config = PortalConfig::new("web-key", "quizdom")
        .with_auth_url(&server.uri())
        .with_firestore_url(&server.uri())
        .with_credentials(Credentials::AccessToken("admin-token".to_string()));
    Portal::new(config).unwrap()
}

fn document(collection: &str, id: &str, fields: serde_json::Value) -> serde_json::Value {
    json!({
        "name": format!("projects/quizdom/databases/(default)/documents/{}/{}", collection, id),
        "fields": fields,
        "createTime": "2025-02-01T12:00:00.000000Z",
        "updateTime": "2025-02-01T12:00:00.000000Z"
    })
}

async fn mount_sign_in(server: &MockServer, uid: &str) {
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signInWithPassword"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "localId": uid,
            "email": format!("{}@example.com", uid),
            "idToken": format!("id-token-{}", uid),
            "refreshToken": "refresh",
            "expiresIn": "3600"
        })))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_auth_delete(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/v1/projects/quizdom/accounts:delete"))
        .and(header("Authorization", "Bearer admin-token"))
        .respond_with(response)
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_existing(server: &MockServer, collection: &str, id: &str) {
    let doc_path = format!("{}/{}/{}", DOCS, collection, id);

    Mock::given(method("GET"))
        .and(path(doc_path.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(document(collection, id, json!({}))))
        .mount(server)
        .await;

    Mock::given(method("DELETE"))
        .and(path(doc_path.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_empty_query(server: &MockServer, collection: &str) {
    Mock::given(method("POST"))
        .and(path(format!("{}:runQuery", DOCS).as_str()))
        .and(body_string_contains(collection))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"readTime": "2025-06-01T00:00:00Z"}
        ])))
        .expect(1)
        .mount(server)
        .await;
}

/// Anything not mounted explicitly does not exist.
async fn mount_missing_fallback(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path_regex(r"^/v1/projects/quizdom/databases/\(default\)/documents/.+"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"code": 404, "message": "Document not found", "status": "NOT_FOUND"}
        })))
        .with_priority(10)
        .mount(server)
        .await;
}

#[tokio::test]
async fn deletes_user_with_documents_and_room() {
    let server = MockServer::start().await;
    mount_sign_in(&server, "u1").await;
    mount_auth_delete(&server, ResponseTemplate::new(200).set_body_json(json!({}))).await;

    for collection in ["users", "userStatistics", "userPreferences"] {
        mount_existing(&server, collection, "u1").await;
    }
    mount_missing_fallback(&server).await;

    Mock::given(method("POST"))
        .and(path(format!("{}:runQuery", DOCS).as_str()))
        .and(body_string_contains("triviaRooms"))
        .and(body_string_contains("createdBy"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "document": document("triviaRooms", "room-1", json!({"createdBy": {"stringValue": "u1"}})),
                "readTime": "2025-06-01T00:00:00Z"
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;
    mount_empty_query(&server, "availablePlayers").await;

    Mock::given(method("DELETE"))
        .and(path(format!("{}/triviaRooms/room-1", DOCS).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let portal = portal(&server);
    let user = portal.sign_in("u1@example.com", "pw").await.unwrap();
    let result = portal.delete_account(user).await;

    assert!(result.success);
    assert!(result.auth_deleted);
    assert_eq!(
        result.collections_deleted,
        ["users", "userStatistics", "userPreferences"]
    );
    assert_eq!(result.related_docs_deleted, 1);
    assert!(result.error.is_none());
}

#[tokio::test]
async fn user_without_any_data() {
    let server = MockServer::start().await;
    mount_sign_in(&server, "u2").await;
    mount_auth_delete(
        &server,
        ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": 400, "message": "USER_NOT_FOUND"}
        })),
    )
    .await;
    mount_missing_fallback(&server).await;
    mount_empty_query(&server, "triviaRooms").await;
    mount_empty_query(&server, "availablePlayers").await;

    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let portal = portal(&server);
    let user = portal.sign_in("u2@example.com", "pw").await.unwrap();
    let result = portal.delete_account(user).await;

    assert!(result.success);
    assert!(result.auth_deleted);
    assert!(result.collections_deleted.is_empty());
    assert_eq!(result.related_docs_deleted, 0);
}

#[tokio::test]
async fn primary_record_failure_aborts_before_references() {
    let server = MockServer::start().await;
    mount_sign_in(&server, "u3").await;
    mount_auth_delete(&server, ResponseTemplate::new(200).set_body_json(json!({}))).await;

    Mock::given(method("GET"))
        .and(path(format!("{}/users/u3", DOCS).as_str()))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "error": {"code": 503, "message": "The service is currently unavailable.", "status": "UNAVAILABLE"}
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("{}:runQuery", DOCS).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let portal = portal(&server);
    let user = portal.sign_in("u3@example.com", "pw").await.unwrap();
    let result = portal.delete_account(user).await;

    assert!(!result.success);
    assert!(result.auth_deleted);
    let error = result.error.as_deref().unwrap();
    assert!(error.starts_with("Failed to delete user data from Firestore"));
    assert!(error.contains("currently unavailable"));
}

#[tokio::test]
async fn account_details_render_profile() {
    let server = MockServer::start().await;
    mount_sign_in(&server, "u1").await;

    Mock::given(method("GET"))
        .and(path(format!("{}/users/u1", DOCS).as_str()))
        .and(header("Authorization", "Bearer admin-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(document(
            "users",
            "u1",
            json!({
                "name": {"stringValue": "Ada"},
                "createdAt": {"timestampValue": "2025-01-05T09:00:00Z"},
                "lastLogin": {"stringValue": "2025-06-01T08:30:59.123456+00:00"}
            }),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let portal = portal(&server);
    let user = portal.sign_in("u1@example.com", "pw").await.unwrap();
    let details = portal.account_details(&user).await.unwrap().unwrap();

    assert_eq!(details.name, "Ada");
    assert_eq!(details.created_at.as_deref(), Some("2025-01-05T09:00:00Z"));
    assert_eq!(details.last_login.as_deref(), Some("2025-06-01 08:30"));
}

#[tokio::test]
async fn missing_profile_is_not_an_error() {
    let server = MockServer::start().await;
    mount_sign_in(&server, "u2").await;
    mount_missing_fallback(&server).await;

    let portal = portal(&server);
    let user = portal.sign_in("u2@example.com", "pw").await.unwrap();
    assert!(portal.account_details(&user).await.unwrap().is_none());
}

#[tokio::test]
async fn rejected_sign_in_reports_service_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/accounts:signInWithPassword"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": 400, "message": "EMAIL_NOT_FOUND"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    match portal(&server).sign_in("nobody@example.com", "pw").await {
        Err(Error::Auth(msg)) => assert_eq!(msg, "EMAIL_NOT_FOUND"),
        other => panic!("Expected Auth error, got {:?}", other),
    }
}

#[tokio::test]
async fn secondary_collection_failures_are_warnings() {
    let server = MockServer::start().await;
    mount_sign_in(&server, "u4").await;
    mount_auth_delete(&server, ResponseTemplate::new(200).set_body_json(json!({}))).await;

    for collection in ["users", "userStatistics"] {
        mount_existing(&server, collection, "u4").await;
    }

    // Present on read, rejected on delete.
    let preferences = format!("{}/userPreferences/u4", DOCS);
    Mock::given(method("GET"))
        .and(path(preferences.as_str()))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(document("userPreferences", "u4", json!({}))),
        )
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(preferences.as_str()))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": {"code": 500, "message": "Internal error encountered.", "status": "INTERNAL"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    // Gone between read and delete.
    let history = format!("{}/gameHistory/u4", DOCS);
    Mock::given(method("GET"))
        .and(path(history.as_str()))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(document("gameHistory", "u4", json!({}))),
        )
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(history.as_str()))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"code": 404, "message": "Document not found", "status": "NOT_FOUND"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    mount_missing_fallback(&server).await;
    mount_empty_query(&server, "triviaRooms").await;
    mount_empty_query(&server, "availablePlayers").await;

    let portal = portal(&server);
    let user = portal.sign_in("u4@example.com", "pw").await.unwrap();
    let result = portal.delete_account(user).await;

    assert!(result.success);
    assert!(result.error.is_none());
    assert_eq!(
        result.collections_deleted,
        ["users", "userStatistics", "gameHistory"]
    );
    assert_eq!(result.warnings.len(), 1);
    assert!(result.warnings[0].contains("userPreferences"));
    assert!(result.warnings[0].contains("Internal error encountered."));
}
