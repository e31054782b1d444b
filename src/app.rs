use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::admin::routes as admin;
use crate::api::{accounts, bookings, equipment, login, messages, notices};
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(notices::home).post(notices::create_notice))
        // Identity
        .route("/signup", post(login::signup))
        .route("/login", post(login::login))
        .route("/logout", post(login::logout))
        // Equipment and bookings
        .route(
            "/equipment",
            get(equipment::list_equipment).post(equipment::create_equipment),
        )
        .route(
            "/equipment/{id}",
            get(equipment::get_equipment)
                .put(equipment::update_equipment)
                .delete(equipment::delete_equipment),
        )
        .route(
            "/bookings",
            get(bookings::list_bookings).post(bookings::create_booking),
        )
        .route("/bookings/previous", get(bookings::previous_bookings))
        .route(
            "/bookings/{id}",
            get(bookings::get_booking)
                .put(bookings::update_booking)
                .delete(bookings::delete_booking),
        )
        .route(
            "/accounts",
            get(accounts::get_account).put(accounts::update_account),
        )
        // Messages and notices
        .route("/contact", post(messages::contact))
        .route("/messages", get(messages::list_messages))
        .route("/admin/messages", get(messages::admin_messages))
        .route(
            "/inbox",
            get(messages::inbox).post(messages::settle_messages),
        )
        .route(
            "/messages/{id}/respond",
            get(messages::get_message).post(messages::respond_to_message),
        )
        .route(
            "/notice",
            get(notices::get_notice)
                .put(notices::update_notice)
                .delete(notices::remove_notices),
        )
        // Lockout administration
        .route("/admin/login-attempts", get(admin::list_login_attempts))
        .route(
            "/admin/login-attempts/{user_id}/unlock",
            post(admin::unlock_user),
        )
        .route("/admin", get(admin::security_notice))
        .route("/admin/", get(admin::security_notice))
        .route("/secure-admin", get(admin::security_notice))
        .route("/secure-admin/", get(admin::security_notice))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use chrono::{TimeDelta, Utc};
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use crate::auth::password::hash_password;
    use crate::config::{AdminConfig, Config};

    const ADMIN: &str = "admin";
    const ADMIN_PASSWORD: &str = "admin-password";

    fn test_state() -> (TempDir, Arc<AppState>) {
        let dir = TempDir::new().unwrap();
        let config = Config {
            bind_addr: "127.0.0.1:0".to_string(),
            data_dir: dir.path().join("data"),
            admin: Some(AdminConfig {
                username: ADMIN.to_string(),
                password: ADMIN_PASSWORD.to_string(),
            }),
            mail_from: "no-reply@example.com".to_string(),
            company: "Example Co".to_string(),
        };
        (dir, Arc::new(AppState::open(&config).unwrap()))
    }

    fn test_app() -> (TempDir, Router) {
        let (dir, state) = test_state();
        (dir, router(state))
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, String) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    async fn login(app: &Router, username: &str, password: &str) -> (StatusCode, String) {
        send(
            app,
            Method::POST,
            "/login",
            None,
            Some(json!({ "username": username, "password": password })),
        )
        .await
    }

    fn token_of(body: &str) -> String {
        let value: Value = serde_json::from_str(body).unwrap();
        value["token"].as_str().unwrap().to_string()
    }

    async fn signup(app: &Router, username: &str, password: &str) -> String {
        let (status, body) = send(
            app,
            Method::POST,
            "/signup",
            None,
            Some(json!({ "username": username, "password1": password, "password2": password })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        token_of(&body)
    }

    async fn admin_token(app: &Router) -> String {
        let (status, body) = login(app, ADMIN, ADMIN_PASSWORD).await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        token_of(&body)
    }

    #[tokio::test]
    async fn test_security_notice_is_public() {
        let (_dir, app) = test_app();
        for uri in ["/admin", "/admin/", "/secure-admin", "/secure-admin/"] {
            let (status, body) = send(&app, Method::GET, uri, None, None).await;
            assert_eq!(status, StatusCode::OK);
            assert!(body.contains("OWASP Top 10"));
        }
    }

    #[tokio::test]
    async fn test_requires_session() {
        let (_dir, app) = test_app();
        let (status, _) = send(&app, Method::GET, "/bookings", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&app, Method::GET, "/bookings", Some("bogus"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_lockout_rejects_correct_password() {
        let (_dir, app) = test_app();
        signup(&app, "alice", "correct-horse").await;

        for _ in 0..3 {
            let (status, body) = login(&app, "alice", "wrong-password").await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body, "Invalid username or password. Please try again.");
        }

        let (status, body) = login(&app, "alice", "correct-horse").await;
        assert_eq!(status, StatusCode::LOCKED);
        assert!(body.starts_with("Account locked. Try again in"), "{}", body);

        // An administrator clears the lock, then the user can log in again.
        let admin = admin_token(&app).await;
        let (status, body) = send(&app, Method::GET, "/admin/login-attempts", Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        let attempts: Value = serde_json::from_str(&body).unwrap();
        let alice = attempts
            .as_array()
            .unwrap()
            .iter()
            .find(|a| a["username"] == "alice")
            .unwrap();
        assert_eq!(alice["failed_attempts"], 3);
        assert_eq!(alice["locked"], true);
        let alice_id = alice["user_id"].as_u64().unwrap();

        let uri = format!("/admin/login-attempts/{}/unlock", alice_id);
        let (status, _) = send(&app, Method::POST, &uri, Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = login(&app, "alice", "correct-horse").await;
        assert_eq!(status, StatusCode::OK, "{}", body);
    }

    #[tokio::test]
    async fn test_unknown_user_is_not_tracked() {
        let (_dir, app) = test_app();
        let (status, _) = login(&app, "nobody", "whatever-password").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let admin = admin_token(&app).await;
        let (status, body) = send(&app, Method::GET, "/admin/login-attempts", Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        // Only the admin's own successful login left a record.
        let attempts: Value = serde_json::from_str(&body).unwrap();
        let attempts = attempts.as_array().unwrap();
        assert_eq!(attempts.len(), 1);
        assert_eq!(attempts[0]["username"], ADMIN);
        assert_eq!(attempts[0]["failed_attempts"], 0);
    }

    #[tokio::test]
    async fn test_admin_login_reports_unread_messages() {
        let (_dir, app) = test_app();
        let (status, body) = login(&app, ADMIN, ADMIN_PASSWORD).await;
        assert_eq!(status, StatusCode::OK);
        let value: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["unread_messages"], 0);
        assert_eq!(value["user"]["is_superuser"], true);
    }

    #[tokio::test]
    async fn test_booking_lifecycle() {
        let (_dir, app) = test_app();
        let admin = admin_token(&app).await;
        let alice = signup(&app, "alice", "correct-horse").await;

        let (status, _) = send(
            &app,
            Method::POST,
            "/equipment",
            Some(&alice),
            Some(json!({ "name": "pc" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = send(
            &app,
            Method::POST,
            "/equipment",
            Some(&admin),
            Some(json!({ "name": "total_station", "description": "Leica" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let equipment_id = serde_json::from_str::<Value>(&body).unwrap()["id"].as_u64().unwrap();

        let (status, body) = send(&app, Method::GET, "/equipment?q=total", Some(&alice), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(serde_json::from_str::<Value>(&body).unwrap().as_array().unwrap().len(), 1);

        let start = Utc::now() + TimeDelta::days(1);
        let (status, body) = send(
            &app,
            Method::POST,
            "/bookings",
            Some(&alice),
            Some(json!({
                "equipment_id": equipment_id,
                "start_time": start,
                "end_time": start + TimeDelta::hours(8),
                "reason": "Site survey",
                "project_number": "123456",
                "use_location": "North yard",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        let booking_id = serde_json::from_str::<Value>(&body).unwrap()["id"].as_u64().unwrap();

        let (status, body) = send(&app, Method::GET, "/bookings", Some(&alice), None).await;
        assert_eq!(status, StatusCode::OK);
        let list: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(list["bookings"].as_array().unwrap().len(), 1);
        assert_eq!(list["previous_bookings"].as_array().unwrap().len(), 0);
        assert_eq!(list["is_superuser"], false);

        let uri = format!("/bookings/{}", booking_id);
        let (status, _) = send(&app, Method::DELETE, &uri, Some(&alice), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(&app, Method::DELETE, &uri, Some(&admin), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&app, Method::DELETE, &uri, Some(&alice), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cannot_edit_past_booking() {
        let (_dir, app) = test_app();
        let admin = admin_token(&app).await;
        let alice = signup(&app, "alice", "correct-horse").await;

        let (_, body) = send(
            &app,
            Method::POST,
            "/equipment",
            Some(&admin),
            Some(json!({ "name": "ipad" })),
        )
        .await;
        let equipment_id = serde_json::from_str::<Value>(&body).unwrap()["id"].as_u64().unwrap();

        let start = Utc::now() - TimeDelta::days(2);
        let booking = json!({
            "equipment_id": equipment_id,
            "start_time": start,
            "end_time": start + TimeDelta::hours(4),
            "reason": "Inspection",
            "project_number": "42",
            "use_location": "Depot",
        });
        let (status, body) = send(&app, Method::POST, "/bookings", Some(&alice), Some(booking.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        let booking_id = serde_json::from_str::<Value>(&body).unwrap()["id"].as_u64().unwrap();

        let uri = format!("/bookings/{}", booking_id);
        let (status, body) = send(&app, Method::PUT, &uri, Some(&alice), Some(booking.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "You cannot edit a past booking.");

        let (status, _) = send(&app, Method::PUT, &uri, Some(&admin), Some(booking)).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, Method::GET, "/bookings/previous", Some(&alice), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(serde_json::from_str::<Value>(&body).unwrap().as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_contact_and_respond() {
        let (_dir, app) = test_app();
        let admin = admin_token(&app).await;
        let alice = signup(&app, "alice", "correct-horse").await;

        let message = json!({ "content": "The scanner battery is flat." });
        let (status, _) = send(&app, Method::POST, "/contact", Some(&alice), Some(message.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &app,
            Method::PUT,
            "/accounts",
            Some(&alice),
            Some(json!({ "email": "alice@example.com", "phone_number": "0400000000" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let account: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(account["user_type"], "Regular User");
        assert_eq!(account["company"], "Example Co");
        assert_eq!(account["profile"]["phone_number"], "0400000000");

        let (status, body) = send(&app, Method::POST, "/contact", Some(&alice), Some(message)).await;
        assert_eq!(status, StatusCode::CREATED);
        let sent: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(sent["subject"], "General Inquiry");
        assert_eq!(sent["confirmation_number"].as_str().unwrap().len(), 8);
        let message_id = sent["id"].as_u64().unwrap();

        let (_, body) = send(&app, Method::GET, "/", Some(&admin), None).await;
        assert_eq!(serde_json::from_str::<Value>(&body).unwrap()["unread_messages"], 1);

        let uri = format!("/messages/{}/respond", message_id);
        let (status, _) = send(
            &app,
            Method::POST,
            &uri,
            Some(&alice),
            Some(json!({ "response": "no" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = send(
            &app,
            Method::POST,
            &uri,
            Some(&admin),
            Some(json!({ "response": "A spare is on its way." })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let answered: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(answered["read"], true);

        let (status, body) = send(&app, Method::GET, "/inbox", Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        let inbox: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(inbox["settled_messages"].as_array().unwrap().len(), 1);
        assert_eq!(inbox["unsettled_messages"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_notices() {
        let (_dir, app) = test_app();
        let admin = admin_token(&app).await;
        let alice = signup(&app, "alice", "correct-horse").await;

        let notice = json!({ "message": "Store closed Friday" });
        let (status, _) = send(&app, Method::POST, "/", Some(&alice), Some(notice.clone())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(&app, Method::POST, "/", Some(&admin), Some(notice)).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, _) = send(
            &app,
            Method::PUT,
            "/notice",
            Some(&admin),
            Some(json!({ "message": "Store closed Monday" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = send(&app, Method::GET, "/", Some(&alice), None).await;
        let home: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(home["notice"]["message"], "Store closed Monday");
        assert!(home.get("unread_messages").is_none());

        let (status, _) = send(&app, Method::DELETE, "/notice", Some(&admin), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, body) = send(&app, Method::GET, "/", Some(&alice), None).await;
        assert!(serde_json::from_str::<Value>(&body).unwrap()["notice"].is_null());
    }

    #[tokio::test]
    async fn test_inbox_is_shared_by_superusers() {
        let (_dir, state) = test_state();
        let hash = hash_password("second-admin-pw").unwrap();
        state
            .users
            .write()
            .await
            .create_user("admin2", hash, true)
            .unwrap();
        let app = router(state);

        let alice = signup(&app, "alice", "correct-horse").await;
        send(
            &app,
            Method::PUT,
            "/accounts",
            Some(&alice),
            Some(json!({ "email": "alice@example.com" })),
        )
        .await;
        let (status, _) = send(
            &app,
            Method::POST,
            "/contact",
            Some(&alice),
            Some(json!({ "content": "Monitor 3 flickers." })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        // The message went to the first superuser, but admin2 still sees it.
        let (status, body) = login(&app, "admin2", "second-admin-pw").await;
        assert_eq!(status, StatusCode::OK);
        let admin2 = token_of(&body);
        let admin2_id = serde_json::from_str::<Value>(&body).unwrap()["user"]["id"].as_u64().unwrap();

        let (status, body) = send(&app, Method::GET, "/inbox", Some(&admin2), None).await;
        assert_eq!(status, StatusCode::OK);
        let inbox: Value = serde_json::from_str(&body).unwrap();
        let unsettled = inbox["unsettled_messages"].as_array().unwrap();
        assert_eq!(unsettled.len(), 1);
        assert_eq!(unsettled[0]["content"], "Monitor 3 flickers.");
        let message_id = unsettled[0]["id"].as_u64().unwrap();

        let (status, body) = send(
            &app,
            Method::POST,
            "/inbox",
            Some(&admin2),
            Some(json!({ "replied_messages": [message_id] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let inbox: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(inbox["unsettled_messages"].as_array().unwrap().len(), 0);
        assert_eq!(inbox["settled_messages"].as_array().unwrap().len(), 1);

        // The first superuser sees the same settled message.
        let admin = admin_token(&app).await;
        let (_, body) = send(&app, Method::GET, "/inbox", Some(&admin), None).await;
        let inbox: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(inbox["settled_messages"].as_array().unwrap().len(), 1);
        assert_eq!(inbox["settled_messages"][0]["responded_by"], admin2_id);
    }

    #[tokio::test]
    async fn test_account_company_is_not_editable() {
        let (_dir, app) = test_app();
        let alice = signup(&app, "alice", "correct-horse").await;

        let (status, body) = send(
            &app,
            Method::PUT,
            "/accounts",
            Some(&alice),
            Some(json!({ "email": "alice@example.com", "company": "Rogue Inc", "job_role": "Surveyor" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        let account: Value = serde_json::from_str(&body).unwrap();
        assert!(account["profile"]["company"].is_null());
        assert_eq!(account["profile"]["job_role"], "Surveyor");
        assert_eq!(account["company"], "Example Co");

        let (_, body) = send(&app, Method::GET, "/accounts", Some(&alice), None).await;
        let account: Value = serde_json::from_str(&body).unwrap();
        assert!(account["profile"]["company"].is_null());
    }
}
