/// HTTP-level tests for the TicketTrack API
///
/// Each test drives a fresh router over an in-memory store:
/// - identity endpoints and bearer authentication
/// - board membership and invitations
/// - the ticket lifecycle, including the full board scenario
/// - status code and error body mapping

mod common;

use axum::http::StatusCode;
use common::TestContext;
use serde_json::{json, Value};

fn member_ids(board: &Value) -> Vec<String> {
    board["members"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["user_id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_health_check() {
    let ctx = TestContext::new();

    let (status, body) = ctx.request("GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["store"], "connected");
}

#[tokio::test]
async fn test_signup_signin_and_me() {
    let ctx = TestContext::new();
    let ada = ctx.signup("Ada@Example.com", "Ada").await;
    assert_eq!(ada.email, "ada@example.com");

    let (status, body) = ctx
        .request(
            "POST",
            "/v1/auth/signin",
            None,
            Some(json!({ "email": "ada@example.com", "password": "password123" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "Bearer");
    assert!(body["user"].get("password_hash").is_none());

    let token = body["access_token"].as_str().unwrap().to_string();
    let (status, me) = ctx.request("GET", "/v1/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"], ada.id.as_str());
    assert_eq!(me["role"], "member");
}

#[tokio::test]
async fn test_signup_rejects_duplicates_and_bad_input() {
    let ctx = TestContext::new();
    ctx.signup("ada@example.com", "Ada").await;

    let (status, body) = ctx
        .request(
            "POST",
            "/v1/auth/signup",
            None,
            Some(json!({ "email": "ADA@example.com", "password": "password123", "name": "Ada 2" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    let (status, body) = ctx
        .request(
            "POST",
            "/v1/auth/signup",
            None,
            Some(json!({ "email": "nope", "password": "short", "name": "" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
    assert!(body["details"].as_array().unwrap().len() >= 3);
}

#[tokio::test]
async fn test_signin_wrong_password() {
    let ctx = TestContext::new();
    ctx.signup("ada@example.com", "Ada").await;

    let (wrong_status, wrong_body) = ctx
        .request(
            "POST",
            "/v1/auth/signin",
            None,
            Some(json!({ "email": "ada@example.com", "password": "wrong-password" })),
        )
        .await;
    let (unknown_status, unknown_body) = ctx
        .request(
            "POST",
            "/v1/auth/signin",
            None,
            Some(json!({ "email": "ghost@example.com", "password": "password123" })),
        )
        .await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body["message"], unknown_body["message"]);
}

#[tokio::test]
async fn test_refresh_token_flow() {
    let ctx = TestContext::new();
    let (_, body) = ctx
        .request(
            "POST",
            "/v1/auth/signup",
            None,
            Some(json!({ "email": "ada@example.com", "password": "password123", "name": "Ada" })),
        )
        .await;
    let refresh_token = body["refresh_token"].as_str().unwrap().to_string();

    // Refresh tokens are not accepted as bearer credentials
    let (status, _) = ctx
        .request("GET", "/v1/boards", Some(&refresh_token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = ctx
        .request(
            "POST",
            "/v1/auth/refresh",
            None,
            Some(json!({ "refresh_token": refresh_token })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let access_token = body["access_token"].as_str().unwrap().to_string();
    let (status, _) = ctx.request("GET", "/v1/boards", Some(&access_token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_protected_routes_require_authentication() {
    let ctx = TestContext::new();

    let (status, body) = ctx.request("GET", "/v1/boards", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = ctx
        .request("GET", "/v1/boards", Some("garbage"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_security_headers_present() {
    let ctx = TestContext::new();
    let response = {
        use axum::{body::Body, http::Request};
        use tower::ServiceExt;

        ctx.app
            .clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap()
    };

    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
}

#[tokio::test]
async fn test_board_visibility() {
    let ctx = TestContext::new();
    let owner = ctx.signup("owner@example.com", "Owner").await;
    let outsider = ctx.signup("outsider@example.com", "Outsider").await;

    let board = ctx.create_board(&owner, "Sprint 1").await;
    let board_id = board["id"].as_str().unwrap();
    assert_eq!(board["ticket_prefix"], "SPRINT1");
    assert_eq!(board["my_role"], "owner");
    assert!(board["members"].as_array().unwrap().is_empty());

    let (status, body) = ctx
        .request("GET", &format!("/v1/boards/{}", board_id), Some(&owner.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["board"]["owner"]["email"], "owner@example.com");

    let (status, body) = ctx
        .request("GET", &format!("/v1/boards/{}", board_id), Some(&outsider.token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (status, body) = ctx.request("GET", "/v1/boards", Some(&outsider.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["boards"].as_array().unwrap().is_empty());

    let (status, body) = ctx
        .request(
            "GET",
            &format!("/v1/boards/{}", uuid::Uuid::new_v4()),
            Some(&owner.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_create_board_blank_name() {
    let ctx = TestContext::new();
    let owner = ctx.signup("owner@example.com", "Owner").await;

    let (status, body) = ctx
        .request("POST", "/v1/boards", Some(&owner.token), Some(json!({ "name": "   " })))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_input");
}

#[tokio::test]
async fn test_invitation_rules() {
    let ctx = TestContext::new();
    let owner = ctx.signup("owner@example.com", "Owner").await;
    let bob = ctx.signup("b@x.com", "Bob").await;
    let eve = ctx.signup("eve@example.com", "Eve").await;

    let board = ctx.create_board(&owner, "Sprint 1").await;
    let board_id = board["id"].as_str().unwrap();
    let invite_uri = format!("/v1/boards/{}/invite", board_id);
    let accept_uri = format!("/v1/boards/{}/accept-invitation", board_id);

    let (status, body) = ctx
        .request("POST", &invite_uri, Some(&owner.token), Some(json!({ "email": "b@x.com" })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["invitation"]["status"], "pending");

    // Second invitation while the first is pending
    let (status, _) = ctx
        .request("POST", &invite_uri, Some(&owner.token), Some(json!({ "email": "B@x.com" })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Someone else's invitation
    let (status, _) = ctx
        .request("POST", &accept_uri, Some(&eve.token), Some(json!({ "email": "b@x.com" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Non-members cannot invite
    let (status, _) = ctx
        .request("POST", &invite_uri, Some(&eve.token), Some(json!({ "email": "eve@example.com" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .request("POST", &accept_uri, Some(&bob.token), Some(json!({ "email": "b@x.com" })))
        .await;
    assert_eq!(status, StatusCode::OK);

    // Second acceptance finds no pending invitation
    let (status, body) = ctx
        .request("POST", &accept_uri, Some(&bob.token), Some(json!({ "email": "b@x.com" })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    // Existing members cannot be invited again
    let (status, _) = ctx
        .request("POST", &invite_uri, Some(&owner.token), Some(json!({ "email": "b@x.com" })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = ctx
        .request("GET", &format!("/v1/boards/{}", board_id), Some(&owner.token), None)
        .await;
    assert_eq!(member_ids(&body["board"]), vec![bob.id.clone()]);
}

#[tokio::test]
async fn test_invite_rejects_malformed_email() {
    let ctx = TestContext::new();
    let owner = ctx.signup("owner@example.com", "Owner").await;
    let board = ctx.create_board(&owner, "Sprint 1").await;
    let board_id = board["id"].as_str().unwrap();

    let (status, body) = ctx
        .request(
            "POST",
            &format!("/v1/boards/{}/invite", board_id),
            Some(&owner.token),
            Some(json!({ "email": "not-an-email" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"][0]["field"], "email");

    let (status, _) = ctx
        .request(
            "POST",
            &format!("/v1/boards/{}/accept-invitation", board_id),
            Some(&owner.token),
            Some(json!({ "email": "bob@" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_board_to_done_scenario() {
    let ctx = TestContext::new();
    let a = ctx.signup("a@x.com", "Alice").await;
    let b = ctx.signup("b@x.com", "Bob").await;

    let board = ctx.create_board(&a, "Sprint 1").await;
    let board_id = board["id"].as_str().unwrap().to_string();

    let (status, _) = ctx
        .request(
            "POST",
            &format!("/v1/boards/{}/invite", board_id),
            Some(&a.token),
            Some(json!({ "email": "b@x.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = ctx
        .request(
            "POST",
            &format!("/v1/boards/{}/accept-invitation", board_id),
            Some(&b.token),
            Some(json!({ "email": "b@x.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let board = &body["board"];
    let members = board["members"].as_array().unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0]["user_id"], b.id.as_str());
    assert_eq!(members[0]["role"], "member");
    assert_eq!(board["invitations"][0]["status"], "accepted");

    let ticket = ctx
        .create_ticket(
            &a,
            &board_id,
            json!({ "title": "Fix login", "description": "Users cannot sign in", "assigned_to": b.id }),
        )
        .await;
    assert_eq!(ticket["ticket_key"], "SPRINT1-1");
    assert_eq!(ticket["status"], "in process");
    assert_eq!(ticket["assigned_to"]["email"], "b@x.com");
    let ticket_uri = format!("/v1/tickets/{}", ticket["id"].as_str().unwrap());

    let (status, body) = ctx
        .request("PUT", &ticket_uri, Some(&b.token), Some(json!({ "status": "completed" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ticket"]["status"], "completed");

    let (status, body) = ctx.request("DELETE", &ticket_uri, Some(&a.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Ticket deleted");

    let (status, body) = ctx
        .request("GET", &format!("/v1/tickets/board/{}", board_id), Some(&a.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["tickets"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_ticket_keys_are_sequential() {
    let ctx = TestContext::new();
    let owner = ctx.signup("owner@example.com", "Owner").await;
    let board = ctx.create_board(&owner, "Web App").await;
    let board_id = board["id"].as_str().unwrap();

    let mut keys = Vec::new();
    for title in ["One", "Two", "Three"] {
        let ticket = ctx
            .create_ticket(&owner, board_id, json!({ "title": title }))
            .await;
        keys.push(ticket["ticket_key"].as_str().unwrap().to_string());
    }

    assert_eq!(keys, vec!["WEBAPP-1", "WEBAPP-2", "WEBAPP-3"]);
}

#[tokio::test]
async fn test_assignee_must_be_member() {
    let ctx = TestContext::new();
    let owner = ctx.signup("owner@example.com", "Owner").await;
    let outsider = ctx.signup("outsider@example.com", "Outsider").await;
    let board = ctx.create_board(&owner, "Sprint 1").await;
    let board_id = board["id"].as_str().unwrap();

    let (status, body) = ctx
        .request(
            "POST",
            "/v1/tickets",
            Some(&owner.token),
            Some(json!({
                "board_id": board_id,
                "title": "Fix login",
                "description": "Broken",
                "assigned_to": outsider.id,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "invalid_assignee");

    // The owner is an implicit member
    let ticket = ctx
        .create_ticket(&owner, board_id, json!({ "assigned_to": owner.id }))
        .await;
    assert_eq!(ticket["assigned_to"]["id"], owner.id.as_str());

    // Explicit null clears the assignee
    let (status, body) = ctx
        .request(
            "PUT",
            &format!("/v1/tickets/{}", ticket["id"].as_str().unwrap()),
            Some(&owner.token),
            Some(json!({ "assigned_to": null })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["ticket"]["assigned_to"].is_null());
}

#[tokio::test]
async fn test_ticket_patch_validation() {
    let ctx = TestContext::new();
    let owner = ctx.signup("owner@example.com", "Owner").await;
    let board = ctx.create_board(&owner, "Sprint 1").await;
    let ticket = ctx
        .create_ticket(&owner, board["id"].as_str().unwrap(), json!({}))
        .await;
    let uri = format!("/v1/tickets/{}", ticket["id"].as_str().unwrap());

    let (status, body) = ctx
        .request("PUT", &uri, Some(&owner.token), Some(json!({ "title": "  " })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_input");

    let (status, body) = ctx
        .request("PUT", &uri, Some(&owner.token), Some(json!({ "ticket_key": "X-1" })))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");

    let (status, _) = ctx
        .request("PUT", &uri, Some(&owner.token), Some(json!({ "status": "archived" })))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = ctx
        .request(
            "PUT",
            &uri,
            Some(&owner.token),
            Some(json!({
                "title": "Renamed",
                "priority": "urgent",
                "due_date": "2025-03-01",
                "tags": ["ui", " ui ", "auth"],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ticket"]["title"], "Renamed");
    assert_eq!(body["ticket"]["priority"], "urgent");
    assert_eq!(body["ticket"]["due_date"], "2025-03-01");
    assert_eq!(body["ticket"]["tags"], json!(["ui", "auth"]));
    assert_eq!(body["ticket"]["ticket_key"], "SPRINT1-1");
}

#[tokio::test]
async fn test_null_clears_tags_and_blockers() {
    let ctx = TestContext::new();
    let owner = ctx.signup("owner@example.com", "Owner").await;
    let board = ctx.create_board(&owner, "Sprint 1").await;
    let board_id = board["id"].as_str().unwrap();

    let blocker = ctx.create_ticket(&owner, board_id, json!({})).await;
    let ticket = ctx
        .create_ticket(
            &owner,
            board_id,
            json!({ "tags": ["ui"], "blockers": [blocker["id"]] }),
        )
        .await;
    assert_eq!(ticket["tags"], json!(["ui"]));
    assert_eq!(ticket["blockers"].as_array().unwrap().len(), 1);
    let uri = format!("/v1/tickets/{}", ticket["id"].as_str().unwrap());

    let (status, body) = ctx
        .request(
            "PUT",
            &uri,
            Some(&owner.token),
            Some(json!({ "tags": null, "blockers": null })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ticket"]["tags"], json!([]));
    assert_eq!(body["ticket"]["blockers"], json!([]));
    assert_eq!(body["ticket"]["title"], "Untitled");

    let (_, body) = ctx.request("GET", &uri, Some(&owner.token), None).await;
    assert_eq!(body["ticket"]["tags"], json!([]));
    assert_eq!(body["ticket"]["blockers"], json!([]));
}

#[tokio::test]
async fn test_delete_permissions() {
    let ctx = TestContext::new();
    let owner = ctx.signup("owner@example.com", "Owner").await;
    let alice = ctx.signup("alice@example.com", "Alice").await;
    let bob = ctx.signup("bob@example.com", "Bob").await;

    let board = ctx.create_board(&owner, "Sprint 1").await;
    let board_id = board["id"].as_str().unwrap();
    ctx.add_member(&owner, board_id, &alice).await;
    ctx.add_member(&owner, board_id, &bob).await;

    let ticket = ctx.create_ticket(&alice, board_id, json!({})).await;
    let uri = format!("/v1/tickets/{}", ticket["id"].as_str().unwrap());

    let (status, body) = ctx.request("DELETE", &uri, Some(&bob.token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    // Board owner is an admin
    let (status, _) = ctx.request("DELETE", &uri, Some(&owner.token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = ctx.request("GET", &uri, Some(&owner.token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Creator may delete their own ticket
    let ticket = ctx.create_ticket(&bob, board_id, json!({})).await;
    let uri = format!("/v1/tickets/{}", ticket["id"].as_str().unwrap());
    let (status, _) = ctx.request("DELETE", &uri, Some(&bob.token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_global_admin_needs_membership() {
    let ctx = TestContext::new();
    let owner = ctx.signup("owner@example.com", "Owner").await;
    let admin = ctx.global_admin("root@example.com").await;

    let board = ctx.create_board(&owner, "Sprint 1").await;
    let board_id = board["id"].as_str().unwrap();
    let ticket = ctx.create_ticket(&owner, board_id, json!({})).await;
    let uri = format!("/v1/tickets/{}", ticket["id"].as_str().unwrap());

    let (status, _) = ctx.request("DELETE", &uri, Some(&admin.token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    ctx.add_member(&owner, board_id, &admin).await;
    let (status, _) = ctx.request("DELETE", &uri, Some(&admin.token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_blockers_and_comments() {
    let ctx = TestContext::new();
    let owner = ctx.signup("owner@example.com", "Owner").await;
    let board = ctx.create_board(&owner, "Sprint 1").await;
    let board_id = board["id"].as_str().unwrap();

    let blocker = ctx
        .create_ticket(&owner, board_id, json!({ "title": "Set up database" }))
        .await;
    let blocked = ctx
        .create_ticket(&owner, board_id, json!({ "blockers": [blocker["id"]] }))
        .await;
    assert_eq!(blocked["blockers"][0]["ticket_key"], "SPRINT1-1");
    let blocked_uri = format!("/v1/tickets/{}", blocked["id"].as_str().unwrap());

    let (status, body) = ctx
        .request(
            "POST",
            &format!("{}/comments", blocked_uri),
            Some(&owner.token),
            Some(json!({ "text": "Waiting on the schema" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["ticket"]["comments"][0]["text"], "Waiting on the schema");
    assert!(body["ticket"]["comments"][0]["id"].is_string());
    assert_eq!(body["ticket"]["comments"][0]["author"]["email"], "owner@example.com");

    let (status, _) = ctx
        .request(
            "POST",
            &format!("{}/comments", blocked_uri),
            Some(&owner.token),
            Some(json!({ "text": "   " })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Deleting the blocker clears the reference
    let (status, _) = ctx
        .request(
            "DELETE",
            &format!("/v1/tickets/{}", blocker["id"].as_str().unwrap()),
            Some(&owner.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = ctx.request("GET", &blocked_uri, Some(&owner.token), None).await;
    assert!(body["ticket"]["blockers"].as_array().unwrap().is_empty());
    assert_eq!(body["ticket"]["comments"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_list_filters() {
    let ctx = TestContext::new();
    let owner = ctx.signup("owner@example.com", "Owner").await;
    let board = ctx.create_board(&owner, "Sprint 1").await;
    let board_id = board["id"].as_str().unwrap();

    ctx.create_ticket(&owner, board_id, json!({ "title": "A" })).await;
    ctx.create_ticket(&owner, board_id, json!({ "title": "B", "status": "ready" }))
        .await;
    ctx.create_ticket(&owner, board_id, json!({ "title": "C", "status": "ready" }))
        .await;

    let (status, body) = ctx
        .request(
            "GET",
            &format!("/v1/tickets/board/{}?status=ready", board_id),
            Some(&owner.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = body["tickets"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["C", "B"]);

    let (status, body) = ctx
        .request(
            "GET",
            &format!("/v1/tickets/board/{}?status=in%20process", board_id),
            Some(&owner.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tickets"].as_array().unwrap().len(), 1);

    let (status, body) = ctx
        .request(
            "GET",
            &format!("/v1/tickets/board/{}?status=bogus", board_id),
            Some(&owner.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_input");
}
