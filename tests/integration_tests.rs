use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use std::time::Duration;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message as TungsteniteMessage};
use url::Url;
use uuid::Uuid;

mod unit;
mod websocket;

const API_URL: &str = "http://127.0.0.1:8000";
const WEBSOCKET_URL: &str = "ws://127.0.0.1:8000/ws";

/// Registers a fresh user (with their personal organization) and returns the
/// access token.
async fn register_user(client: &reqwest::Client) -> String {
    register_account(client).await.0
}

/// Like `register_user`, also returning the email.
async fn register_account(client: &reqwest::Client) -> (String, String) {
    let suffix = Uuid::new_v4().simple().to_string();
    let email = format!("pm_{}@example.com", &suffix[..8]);
    let response = client
        .post(format!("{}/auth/register", API_URL))
        .json(&json!({
            "email": email,
            "username": format!("pm_{}", &suffix[..8]),
            "name": "Test Manager",
            "password": "Str0ngPass!",
        }))
        .send()
        .await
        .expect("register request");
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);

    let body: Value = response.json().await.unwrap();
    let token = body["data"]["access_token"]
        .as_str()
        .expect("access token in response")
        .to_string();
    (token, email)
}

async fn profile(client: &reqwest::Client, token: &str) -> Value {
    let body: Value = client
        .get(format!("{}/auth/profile", API_URL))
        .bearer_auth(token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    body["data"].clone()
}

async fn create_project(client: &reqwest::Client, token: &str) -> String {
    let project: Value = client
        .post(format!("{}/projects", API_URL))
        .bearer_auth(token)
        .json(&json!({
            "code": format!("IT-{}", &Uuid::new_v4().simple().to_string()[..6]),
            "name": "Integration project",
            "start_date": "2026-03-02",
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    project["data"]["id"].as_str().unwrap().to_string()
}

async fn create_task(client: &reqwest::Client, token: &str, project_id: &str, wbs: &str) -> String {
    let task: Value = client
        .post(format!("{}/projects/{}/tasks", API_URL, project_id))
        .bearer_auth(token)
        .json(&json!({ "wbs_code": wbs, "name": format!("Task {}", wbs) }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    task["data"]["id"].as_str().unwrap().to_string()
}

/// Adds the account behind `email` to the caller's organization and makes it
/// the account's current organization.
async fn join_organization(client: &reqwest::Client, owner: &str, token: &str, email: &str, role: &str) {
    let added = client
        .post(format!("{}/members", API_URL))
        .bearer_auth(owner)
        .json(&json!({ "email": email, "role": role }))
        .send()
        .await
        .unwrap();
    assert_eq!(added.status(), reqwest::StatusCode::CREATED);

    let organization_id = profile(client, owner).await["current_organization_id"].clone();
    let switched = client
        .post(format!("{}/auth/switch-organization", API_URL))
        .bearer_auth(token)
        .json(&json!({ "organization_id": organization_id }))
        .send()
        .await
        .unwrap();
    assert!(switched.status().is_success());
}

async fn error_code(response: reqwest::Response) -> String {
    let body: Value = response.json().await.unwrap();
    body["errors"][0]["code"].as_str().unwrap_or_default().to_string()
}

#[tokio::test]
#[ignore = "requires running server"]
async fn test_health_reports_dependencies() {
    let body: Value = reqwest::get(format!("{}/health", API_URL))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(body["database"].is_string());
    assert!(body["redis"].is_string());
}

#[tokio::test]
#[ignore = "requires running server"]
async fn test_protected_route_requires_token() {
    let response = reqwest::get(format!("{}/projects", API_URL)).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "requires running server"]
async fn test_project_task_and_gantt_flow() {
    let client = reqwest::Client::new();
    let token = register_user(&client).await;

    let project: Value = client
        .post(format!("{}/projects", API_URL))
        .bearer_auth(&token)
        .json(&json!({
            "code": format!("IT-{}", &Uuid::new_v4().simple().to_string()[..6]),
            "name": "Integration project",
            "start_date": "2026-03-02",
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let project_id = project["data"]["id"].as_str().unwrap().to_string();

    let mut task_ids = Vec::new();
    for (wbs, hours) in [("1", 16.0), ("2", 24.0)] {
        let task: Value = client
            .post(format!("{}/projects/{}/tasks", API_URL, project_id))
            .bearer_auth(&token)
            .json(&json!({ "wbs_code": wbs, "name": format!("Task {}", wbs), "estimated_hours": hours }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        task_ids.push(task["data"]["id"].as_str().unwrap().to_string());
    }

    let link = client
        .post(format!("{}/projects/{}/dependencies", API_URL, project_id))
        .bearer_auth(&token)
        .json(&json!({ "predecessor_id": task_ids[0], "successor_id": task_ids[1] }))
        .send()
        .await
        .unwrap();
    assert!(link.status().is_success());

    let cycle = client
        .post(format!("{}/projects/{}/dependencies", API_URL, project_id))
        .bearer_auth(&token)
        .json(&json!({ "predecessor_id": task_ids[1], "successor_id": task_ids[0] }))
        .send()
        .await
        .unwrap();
    assert_eq!(cycle.status(), reqwest::StatusCode::CONFLICT);

    let gantt: Value = client
        .get(format!("{}/projects/{}/gantt", API_URL, project_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(gantt["data"]["critical_path"].as_array().unwrap().len(), 2);
}

#[tokio::test]
#[ignore = "requires running server"]
async fn test_dependency_duplicate_and_cycle_conflicts() {
    let client = reqwest::Client::new();
    let token = register_user(&client).await;
    let project_id = create_project(&client, &token).await;
    let a = create_task(&client, &token, &project_id, "1").await;
    let b = create_task(&client, &token, &project_id, "2").await;
    let url = format!("{}/projects/{}/dependencies", API_URL, project_id);

    let first = client
        .post(&url)
        .bearer_auth(&token)
        .json(&json!({ "predecessor_id": a, "successor_id": b }))
        .send()
        .await
        .unwrap();
    assert!(first.status().is_success());

    let again = client
        .post(&url)
        .bearer_auth(&token)
        .json(&json!({ "predecessor_id": a, "successor_id": b }))
        .send()
        .await
        .unwrap();
    assert_eq!(again.status(), reqwest::StatusCode::CONFLICT);
    assert_eq!(error_code(again).await, "DEPENDENCY_EXISTS");

    let back = client
        .post(&url)
        .bearer_auth(&token)
        .json(&json!({ "predecessor_id": b, "successor_id": a }))
        .send()
        .await
        .unwrap();
    assert_eq!(back.status(), reqwest::StatusCode::CONFLICT);
    assert_eq!(error_code(back).await, "DEPENDENCY_CYCLE");
}

#[tokio::test]
#[ignore = "requires running server"]
async fn test_opposite_dependencies_race_to_one_winner() {
    let client = reqwest::Client::new();
    let token = register_user(&client).await;
    let project_id = create_project(&client, &token).await;
    let a = create_task(&client, &token, &project_id, "1").await;
    let b = create_task(&client, &token, &project_id, "2").await;
    let url = format!("{}/projects/{}/dependencies", API_URL, project_id);

    let (forward, backward) = tokio::join!(
        client
            .post(&url)
            .bearer_auth(&token)
            .json(&json!({ "predecessor_id": a, "successor_id": b }))
            .send(),
        client
            .post(&url)
            .bearer_auth(&token)
            .json(&json!({ "predecessor_id": b, "successor_id": a }))
            .send(),
    );
    let statuses = [forward.unwrap().status(), backward.unwrap().status()];
    assert_eq!(statuses.iter().filter(|s| s.is_success()).count(), 1);
    assert!(statuses.contains(&reqwest::StatusCode::CONFLICT));

    let links: Value = client
        .get(&url)
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(links["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
#[ignore = "requires running server"]
async fn test_concurrent_time_entries_respect_daily_cap() {
    let client = reqwest::Client::new();
    let token = register_user(&client).await;
    let project_id = create_project(&client, &token).await;
    let task_id = create_task(&client, &token, &project_id, "1").await;
    let url = format!("{}/time-entries", API_URL);
    let entry = json!({ "task_id": task_id, "work_date": "2026-03-04", "hours": 16.0 });

    let (first, second) = tokio::join!(
        client.post(&url).bearer_auth(&token).json(&entry).send(),
        client.post(&url).bearer_auth(&token).json(&entry).send(),
    );
    let (first, second) = (first.unwrap(), second.unwrap());
    let created = [first.status(), second.status()]
        .iter()
        .filter(|s| **s == reqwest::StatusCode::CREATED)
        .count();
    assert_eq!(created, 1);

    let rejected = if first.status() == reqwest::StatusCode::CONFLICT { first } else { second };
    assert_eq!(rejected.status(), reqwest::StatusCode::CONFLICT);
    assert_eq!(error_code(rejected).await, "DAILY_HOURS_EXCEEDED");
}

#[tokio::test]
#[ignore = "requires running server"]
async fn test_last_owner_cannot_leave_or_step_down() {
    let client = reqwest::Client::new();
    let token = register_user(&client).await;
    let me = profile(&client, &token).await["id"].as_str().unwrap().to_string();
    let url = format!("{}/members/{}", API_URL, me);

    let demote = client
        .put(&url)
        .bearer_auth(&token)
        .json(&json!({ "role": "member" }))
        .send()
        .await
        .unwrap();
    assert_eq!(demote.status(), reqwest::StatusCode::CONFLICT);
    assert_eq!(error_code(demote).await, "LAST_OWNER");

    let leave = client.delete(&url).bearer_auth(&token).send().await.unwrap();
    assert_eq!(leave.status(), reqwest::StatusCode::CONFLICT);
    assert_eq!(error_code(leave).await, "LAST_OWNER");
}

#[tokio::test]
#[ignore = "requires running server"]
async fn test_concurrent_owner_demotions_keep_an_owner() {
    let client = reqwest::Client::new();
    let owner = register_user(&client).await;
    let (co_owner, co_owner_email) = register_account(&client).await;
    join_organization(&client, &owner, &co_owner, &co_owner_email, "owner").await;

    let owner_id = profile(&client, &owner).await["id"].as_str().unwrap().to_string();
    let co_owner_id = profile(&client, &co_owner).await["id"].as_str().unwrap().to_string();
    let demote = json!({ "role": "member" });

    let (first, second) = tokio::join!(
        client
            .put(format!("{}/members/{}", API_URL, co_owner_id))
            .bearer_auth(&owner)
            .json(&demote)
            .send(),
        client
            .put(format!("{}/members/{}", API_URL, owner_id))
            .bearer_auth(&co_owner)
            .json(&demote)
            .send(),
    );
    // The loser either fails the owner count or has already lost its own role.
    let statuses = [first.unwrap().status(), second.unwrap().status()];
    assert_eq!(statuses.iter().filter(|s| s.is_success()).count(), 1);
    assert!(statuses
        .iter()
        .any(|s| *s == reqwest::StatusCode::CONFLICT || *s == reqwest::StatusCode::FORBIDDEN));

    let members: Value = client
        .get(format!("{}/members", API_URL))
        .bearer_auth(&owner)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let owners = members["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|m| m["role"] == "owner")
        .count();
    assert_eq!(owners, 1);
}

#[tokio::test]
#[ignore = "requires running server"]
async fn test_other_organization_project_is_not_found() {
    let client = reqwest::Client::new();
    let owner = register_user(&client).await;
    let outsider = register_user(&client).await;
    let project_id = create_project(&client, &owner).await;

    let response = client
        .get(format!("{}/projects/{}", API_URL, project_id))
        .bearer_auth(&outsider)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);

    let tasks = client
        .get(format!("{}/projects/{}/tasks", API_URL, project_id))
        .bearer_auth(&outsider)
        .send()
        .await
        .unwrap();
    assert_eq!(tasks.status(), reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires running server"]
async fn test_logout_revokes_access_token() {
    let client = reqwest::Client::new();
    let token = register_user(&client).await;

    let before = client
        .get(format!("{}/auth/profile", API_URL))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(before.status(), reqwest::StatusCode::OK);

    let logout = client
        .post(format!("{}/auth/logout", API_URL))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert!(logout.status().is_success());

    let after = client
        .get(format!("{}/auth/profile", API_URL))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(after.status(), reqwest::StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "requires running server"]
async fn test_concurrent_direct_conversations_dedupe() {
    let client = reqwest::Client::new();
    let owner = register_user(&client).await;
    let (peer, peer_email) = register_account(&client).await;
    join_organization(&client, &owner, &peer, &peer_email, "member").await;
    let peer_id = profile(&client, &peer).await["id"].as_str().unwrap().to_string();

    let url = format!("{}/conversations", API_URL);
    let request = json!({ "kind": "direct", "participant_ids": [peer_id] });
    let (first, second) = tokio::join!(
        client.post(&url).bearer_auth(&owner).json(&request).send(),
        client.post(&url).bearer_auth(&owner).json(&request).send(),
    );
    let (first, second) = (first.unwrap(), second.unwrap());
    let statuses = [first.status(), second.status()];
    assert_eq!(statuses.iter().filter(|s| s.is_success()).count(), 1);

    let rejected = if first.status() == reqwest::StatusCode::CONFLICT { first } else { second };
    assert_eq!(rejected.status(), reqwest::StatusCode::CONFLICT);
    assert_eq!(error_code(rejected).await, "DIRECT_CONVERSATION_EXISTS");
}

#[tokio::test]
#[ignore = "requires running server"]
async fn test_websocket_welcome_and_ping() {
    let client = reqwest::Client::new();
    let token = register_user(&client).await;
    let url = Url::parse(&format!("{}?token={}", WEBSOCKET_URL, token)).expect("Invalid URL");

    let (ws_stream, _) = connect_async(url).await.expect("Failed to connect");
    let (mut write, mut read) = ws_stream.split();

    let welcome = timeout(Duration::from_secs(5), read.next())
        .await
        .expect("Timeout waiting for welcome")
        .expect("Stream ended")
        .expect("Read error");
    let TungsteniteMessage::Text(text) = welcome else {
        panic!("expected a text frame");
    };
    let frame: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(frame["type"], "welcome");

    write
        .send(TungsteniteMessage::Text(json!({"type": "ping"}).to_string()))
        .await
        .unwrap();
    let pong = timeout(Duration::from_secs(5), read.next())
        .await
        .expect("Timeout waiting for pong")
        .expect("Stream ended")
        .expect("Read error");
    if let TungsteniteMessage::Text(text) = pong {
        let frame: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(frame["type"], "pong");
    }

    write
        .send(TungsteniteMessage::Text("not json".to_string()))
        .await
        .unwrap();
    let error = timeout(Duration::from_secs(5), read.next())
        .await
        .expect("Timeout waiting for error")
        .expect("Stream ended")
        .expect("Read error");
    if let TungsteniteMessage::Text(text) = error {
        let frame: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(frame["code"], "INVALID_FRAME");
    }
}

#[tokio::test]
#[ignore = "requires running server"]
async fn test_websocket_rejects_invalid_token() {
    let url = Url::parse(&format!("{}?token=not-a-jwt", WEBSOCKET_URL)).unwrap();
    assert!(connect_async(url).await.is_err());
}
