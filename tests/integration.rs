use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use taskboard::db::Repository;
use taskboard::{create_app, AppState};

struct TestServer {
    addr: String,
    client: Client,
    repo: Repository,
}

impl TestServer {
    async fn new() -> Self {
        let repo = Repository::open(":memory:", true).expect("opening in-memory database");

        let state = AppState { repo: repo.clone() };
        let app = create_app(state);

        // Bind to random available port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = format!("http://{}", listener.local_addr().unwrap());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = Client::new();

        TestServer { addr, client, repo }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    async fn create_todo(&self, body: Value) -> Value {
        let resp = self
            .client
            .post(self.url("/todos"))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        resp.json().await.unwrap()
    }

    async fn list(&self, query: &str) -> Value {
        let resp = self
            .client
            .get(self.url(&format!("/todos{query}")))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        resp.json().await.unwrap()
    }
}

fn ids(items: &Value) -> Vec<i64> {
    items
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_health() {
    let server = TestServer::new().await;

    let resp = server
        .client
        .get(server.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn test_create_todo_with_defaults() {
    let server = TestServer::new().await;

    let todo = server
        .create_todo(json!({"title": "Test todo", "status": "pending"}))
        .await;
    assert_eq!(todo["title"], "Test todo");
    assert_eq!(todo["status"], "pending");
    assert_eq!(todo["priority"], "medium");
    assert_eq!(todo["description"], "");
    assert_eq!(todo["tags"], json!([]));
    assert!(todo["id"].as_i64().is_some());
    assert!(todo["createdAt"].as_i64().is_some());
    assert!(todo["updatedAt"].as_i64().is_some());
}

#[tokio::test]
async fn test_create_trims_title() {
    let server = TestServer::new().await;

    let todo = server.create_todo(json!({"title": "  padded  "})).await;
    assert_eq!(todo["title"], "padded");
}

#[tokio::test]
async fn test_create_requires_title() {
    let server = TestServer::new().await;

    for body in [json!({}), json!({"title": "   "})] {
        let resp = server
            .client
            .post(server.url("/todos"))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let err: Value = resp.json().await.unwrap();
        assert_eq!(err["error"], "Validation error");
        assert_eq!(err["details"][0]["field"], "title");
    }
}

#[tokio::test]
async fn test_create_rejects_invalid_priority() {
    let server = TestServer::new().await;

    let resp = server
        .client
        .post(server.url("/todos"))
        .json(&json!({"title": "Invalid priority", "priority": "urgent"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let err: Value = resp.json().await.unwrap();
    assert!(!err["error"].as_str().unwrap().is_empty());
    assert_eq!(err["details"][0]["field"], "priority");
}

#[tokio::test]
async fn test_create_rejects_invalid_status() {
    let server = TestServer::new().await;

    let resp = server
        .client
        .post(server.url("/todos"))
        .json(&json!({"title": "Invalid status", "status": "done"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_sort_order_rejects_invalid_values() {
    let server = TestServer::new().await;

    for sort_order in [json!(-1), json!(1.5), json!(1_000_001), json!("abc")] {
        let resp = server
            .client
            .post(server.url("/todos"))
            .json(&json!({"title": "Invalid sortOrder", "sortOrder": sort_order}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let err: Value = resp.json().await.unwrap();
        assert!(!err["error"].as_str().unwrap().is_empty());
        assert_eq!(err["details"][0]["field"], "sortOrder");
    }
}

#[tokio::test]
async fn test_sort_order_accepts_boundaries() {
    let server = TestServer::new().await;

    let min = server
        .create_todo(json!({"title": "Min sortOrder", "sortOrder": 0}))
        .await;
    assert_eq!(min["sortOrder"], 0);

    let max = server
        .create_todo(json!({"title": "Max sortOrder", "sortOrder": 1_000_000}))
        .await;
    assert_eq!(max["sortOrder"], 1_000_000);
}

#[tokio::test]
async fn test_due_date_normalized_to_utc() {
    let server = TestServer::new().await;

    let todo = server
        .create_todo(json!({"title": "Due", "dueDate": "2026-03-01T12:30:00+01:00"}))
        .await;
    assert_eq!(todo["dueDate"], "2026-03-01T11:30:00Z");

    let resp = server
        .client
        .post(server.url("/todos"))
        .json(&json!({"title": "Bad due", "dueDate": "next tuesday"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let err: Value = resp.json().await.unwrap();
    assert_eq!(err["details"][0]["field"], "dueDate");
}

#[tokio::test]
async fn test_list_includes_created_todo() {
    let server = TestServer::new().await;

    server.create_todo(json!({"title": "List me"})).await;

    let body = server.list("").await;
    assert!(body["items"].is_array());
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["title"], "List me");
    assert_eq!(body["page"], 1);
    assert_eq!(body["limit"], 20);
    assert_eq!(body["pages"], 1);
    assert_eq!(body["sort"], "createdAt:desc");
}

#[tokio::test]
async fn test_list_pagination() {
    let server = TestServer::new().await;

    for (title, sort_order) in [("one", 1), ("two", 2), ("three", 3)] {
        server
            .create_todo(json!({"title": title, "sortOrder": sort_order}))
            .await;
    }

    let body = server.list("?sort=sortOrder:asc&limit=2").await;
    assert_eq!(body["total"], 3);
    assert_eq!(body["pages"], 2);
    assert_eq!(body["items"].as_array().unwrap().len(), 2);
    assert_eq!(body["items"][0]["title"], "one");
    assert_eq!(body["items"][1]["title"], "two");

    let body = server.list("?sort=sortOrder:asc&limit=2&page=2").await;
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["items"][0]["title"], "three");
}

#[tokio::test]
async fn test_list_clamps_page_and_limit() {
    let server = TestServer::new().await;

    let body = server.list("?limit=1000&page=0").await;
    assert_eq!(body["limit"], 100);
    assert_eq!(body["page"], 1);

    let body = server.list("?limit=abc&page=abc").await;
    assert_eq!(body["limit"], 20);
    assert_eq!(body["page"], 1);
}

#[tokio::test]
async fn test_list_echoes_sort_and_filters() {
    let server = TestServer::new().await;

    let body = server.list("?sort=bogus:asc").await;
    assert_eq!(body["sort"], "createdAt:asc");

    let body = server.list("?status=pending&tag=work&boardId=b-1").await;
    assert_eq!(body["filters"]["status"], "pending");
    assert_eq!(body["filters"]["tag"], "work");
    assert_eq!(body["filters"]["boardId"], "b-1");
    assert_eq!(body["filters"]["q"], Value::Null);
    assert_eq!(body["filters"]["priority"], Value::Null);
}

#[tokio::test]
async fn test_list_rejects_out_of_enum_status_filter() {
    let server = TestServer::new().await;

    let resp = server
        .client
        .get(server.url("/todos?status=done"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let err: Value = resp.json().await.unwrap();
    assert_eq!(err["details"][0]["field"], "status");
}

#[tokio::test]
async fn test_list_filters_by_priority() {
    let server = TestServer::new().await;

    server
        .create_todo(json!({"title": "Low task", "priority": "low"}))
        .await;
    server
        .create_todo(json!({"title": "High task", "priority": "high"}))
        .await;
    server
        .create_todo(json!({"title": "Medium task", "priority": "medium"}))
        .await;

    let body = server.list("?priority=high").await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["title"], "High task");
    assert_eq!(body["items"][0]["priority"], "high");
}

#[tokio::test]
async fn test_list_filters_by_tag() {
    let server = TestServer::new().await;

    server
        .create_todo(json!({"title": "Tagged", "tags": ["work", "errand"]}))
        .await;
    server
        .create_todo(json!({"title": "Other", "tags": ["home"]}))
        .await;

    let body = server.list("?tag=work,missing").await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["title"], "Tagged");
}

#[tokio::test]
async fn test_list_filters_by_title_substring() {
    let server = TestServer::new().await;

    server.create_todo(json!({"title": "Buy Groceries"})).await;
    server.create_todo(json!({"title": "Call mom"})).await;

    let body = server.list("?q=groceries").await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["title"], "Buy Groceries");
}

#[tokio::test]
async fn test_update_todo_status() {
    let server = TestServer::new().await;

    let created = server
        .create_todo(json!({"title": "Update me", "status": "pending"}))
        .await;
    let id = created["id"].as_i64().unwrap();

    let resp = server
        .client
        .put(server.url(&format!("/todos/{id}")))
        .json(&json!({"status": "completed"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Value = resp.json().await.unwrap();
    assert_eq!(updated["status"], "completed");
    assert_eq!(updated["title"], "Update me");
}

#[tokio::test]
async fn test_update_changes_only_provided_fields() {
    let server = TestServer::new().await;

    let created = server
        .create_todo(json!({
            "title": "Keep my fields",
            "description": "original description",
            "priority": "high",
            "tags": ["a", "b"],
            "sortOrder": 7
        }))
        .await;
    let id = created["id"].as_i64().unwrap();

    let resp = server
        .client
        .put(server.url(&format!("/todos/{id}")))
        .json(&json!({"status": "in-progress"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Value = resp.json().await.unwrap();
    assert_eq!(updated["status"], "in-progress");
    assert_eq!(updated["title"], "Keep my fields");
    assert_eq!(updated["description"], "original description");
    assert_eq!(updated["priority"], "high");
    assert_eq!(updated["tags"], json!(["a", "b"]));
    assert_eq!(updated["sortOrder"], 7);
}

#[tokio::test]
async fn test_update_rejects_invalid_fields() {
    let server = TestServer::new().await;

    let created = server.create_todo(json!({"title": "Validate me"})).await;
    let id = created["id"].as_i64().unwrap();

    for body in [
        json!({"title": "   "}),
        json!({"priority": "urgent"}),
        json!({"sortOrder": -1}),
    ] {
        let resp = server
            .client
            .put(server.url(&format!("/todos/{id}")))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_todo_not_found() {
    let server = TestServer::new().await;

    let resp = server
        .client
        .put(server.url("/todos/9999"))
        .json(&json!({"title": "Test"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = server
        .client
        .delete(server.url("/todos/9999"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_then_list_is_empty() {
    let server = TestServer::new().await;

    let created = server.create_todo(json!({"title": "Delete me"})).await;
    let id = created["id"].as_i64().unwrap();

    let resp = server
        .client
        .delete(server.url(&format!("/todos/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let body = server.list("").await;
    assert_eq!(body["total"], 0);
    assert_eq!(body["pages"], 0);
}

#[tokio::test]
async fn test_deterministic_ordering_for_identical_sort_keys() {
    let server = TestServer::new().await;

    let mut created = Vec::new();
    for title in ["A", "B", "C"] {
        created.push(
            server
                .create_todo(json!({"title": title, "sortOrder": 10}))
                .await,
        );
    }

    // Equal sort keys resolve newest-first
    let expected: Vec<i64> = created
        .iter()
        .rev()
        .map(|todo| todo["id"].as_i64().unwrap())
        .collect();

    let first = server.list("?sort=sortOrder:asc").await;
    let second = server.list("?sort=sortOrder:asc").await;

    assert_eq!(ids(&first["items"]), expected);
    assert_eq!(ids(&second["items"]), expected);
}

#[tokio::test]
async fn test_board_scoped_listing_matches_filtered_listing() {
    let server = TestServer::new().await;

    let board_id = "board-1";
    for (title, sort_order) in [("B-2", 2), ("B-1", 1), ("B-3", 3)] {
        server
            .create_todo(json!({"title": title, "boardId": board_id, "sortOrder": sort_order}))
            .await;
    }
    server
        .create_todo(json!({"title": "Other board", "boardId": "board-2", "sortOrder": 1}))
        .await;

    let list_body = server
        .list(&format!("?boardId={board_id}&sort=sortOrder:asc"))
        .await;
    assert_eq!(list_body["total"], 3);
    assert_eq!(list_body["items"].as_array().unwrap().len(), 3);

    let resp = server
        .client
        .get(server.url(&format!("/boards/{board_id}/todos?sort=sortOrder:asc")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let board_body: Value = resp.json().await.unwrap();

    assert_eq!(ids(&list_body["items"]), ids(&board_body["todos"]));

    let titles: Vec<&str> = board_body["todos"]
        .as_array()
        .unwrap()
        .iter()
        .map(|todo| todo["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["B-1", "B-2", "B-3"]);
}

#[tokio::test]
async fn test_boards_require_authentication() {
    let server = TestServer::new().await;

    let resp = server
        .client
        .get(server.url("/boards"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = server
        .client
        .get(server.url("/boards"))
        .header("Authorization", "Bearer bogus")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_boards_list_is_owner_scoped_and_newest_first() {
    let server = TestServer::new().await;

    server.repo.insert_board("Alpha", "user-1").unwrap();
    server.repo.insert_board("Beta", "user-1").unwrap();
    server.repo.insert_board("Gamma", "user-2").unwrap();
    server.repo.insert_api_token("tok-1", "user-1").unwrap();

    let resp = server
        .client
        .get(server.url("/boards"))
        .header("Authorization", "Bearer tok-1")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();

    let boards = body["boards"].as_array().unwrap();
    assert_eq!(boards.len(), 2);
    assert_eq!(boards[0]["name"], "Beta");
    assert_eq!(boards[1]["name"], "Alpha");

    // Projection: id, name and createdAt only
    assert!(boards[0]["id"].as_i64().is_some());
    assert!(boards[0]["createdAt"].as_i64().is_some());
    assert!(boards[0].get("ownerId").is_none());
    assert!(boards[0].get("updatedAt").is_none());
}

#[tokio::test]
async fn test_full_crud_scenario() {
    let server = TestServer::new().await;

    let created = server
        .create_todo(json!({"title": "Test todo", "status": "pending"}))
        .await;
    assert_eq!(created["status"], "pending");
    let id = created["id"].as_i64().unwrap();

    let body = server.list("").await;
    assert_eq!(body["total"], 1);

    let resp = server
        .client
        .put(server.url(&format!("/todos/{id}")))
        .json(&json!({"status": "completed"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Value = resp.json().await.unwrap();
    assert_eq!(updated["status"], "completed");

    let resp = server
        .client
        .delete(server.url(&format!("/todos/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let body = server.list("").await;
    assert_eq!(body["total"], 0);
}
