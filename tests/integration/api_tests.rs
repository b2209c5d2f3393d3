//! API integration tests
//!
//! These run against a live server with an empty or disposable database:
//! `cargo test -- --ignored`

use std::time::{SystemTime, UNIX_EPOCH};

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Digits that differ between runs, for unique ISBNs and national IDs
fn unique_digits(len: usize) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Clock before epoch")
        .as_nanos();
    let digits = format!("{:0>30}", nanos);
    digits[digits.len() - len..].to_string()
}

async fn create_book(client: &Client, copies: i32) -> Value {
    let response = client
        .post(format!("{}/books", BASE_URL))
        .json(&json!({
            "isbn": unique_digits(13),
            "title": "Memórias Póstumas de Brás Cubas",
            "author": "Machado de Assis",
            "publication_year": 1881,
            "total_copies": copies,
            "daily_fine_rate": "1.50"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);
    response.json().await.expect("Failed to parse response")
}

async fn create_member(client: &Client, member_type: &str) -> Value {
    let id = unique_digits(11);
    let response = client
        .post(format!("{}/members", BASE_URL))
        .json(&json!({
            "name": "Carla Mendes",
            "email": format!("carla.{}@example.org", id),
            "national_id": id,
            "member_type": member_type
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);
    response.json().await.expect("Failed to parse response")
}

async fn borrow(client: &Client, book: &Value, member: &Value) -> reqwest::Response {
    client
        .post(format!("{}/loans", BASE_URL))
        .json(&json!({
            "book_id": book["id"],
            "member_id": member["id"]
        }))
        .send()
        .await
        .expect("Failed to send request")
}

async fn get_book(client: &Client, id: &Value) -> Value {
    client
        .get(format!("{}/books/{}", BASE_URL, id))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_loan_lifecycle() {
    let client = Client::new();
    let book = create_book(&client, 2).await;
    let member = create_member(&client, "STUDENT").await;

    let response = borrow(&client, &book, &member).await;
    assert_eq!(response.status(), 201);
    let loan: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(loan["status"], "ACTIVE");
    assert_eq!(loan["is_overdue"], false);
    assert!(loan["return_date"].is_null());

    let loan_date = chrono::NaiveDate::parse_from_str(loan["loan_date"].as_str().unwrap(), "%Y-%m-%d").unwrap();
    let due_date = chrono::NaiveDate::parse_from_str(loan["due_date"].as_str().unwrap(), "%Y-%m-%d").unwrap();
    assert_eq!((due_date - loan_date).num_days(), 14);

    assert_eq!(get_book(&client, &book["id"]).await["available_copies"], 1);

    // Renew
    let response = client
        .patch(format!("{}/loans/{}/renew?days=10", BASE_URL, loan["id"]))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 200);
    let renewed: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(renewed["status"], "RENEWED");
    let renewed_due =
        chrono::NaiveDate::parse_from_str(renewed["due_date"].as_str().unwrap(), "%Y-%m-%d").unwrap();
    assert_eq!((renewed_due - due_date).num_days(), 10);

    // Return on time: no fine
    let response = client
        .patch(format!("{}/loans/{}/return", BASE_URL, loan["id"]))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 200);
    let returned: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(returned["status"], "RETURNED");
    assert!(returned["fine_amount"].is_null());
    assert!(!returned["return_date"].is_null());

    assert_eq!(get_book(&client, &book["id"]).await["available_copies"], 2);

    // A second return is refused and does not touch stock
    let response = client
        .patch(format!("{}/loans/{}/return", BASE_URL, loan["id"]))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);
    assert_eq!(get_book(&client, &book["id"]).await["available_copies"], 2);

    // Returned loans cannot be renewed
    let response = client
        .patch(format!("{}/loans/{}/renew", BASE_URL, loan["id"]))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_last_copy_goes_to_one_member() {
    let client = Client::new();
    let book = create_book(&client, 1).await;
    let first = create_member(&client, "TEACHER").await;
    let second = create_member(&client, "TEACHER").await;

    let response = borrow(&client, &book, &first).await;
    assert_eq!(response.status(), 201);

    let response = borrow(&client, &book, &second).await;
    assert_eq!(response.status(), 400);

    let book = get_book(&client, &book["id"]).await;
    assert_eq!(book["available_copies"], 0);
}

#[tokio::test]
#[ignore]
async fn test_same_book_twice_refused() {
    let client = Client::new();
    let book = create_book(&client, 3).await;
    let member = create_member(&client, "STAFF").await;

    assert_eq!(borrow(&client, &book, &member).await.status(), 201);
    assert_eq!(borrow(&client, &book, &member).await.status(), 400);
    assert_eq!(get_book(&client, &book["id"]).await["available_copies"], 2);
}

#[tokio::test]
#[ignore]
async fn test_borrow_limit_enforced() {
    let client = Client::new();
    let member = create_member(&client, "EXTERNAL").await;
    assert_eq!(member["borrow_limit"], 2);

    for _ in 0..2 {
        let book = create_book(&client, 1).await;
        assert_eq!(borrow(&client, &book, &member).await.status(), 201);
    }

    let book = create_book(&client, 1).await;
    assert_eq!(borrow(&client, &book, &member).await.status(), 400);

    let eligibility: Value = client
        .get(format!("{}/members/{}/can-borrow", BASE_URL, member["id"]))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(eligibility["can_borrow"], false);
    assert_eq!(eligibility["active_loans"], 2);
}

#[tokio::test]
#[ignore]
async fn test_renewal_days_checked_before_lookup() {
    let client = Client::new();

    let response = client
        .patch(format!("{}/loans/999999999/renew?days=31", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);

    let response = client
        .patch(format!("{}/loans/999999999/renew?days=5", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_member_with_open_loan_cannot_be_deleted() {
    let client = Client::new();
    let book = create_book(&client, 1).await;
    let member = create_member(&client, "STUDENT").await;

    let loan: Value = borrow(&client, &book, &member)
        .await
        .json()
        .await
        .expect("Failed to parse response");

    let response = client
        .delete(format!("{}/members/{}", BASE_URL, member["id"]))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);

    client
        .patch(format!("{}/loans/{}/return", BASE_URL, loan["id"]))
        .send()
        .await
        .expect("Failed to send request");

    let response = client
        .delete(format!("{}/members/{}", BASE_URL, member["id"]))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 204);
}

#[tokio::test]
#[ignore]
async fn test_duplicate_isbn_conflict() {
    let client = Client::new();
    let book = create_book(&client, 1).await;

    let response = client
        .post(format!("{}/books", BASE_URL))
        .json(&json!({
            "isbn": book["isbn"],
            "title": "Another title",
            "author": "Someone",
            "total_copies": 1
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);
}

#[tokio::test]
#[ignore]
async fn test_books_by_category() {
    let client = Client::new();

    let category: Value = client
        .post(format!("{}/categories", BASE_URL))
        .json(&json!({ "name": format!("Romance {}", unique_digits(6)) }))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");

    let response = client
        .post(format!("{}/books", BASE_URL))
        .json(&json!({
            "isbn": unique_digits(13),
            "title": "Iracema",
            "author": "José de Alencar",
            "total_copies": 1,
            "category_id": category["id"]
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
    let book: Value = response.json().await.expect("Failed to parse response");
    // Unrelated book outside the category
    create_book(&client, 1).await;

    let body: Value = client
        .get(format!("{}/books/category/{}", BASE_URL, category["id"]))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["id"], book["id"]);

    let response = client
        .get(format!("{}/books/category/999999999", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_wildcard_search_is_literal() {
    let client = Client::new();
    create_book(&client, 1).await;

    let body: Value = client
        .get(format!("{}/books/search?term=%25", BASE_URL))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(body["total"], 0);
}

#[tokio::test]
#[ignore]
async fn test_huge_page_is_empty() {
    let client = Client::new();

    let response = client
        .get(format!("{}/loans?page={}", BASE_URL, i64::MAX))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["items"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
#[ignore]
async fn test_unknown_loan_not_found() {
    let client = Client::new();

    let response = client
        .get(format!("{}/loans/999999999", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 404);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["code"], 5);
}

#[tokio::test]
#[ignore]
async fn test_general_report() {
    let client = Client::new();

    let response = client
        .get(format!("{}/reports/general", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["total_books"].is_i64());
    assert!(body["overdue_loans"].is_i64());
}
