mod common;

use axum::http::StatusCode;
use common::{TestApp, delete, get, json_request};
use serde_json::json;

#[tokio::test]
async fn test_system_admin_creates_and_lists_schools() {
    let app = TestApp::new();
    let token = app.system_admin_token();

    let (status, school) = app
        .send_json(json_request(
            "POST",
            "/api/schools",
            Some(&token),
            &json!({ "name": "Riverside Public School", "code": "SCH-RPS", "address": "1 River Rd" }),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(school["code"], "SCH-RPS");

    let id = school["id"].as_str().unwrap();
    let (status, fetched) = app
        .send_json(get(&format!("/api/schools/{}", id), &token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["name"], "Riverside Public School");

    let (status, list) = app.send_json(get("/api/schools?name=river", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["meta"]["total"], 1);
}

#[tokio::test]
async fn test_duplicate_school_code_conflicts() {
    let app = TestApp::new();
    let token = app.system_admin_token();
    app.create_school("SCH-RPS").await;

    let (status, body) = app
        .send_json(json_request(
            "POST",
            "/api/schools",
            Some(&token),
            &json!({ "name": "Another", "code": "sch-rps" }),
        ))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("already exists"));
}

#[tokio::test]
async fn test_codes_sharing_a_username_prefix_conflict() {
    let app = TestApp::new();
    let token = app.system_admin_token();
    let gps = app.create_school("SCH-GPS").await;
    assert_eq!(gps.username_prefix, "gps");

    for code in ["GPS", "SCHGPS", "G-PS"] {
        let (status, body) = app
            .send_json(json_request(
                "POST",
                "/api/schools",
                Some(&token),
                &json!({ "name": "Greenfield Annex", "code": code }),
            ))
            .await;
        assert_eq!(status, StatusCode::CONFLICT, "code {code}");
        assert!(body["error"].as_str().unwrap().contains("username prefix 'gps'"));
    }

    let (status, _) = app
        .send_json(json_request(
            "POST",
            "/api/schools",
            Some(&token),
            &json!({ "name": "Bare", "code": "SCH" }),
        ))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_create_school_validates_body() {
    let app = TestApp::new();
    let token = app.system_admin_token();

    let (status, _) = app
        .send_json(json_request(
            "POST",
            "/api/schools",
            Some(&token),
            &json!({ "name": "", "code": "SCH-RPS" }),
        ))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = app
        .send_json(json_request("POST", "/api/schools", Some(&token), &json!({ "name": "X" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "code is required");
}

#[tokio::test]
async fn test_school_admin_cannot_manage_schools() {
    let app = TestApp::new();
    let school = app.create_school("SCH-RPS").await;
    let token = app.school_admin_token(school.id);

    let (status, body) = app.send_json(get("/api/schools", &token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Access denied for role school_admin");
}

#[tokio::test]
async fn test_delete_school_removes_students() {
    let app = TestApp::new();
    let school = app.create_school("SCH-RPS").await;
    let school_token = app.school_admin_token(school.id);
    let (status, _) = app
        .send_json(common::csv_request(
            "/api/students/import",
            &school_token,
            common::roster_csv("5", 3),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    let token = app.system_admin_token();
    let (status, _) = app
        .send(delete(&format!("/api/schools/{}", school.id), &token))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(app.store.student_count(), 0);

    let (status, _) = app
        .send_json(get(&format!("/api/schools/{}", school.id), &token))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
