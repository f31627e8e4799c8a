mod common;

use axum::http::StatusCode;
use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use common::{future_week, TestApp};
use serde_json::json;

#[tokio::test]
async fn test_role_enforcement() {
    let app = TestApp::new();
    let student = app.register("student", "s@example.com").await;
    let expert = app.register("expert", "e@example.com").await;

    let (status, _) = app
        .call(
            "POST",
            "/expert/generate-slots",
            Some(&student.access_token),
            Some(json!({
                "days": ["monday"], "start_time": "10:00", "end_time": "11:00", "slot_size": 30
            })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .call("GET", "/student/profile", Some(&expert.access_token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.call("GET", "/expert/my-slots", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_generate_slots_for_monday_window() {
    let app = TestApp::new();
    let (expert, slots) = app.expert_with_slots("e@example.com", 1500).await;
    assert_eq!(slots.len(), 2);

    let first_start: DateTime<Utc> = slots[0]["start_time"].as_str().unwrap().parse().unwrap();
    let first_end: DateTime<Utc> = slots[0]["end_time"].as_str().unwrap().parse().unwrap();
    let second_start: DateTime<Utc> = slots[1]["start_time"].as_str().unwrap().parse().unwrap();
    let date: NaiveDate = slots[0]["date"].as_str().unwrap().parse().unwrap();

    assert_eq!(date.weekday(), Weekday::Mon);
    assert_eq!(first_start.format("%H:%M").to_string(), "10:00");
    assert_eq!(first_end, second_start);
    assert_eq!(second_start.format("%H:%M").to_string(), "10:30");
    assert_eq!(slots[0]["expert_id"], expert.id.as_str());
    assert_eq!(slots[0]["is_booked"], false);

    let (status, body) = app
        .call("GET", "/expert/my-slots", Some(&expert.access_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["slots"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_generate_slots_rejections() {
    let app = TestApp::new();
    let (expert, _) = app.expert_with_slots("e@example.com", 1000).await;
    let token = Some(expert.access_token.as_str());

    // Same week again overlaps what is stored.
    let (status, _) = app
        .call(
            "POST",
            "/expert/generate-slots",
            token,
            Some(json!({
                "days": ["monday"], "start_time": "10:15", "end_time": "10:45",
                "slot_size": 30, "week_of": future_week()
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Window shorter than one slot.
    let (status, body) = app
        .call(
            "POST",
            "/expert/generate-slots",
            token,
            Some(json!({
                "days": ["tuesday"], "start_time": "09:00", "end_time": "09:29",
                "slot_size": 30, "week_of": future_week()
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().is_some());

    for bad in [
        json!({ "days": ["funday"], "start_time": "09:00", "end_time": "10:00", "slot_size": 30 }),
        json!({ "days": [], "start_time": "09:00", "end_time": "10:00", "slot_size": 30 }),
        json!({ "days": ["friday"], "start_time": "9am", "end_time": "10:00", "slot_size": 30 }),
        json!({ "days": ["friday"], "start_time": "10:00", "end_time": "09:00", "slot_size": 30 }),
        json!({ "days": ["friday"], "start_time": "09:00", "end_time": "10:00", "slot_size": 0 }),
    ] {
        let (status, _) = app
            .call("POST", "/expert/generate-slots", token, Some(bad))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_student_browses_experts_and_slots() {
    let app = TestApp::new();
    let (expert, _) = app.expert_with_slots("e@example.com", 800).await;
    let student = app.register("student", "s@example.com").await;

    let (status, body) = app
        .call("GET", "/student/experts", Some(&student.access_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let experts = body["experts"].as_array().unwrap();
    assert_eq!(experts.len(), 1);
    assert_eq!(experts[0]["user"]["id"], expert.id.as_str());
    assert_eq!(experts[0]["expertise"], "Mathematics");
    assert_eq!(experts[0]["fee_per_session"], 800);

    let (status, body) = app
        .call(
            "GET",
            &format!("/student/expert/{}/slots", expert.id),
            Some(&student.access_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["slots"].as_array().unwrap().len(), 2);

    let (status, _) = app
        .call(
            "GET",
            &format!("/student/expert/{}/slots", uuid::Uuid::new_v4()),
            Some(&student.access_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_preview_computes_platform_fee() {
    let app = TestApp::new();
    let (expert, slots) = app.expert_with_slots("e@example.com", 1500).await;
    let student = app.register("student", "s@example.com").await;

    let (status, body) = app
        .call(
            "POST",
            "/student/preview-slot",
            Some(&student.access_token),
            Some(json!({ "slot_id": slots[0]["id"] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["expert"]["id"], expert.id.as_str());
    assert_eq!(body["expert"]["fee_per_session"], 1500);
    assert_eq!(body["platform_fee"], 150);
    assert_eq!(body["total_amount"], 1650);
    assert_eq!(body["currency"], "INR");
    assert_eq!(body["slot"]["id"], slots[0]["id"]);

    let (status, _) = app
        .call(
            "POST",
            "/student/preview-slot",
            Some(&student.access_token),
            Some(json!({ "slot_id": uuid::Uuid::new_v4() })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_double_booking_is_rejected() {
    let app = TestApp::new();
    let (expert, slots) = app.expert_with_slots("e@example.com", 1500).await;
    let first = app.register("student", "first@example.com").await;
    let second = app.register("student", "second@example.com").await;
    let slot_id = slots[0]["id"].clone();

    let (status, body) = app
        .call(
            "POST",
            "/student/book-slot",
            Some(&first.access_token),
            Some(json!({ "slot_id": slot_id })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["slot"]["is_booked"], true);
    assert_eq!(body["slot"]["student_id"], first.id.as_str());

    for student in [&first, &second] {
        let (status, _) = app
            .call(
                "POST",
                "/student/book-slot",
                Some(&student.access_token),
                Some(json!({ "slot_id": slot_id })),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    // A booked slot cannot be previewed either.
    let (status, _) = app
        .call(
            "POST",
            "/student/preview-slot",
            Some(&second.access_token),
            Some(json!({ "slot_id": slot_id })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = app
        .call("GET", "/student/bookings", Some(&first.access_token), None)
        .await;
    assert_eq!(body["slots"].as_array().unwrap().len(), 1);

    let (_, body) = app
        .call("GET", "/student/bookings", Some(&second.access_token), None)
        .await;
    assert!(body["slots"].as_array().unwrap().is_empty());

    let (_, body) = app
        .call("GET", "/expert/bookings", Some(&expert.access_token), None)
        .await;
    assert_eq!(body["slots"][0]["id"], slot_id);

    let (_, body) = app
        .call("GET", "/expert/my-slots", Some(&expert.access_token), None)
        .await;
    assert_eq!(body["slots"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_profile_updates() {
    let app = TestApp::new();
    let student = app.register("student", "s@example.com").await;

    let (status, body) = app
        .call(
            "PUT",
            "/student/profile",
            Some(&student.access_token),
            Some(json!({
                "full_name": "Asha K",
                "city": "Pune",
                "skills": ["algebra", "physics"],
                "date_of_birth": "2004-02-29"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["full_name"], "Asha K");
    assert_eq!(body["city"], "Pune");
    assert_eq!(body["skills"], json!(["algebra", "physics"]));

    let (_, body) = app
        .call("GET", "/student/profile", Some(&student.access_token), None)
        .await;
    assert_eq!(body["date_of_birth"], "2004-02-29");

    let expert = app.register("expert", "e@example.com").await;
    let (status, _) = app
        .call(
            "PUT",
            "/expert/profile",
            Some(&expert.access_token),
            Some(json!({ "fee_per_session": -5 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .call(
            "PUT",
            "/expert/profile",
            Some(&expert.access_token),
            Some(json!({ "fee_per_session": 100_000_000_000_000_000i64 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("fee_per_session"));

    let (status, body) = app
        .call("GET", "/expert/profile", Some(&expert.access_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fee_per_session"], 0);
    assert_eq!(body["verification_status"], "pending");
}
