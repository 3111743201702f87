// Contract tests for the HTTP API
//
// Drives the real route configuration over in-memory backends and checks
// status codes and JSON shapes. Amounts must always be integers.

#[path = "../helpers/mod.rs"]
mod helpers;

use actix_web::{http::StatusCode, test, App};
use helpers::*;
use serde_json::{json, Value};

macro_rules! init_app {
    ($app:expr) => {
        test::init_service(App::new().configure(|cfg| $app.services.configure(cfg))).await
    };
}

fn payment_body(reference: &str, amount: i64, target: Value) -> Value {
    json!({
        "reference": reference,
        "amount": amount,
        "target": target,
        "method": "mobile_money"
    })
}

fn payments_uri(enrollment_id: &str) -> String {
    format!("/enrollments/{}/payments", enrollment_id)
}

#[actix_web::test]
async fn test_submit_payment_accepted_shape() {
    let app = TestApp::new();
    let service = init_app!(app);

    let req = test::TestRequest::post()
        .uri(&payments_uri(ENROLLMENT_ID))
        .set_json(payment_body("PAY-001", 120, json!({"kind": "global"})))
        .to_request();
    let resp = test::call_service(&service, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["outcome"], "accepted");
    assert_eq!(body["status"], "complete");
    assert_eq!(body["reference"], "PAY-001");
    assert_eq!(body["currency"], "XOF");
    assert_eq!(body["is_global"], true);
    assert!(body["payment_id"].is_string());
    assert!(body["requested_amount"].is_i64());
    assert!(body["applied_amount"].is_i64());
    assert_eq!(body["unapplied_amount"], 0);

    let allocation = body["allocation"].as_array().unwrap();
    assert_eq!(allocation.len(), 2);
    assert_eq!(allocation[0], json!({"tranche_index": 0, "amount_applied": 100}));
    assert_eq!(allocation[1], json!({"tranche_index": 1, "amount_applied": 20}));
}

#[actix_web::test]
async fn test_submit_payment_already_settled_is_ok() {
    let app = TestApp::new();
    let service = init_app!(app);

    for (reference, expected) in [("PAY-001", "accepted"), ("PAY-002", "already_settled")] {
        let req = test::TestRequest::post()
            .uri(&payments_uri(ENROLLMENT_ID))
            .set_json(payment_body(reference, 250, json!({"kind": "global"})))
            .to_request();
        let resp = test::call_service(&service, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["outcome"], expected);
    }
}

#[actix_web::test]
async fn test_targeted_overflow_is_unprocessable() {
    let app = TestApp::new();
    let service = init_app!(app);

    let req = test::TestRequest::post()
        .uri(&payments_uri(ENROLLMENT_ID))
        .set_json(payment_body("PAY-001", 101, json!({"kind": "tranche", "index": 0})))
        .to_request();
    let resp = test::call_service(&service, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["kind"], "exceeds_tranche_balance");
    assert_eq!(body["error"]["code"], 422);
}

#[actix_web::test]
async fn test_invalid_amount_is_bad_request() {
    let app = TestApp::new();
    let service = init_app!(app);

    let req = test::TestRequest::post()
        .uri(&payments_uri(ENROLLMENT_ID))
        .set_json(payment_body("PAY-001", -5, json!({"kind": "global"})))
        .to_request();
    let resp = test::call_service(&service, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["kind"], "invalid_amount");
}

#[actix_web::test]
async fn test_inactive_enrollment_is_forbidden() {
    let app = TestApp::new();
    let service = init_app!(app);

    let req = test::TestRequest::post()
        .uri(&payments_uri(DRAFT_ENROLLMENT_ID))
        .set_json(payment_body("PAY-001", 100, json!({"kind": "global"})))
        .to_request();
    let resp = test::call_service(&service, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["kind"], "enrollment_required");
}

#[actix_web::test]
async fn test_malformed_body_uses_error_envelope() {
    let app = TestApp::new();
    let service = init_app!(app);

    // Fractional amounts are not minor units
    let req = test::TestRequest::post()
        .uri(&payments_uri(ENROLLMENT_ID))
        .set_json(json!({
            "reference": "PAY-001",
            "amount": 12.5,
            "target": {"kind": "global"},
            "method": "mobile_money"
        }))
        .to_request();
    let resp = test::call_service(&service, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["kind"], "validation");
}

#[actix_web::test]
async fn test_reference_reuse_conflicts() {
    let app = TestApp::new();
    let service = init_app!(app);

    for (amount, expected) in [(100, StatusCode::OK), (90, StatusCode::CONFLICT)] {
        let req = test::TestRequest::post()
            .uri(&payments_uri(ENROLLMENT_ID))
            .set_json(payment_body("PAY-001", amount, json!({"kind": "global"})))
            .to_request();
        let resp = test::call_service(&service, req).await;
        assert_eq!(resp.status(), expected);
    }
}

#[actix_web::test]
async fn test_summary_and_tranche_statuses() {
    let app = TestApp::new();
    app.services
        .payments
        .submit_payment(ENROLLMENT_ID, global("PAY-001", 120))
        .await
        .unwrap();
    let service = init_app!(app);

    let req = test::TestRequest::get()
        .uri(&format!("/enrollments/{}/summary", ENROLLMENT_ID))
        .to_request();
    let resp = test::call_service(&service, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["total"], 250);
    assert_eq!(body["paid"], 120);
    assert_eq!(body["remaining"], 130);
    assert_eq!(body["display_remaining"], "XOF 130");
    assert_eq!(body["consistency_warning"], false);
    assert_eq!(body["per_tranche"][0]["status"], "complete");
    assert_eq!(body["per_tranche"][1]["status"], "partial");
    assert_eq!(body["per_tranche"][1]["due_date"], "2026-01-15");

    let req = test::TestRequest::get()
        .uri(&format!("/enrollments/{}/tranches", ENROLLMENT_ID))
        .to_request();
    let body: Value = test::call_and_read_body_json(&service, req).await;
    assert_eq!(body["tranches"], json!({"0": "complete", "1": "partial"}));
}

#[actix_web::test]
async fn test_summary_for_unknown_enrollment() {
    let app = TestApp::new();
    let service = init_app!(app);

    let req = test::TestRequest::get()
        .uri("/enrollments/enr-missing/summary")
        .to_request();
    let resp = test::call_service(&service, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_history_lists_payments_in_order() {
    let app = TestApp::new();
    for (reference, amount) in [("PAY-A", 30), ("PAY-B", 70)] {
        app.services
            .payments
            .submit_payment(ENROLLMENT_ID, global(reference, amount))
            .await
            .unwrap();
    }
    let service = init_app!(app);

    let req = test::TestRequest::get()
        .uri(&payments_uri(ENROLLMENT_ID))
        .to_request();
    let body: Value = test::call_and_read_body_json(&service, req).await;

    assert_eq!(body["enrollment_id"], ENROLLMENT_ID);
    let payments = body["payments"].as_array().unwrap();
    assert_eq!(payments.len(), 2);
    assert_eq!(payments[0]["reference"], "PAY-A");
    assert_eq!(payments[1]["reference"], "PAY-B");
    assert!(payments[0]["submitted_at"].is_string());
}

#[actix_web::test]
async fn test_receipt_json_and_text() {
    let app = TestApp::new();
    let result = accepted(
        app.services
            .payments
            .submit_payment(ENROLLMENT_ID, global("PAY-001", 120))
            .await
            .unwrap(),
    );
    let service = init_app!(app);

    let req = test::TestRequest::get()
        .uri(&format!("/payments/{}/receipt", result.payment_id))
        .to_request();
    let body: Value = test::call_and_read_body_json(&service, req).await;
    assert_eq!(body["payment_id"], result.payment_id.as_str());
    assert_eq!(body["amount_applied"], 120);
    assert_eq!(body["lines"].as_array().unwrap().len(), 2);
    assert_eq!(body["digest"].as_str().unwrap().len(), 64);

    let req = test::TestRequest::get()
        .uri(&format!("/payments/{}/receipt?format=text", result.payment_id))
        .to_request();
    let resp = test::call_service(&service, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/plain"));

    let text = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(text.contains("Inscription"));
    assert!(text.contains("Total applied: XOF 120"));
}

#[actix_web::test]
async fn test_receipt_missing_for_pending_payment() {
    let app = TestApp::with(standard_plan(), ScriptedProvider::deferring());
    let result = accepted(
        app.services
            .payments
            .submit_payment(ENROLLMENT_ID, global("PAY-001", 120))
            .await
            .unwrap(),
    );
    let service = init_app!(app);

    let req = test::TestRequest::get()
        .uri(&format!("/payments/{}/receipt", result.payment_id))
        .to_request();
    let resp = test::call_service(&service, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_callback_requires_valid_signature() {
    let app = TestApp::with(standard_plan(), ScriptedProvider::deferring());
    app.services
        .payments
        .submit_payment(ENROLLMENT_ID, global("PAY-001", 120))
        .await
        .unwrap();
    let body = serde_json::to_vec(&json!({
        "enrollment_id": ENROLLMENT_ID,
        "reference": "PAY-001",
        "status": "complete"
    }))
    .unwrap();
    let signature = app.sign(&body);
    let service = init_app!(app);

    // Missing header
    let req = test::TestRequest::post()
        .uri("/payments/callback")
        .insert_header(("content-type", "application/json"))
        .set_payload(body.clone())
        .to_request();
    let resp = test::call_service(&service, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // Signature for another body
    let req = test::TestRequest::post()
        .uri("/payments/callback")
        .insert_header(("X-Signature", "00".repeat(32)))
        .set_payload(body.clone())
        .to_request();
    let resp = test::call_service(&service, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/payments/callback")
        .insert_header(("X-Signature", signature.clone()))
        .set_payload(body.clone())
        .to_request();
    let resp = test::call_service(&service, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let reply: Value = test::read_body_json(resp).await;
    assert_eq!(reply["outcome"], "applied");
    assert_eq!(reply["status"], "complete");

    // Redelivery
    let req = test::TestRequest::post()
        .uri("/payments/callback")
        .insert_header(("X-Signature", signature))
        .set_payload(body)
        .to_request();
    let reply: Value = test::call_and_read_body_json(&service, req).await;
    assert_eq!(reply["outcome"], "duplicate");
}

#[actix_web::test]
async fn test_callback_with_signed_garbage_is_bad_request() {
    let app = TestApp::with(standard_plan(), ScriptedProvider::deferring());
    let body = b"not json".to_vec();
    let signature = app.sign(&body);
    let service = init_app!(app);

    let req = test::TestRequest::post()
        .uri("/payments/callback")
        .insert_header(("X-Signature", signature))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&service, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_fee_plan_for_active_enrollment() {
    let app = TestApp::new();
    let service = init_app!(app);

    let req = test::TestRequest::get()
        .uri(&format!(
            "/students/{}/school-years/{}/fee-plan",
            STUDENT_ID, SCHOOL_YEAR
        ))
        .to_request();
    let resp = test::call_service(&service, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["enrollment_id"], ENROLLMENT_ID);
    assert_eq!(body["total_due"], 250);
    assert_eq!(body["tranches"][1]["allows_partial"], true);

    // Draft enrollment: the client must show "contact administration"
    let req = test::TestRequest::get()
        .uri(&format!("/students/stu-test-2/school-years/{}/fee-plan", SCHOOL_YEAR))
        .to_request();
    let resp = test::call_service(&service, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn test_health_and_readiness() {
    let app = TestApp::new();
    let service = init_app!(app);

    let req = test::TestRequest::get().uri("/health").to_request();
    let body: Value = test::call_and_read_body_json(&service, req).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "tuition-ledger");

    let req = test::TestRequest::get().uri("/ready").to_request();
    let body: Value = test::call_and_read_body_json(&service, req).await;
    assert_eq!(body["ready"], true);
    assert_eq!(body["database"], "not_configured");
}
