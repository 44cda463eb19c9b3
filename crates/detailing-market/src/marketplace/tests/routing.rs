use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;

use crate::marketplace::domain::{ActorContext, Plan, Role};
use crate::marketplace::router::{market_router, ACCOUNT_HEADER, SUB_ACCOUNT_HEADER};

fn post_as(uri: &str, actor: &ActorContext, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(ACCOUNT_HEADER, actor.account_id.to_string())
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn delete_as(uri: &str, actor: &ActorContext) -> Request<Body> {
    Request::delete(uri)
        .header(ACCOUNT_HEADER, actor.account_id.to_string())
        .body(Body::empty())
        .expect("request")
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).expect("request")
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.expect("response");
    let status = response.status();
    if status == StatusCode::NO_CONTENT {
        return (status, Value::Null);
    }
    (status, read_json_body(response).await)
}

#[tokio::test]
async fn commands_without_account_header_are_unauthenticated() {
    let h = harness();
    let router = market_router(h.service.clone());

    let response = router
        .oneshot(
            Request::post("/api/v1/market/vacancies")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({"title": "Detailer", "city": "Moscow"}).to_string()))
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = read_json_body(response).await;
    assert_eq!(body["code"], "unauthenticated");
}

#[tokio::test]
async fn register_route_creates_account() {
    let h = harness();
    let router = market_router(h.service.clone());
    let request = Request::post("/api/v1/market/accounts")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::to_vec(&new_account(Role::Client, Plan::Free)).expect("encode"),
        ))
        .expect("request");

    let (status, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["role"], "client");
}

#[tokio::test]
async fn fourth_free_vacancy_is_forbidden_with_entitlement_code() {
    let h = harness();
    let employer = register(&h.service, Role::Employer, Plan::Free);
    let router = market_router(h.service.clone());

    for n in 0..3 {
        let (status, body) = send(
            &router,
            post_as(
                "/api/v1/market/vacancies",
                &employer,
                json!({"title": format!("Detailer {n}"), "city": "Moscow"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"], "open");
    }

    let (status, body) = send(
        &router,
        post_as(
            "/api/v1/market/vacancies",
            &employer,
            json!({"title": "One too many", "city": "Moscow"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "entitlement_exceeded");
}

#[tokio::test]
async fn repeat_gig_response_returns_ok_instead_of_created() {
    let h = harness();
    let employer = register(&h.service, Role::Employer, Plan::Free);
    let specialist = register(&h.service, Role::Specialist, Plan::Free);
    let gig = h
        .service
        .create_gig(&employer, new_gig("Saturday shift"))
        .expect("gig");
    let router = market_router(h.service.clone());
    let uri = format!("/api/v1/market/gigs/{}/responses", gig.id);

    let (first, body) = send(&router, post_as(&uri, &specialist, json!({"message": "free"}))).await;
    assert_eq!(first, StatusCode::CREATED);
    assert_eq!(body["outcome"], "created");

    let (second, body) = send(&router, post_as(&uri, &specialist, json!({}))).await;
    assert_eq!(second, StatusCode::OK);
    assert_eq!(body["outcome"], "unchanged");

    let response = router
        .clone()
        .oneshot(
            Request::get(format!("/api/v1/market/listings/gigs/{}/responses", gig.id))
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let records = read_json_body(response).await;
    assert_eq!(records.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn promo_redemption_over_http() {
    let h = harness();
    let supplier = register(&h.service, Role::Supplier, Plan::Free);
    let client = register(&h.service, Role::Client, Plan::Free);
    let router = market_router(h.service.clone());

    let (status, _) = send(
        &router,
        post_as(
            "/api/v1/market/promos",
            &supplier,
            json!({"code": "wax10", "title": "Wax week", "discount_percent": 10, "max_uses": 1}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &router,
        post_as("/api/v1/market/promos/redeem", &client, json!({"code": "WAX10"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["value"]["used_count"], 1);

    let latecomer = register(&h.service, Role::Specialist, Plan::Free);
    let (status, body) = send(
        &router,
        post_as("/api/v1/market/promos/redeem", &latecomer, json!({"code": "wax10"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "illegal_transition");
}

#[tokio::test]
async fn unknown_sub_account_and_listing_kind_are_rejected() {
    let h = harness();
    let employer = register(&h.service, Role::Employer, Plan::Standard);
    let router = market_router(h.service.clone());

    let request = Request::get("/api/v1/market/dashboard")
        .header(ACCOUNT_HEADER, employer.account_id.to_string())
        .header(SUB_ACCOUNT_HEADER, "sub-missing")
        .body(Body::empty())
        .expect("request");
    let (status, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");

    let request = Request::get("/api/v1/market/listings/boats/x/responses")
        .body(Body::empty())
        .expect("request");
    let (status, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "validation");
}

#[tokio::test]
async fn dashboard_route_tags_the_role() {
    let h = harness();
    let supplier = register(&h.service, Role::Supplier, Plan::Free);
    let router = market_router(h.service.clone());

    let request = Request::get("/api/v1/market/dashboard")
        .header(ACCOUNT_HEADER, supplier.account_id.to_string())
        .body(Body::empty())
        .expect("request");
    let (status, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "supplier");
    assert_eq!(body["plan"], "free");
}

#[tokio::test]
async fn training_certificate_is_verifiable_over_http() {
    let h = harness();
    let specialist = register(&h.service, Role::Specialist, Plan::Free);
    let router = market_router(h.service.clone());

    let (status, enrollment) = send(
        &router,
        post_as("/api/v1/market/training", &specialist, json!({"course": "Paint correction"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let enrollment_id = enrollment["id"].as_str().expect("enrollment id").to_string();

    let (status, completed) = send(
        &router,
        post_as(
            &format!("/api/v1/market/training/{enrollment_id}/complete"),
            &specialist,
            json!({}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let certificate = completed["certificate_id"]
        .as_str()
        .expect("certificate issued")
        .to_string();

    let (status, verified) =
        send(&router, get(&format!("/api/v1/market/certificates/{certificate}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(verified["id"], enrollment_id.as_str());

    let (status, body) = send(&router, get("/api/v1/market/certificates/UC-1999-999")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");

    let (status, listed) = send(
        &router,
        get(&format!("/api/v1/market/accounts/{}/training", specialist.account_id)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn reviews_and_favorites_over_http() {
    let h = harness();
    let client = register(&h.service, Role::Client, Plan::Free);
    let specialist = register(&h.service, Role::Specialist, Plan::Free);
    let router = market_router(h.service.clone());

    let (status, _) = send(
        &router,
        post_as(
            "/api/v1/market/reviews",
            &client,
            json!({"target_id": specialist.account_id.to_string(), "rating": 5, "text": "Spotless"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, reviews) = send(
        &router,
        get(&format!("/api/v1/market/accounts/{}/reviews", specialist.account_id)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reviews.as_array().map(Vec::len), Some(1));

    let favorite = json!({"target_id": specialist.account_id.to_string(), "target_type": "specialist"});
    let (first, _) = send(&router, post_as("/api/v1/market/favorites", &client, favorite.clone())).await;
    let (again, body) = send(&router, post_as("/api/v1/market/favorites", &client, favorite)).await;
    assert_eq!(first, StatusCode::CREATED);
    assert_eq!(again, StatusCode::OK);
    assert_eq!(body["outcome"], "unchanged");

    let uri = format!("/api/v1/market/favorites/specialist/{}", specialist.account_id);
    let (status, body) = send(&router, delete_as(&uri, &client)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["removed"], true);
    let (_, body) = send(&router, delete_as(&uri, &client)).await;
    assert_eq!(body["removed"], false);
}

#[tokio::test]
async fn listing_lifecycle_routes_close_and_cancel() {
    let h = harness();
    let employer = register(&h.service, Role::Employer, Plan::Standard);
    let client = register(&h.service, Role::Client, Plan::Free);
    let vacancy = h
        .service
        .create_vacancy(&employer, new_vacancy("Wrap installer"))
        .expect("vacancy");
    let gig = h
        .service
        .create_gig(&employer, new_gig("Night shift"))
        .expect("gig");
    let order = h.service.create_order(&client, new_order()).expect("order");
    let router = market_router(h.service.clone());

    let (status, body) = send(
        &router,
        post_as(&format!("/api/v1/market/vacancies/{}/fill", vacancy.id), &employer, json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "filled");

    let (status, body) = send(
        &router,
        post_as(&format!("/api/v1/market/gigs/{}/close", gig.id), &client, json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "forbidden");

    let (status, body) = send(
        &router,
        post_as(&format!("/api/v1/market/orders/{}/cancel", order.id), &client, json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cancelled");

    let (status, _) = send(
        &router,
        delete_as(&format!("/api/v1/market/gigs/{}", gig.id), &employer),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&router, get(&format!("/api/v1/market/gigs/{}", gig.id))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn manager_header_cannot_bid_on_orders() {
    let h = harness();
    let employer = register(&h.service, Role::Employer, Plan::Standard);
    let client = register(&h.service, Role::Client, Plan::Free);
    let order = h.service.create_order(&client, new_order()).expect("order");
    let router = market_router(h.service.clone());

    let (status, sub) = send(
        &router,
        post_as(
            "/api/v1/market/sub-accounts",
            &employer,
            json!({"name": "Olga", "email": "olga@studio.example", "role": "manager"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let sub_id = sub["id"].as_str().expect("sub-account id").to_string();

    let request = Request::post(format!("/api/v1/market/orders/{}/responses", order.id))
        .header(header::CONTENT_TYPE, "application/json")
        .header(ACCOUNT_HEADER, employer.account_id.to_string())
        .header(SUB_ACCOUNT_HEADER, sub_id.as_str())
        .body(Body::from(json!({"price": 15000}).to_string()))
        .expect("request");
    let (status, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "forbidden");
}
