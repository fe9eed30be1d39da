mod common;

use actix_web::http::header;
use actix_web::{test, App};
use common::{app_state, development, production};
use query_gateway::gateway_node::configure_routes;

const REFERRER: &str = "https://a.b:8080/x";

macro_rules! gateway {
    ($config:expr) => {
        test::init_service(
            App::new()
                .app_data(app_state(&$config))
                .configure(configure_routes),
        )
        .await
    };
}

#[actix_web::test]
async fn production_never_sends_cors_headers() {
    let app = gateway!(production());
    let req = test::TestRequest::post()
        .uri("/")
        .insert_header((header::REFERER, REFERRER))
        .set_payload(r#"{"query": "{ version }"}"#)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
    assert!(resp
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
    assert!(resp
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
        .is_none());
}

#[actix_web::test]
async fn development_allows_the_referring_origin() {
    let app = gateway!(development());
    let req = test::TestRequest::post()
        .uri("/")
        .insert_header((header::REFERER, REFERRER))
        .set_payload(r#"{"query": "{ version }"}"#)
        .to_request();
    let resp = test::call_service(&app, req).await;

    let headers = resp.headers();
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "https://a.b:8080"
    );
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_HEADERS).unwrap(),
        "Set-Cookie, Content-Type"
    );
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
        "true"
    );
}

#[actix_web::test]
async fn development_without_referrer_sends_nothing() {
    let app = gateway!(development());
    let req = test::TestRequest::post()
        .uri("/")
        .set_payload(r#"{"query": "{ version }"}"#)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());

    let req = test::TestRequest::post()
        .uri("/")
        .insert_header((header::REFERER, "not a url"))
        .set_payload(r#"{"query": "{ version }"}"#)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}

#[actix_web::test]
async fn cors_applies_to_batches_and_rejections() {
    let app = gateway!(development());

    let req = test::TestRequest::post()
        .uri("/")
        .insert_header((header::REFERER, REFERRER))
        .set_payload(r#"[{"query": "{ version }"}]"#)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(
        resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "https://a.b:8080"
    );

    let req = test::TestRequest::post()
        .uri("/")
        .insert_header((header::REFERER, REFERRER))
        .set_payload("{}")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    assert_eq!(
        resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "https://a.b:8080"
    );
}

#[actix_web::test]
async fn preflight_returns_headers_only() {
    let app = gateway!(development());
    let req = test::TestRequest::default()
        .method(actix_web::http::Method::OPTIONS)
        .uri("/anything/at/all")
        .insert_header((header::REFERER, REFERRER))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "https://a.b:8080"
    );
    assert!(test::read_body(resp).await.is_empty());

    let app = gateway!(production());
    let req = test::TestRequest::default()
        .method(actix_web::http::Method::OPTIONS)
        .uri("/")
        .insert_header((header::REFERER, REFERRER))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    assert!(resp
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}
