//! End-to-end tests of the static backend against a local HTTP server.

use hammer_engine::{EngineError, HammerDriver, StaticDriver, Target};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PAGE: &str = r#"<html><body>
    <h1 id="title">Widget Deluxe</h1>
    <div id="price">  $19.99  </div>
    <a class="nav" href="/specs">Specs</a>
</body></html>"#;

async fn serve_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn static_engine_extracts_from_served_page() {
    let server = MockServer::start().await;
    serve_page(&server, "/item", PAGE).await;
    let target = Target::new(format!("{}/item", server.uri())).unwrap();

    let mut engine = StaticDriver::new().into_engine();
    engine.startup().await.unwrap();
    engine.process(&target).await.unwrap();

    let price = engine
        .parse(|core| Box::pin(async move { core.text("#price").await }))
        .await
        .unwrap();
    assert_eq!(price, "$19.99");

    let href = engine
        .parse(|core| Box::pin(async move { core.attribute("a.nav", "href").await }))
        .await
        .unwrap();
    assert_eq!(href, "/specs");

    engine.shutoff().await.unwrap();
}

#[tokio::test]
async fn adaptive_engine_stays_static_when_marker_is_served() {
    let server = MockServer::start().await;
    serve_page(&server, "/item", PAGE).await;
    let target = Target::new(format!("{}/item", server.uri())).unwrap();

    let mut engine = HammerDriver::new("#price").into_engine();
    engine.startup().await.unwrap();
    engine.process(&target).await.unwrap();

    assert!(!engine.using_live_backend(), "served marker must not trigger a browser");

    let title = engine
        .parse(|core| Box::pin(async move { core.text("#title").await }))
        .await
        .unwrap();
    assert_eq!(title, "Widget Deluxe");

    engine.shutoff().await.unwrap();
}

#[tokio::test]
async fn missing_page_surfaces_the_http_status() {
    let server = MockServer::start().await;
    let target = Target::new(format!("{}/nope", server.uri())).unwrap();

    let mut engine = StaticDriver::new().into_engine();
    engine.startup().await.unwrap();

    let err = engine.process(&target).await.unwrap_err();
    assert!(matches!(err, EngineError::HttpStatus { status: 404, .. }));
    assert!(!engine.has_query_core());

    engine.shutoff().await.unwrap();
}

#[tokio::test]
async fn transient_server_errors_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    serve_page(&server, "/flaky", PAGE).await;
    let target = Target::new(format!("{}/flaky", server.uri())).unwrap();

    let mut engine = StaticDriver::new().into_engine();
    engine.startup().await.unwrap();
    engine.process(&target).await.unwrap();

    let price = engine
        .parse(|core| Box::pin(async move { core.text("#price").await }))
        .await
        .unwrap();
    assert_eq!(price, "$19.99");

    engine.shutoff().await.unwrap();
}
