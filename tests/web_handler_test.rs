#![cfg(feature = "web")]
//! Web handler integration tests.
//!
//! Tests cover:
//! - Dashboard rendering: wallet, market panel, watchlist, news
//! - Order placement (market and limit) mutating the ledger
//! - Rejected orders and funding surfacing flash errors, state untouched
//! - Reset restoring the starting balance
//! - Quote failures degrading the page instead of erroring
//! - HTMX fragment vs redirect responses

mod common;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt;
use vaultex::adapters::web::{AppState, build_test_router, new_ledger_store};
use vaultex::ports::config_port::ConfigPort;
use vaultex::ports::news_port::NewsPort;
use vaultex::ports::quote_port::QuotePort;

use common::*;

struct MockConfigPort;

impl ConfigPort for MockConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        match (section, key) {
            ("market", "default_symbol") => Some("BTC-USD".to_string()),
            ("market", "watchlist") => Some("BTC-USD,AAPL".to_string()),
            _ => None,
        }
    }

    fn get_int(&self, _section: &str, _key: &str, default: i64) -> i64 {
        default
    }

    fn get_double(&self, _section: &str, _key: &str, default: f64) -> f64 {
        default
    }

    fn get_bool(&self, _section: &str, _key: &str, default: bool) -> bool {
        default
    }

    fn get_section(&self, _section: &str) -> Option<HashMap<String, String>> {
        None
    }
}

/// 60 bars with closes 100..159, so the last market price is 159.
fn default_quote_port() -> MockQuotePort {
    MockQuotePort::new()
        .with_bars("BTC-USD", generate_bars(60, 100.0))
        .with_price("AAPL", 210.0)
}

async fn create_app_with(quote: MockQuotePort, news: MockNewsPort) -> Router {
    let state = AppState {
        quote_port: Arc::new(quote) as Arc<dyn QuotePort + Send + Sync>,
        news_port: Arc::new(news) as Arc<dyn NewsPort + Send + Sync>,
        config: Arc::new(MockConfigPort),
        ledgers: new_ledger_store(),
    };
    build_test_router(state).await
}

async fn create_app() -> Router {
    create_app_with(default_quote_port(), MockNewsPort::with_items(make_news(8))).await
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn form_post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_html(response: axum::http::Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8_lossy(&bytes).to_string()
}

fn session_cookie(response: &axum::http::Response<Body>) -> String {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(|sc| sc.split(';').next().unwrap_or("").to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[tokio::test]
async fn dashboard_renders_wallet_market_and_watchlist() {
    let app = create_app().await;

    let response = app.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_html(response).await;
    assert!(html.contains("Wallet"));
    assert!(html.contains("25,000.00"));
    assert!(html.contains("BTC-USD"));
    assert!(html.contains("Place Order"));
    assert!(html.contains("<svg"));
    // Watchlist shows the AAPL quote.
    assert!(html.contains("210.00"));
    // News headlines capped at six.
    assert!(html.contains("Market headline 0"));
    assert!(html.contains("Market headline 5"));
    assert!(!html.contains("Market headline 6"));
    // Video research links.
    assert!(html.contains("BTC-USD+trading+strategy"));
}

#[tokio::test]
async fn intraday_timeframes_auto_refresh() {
    let app = create_app().await;

    let html = body_html(
        app.clone()
            .oneshot(get("/?symbol=BTC-USD&timeframe=15m"))
            .await
            .unwrap(),
    )
    .await;
    assert!(html.contains(r#"http-equiv="refresh""#));
    assert!(html.contains("LIVE"));

    let html = body_html(app.oneshot(get("/?symbol=BTC-USD&timeframe=1y")).await.unwrap()).await;
    assert!(!html.contains(r#"http-equiv="refresh""#));
}

#[tokio::test]
async fn dashboard_with_unknown_symbol_reports_no_data() {
    let app = create_app().await;

    let response = app.oneshot(get("/?symbol=ZZZ&timeframe=1d")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_html(response).await;
    assert!(html.contains("No market data available for ZZZ"));
    // The wallet still renders.
    assert!(html.contains("25,000.00"));
}

#[tokio::test]
async fn market_buy_executes_at_last_price() {
    let app = create_app().await;

    let response = app
        .clone()
        .oneshot(form_post(
            "/order",
            "symbol=BTC-USD&side=buy&order_type=market&quantity=10&limit_price=&timeframe=1d",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    // 25000 - 10 * 159 = 23410.
    let html = body_html(app.oneshot(get("/")).await.unwrap()).await;
    assert!(html.contains("23,410.00"));
    // Holding row: 10 units valued at the live price 159.
    assert!(html.contains("1,590.00"));
    assert!(!html.contains("Portfolio is empty."));
}

#[tokio::test]
async fn limit_buy_then_sell_updates_cash_and_position() {
    let app = create_app().await;

    let buy = app
        .clone()
        .oneshot(form_post(
            "/order",
            "symbol=BTC-USD&side=buy&order_type=limit&quantity=10&limit_price=100&timeframe=1d",
        ))
        .await
        .unwrap();
    assert_eq!(buy.status(), StatusCode::SEE_OTHER);

    let sell = app
        .clone()
        .oneshot(form_post(
            "/order",
            "symbol=BTC-USD&side=sell&order_type=limit&quantity=5&limit_price=120&timeframe=1d",
        ))
        .await
        .unwrap();
    assert_eq!(sell.status(), StatusCode::SEE_OTHER);

    let html = body_html(app.oneshot(get("/")).await.unwrap()).await;
    assert!(html.contains("24,600.00"));
    assert!(html.contains("SELL"));
    // Position of 5 valued at the live price 159.
    assert!(html.contains("795.00"));
}

#[tokio::test]
async fn insufficient_funds_flashes_error_and_preserves_state() {
    let app = create_app().await;

    let response = app
        .clone()
        .oneshot(form_post(
            "/order",
            "symbol=BTC-USD&side=buy&order_type=limit&quantity=1000&limit_price=100&timeframe=1d",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let cookie = session_cookie(&response);

    let follow = app
        .oneshot(
            Request::builder()
                .uri("/")
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let html = body_html(follow).await;
    assert!(html.contains("insufficient funds"));
    assert!(html.contains("25,000.00"));
    assert!(html.contains("Portfolio is empty."));
}

#[tokio::test]
async fn sell_without_position_is_rejected() {
    let app = create_app().await;

    let response = app
        .clone()
        .oneshot(form_post(
            "/order",
            "symbol=BTC-USD&side=sell&order_type=limit&quantity=3&limit_price=100&timeframe=1d",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let cookie = session_cookie(&response);

    let follow = app
        .oneshot(
            Request::builder()
                .uri("/")
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let html = body_html(follow).await;
    assert!(html.contains("insufficient position"));
    assert!(html.contains("25,000.00"));
}

#[tokio::test]
async fn market_order_without_quote_is_rejected() {
    let app = create_app().await;

    let response = app
        .clone()
        .oneshot(form_post(
            "/order",
            "symbol=ZZZ&side=buy&order_type=market&quantity=1&limit_price=&timeframe=1d",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let cookie = session_cookie(&response);

    let follow = app
        .oneshot(
            Request::builder()
                .uri("/")
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let html = body_html(follow).await;
    assert!(html.contains("no market data for ZZZ"));
    assert!(html.contains("25,000.00"));
}

#[tokio::test]
async fn funding_credits_wallet_within_bounds() {
    let app = create_app().await;

    let response = app
        .clone()
        .oneshot(form_post(
            "/funds",
            "amount=5000&symbol=BTC-USD&timeframe=1d",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let html = body_html(app.oneshot(get("/")).await.unwrap()).await;
    assert!(html.contains("30,000.00"));
}

#[tokio::test]
async fn funding_out_of_range_is_rejected() {
    let app = create_app().await;

    let response = app
        .clone()
        .oneshot(form_post("/funds", "amount=50&symbol=BTC-USD&timeframe=1d"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let cookie = session_cookie(&response);

    let follow = app
        .oneshot(
            Request::builder()
                .uri("/")
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let html = body_html(follow).await;
    assert!(html.contains("outside allowed range"));
    assert!(html.contains("25,000.00"));
}

#[tokio::test]
async fn reset_restores_starting_balance() {
    let app = create_app().await;

    app.clone()
        .oneshot(form_post(
            "/order",
            "symbol=BTC-USD&side=buy&order_type=limit&quantity=10&limit_price=100&timeframe=1d",
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(form_post("/reset", "symbol=BTC-USD&timeframe=1d"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let html = body_html(app.oneshot(get("/")).await.unwrap()).await;
    assert!(html.contains("25,000.00"));
    assert!(html.contains("Portfolio is empty."));
    assert!(html.contains("No trades executed this session."));
}

#[tokio::test]
async fn htmx_order_returns_wallet_fragment() {
    let app = create_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/order")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .header("HX-Request", "true")
                .body(Body::from(
                    "symbol=BTC-USD&side=buy&order_type=limit&quantity=10&limit_price=100&timeframe=1d",
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_html(response).await;
    assert!(html.contains("banner ok"));
    assert!(html.contains("id=\"wallet\""));
    assert!(html.contains("24,000.00"));
}

#[tokio::test]
async fn invalid_quantity_is_bad_request() {
    let app = create_app().await;

    let response = app
        .oneshot(form_post(
            "/order",
            "symbol=BTC-USD&side=buy&order_type=limit&quantity=ten&limit_price=100&timeframe=1d",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn quote_failure_degrades_dashboard() {
    let quote = MockQuotePort::new().with_error("BTC-USD", "connection refused");
    let app = create_app_with(quote, MockNewsPort::with_items(make_news(2))).await;

    let response = app.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_html(response).await;
    assert!(html.contains("quote fetch failed"));
    // Valuation degrades to cash only.
    assert!(html.contains("25,000.00"));
}

#[tokio::test]
async fn news_failure_shows_offline_hint() {
    let app = create_app_with(default_quote_port(), MockNewsPort::failing()).await;

    let response = app.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_html(response).await;
    assert!(html.contains("News feed temporarily offline."));
}

#[tokio::test]
async fn unknown_route_renders_not_found() {
    let app = create_app().await;

    let response = app.oneshot(get("/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let html = body_html(response).await;
    assert!(html.contains("Page not found"));
}
