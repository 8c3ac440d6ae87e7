//! HTTP request handlers for the web adapter.

use axum::{
    Form,
    extract::{Query, State},
    http::HeaderMap,
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tower_sessions::Session;

use crate::domain::error::VaultexError;
use crate::domain::ledger::{Ledger, Side};
use crate::domain::news::NewsItem;
use crate::domain::quote::{OhlcvBar, Timeframe};

use super::auth::{Backend, Credentials};
use super::{AppState, WebError, is_htmx_request, ledger_settings, templates};

pub type AuthSession = axum_login::AuthSession<Backend>;

const FLASH_NOTICE: &str = "flash.notice";
const FLASH_ERROR: &str = "flash.error";
const DEFAULT_SYMBOL: &str = "BTC-USD";

pub async fn login_form() -> Result<Response, WebError> {
    render_page(templates::LoginTemplate { error: None })
}

pub async fn login(
    mut auth_session: AuthSession,
    Form(creds): Form<Credentials>,
) -> Result<Response, WebError> {
    let user = match auth_session.authenticate(creds).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return render_page(templates::LoginTemplate {
                error: Some("Invalid username or password".to_string()),
            });
        }
        Err(e) => return Err(WebError::internal(e.to_string())),
    };

    auth_session
        .login(&user)
        .await
        .map_err(|e| WebError::internal(e.to_string()))?;
    Ok(Redirect::to("/").into_response())
}

pub async fn logout(mut auth_session: AuthSession) -> Result<Response, WebError> {
    auth_session
        .logout()
        .await
        .map_err(|e| WebError::internal(e.to_string()))?;
    Ok(Redirect::to("/login").into_response())
}

#[derive(Debug, serde::Deserialize)]
pub struct DashboardQuery {
    pub symbol: Option<String>,
    pub timeframe: Option<String>,
}

pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    auth_session: AuthSession,
    session: Session,
    Query(query): Query<DashboardQuery>,
) -> Result<Response, WebError> {
    let username = current_username(&auth_session);
    let default_symbol = state
        .config
        .get_string("market", "default_symbol")
        .unwrap_or_else(|| DEFAULT_SYMBOL.to_string());
    let mut symbol = sanitize_symbol(query.symbol.as_deref().unwrap_or(&default_symbol));
    if symbol.is_empty() {
        symbol = sanitize_symbol(&default_symbol);
    }
    let timeframe = parse_timeframe(query.timeframe.as_deref());

    let ledger = snapshot_ledger(&state, &username);
    let held: Vec<String> = ledger.holdings().keys().cloned().collect();
    let watchlist = configured_watchlist(&state);

    let market = gather_market_data(
        state.clone(),
        symbol.clone(),
        timeframe,
        watchlist,
        held,
    )
    .await?;

    let (market_panel, market_error) = match &market.bars {
        Ok(bars) if bars.is_empty() => (
            None,
            Some(format!("No market data available for {symbol}.")),
        ),
        Ok(bars) => (templates::MarketPanel::build(bars), None),
        Err(err) => (None, Some(err.to_string())),
    };

    let (news, news_error) = match &market.news {
        Ok(items) => (templates::news_rows(items), None),
        Err(_) => (Vec::new(), Some("News feed temporarily offline.".to_string())),
    };

    let notice = take_flash(&session, FLASH_NOTICE).await;
    let error_msg = take_flash(&session, FLASH_ERROR).await;
    let settings = *ledger.settings();

    let template = templates::DashboardTemplate {
        username,
        currency: templates::CURRENCY,
        symbol: symbol.clone(),
        timeframe: timeframe.label().to_string(),
        timeframes: templates::timeframe_options(timeframe),
        refresh_secs: timeframe.is_intraday().then_some(10),
        notice,
        error_msg,
        market: market_panel,
        market_error,
        wallet: templates::WalletPanel::build(&ledger, &market.holding_prices),
        watchlist: templates::watch_rows(&market.watch_prices),
        holdings: templates::holding_rows(&ledger, &market.holding_prices),
        trades: templates::trade_rows(ledger.log()),
        news,
        news_error,
        videos: templates::research_links(&symbol),
        funding_min: templates::fmt_money(settings.funding_min),
        funding_max: templates::fmt_money(settings.funding_max),
    };
    render_page(template)
}

#[derive(Debug, serde::Deserialize)]
pub struct OrderForm {
    pub side: String,
    pub order_type: String,
    pub symbol: String,
    pub quantity: String,
    #[serde(default)]
    pub limit_price: String,
    #[serde(default)]
    pub timeframe: String,
}

pub async fn place_order(
    State(state): State<Arc<AppState>>,
    auth_session: AuthSession,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<OrderForm>,
) -> Result<Response, WebError> {
    let username = current_username(&auth_session);
    let timeframe = parse_timeframe(Some(form.timeframe.as_str()));
    let symbol = sanitize_symbol(&form.symbol);
    if symbol.is_empty() {
        return Err(WebError::bad_request("Symbol must not be empty"));
    }

    let side = match form.side.as_str() {
        "buy" => Side::Buy,
        "sell" => Side::Sell,
        other => return Err(WebError::bad_request(format!("Invalid order side: {other}"))),
    };
    let quantity: i64 = form
        .quantity
        .trim()
        .parse()
        .map_err(|_| WebError::bad_request("Invalid quantity"))?;

    let price = match form.order_type.as_str() {
        "limit" => Some(
            form.limit_price
                .trim()
                .parse::<f64>()
                .map_err(|_| WebError::bad_request("Invalid limit price"))?,
        ),
        "market" => {
            let quote_state = state.clone();
            let quote_symbol = symbol.clone();
            tokio::task::spawn_blocking(move || {
                quote_state.quote_port.last_price(&quote_symbol)
            })
            .await
            .map_err(|e| WebError::internal(e.to_string()))?
            .ok()
            .flatten()
            .filter(|p| *p > 0.0)
        }
        other => return Err(WebError::bad_request(format!("Invalid order type: {other}"))),
    };

    let outcome = match price {
        Some(price) => {
            let mut ledgers = lock_store(&state);
            let ledger = ledgers
                .entry(username.clone())
                .or_insert_with(|| Ledger::new(ledger_settings(&*state.config)));
            ledger
                .place_order(side, &symbol, quantity, price, Utc::now())
                .map(|entry| {
                    format!(
                        "{} {} {} @ {} {} executed",
                        entry.side,
                        entry.quantity,
                        entry.symbol,
                        templates::CURRENCY,
                        templates::fmt_money(entry.price),
                    )
                })
                .map_err(|err| err.to_string())
        }
        None => Err(VaultexError::NoData {
            symbol: symbol.clone(),
        }
        .to_string()),
    };

    finish_mutation(state, session, headers, username, symbol, timeframe, outcome).await
}

#[derive(Debug, serde::Deserialize)]
pub struct FundsForm {
    pub amount: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub timeframe: String,
}

pub async fn add_funds(
    State(state): State<Arc<AppState>>,
    auth_session: AuthSession,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<FundsForm>,
) -> Result<Response, WebError> {
    let username = current_username(&auth_session);
    let timeframe = parse_timeframe(Some(form.timeframe.as_str()));
    let symbol = sanitize_symbol(&form.symbol);

    let amount: f64 = form
        .amount
        .trim()
        .parse()
        .map_err(|_| WebError::bad_request("Invalid amount"))?;

    let outcome = {
        let mut ledgers = lock_store(&state);
        let ledger = ledgers
            .entry(username.clone())
            .or_insert_with(|| Ledger::new(ledger_settings(&*state.config)));
        ledger
            .add_funds(amount)
            .map(|()| {
                format!(
                    "{} {} added to wallet",
                    templates::CURRENCY,
                    templates::fmt_money(amount),
                )
            })
            .map_err(|err| err.to_string())
    };

    finish_mutation(state, session, headers, username, symbol, timeframe, outcome).await
}

#[derive(Debug, serde::Deserialize)]
pub struct ResetForm {
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub timeframe: String,
}

pub async fn reset_account(
    State(state): State<Arc<AppState>>,
    auth_session: AuthSession,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<ResetForm>,
) -> Result<Response, WebError> {
    let username = current_username(&auth_session);
    let timeframe = parse_timeframe(Some(form.timeframe.as_str()));
    let symbol = sanitize_symbol(&form.symbol);

    {
        let mut ledgers = lock_store(&state);
        let ledger = ledgers
            .entry(username.clone())
            .or_insert_with(|| Ledger::new(ledger_settings(&*state.config)));
        ledger.reset();
    }

    let outcome = Ok("Account reset to starting balance".to_string());
    finish_mutation(state, session, headers, username, symbol, timeframe, outcome).await
}

pub async fn not_found() -> Response {
    WebError::not_found("Page not found").into_response()
}

/// Fetched market context for one dashboard render. Port failures stay in
/// the `Result`s so the page can degrade a panel instead of erroring out.
struct MarketData {
    bars: Result<Vec<OhlcvBar>, VaultexError>,
    news: Result<Vec<NewsItem>, VaultexError>,
    watch_prices: Vec<(String, f64)>,
    holding_prices: HashMap<String, f64>,
}

async fn gather_market_data(
    state: Arc<AppState>,
    symbol: String,
    timeframe: Timeframe,
    watchlist: Vec<String>,
    held: Vec<String>,
) -> Result<MarketData, WebError> {
    tokio::task::spawn_blocking(move || {
        let bars = state.quote_port.fetch_history(&symbol, timeframe);
        let news = state.news_port.fetch_feed(&symbol);
        let watch_prices = watchlist
            .into_iter()
            .map(|s| {
                let price = state.quote_port.last_price(&s).ok().flatten().unwrap_or(0.0);
                (s, price)
            })
            .collect();
        let holding_prices = held
            .into_iter()
            .filter_map(|s| {
                state
                    .quote_port
                    .last_price(&s)
                    .ok()
                    .flatten()
                    .map(|price| (s, price))
            })
            .collect();
        MarketData {
            bars,
            news,
            watch_prices,
            holding_prices,
        }
    })
    .await
    .map_err(|e| WebError::internal(e.to_string()))
}

/// Common tail of the mutating handlers: flash + redirect for normal form
/// posts, an inline status plus out-of-band wallet swap for HTMX.
async fn finish_mutation(
    state: Arc<AppState>,
    session: Session,
    headers: HeaderMap,
    username: String,
    symbol: String,
    timeframe: Timeframe,
    outcome: Result<String, String>,
) -> Result<Response, WebError> {
    if is_htmx_request(&headers) {
        let ledger = snapshot_ledger(&state, &username);
        let held: Vec<String> = ledger.holdings().keys().cloned().collect();
        let prices_state = state.clone();
        let holding_prices: HashMap<String, f64> = tokio::task::spawn_blocking(move || {
            held.into_iter()
                .filter_map(|s| {
                    prices_state
                        .quote_port
                        .last_price(&s)
                        .ok()
                        .flatten()
                        .map(|price| (s, price))
                })
                .collect()
        })
        .await
        .map_err(|e| WebError::internal(e.to_string()))?;

        let status = match &outcome {
            Ok(msg) => format!("<div class=\"banner ok\">{msg}</div>"),
            Err(msg) => format!("<div class=\"banner err\">{msg}</div>"),
        };
        let wallet = templates::WalletPanel::build(&ledger, &holding_prices);
        return Ok(Html(format!("{status}{}", wallet.fragment())).into_response());
    }

    match outcome {
        Ok(msg) => set_flash(&session, FLASH_NOTICE, msg).await?,
        Err(msg) => set_flash(&session, FLASH_ERROR, msg).await?,
    }

    let target = if symbol.is_empty() {
        "/".to_string()
    } else {
        format!("/?symbol={symbol}&timeframe={}", timeframe.label())
    };
    Ok(Redirect::to(&target).into_response())
}

fn current_username(auth_session: &AuthSession) -> String {
    auth_session
        .user
        .as_ref()
        .map(|user| user.username.clone())
        .unwrap_or_else(|| "demo".to_string())
}

/// Clone-out snapshot of a user's ledger, creating it on first touch.
fn snapshot_ledger(state: &Arc<AppState>, username: &str) -> Ledger {
    let mut ledgers = lock_store(state);
    ledgers
        .entry(username.to_string())
        .or_insert_with(|| Ledger::new(ledger_settings(&*state.config)))
        .clone()
}

fn lock_store(
    state: &Arc<AppState>,
) -> std::sync::MutexGuard<'_, HashMap<String, Ledger>> {
    state
        .ledgers
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn configured_watchlist(state: &Arc<AppState>) -> Vec<String> {
    state
        .config
        .get_string("market", "watchlist")
        .unwrap_or_else(|| "BTC-USD,ETH-USD,AAPL,TSLA".to_string())
        .split(',')
        .map(sanitize_symbol)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Uppercase and keep only characters that appear in provider tickers.
fn sanitize_symbol(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '^' | '='))
        .collect::<String>()
        .to_uppercase()
}

fn parse_timeframe(raw: Option<&str>) -> Timeframe {
    raw.and_then(|s| s.parse().ok()).unwrap_or(Timeframe::D1)
}

async fn take_flash(session: &Session, key: &str) -> Option<String> {
    session.remove::<String>(key).await.ok().flatten()
}

async fn set_flash(session: &Session, key: &str, value: String) -> Result<(), WebError> {
    session
        .insert(key, value)
        .await
        .map_err(|e| WebError::internal(e.to_string()))
}

fn render_page<T: askama::Template>(template: T) -> Result<Response, WebError> {
    template
        .render()
        .map(|html| Html(html).into_response())
        .map_err(|e| WebError::internal(e.to_string()))
}
