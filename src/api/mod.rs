mod cli;
mod form;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::{Json, Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::core::{ProjectionResult, compute};
use crate::rates::{CachedRates, ConfiguredSource, Currency, RateOrigin, RateSnapshot};

pub use cli::{ProjectArgs, ServeArgs, ServerConfig, rate_source, render_report};
pub use form::{
    ProjectionForm, ProjectionPayload, ProjectionRequest, RequestError, parse_amount, parse_date,
};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

#[derive(Debug)]
pub struct AppState {
    pub config: ServerConfig,
    pub rates: CachedRates<ConfiguredSource>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let rates = CachedRates::new(config.rate_source(), config.rate_ttl, config.rate_timeout);
        Self { config, rates }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectionResponse {
    currency: Currency,
    display_currency: Currency,
    #[serde(skip_serializing_if = "Option::is_none")]
    rate_origin: Option<RateOrigin>,
    result: ProjectionResult,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RatesQuery {
    base: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConvertQuery {
    amount: Option<String>,
    from: Option<String>,
    to: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConvertResponse {
    amount: f64,
    from: Currency,
    to: Currency,
    converted: f64,
    rate_origin: RateOrigin,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'static str>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route(
            "/api/projection",
            get(projection_get_handler).post(projection_post_handler),
        )
        .route("/api/rates", get(rates_handler))
        .route("/api/convert", get(convert_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run_http_server(config: ServerConfig) -> std::io::Result<()> {
    let addr = SocketAddr::new(config.bind, config.port);
    let port = config.port;
    info!(
        base_currency = %config.base_currency,
        rates_url = ?config.rates_url,
        rates_file = ?config.rates_file,
        rate_ttl = ?config.rate_ttl,
        "starting projection server"
    );
    let app = router(Arc::new(AppState::new(config)));

    let listener = TcpListener::bind(addr).await?;
    info!("savings projection API listening on http://{addr}");
    info!("local access: http://127.0.0.1:{port}/");

    axum::serve(listener, app).await
}

async fn index_handler() -> impl IntoResponse {
    with_cache_control(Html(INDEX_HTML))
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn app_js_handler() -> impl IntoResponse {
    with_cache_control((
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        APP_JS,
    ))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found", None)
}

async fn projection_get_handler(
    State(state): State<Arc<AppState>>,
    Query(form): Query<ProjectionForm>,
) -> Response {
    match ProjectionRequest::try_from(form) {
        Ok(request) => projection_handler_impl(&state, request).await,
        Err(err) => request_error_response(&err),
    }
}

async fn projection_post_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ProjectionPayload>,
) -> Response {
    match ProjectionRequest::try_from(payload) {
        Ok(request) => projection_handler_impl(&state, request).await,
        Err(err) => request_error_response(&err),
    }
}

async fn projection_handler_impl(state: &AppState, request: ProjectionRequest) -> Response {
    let result = match compute(&request.input) {
        Ok(result) => result,
        Err(err) => return request_error_response(&RequestError::from(err)),
    };

    let currency = request.currency.unwrap_or(state.config.base_currency);
    let display_currency = request.display_currency.unwrap_or(currency);
    if display_currency == currency {
        return json_response(
            StatusCode::OK,
            ProjectionResponse {
                currency,
                display_currency,
                rate_origin: None,
                result,
            },
        );
    }

    let snapshot = state.rates.get_rates(currency).await;
    let response = match snapshot.rates.factor(currency, display_currency) {
        Ok(factor) => {
            debug!(%currency, %display_currency, factor, "scaling projection");
            ProjectionResponse {
                currency,
                display_currency,
                rate_origin: Some(snapshot.origin),
                result: result.scaled(factor),
            }
        }
        Err(err) => {
            warn!(%currency, %display_currency, error = %err, "conversion unavailable; returning unconverted amounts");
            ProjectionResponse {
                currency,
                display_currency: currency,
                rate_origin: None,
                result,
            }
        }
    };
    json_response(StatusCode::OK, response)
}

async fn rates_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RatesQuery>,
) -> Response {
    let base = match parse_currency(query.base.as_deref(), state.config.base_currency) {
        Ok(base) => base,
        Err(err) => return request_error_response(&err),
    };
    let snapshot: RateSnapshot = state.rates.get_rates(base).await;
    json_response(StatusCode::OK, snapshot)
}

async fn convert_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConvertQuery>,
) -> Response {
    let base = state.config.base_currency;
    let (from, to) = match (
        parse_currency(query.from.as_deref(), base),
        parse_currency(query.to.as_deref(), base),
    ) {
        (Ok(from), Ok(to)) => (from, to),
        (Err(err), _) | (_, Err(err)) => return request_error_response(&err),
    };
    let amount = parse_amount(query.amount.as_deref().unwrap_or(""));

    let snapshot = state.rates.get_rates(from).await;
    match snapshot.rates.convert(amount, from, to) {
        Ok(converted) => json_response(
            StatusCode::OK,
            ConvertResponse {
                amount,
                from,
                to,
                converted,
                rate_origin: snapshot.origin,
            },
        ),
        Err(err) => error_response(StatusCode::BAD_GATEWAY, &err.to_string(), None),
    }
}

fn parse_currency(text: Option<&str>, default: Currency) -> Result<Currency, RequestError> {
    match text.map(str::trim) {
        None | Some("") => Ok(default),
        Some(code) => Ok(code.parse()?),
    }
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn error_response(status: StatusCode, msg: &str, field: Option<&'static str>) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
            field,
        },
    )
}

fn request_error_response(err: &RequestError) -> Response {
    debug!(error = %err, "rejecting projection request");
    error_response(
        StatusCode::BAD_REQUEST,
        &err.to_string(),
        err.field().map(|field| field.key()),
    )
}
