//! HTTP surface for the signal service.
//!
//! Four GET routes over hand-rolled hyper routing: `/signals` for explicit
//! addresses, `/signals/latest` for the discovery feed, `/signals/snapshot/`
//! for one raw snapshot and `/health` for liveness. Errors are JSON bodies
//! shaped `{"detail": ...}`.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use hyper::http;
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use crate::engine::SignalEngine;
use crate::error::ApiError;
use crate::types::Signal;

const SNAPSHOT_PREFIX: &str = "/signals/snapshot/";

/// Binds the listener and serves requests until the server ends.
pub async fn serve(engine: SignalEngine, addr: SocketAddr) -> anyhow::Result<()> {
    let engine = Arc::new(engine);
    let make_svc = make_service_fn(move |_conn| {
        let engine = engine.clone();
        async move {
            Ok::<_, Infallible>(service_fn(move |req| {
                let engine = engine.clone();
                async move { route(req, engine).await }
            }))
        }
    });

    let server = Server::bind(&addr).serve(make_svc);
    info!("signals API listening on {}", addr);
    server.await.context("signals API server failed")?;
    Ok(())
}

async fn route(
    req: Request<Body>,
    engine: Arc<SignalEngine>,
) -> Result<Response<Body>, http::Error> {
    let path = req.uri().path().to_string();
    let query = req.uri().query().unwrap_or("").to_string();

    match (req.method(), path.as_str()) {
        (&Method::GET, "/health") => Ok(Response::builder()
            .status(StatusCode::OK)
            .body(Body::from("OK"))?),
        (&Method::GET, "/signals") => reply(signals(&engine, &query).await),
        (&Method::GET, "/signals/latest") => reply(latest(&engine, &query).await),
        (&Method::GET, p) if p.starts_with(SNAPSHOT_PREFIX) => {
            let address = &p[SNAPSHOT_PREFIX.len()..];
            if address.is_empty() {
                return error_response(StatusCode::NOT_FOUND, "Not Found");
            }
            json_response(&engine.enriched_snapshot(address).await)
        }
        _ => error_response(StatusCode::NOT_FOUND, "Not Found"),
    }
}

async fn signals(engine: &SignalEngine, query: &str) -> Result<Vec<Signal>, ApiError> {
    let raw = query_param(query, "addresses")
        .ok_or_else(|| ApiError::MissingParam("addresses parameter is required".to_string()))?;
    let addresses: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect();
    if addresses.is_empty() {
        return Err(ApiError::MissingParam(
            "addresses parameter is required".to_string(),
        ));
    }
    engine.signals_for(&addresses, analyze_requested(query)).await
}

async fn latest(engine: &SignalEngine, query: &str) -> Result<Vec<Signal>, ApiError> {
    engine.latest_signals(analyze_requested(query)).await
}

fn analyze_requested(query: &str) -> bool {
    query_param(query, "analyze")
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn query_param(query: &str, name: &str) -> Option<String> {
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}

fn reply<T: Serialize>(outcome: Result<T, ApiError>) -> Result<Response<Body>, http::Error> {
    match outcome {
        Ok(value) => json_response(&value),
        Err(e) => error_response(status_for(&e), &e.to_string()),
    }
}

fn status_for(err: &ApiError) -> StatusCode {
    match err {
        ApiError::MissingParam(_) => StatusCode::BAD_REQUEST,
        ApiError::NoMatches(_) => StatusCode::NOT_FOUND,
    }
}

fn json_response<T: Serialize>(value: &T) -> Result<Response<Body>, http::Error> {
    match serde_json::to_vec(value) {
        Ok(body) => Ok(Response::builder()
            .status(StatusCode::OK)
            .header("content-type", "application/json")
            .body(Body::from(body))?),
        Err(e) => {
            warn!("response serialization failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
        }
    }
}

fn error_response(status: StatusCode, detail: &str) -> Result<Response<Body>, http::Error> {
    Ok(Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Body::from(json!({ "detail": detail }).to_string()))?)
}
