//! Actix Web server exposing the streaming, navigation, and metrics
//! endpoints.
//!
//! Each `/video_feed` connection gets its own session thread owning an
//! exclusive camera handle; the handler only shuttles encoded multipart
//! chunks from the session channel into the response body. Slow or stalled
//! clients therefore block their own thread, never another session.

use std::path::Path;

use actix_web::{
    App, HttpResponse, HttpServer,
    web::{self, Bytes},
};
use anyhow::{Context, Result};
use async_stream::stream;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error};

use crate::html;
use crate::stream::{
    catalog::{CursorSnapshot, ReferenceCatalog},
    config::StreamConfig,
    data::CursorResponse,
    encoding::MULTIPART_BOUNDARY,
    session::StreamSession,
    telemetry,
};

/// Shared state backing HTTP handlers.
pub(crate) struct ServerState {
    pub(crate) catalog: ReferenceCatalog,
    pub(crate) config: StreamConfig,
}

/// Load the catalog and run the server until shutdown.
///
/// Catalog problems (missing folder, no images) abort here, before the
/// listener binds.
pub fn run(config: StreamConfig) -> Result<()> {
    telemetry::init_tracing(config.verbose);
    let _ = telemetry::init_metrics_recorder();

    let catalog = ReferenceCatalog::load(&config.image_dir)
        .context("reference catalog unavailable at startup")?;
    debug!(
        "loaded {} reference image(s) from {:?}",
        catalog.len(),
        config.image_dir
    );

    let port = config.port;
    let state = web::Data::new(ServerState { catalog, config });
    println!("pose-mirror listening on http://127.0.0.1:{port}/");

    actix_web::rt::System::new()
        .block_on(async move {
            HttpServer::new(move || {
                App::new()
                    .app_data(state.clone())
                    .route("/", web::get().to(index_route))
                    .route("/video_feed", web::get().to(video_feed_handler))
                    .route("/next", web::get().to(next_handler))
                    .route("/previous", web::get().to(previous_handler))
                    .route("/current", web::get().to(current_handler))
                    .route("/reference.jpg", web::get().to(reference_handler))
                    .route("/metrics", web::get().to(metrics_handler))
            })
            .bind(("0.0.0.0", port))?
            .run()
            .await
        })
        .context("HTTP server failed")
}

/// Serve the embedded control page.
async fn index_route() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(html::index::INDEX_HTML)
}

/// Open a new streaming session and pipe its multipart chunks to the client.
async fn video_feed_handler(state: web::Data<ServerState>) -> HttpResponse {
    let snapshot = state.catalog.current();
    let config = state.config.clone();
    let (ready_tx, ready_rx) = oneshot::channel();
    let (chunk_tx, mut chunk_rx) = mpsc::channel::<Vec<u8>>(2);

    let spawned = telemetry::spawn_thread("pose-stream-session", move || {
        match StreamSession::start(&config, &snapshot.entry) {
            Ok(session) => {
                if ready_tx.send(Ok(())).is_err() {
                    return;
                }
                session.run(chunk_tx);
            }
            Err(err) => {
                let _ = ready_tx.send(Err(err));
            }
        }
    });
    if let Err(err) = spawned {
        error!("failed to spawn session thread: {err}");
        return HttpResponse::InternalServerError().body(format!("{err}"));
    }

    // A session that cannot start must yield an explicit error response, not
    // an empty or hung stream.
    match ready_rx.await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => {
            error!("stream session failed to start: {err:?}");
            return HttpResponse::ServiceUnavailable().body(format!("{err:#}"));
        }
        Err(_) => {
            return HttpResponse::ServiceUnavailable()
                .body("stream session exited before startup completed");
        }
    }

    let body = stream! {
        while let Some(chunk) = chunk_rx.recv().await {
            yield Ok::<Bytes, actix_web::Error>(Bytes::from(chunk));
        }
    };

    HttpResponse::Ok()
        .append_header(("Cache-Control", "no-cache"))
        .append_header((
            "Content-Type",
            format!("multipart/x-mixed-replace; boundary={MULTIPART_BOUNDARY}"),
        ))
        .streaming(body)
}

async fn next_handler(state: web::Data<ServerState>) -> HttpResponse {
    cursor_response(state.catalog.advance(), &state.catalog)
}

async fn previous_handler(state: web::Data<ServerState>) -> HttpResponse {
    cursor_response(state.catalog.retreat(), &state.catalog)
}

async fn current_handler(state: web::Data<ServerState>) -> HttpResponse {
    cursor_response(state.catalog.current(), &state.catalog)
}

fn cursor_response(snapshot: CursorSnapshot, catalog: &ReferenceCatalog) -> HttpResponse {
    HttpResponse::Ok().json(CursorResponse {
        index: snapshot.index,
        count: catalog.len(),
        name: snapshot.entry.name,
    })
}

/// Serve the raw bytes of the currently selected reference image.
async fn reference_handler(state: web::Data<ServerState>) -> HttpResponse {
    let snapshot = state.catalog.current();
    match std::fs::read(&snapshot.entry.path) {
        Ok(bytes) => HttpResponse::Ok()
            .content_type(content_type_for(&snapshot.entry.path))
            .body(bytes),
        Err(err) => {
            error!(
                "failed to read reference image {:?}: {err}",
                snapshot.entry.path
            );
            HttpResponse::InternalServerError().body(format!("{err}"))
        }
    }
}

fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        _ => "image/jpeg",
    }
}

/// Expose pipeline counters in Prometheus exposition format.
async fn metrics_handler() -> HttpResponse {
    match telemetry::prometheus_handle() {
        Some(handle) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(handle.render()),
        None => HttpResponse::NoContent().finish(),
    }
}
