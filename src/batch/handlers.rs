use actix_web::{web, HttpRequest, HttpResponse, Responder};
use futures::StreamExt;
use serde::Serialize;
use tokio_stream::wrappers::WatchStream;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{BatchError, BatchRequest, BatchStatus};
use crate::auth::validate_request_token;
use crate::documents::handlers::attachment;
use crate::{AppState, ErrorResponse};

#[derive(Debug, Serialize, ToSchema)]
pub struct BatchCreated {
    pub batch_id: Uuid,
    pub total_units: usize,
}

fn batch_not_found(id: &Uuid) -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponse::not_found(&format!("Batch {} not found", id)))
}

#[utoipa::path(
    post,
    path = "/api/batches",
    tag = "Batches",
    request_body = BatchRequest,
    responses(
        (status = 202, description = "Batch started", body = BatchCreated),
        (status = 400, description = "Invalid selection; the batch was not started", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_batch(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<BatchRequest>,
) -> impl Responder {
    if let Err(e) = validate_request_token(&req, &state.jwt) {
        return e.error_response();
    }

    let request = body.into_inner();
    let jobs = match request.expand() {
        Ok(jobs) => jobs,
        Err(BatchError::Validation(message)) => {
            log::info!("Batch rejected: {}", message);
            return HttpResponse::BadRequest().json(ErrorResponse::bad_request(&message));
        }
    };

    let total_units = jobs.len();
    let handle = state.orchestrator.launch(request.kind, jobs);
    state.batches.insert(handle.id, handle.clone()).await;

    HttpResponse::Accepted().json(BatchCreated {
        batch_id: handle.id,
        total_units,
    })
}

#[utoipa::path(
    get,
    path = "/api/batches/{id}",
    tag = "Batches",
    params(("id" = Uuid, Path, description = "Batch id")),
    responses(
        (status = 200, description = "Current batch status", body = BatchStatus),
        (status = 404, description = "Unknown or expired batch", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_batch(req: HttpRequest, state: web::Data<AppState>, id: web::Path<Uuid>) -> impl Responder {
    if let Err(e) = validate_request_token(&req, &state.jwt) {
        return e.error_response();
    }

    let id = id.into_inner();
    match state.batches.get(&id).await {
        Some(handle) => HttpResponse::Ok().json(handle.status()),
        None => batch_not_found(&id),
    }
}

#[utoipa::path(
    get,
    path = "/api/batches/{id}/events",
    tag = "Batches",
    params(("id" = Uuid, Path, description = "Batch id")),
    responses(
        (status = 200, description = "Server-sent stream of BatchStatus snapshots"),
        (status = 404, description = "Unknown or expired batch", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn batch_events(req: HttpRequest, state: web::Data<AppState>, id: web::Path<Uuid>) -> impl Responder {
    if let Err(e) = validate_request_token(&req, &state.jwt) {
        return e.error_response();
    }

    let id = id.into_inner();
    let Some(handle) = state.batches.get(&id).await else {
        return batch_not_found(&id);
    };

    // ends when the batch has reset to idle and its driver is gone
    let stream = WatchStream::new(handle.subscribe()).map(|status| match serde_json::to_string(&status) {
        Ok(json) => Ok::<_, std::io::Error>(web::Bytes::from(format!("data: {}\n\n", json))),
        Err(_) => Ok(web::Bytes::from("event: error\ndata: stream error\n\n")),
    });

    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .insert_header(("Connection", "keep-alive"))
        .streaming(stream)
}

#[utoipa::path(
    get,
    path = "/api/batches/{id}/archive",
    tag = "Batches",
    params(("id" = Uuid, Path, description = "Batch id")),
    responses(
        (status = 200, description = "Zip of every successful document"),
        (status = 404, description = "Unknown batch, or packaging failed", body = ErrorResponse),
        (status = 409, description = "Batch still running", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn download_archive(req: HttpRequest, state: web::Data<AppState>, id: web::Path<Uuid>) -> impl Responder {
    if let Err(e) = validate_request_token(&req, &state.jwt) {
        return e.error_response();
    }

    let id = id.into_inner();
    let Some(handle) = state.batches.get(&id).await else {
        return batch_not_found(&id);
    };

    if let Some(archive) = handle.archive() {
        return attachment("application/zip", &archive.name, archive.bytes.clone());
    }

    let status = handle.status();
    if status.finished {
        let message = status.error.unwrap_or_else(|| "Archive is not available".to_string());
        HttpResponse::NotFound().json(ErrorResponse::not_found(&message))
    } else {
        HttpResponse::Conflict().json(ErrorResponse::new("Conflict", "Batch is still running"))
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/batches").route(web::post().to(create_batch)))
        .service(web::resource("/batches/{id}").route(web::get().to(get_batch)))
        .service(web::resource("/batches/{id}/events").route(web::get().to(batch_events)))
        .service(web::resource("/batches/{id}/archive").route(web::get().to(download_archive)));
}
