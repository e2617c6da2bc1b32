use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::Value;
use utoipa::IntoParams;

use super::naming::bundle_file_name;
use super::{DocumentKind, DocumentRequest, GeneratedDocument, OutputFormat, Validator};
use crate::auth::validate_request_token;
use crate::batch::{ArchiveManifest, JobError, JobId};
use crate::{AppState, ErrorResponse};

#[derive(Debug, Deserialize, IntoParams)]
pub struct FormatQuery {
    /// `pdf` (default) or `word`
    #[serde(default)]
    pub format: Option<OutputFormat>,
}

pub(crate) fn attachment(content_type: &str, filename: &str, bytes: Vec<u8>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(content_type)
        .insert_header(("Content-Disposition", format!("attachment; filename=\"{}\"", filename)))
        .body(bytes)
}

fn bundle(request_title: &str, kind: DocumentKind, documents: Vec<GeneratedDocument>) -> HttpResponse {
    let mut manifest = ArchiveManifest::new();
    for document in documents {
        manifest.insert(JobId(0), document.filename, document.bytes);
    }
    match manifest.package(bundle_file_name(request_title, kind)) {
        Ok(archive) => attachment("application/zip", &archive.name, archive.bytes),
        Err(e) => {
            log::error!("Failed to bundle {} documents: {}", kind.slug(), e);
            HttpResponse::InternalServerError().json(ErrorResponse::internal_error(&e.to_string()))
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/documents/{kind}",
    tag = "Documents",
    request_body(content = serde_json::Value, description = "Kind-specific render record"),
    params(
        ("kind" = DocumentKind, Path, description = "Document kind"),
        FormatQuery
    ),
    responses(
        (status = 200, description = "Rendered file; a zip when the kind yields several documents"),
        (status = 400, description = "Invalid render record", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 502, description = "Word renderer unavailable", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn render_document(
    req: HttpRequest,
    state: web::Data<AppState>,
    kind: web::Path<DocumentKind>,
    query: web::Query<FormatQuery>,
    body: web::Json<Value>,
) -> impl Responder {
    if let Err(e) = validate_request_token(&req, &state.jwt) {
        return e.error_response();
    }

    let kind = kind.into_inner();
    let request = match DocumentRequest::from_value(kind, body.into_inner()) {
        Ok(request) => request,
        Err(e) => {
            return HttpResponse::BadRequest()
                .json(ErrorResponse::bad_request(&format!("Belge verisi okunamadı: {}", e)))
        }
    };
    if let Err(message) = request.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse::bad_request(&message));
    }

    let request = request.resolved();
    let title = request.company().name.clone();
    let format = query.format.unwrap_or(OutputFormat::Pdf);

    match state.orchestrator.render_single(request, format).await {
        Ok(mut documents) if documents.len() == 1 => {
            let document = documents.remove(0);
            attachment(document.format.mime_type(), &document.filename, document.bytes)
        }
        Ok(documents) => bundle(&title, kind, documents),
        Err(JobError::Transport(e)) => HttpResponse::BadGateway().json(ErrorResponse::new("BadGateway", &e.to_string())),
        Err(e) => HttpResponse::InternalServerError().json(ErrorResponse::internal_error(&e.to_string())),
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/documents/{kind}").route(web::post().to(render_document)));
}
