use actix_cors::Cors;
use actix_web::middleware::Compress;
use actix_web::{http::header, web, App, HttpServer};
use actix_web_prometheus::PrometheusMetricsBuilder;
use serde::{Deserialize, Serialize};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

pub mod auth;
pub mod batch;
pub mod config;
pub mod documents;
pub mod history;
pub mod layout;
pub mod metrics;
pub mod state;
pub mod word_renderer;

pub use crate::config::AppConfig;
pub use crate::state::AppState;

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_type: &str, message: &str) -> Self {
        Self {
            error: error_type.to_string(),
            message: message.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn not_found(message: &str) -> Self {
        Self::new("NotFound", message)
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new("BadRequest", message)
    }

    pub fn internal_error(message: &str) -> Self {
        Self::new("InternalServerError", message)
    }
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::documents::handlers::render_document,
        crate::batch::handlers::create_batch,
        crate::batch::handlers::get_batch,
        crate::batch::handlers::batch_events,
        crate::batch::handlers::download_archive,
        crate::metrics::documents_metrics
    ),
    components(
        schemas(
            ErrorResponse,
            documents::DocumentKind,
            documents::OutputFormat,
            documents::Company,
            documents::DangerClass,
            documents::Signatory,
            documents::Participant,
            documents::EmergencyPlanRequest,
            documents::WorkPermitRequest,
            documents::TrainingSheetRequest,
            documents::CertificateRequest,
            batch::BatchRequest,
            batch::FormatSelection,
            batch::DocumentNumbering,
            batch::BatchStatus,
            batch::BatchState,
            batch::BatchProgress,
            batch::Phase,
            batch::JobSummary,
            batch::JobOutcome,
            batch::handlers::BatchCreated,
            history::ReportSnapshot,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Documents", description = "Single document rendering."),
        (name = "Batches", description = "Bulk generation, progress and archive download."),
        (name = "Metrics", description = "Pipeline counters.")
    ),
    servers(
        (url = "http://127.0.0.1:8080", description = "Localhost server")
    )
)]
pub struct ApiDoc;

/// Routes shared by the server and the integration tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .configure(documents::handlers::config)
            .configure(batch::handlers::config),
    )
    .service(web::resource("/metrics/documents").route(web::get().to(metrics::documents_metrics)));
}

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok(); // Load .env file
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env()?;
    let bind_address = config.bind_address();
    let allowed_origins = config.allowed_origins.clone();

    let app_state = web::Data::new(AppState::new(config).await?);

    let prometheus = PrometheusMetricsBuilder::new("isg_docs_server")
        .endpoint("/metrics")
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to create Prometheus metrics middleware: {}", e))?;

    log::info!("Starting server at http://{}:{}", bind_address.0, bind_address.1);

    HttpServer::new(move || {
        let app_state = app_state.clone();
        let prometheus = prometheus.clone();
        let cors = allowed_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec![header::AUTHORIZATION, header::ACCEPT, header::CONTENT_TYPE])
            .expose_headers(vec![header::CONTENT_DISPOSITION])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .wrap(Compress::default())
            .wrap(prometheus)
            .wrap(cors)
            .app_data(app_state)
            .configure(configure)
            .service(SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-doc/openapi.json", ApiDoc::openapi()))
    })
    .keep_alive(actix_web::http::KeepAlive::Os)
    .bind(bind_address)?
    .run()
    .await?;

    Ok(())
}
