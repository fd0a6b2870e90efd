use actix_multipart::Multipart;
use actix_web::error::{BlockingError, InternalError};
use actix_web::{web, HttpResponse};
use defungi_inference::{ClassificationResult, ImageSource, InferenceError, InferenceService};
use futures::{StreamExt, TryStreamExt};
use log::{error, info, warn};
use shared::{ClassifyRequest, ErrorResponse, HealthResponse};
use uuid::Uuid;

/// Per-server settings the handlers need besides the service itself.
#[derive(Debug, Clone, Copy)]
pub struct ServingOptions {
    pub include_probabilities: bool,
    pub max_payload_bytes: usize,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/classify").route(web::post().to(classify_json)))
        .service(web::resource("/api/classify/upload").route(web::post().to(classify_upload)))
        .service(web::resource("/api/health").route(web::get().to(health)));
}

/// JSON extractor settings: body size limit and `{ "error": ... }` rejections.
pub fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default().limit(limit).error_handler(|err, _req| {
        let message = err.to_string();
        warn!("Rejected JSON body: {}", message);
        let response = HttpResponse::BadRequest().json(ErrorResponse { error: message });
        InternalError::from_response(err, response).into()
    })
}

async fn classify_json(
    service: web::Data<InferenceService>,
    options: web::Data<ServingOptions>,
    body: web::Json<ClassifyRequest>,
) -> HttpResponse {
    let request_id = Uuid::new_v4();
    let ClassifyRequest { image } = body.into_inner();
    info!("[{}] Classify request with {} transport bytes", request_id, image.len());

    let service = service.get_ref().clone();
    let outcome = web::block(move || service.classify(ImageSource::Transport(&image))).await;
    respond(request_id, outcome, options.include_probabilities)
}

async fn classify_upload(
    service: web::Data<InferenceService>,
    options: web::Data<ServingOptions>,
    mut payload: Multipart,
) -> HttpResponse {
    let request_id = Uuid::new_v4();
    let mut image_data = Vec::new();

    loop {
        let mut field = match payload.try_next().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return malformed_upload(request_id, e),
        };
        while let Some(chunk) = field.next().await {
            match chunk {
                Ok(data) => image_data.extend_from_slice(&data),
                Err(e) => return malformed_upload(request_id, e),
            }
            if image_data.len() > options.max_payload_bytes {
                warn!("[{}] Upload exceeds {} bytes", request_id, options.max_payload_bytes);
                return HttpResponse::PayloadTooLarge()
                    .json(ErrorResponse { error: "Uploaded image is too large".into() });
            }
        }
        if !image_data.is_empty() {
            break;
        }
    }

    if image_data.is_empty() {
        warn!("[{}] Upload contained no image data", request_id);
        return HttpResponse::BadRequest().json(ErrorResponse { error: "No image provided".into() });
    }
    info!("[{}] Classify upload of {} bytes", request_id, image_data.len());

    let service = service.get_ref().clone();
    let outcome = web::block(move || service.classify(ImageSource::Encoded(&image_data))).await;
    respond(request_id, outcome, options.include_probabilities)
}

async fn health(service: web::Data<InferenceService>) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".into(),
        model_loaded: service.model().is_loaded(),
    })
}

fn malformed_upload(request_id: Uuid, err: impl std::fmt::Display) -> HttpResponse {
    error!("[{}] Failed to read upload: {}", request_id, err);
    HttpResponse::BadRequest().json(ErrorResponse { error: format!("Malformed upload: {}", err) })
}

fn respond(
    request_id: Uuid,
    outcome: Result<Result<ClassificationResult, InferenceError>, BlockingError>,
    include_probabilities: bool,
) -> HttpResponse {
    match outcome {
        Ok(Ok(result)) => {
            info!("[{}] Responding with {}", request_id, result.label);
            HttpResponse::Ok().json(result.to_response(include_probabilities))
        }
        Ok(Err(e)) => {
            error!("[{}] Classification failed: {}", request_id, e);
            error_response(&e)
        }
        Err(e) => {
            error!("[{}] Blocking task failed: {}", request_id, e);
            HttpResponse::InternalServerError()
                .json(ErrorResponse { error: "Classification task failed".into() })
        }
    }
}

fn error_response(err: &InferenceError) -> HttpResponse {
    let body = ErrorResponse { error: err.to_string() };
    match err {
        InferenceError::InvalidImage(_) => HttpResponse::BadRequest().json(body),
        _ => HttpResponse::InternalServerError().json(body),
    }
}
