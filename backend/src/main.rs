mod config;
mod routes;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use config::AppConfig;
use defungi_inference::{InferenceService, ModelHandle};
use routes::{configure_routes, json_config, ServingOptions};
use std::env;
use std::sync::Arc;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    dotenv::dotenv().ok();

    if let Ok(current_dir) = env::current_dir() {
        log::info!("Current working directory: {}", current_dir.display());
    } else {
        log::error!("Failed to get the current working directory.");
    }

    let config = AppConfig::load().map_err(|e| {
        log::error!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    defungi_inference::self_check().map_err(|e| {
        log::error!("Feature layout self-check failed: {}", e);
        std::io::Error::other(format!("Feature self-check failed: {}", e))
    })?;

    let model = Arc::new(ModelHandle::from_candidates(config.model.candidates.clone()));
    if config.model.preload {
        if let Err(e) = model.get() {
            log::error!("Failed to preload model at startup: {}", e);
            return Err(std::io::Error::other(format!("Model loading failed: {}", e)));
        }
    } else {
        log::info!(
            "Model will be loaded on first request from {} candidate path(s)",
            config.model.candidates.len()
        );
    }

    let service = InferenceService::new(model).with_features(config.response.include_features);
    let options = ServingOptions {
        include_probabilities: config.response.include_probabilities,
        max_payload_bytes: config.server.max_payload_bytes,
    };

    let bind_address = config.bind_address();
    log::info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec![
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .max_age(3600),
            )
            .app_data(web::Data::new(service.clone()))
            .app_data(web::Data::new(options))
            .app_data(json_config(options.max_payload_bytes))
            .app_data(web::PayloadConfig::new(options.max_payload_bytes))
            .configure(configure_routes)
    })
    .bind(&bind_address)?
    .run()
    .await
}
