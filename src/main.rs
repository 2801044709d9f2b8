use std::io;
use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::{App, HttpResponse, HttpServer, cookie::Key, middleware, web};

use deckstudy::auth::access::PgDeckAccess;
use deckstudy::auth::rate_limit::LoginLimiter;
use deckstudy::config::Config;
use deckstudy::errors::ApiErrorResponse;
use deckstudy::generation::ContentGenerator;
use deckstudy::llm::{LanguageModel, OpenAiClient};
use deckstudy::storage::{FileArtifactStore, FileSlideSource};
use deckstudy::{db, handlers};

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init();
    let config = Config::load();

    std::fs::create_dir_all(&config.data_dir)?;

    let pool = db::init_pool(&config.database_url)
        .await
        .map_err(|e| io::Error::other(format!("Failed to connect to database: {e}")))?;
    db::run_migrations(&pool)
        .await
        .map_err(|e| io::Error::other(format!("Failed to run migrations: {e}")))?;

    let model: Option<Arc<dyn LanguageModel>> = match &config.openai_api_key {
        Some(key) => {
            let client = OpenAiClient::new(
                &config.openai_base_url,
                key,
                &config.openai_model,
                config.openai_timeout,
            )
            .map_err(|e| io::Error::other(e.to_string()))?;
            log::info!("Content generation enabled with model {}", config.openai_model);
            Some(Arc::new(client))
        }
        None => {
            log::warn!("No OPENAI_API_KEY set, content generation requests will fail");
            None
        }
    };

    let slides = FileSlideSource::new(&config.data_dir);
    let generator = web::Data::new(ContentGenerator::new(
        Arc::new(PgDeckAccess::new(pool.clone())),
        Arc::new(slides.clone()),
        Arc::new(FileArtifactStore::new(&config.data_dir)),
        model,
    ));
    let pool_data = web::Data::new(pool);
    let slides_data = web::Data::new(slides);
    let limiter = web::Data::new(LoginLimiter::default());

    // Session encryption key: load from SESSION_KEY for sessions that survive restarts
    let secret_key = match std::env::var("SESSION_KEY") {
        Ok(val) if val.len() >= 64 => {
            log::info!("Using SESSION_KEY from environment");
            Key::from(val.as_bytes())
        }
        Ok(val) => {
            log::warn!("SESSION_KEY too short ({} bytes, need 64+), generating random key", val.len());
            Key::generate()
        }
        Err(_) => {
            log::warn!("No SESSION_KEY set, generating random key (sessions lost on restart)");
            Key::generate()
        }
    };

    log::info!("Starting server at http://{}", config.bind_addr);

    HttpServer::new(move || {
        let session_mw = SessionMiddleware::builder(CookieSessionStore::default(), secret_key.clone())
            .cookie_secure(false)
            .cookie_http_only(true)
            .build();

        App::new()
            .wrap(session_mw)
            .wrap(middleware::Logger::default())
            .app_data(pool_data.clone())
            .app_data(slides_data.clone())
            .app_data(generator.clone())
            .app_data(limiter.clone())
            .configure(handlers::api::configure)
            .default_service(web::to(|| async {
                HttpResponse::NotFound().json(ApiErrorResponse {
                    error: "Not found".to_string(),
                })
            }))
    })
    .bind(&config.bind_addr)?
    .run()
    .await
}
