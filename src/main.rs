use actix_cors::Cors;
use actix_web::{middleware::Logger, App, HttpServer};
use std::io;

use tasktracker::{config::Config, store, AppState};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    if config.jwt_secret_is_fallback {
        log::warn!(
            "JWT_SECRET is not set; signing tokens with the built-in development secret. \
             Anyone can forge tokens for this server. Set JWT_SECRET before deploying."
        );
    }

    let backend = store::connect(&config)
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    log::info!("storage backend: {:?}", backend.kind);

    let state = AppState::new(&backend, &config.jwt_secret, config.bcrypt_cost);

    log::info!("Starting server at {}", config.server_url());
    HttpServer::new(move || {
        App::new()
            .wrap(state.auth_middleware())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .configure(|cfg| state.configure(cfg))
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
