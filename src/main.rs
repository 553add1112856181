use actix_cors::Cors;
use actix_web::{
    self,
    middleware::{from_fn, Logger},
    web, App, HttpServer,
};
use std::sync::{Arc, LazyLock};

use crate::{
    configs::{connect_database, RedisCache},
    middlewares::identify,
    modules::{
        upload::{UploadConfig, UploadRepositoryPg, UploadService},
        user::{repository_pg::UserRepositoryPg, service::UserService},
    },
};

mod api;
mod configs;
mod constants;
mod middlewares;
mod modules;
#[cfg(test)]
mod test;
mod utils;

pub static ENV: LazyLock<constants::Env> = LazyLock::new(|| {
    dotenvy::dotenv().ok();
    env_logger::init();
    log::info!("Environment variables loaded from .env file");
    constants::Env::default()
});

/// Every route of the service. Callers wrap it with [`identify`].
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(modules::page::route::configure)
        .configure(modules::upload::route::configure)
        .configure(modules::user::route::configure);
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let db_pool =
        connect_database().await.map_err(|_| std::io::Error::other("Database connection error"))?;

    let redis_cache =
        RedisCache::new().await.map_err(|_| std::io::Error::other("Redis connection error"))?;
    let sessions = Arc::new(redis_cache);

    let user_service = UserService::with_dependencies(
        Arc::new(UserRepositoryPg::new(db_pool.clone())),
        sessions.clone(),
    );
    let upload_service = UploadService::with_dependencies(
        Arc::new(UploadRepositoryPg::new(db_pool.clone())),
        sessions,
        UploadConfig::new(ENV.upload_dir.as_str()),
    );

    log::info!("Starting server at http://{}:{}", ENV.ip.as_str(), ENV.port);
    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(ENV.frontend_url.as_str())
            .allow_any_method()
            .allow_any_header()
            .supports_credentials();

        App::new()
            .wrap(from_fn(identify))
            .wrap(cors)
            .wrap(Logger::default())
            .app_data(web::Data::new(user_service.clone()))
            .app_data(web::Data::new(upload_service.clone()))
            .configure(routes)
    })
    .bind((ENV.ip.as_str(), ENV.port))?
    .workers(2)
    .run()
    .await
}
