use actix_files as fs;
use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::AccessTokenCodec;
use crate::clock::Clock;
use crate::configuration::Settings;
use crate::logger::LoggerMiddleware;
use crate::middleware::HitCounter;
use crate::routes::{
    create_post, create_user, delete_post, get_post, handle_webhook, health_check, list_posts,
    login, metrics, refresh_access_token, reset, revoke_refresh_token, update_user,
};
use crate::store::Store;

pub fn run(
    listener: TcpListener,
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    settings: Settings,
) -> Result<Server, std::io::Error> {
    let store: web::Data<dyn Store> = web::Data::from(store);
    let clock: web::Data<dyn Clock> = web::Data::from(clock);
    let codec = AccessTokenCodec::from_settings(&settings.jwt)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;
    let codec = web::Data::new(codec);
    let hits = web::Data::new(HitCounter::new());
    let settings = web::Data::new(settings);

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware
            .wrap(Logger::default())
            .wrap(LoggerMiddleware)

            // Shared state
            .app_data(store.clone())
            .app_data(clock.clone())
            .app_data(codec.clone())
            .app_data(hits.clone())
            .app_data(settings.clone())

            .service(
                web::scope("/api")
                    .route("/healthz", web::get().to(health_check))
                    .route("/users", web::post().to(create_user))
                    .route("/users", web::put().to(update_user))
                    .route("/login", web::post().to(login))
                    .route("/refresh", web::post().to(refresh_access_token))
                    .route("/revoke", web::post().to(revoke_refresh_token))
                    .route("/posts", web::post().to(create_post))
                    .route("/posts", web::get().to(list_posts))
                    .route("/posts/{post_id}", web::get().to(get_post))
                    .route("/posts/{post_id}", web::delete().to(delete_post))
                    .route("/webhooks", web::post().to(handle_webhook)),
            )
            .service(
                web::scope("/admin")
                    .route("/metrics", web::get().to(metrics))
                    .route("/reset", web::post().to(reset)),
            )

            // Static files, counted
            .service(
                web::scope("/app")
                    .wrap(hits.get_ref().clone())
                    .service(fs::Files::new("/", "./public").index_file("index.html")),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
