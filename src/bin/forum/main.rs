use actix_session::{config::PersistentSession, storage::CookieSessionStore, SessionMiddleware};
use actix_web::cookie::{Key, SameSite};
use actix_web::middleware::Logger;
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use env_logger::Env;
use rand::{distributions::Alphanumeric, Rng};
use stoa::db::init_db;
use stoa::middleware::ClientCtx;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    init_db(std::env::var("DATABASE_URL").expect("DATABASE_URL must be set.")).await;

    let permissions = stoa::permission::new()
        .await
        .expect("Permission data failed to load.");

    let secret_key = match std::env::var("SECRET_KEY") {
        Ok(key) => Key::from(key.as_bytes()),
        Err(err) => {
            let random_string: String = rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(128)
                .map(char::from)
                .collect();
            log::warn!(
                "SECRET_KEY was invalid ({:?}); session cookies will not survive a restart. A key must be at least 64 bytes.",
                err
            );
            Key::from(random_string.as_bytes())
        }
    };

    let config = stoa::app_config::get_app_config();
    let bind = (config.server.bind.clone(), config.server.port);

    HttpServer::new(move || {
        // Middleware runs in reverse registration order; the session layer
        // must wrap ClientCtx so the context can read it.
        App::new()
            .app_data(Data::new(permissions.clone()))
            .wrap(ClientCtx::default())
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), secret_key.clone())
                    .cookie_same_site(SameSite::Lax)
                    .cookie_secure(false) // Allow HTTP for development
                    .session_lifecycle(PersistentSession::default())
                    .build(),
            )
            .wrap(Logger::new("%a %{User-Agent}i"))
            .configure(stoa::web::configure)
    })
    .bind(bind)?
    .run()
    .await
}
