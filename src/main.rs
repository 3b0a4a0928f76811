use actix_cors::Cors;
use actix_web::{http::header, middleware::Logger, web, App, HttpServer};
use log::{error, info};
use sqlx::postgres::PgPoolOptions;
use std::io;

use todoforge::{
    access::AccessControl,
    auth::{Accounts, CredentialVerifier, SessionIssuer},
    config::Config,
    routes::{self, health},
    store::Stores,
};

fn startup_error(context: &str, err: impl std::fmt::Display) -> io::Error {
    error!("{}: {}", context, err);
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, err))
}

async fn open_stores(config: &Config) -> io::Result<Stores> {
    let Some(database_url) = config.database_url.as_deref() else {
        info!("DATABASE_URL not set; using in-memory stores");
        return Ok(Stores::in_memory());
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(database_url)
        .await
        .map_err(|e| startup_error("failed to connect to database", e))?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| startup_error("failed to run migrations", e))?;

    info!("connected to database, migrations applied");
    Ok(Stores::postgres(pool))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env().map_err(|e| startup_error("invalid configuration", e))?;
    let stores = open_stores(&config).await?;

    let issuer = SessionIssuer::new(&config.jwt_secret, config.token_ttl_days);
    let accounts = Accounts::new(
        stores.users.clone(),
        CredentialVerifier::new(config.bcrypt_cost),
        issuer.clone(),
    );
    let access = AccessControl::new(stores);

    if config.reconcile_on_startup {
        let repaired = access
            .reconcile_all()
            .await
            .map_err(|e| startup_error("startup reconciliation failed", e))?;
        info!("startup reconciliation repaired {} user(s)", repaired.len());
    }

    let issuer = web::Data::new(issuer);
    let accounts = web::Data::new(accounts);
    let access = web::Data::new(access);

    info!("Starting todoforge server at {}", config.server_url());
    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE"])
            .allowed_headers(vec![header::CONTENT_TYPE, header::AUTHORIZATION])
            .max_age(3600);

        App::new()
            .app_data(issuer.clone())
            .app_data(accounts.clone())
            .app_data(access.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .service(health::health)
            .configure(routes::config)
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
