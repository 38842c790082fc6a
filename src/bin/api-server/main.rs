use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use restaurant_finder::{
    api::{self, ApiState},
    config::Config,
    db,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .with_ansi(true)
        .with_file(false)
        .pretty()
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("fail to setup logging")?;

    let db_pool = db::connect(&config.database_url).await?;
    db::init_schema(&db_pool).await?;
    tracing::info!("connected to {}", config.database_url);

    let state = web::Data::new(ApiState::new(db_pool));
    let cors_origin = config.cors_origin.clone();

    tracing::info!("listening on http://{}:{}", config.host, config.port);
    HttpServer::new(move || {
        let cors = match &cors_origin {
            Some(origin) => Cors::default().allowed_origin(origin),
            None => Cors::default().allow_any_origin(),
        };

        App::new()
            .wrap(cors.allow_any_method())
            .app_data(state.clone())
            .configure(api::configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;
    Ok(())
}
