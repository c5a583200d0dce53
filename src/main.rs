use actix_web::{middleware, web, App, HttpServer};

use groceries_recipes_api::config::Settings;
use groceries_recipes_api::{db, routes};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let settings = Settings::from_env().map_err(std::io::Error::other)?;

    // set up database connection pool and make sure the tables exist
    let store = db::connect(&settings).map_err(std::io::Error::other)?;
    log::info!("using database {}", settings.database_url);

    log::info!("starting HTTP server at http://{}:{}", settings.host, settings.port);

    // Start HTTP server
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(store.clone()))
            .wrap(middleware::Logger::default())
            .configure(routes::configure)
    })
    .bind((settings.host.as_str(), settings.port))?
    .run()
    .await
}
