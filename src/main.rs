mod handlers;
mod models;
mod services;
mod utils;

use actix_web::{web, App, HttpServer};
use clap::{value_parser, Arg, Command};
use log::{info, warn};
use std::fs::OpenOptions;

use crate::models::{AppState, DrawConfig};
use crate::services::sessions::SessionStore;
use crate::services::upstream::SpreadClient;

// Function to initialize logging
fn init_logging(log_file: Option<&String>) {
    if let Some(file) = log_file {
        let log_output = OpenOptions::new()
            .create(true)
            .append(true)
            .open(file)
            .expect("Failed to open log file");

        env_logger::Builder::new()
            .target(env_logger::Target::Pipe(Box::new(log_output)))
            .init();
    } else {
        env_logger::init();
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let matches = Command::new("tarotd")
        .version("0.3")
        .about("Tarot spread relay and card-reading service")
        .arg(
            Arg::new("upstream-url")
                .long("upstream-url")
                .num_args(1)
                .default_value("https://tarot-api-vercel.vercel.app")
                .help("Base URL of the upstream spread API"),
        )
        .arg(
            Arg::new("product-id")
                .long("product-id")
                .num_args(1)
                .default_value("angeles_12")
                .help("Product drawn when no product is named in the path"),
        )
        .arg(
            Arg::new("deck-size")
                .long("deck-size")
                .num_args(1)
                .default_value("12")
                .value_parser(value_parser!(usize))
                .help("Number of face-down cards the page offers"),
        )
        .arg(
            Arg::new("pick-limit")
                .long("pick-limit")
                .num_args(1)
                .default_value("4")
                .value_parser(value_parser!(usize))
                .help("Cards a visitor must pick before the draw"),
        )
        .arg(
            Arg::new("session-cap")
                .long("session-cap")
                .num_args(1)
                .default_value("256")
                .value_parser(value_parser!(usize))
                .help("Maximum number of open readings held in memory"),
        )
        .arg(
            Arg::new("listen-host")
                .long("listen-host")
                .num_args(1)
                .default_value("0.0.0.0:2345")
                .help("Specify the listen address (e.g., 0.0.0.0:2345)"),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .num_args(1)
                .help("Specify a log file path (if omitted, logs to stderr)"),
        )
        .get_matches();

    let upstream_url = matches.get_one::<String>("upstream-url").unwrap().clone();
    let product_id = matches.get_one::<String>("product-id").unwrap().clone();
    let deck_size = *matches.get_one::<usize>("deck-size").unwrap();
    let mut pick_limit = *matches.get_one::<usize>("pick-limit").unwrap();
    let session_cap = *matches.get_one::<usize>("session-cap").unwrap();
    let listen_host = matches.get_one::<String>("listen-host").unwrap().clone();
    let log_file = matches.get_one::<String>("log-file");

    init_logging(log_file);

    if pick_limit > deck_size {
        warn!(
            "Pick limit {} exceeds deck size {}; clamping to the deck",
            pick_limit, deck_size
        );
        pick_limit = deck_size;
    }

    info!(
        "Serving product {} ({} cards, pick {}) against {}",
        product_id, deck_size, pick_limit, upstream_url
    );

    let state = AppState {
        draw: DrawConfig {
            product_id,
            deck_size,
            pick_limit,
        },
        upstream: SpreadClient::new(&upstream_url),
        sessions: SessionStore::new(session_cap),
    };
    let shared_state = web::Data::new(state);

    HttpServer::new(move || {
        App::new()
            .app_data(shared_state.clone())
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                let body = models::ReadingEnvelope::rejected(
                    "validation_error",
                    err.to_string(),
                    None,
                );
                actix_web::error::InternalError::from_response(
                    err,
                    actix_web::HttpResponse::BadRequest().json(body),
                )
                .into()
            }))
            .service(handlers::pages::index)
            .service(handlers::pages::app_js)
            .service(handlers::pages::styles_css)
            .service(handlers::pages::card_back)
            .service(handlers::pages::card_placeholder)
            .service(handlers::pages::get_config)
            .service(handlers::readings::create_reading)
            .service(handlers::readings::get_reading)
            .service(handlers::readings::reading_action)
            .service(handlers::spread::relay_default)
            .service(handlers::spread::relay_product)
    })
    .bind(&listen_host)?
    .run()
    .await
}
