use actix_web::{get, web, HttpResponse, Responder};

use crate::models::{AppState, ConfigResponse};

// Front-end assets are compiled into the binary so the service ships as
// a single file.
const INDEX_HTML: &str = include_str!("../../web/index.html");
const APP_JS: &str = include_str!("../../web/app.js");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const CARD_BACK_SVG: &str = include_str!("../../web/card-back.svg");
const CARD_PLACEHOLDER_SVG: &str = include_str!("../../web/card-placeholder.svg");

#[get("/")]
pub async fn index() -> impl Responder {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(INDEX_HTML)
}

#[get("/app.js")]
pub async fn app_js() -> impl Responder {
    HttpResponse::Ok()
        .content_type("application/javascript")
        .body(APP_JS)
}

#[get("/styles.css")]
pub async fn styles_css() -> impl Responder {
    HttpResponse::Ok()
        .content_type("text/css; charset=utf-8")
        .body(STYLES_CSS)
}

#[get("/card-back.svg")]
pub async fn card_back() -> impl Responder {
    HttpResponse::Ok()
        .content_type("image/svg+xml")
        .body(CARD_BACK_SVG)
}

#[get("/card-placeholder.svg")]
pub async fn card_placeholder() -> impl Responder {
    HttpResponse::Ok()
        .content_type("image/svg+xml")
        .body(CARD_PLACEHOLDER_SVG)
}

#[get("/api/config")]
pub async fn get_config(data: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(ConfigResponse {
        product_id: data.draw.product_id.clone(),
        deck_size: data.draw.deck_size,
        pick_limit: data.draw.pick_limit,
    })
}
