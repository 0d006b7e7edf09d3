use actix_web::{get, post, web, HttpResponse, Responder};
use log::{info, warn};

use crate::models::{ActionRequest, AppState, ReadingEnvelope};
use crate::services::mailer;

fn unknown_reading(id: &str) -> HttpResponse {
    HttpResponse::NotFound().json(ReadingEnvelope::rejected(
        "unknown_reading",
        format!("No open reading with id {}", id),
        None,
    ))
}

#[post("/api/reading")]
pub async fn create_reading(data: web::Data<AppState>) -> impl Responder {
    let id = data
        .sessions
        .create(data.draw.deck_size, data.draw.pick_limit);
    info!("Opened reading {}", id);
    match data.sessions.with_reading(&id, |reading| reading.snapshot()) {
        Some(snapshot) => HttpResponse::Ok().json(ReadingEnvelope::created(id, snapshot)),
        None => unknown_reading(&id),
    }
}

#[get("/api/reading/{id}")]
pub async fn get_reading(data: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let id = path.into_inner();
    match data.sessions.with_reading(&id, |reading| reading.snapshot()) {
        Some(snapshot) => HttpResponse::Ok().json(ReadingEnvelope::state(snapshot)),
        None => unknown_reading(&id),
    }
}

#[post("/api/reading/{id}/action")]
pub async fn reading_action(
    data: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<ActionRequest>,
) -> impl Responder {
    let id = path.into_inner();
    let action = body.into_inner();
    match action.action.as_str() {
        "pick" => pick(&data, &id, action.slot),
        "reveal" => reveal(&data, &id).await,
        "reset" => reset(&data, &id),
        "mail" => mail(&data, &id, action.address.as_deref()),
        other => HttpResponse::BadRequest().json(ReadingEnvelope::rejected(
            "validation_error",
            format!("Unknown action '{}'", other),
            None,
        )),
    }
}

fn pick(data: &AppState, id: &str, slot: Option<usize>) -> HttpResponse {
    let Some(slot) = slot else {
        return HttpResponse::BadRequest().json(ReadingEnvelope::rejected(
            "validation_error",
            "Action 'pick' needs a slot".to_string(),
            None,
        ));
    };
    let outcome = data
        .sessions
        .with_reading(id, |reading| (reading.pick(slot), reading.snapshot()));
    match outcome {
        None => unknown_reading(id),
        Some((Err(err), snapshot)) => HttpResponse::BadRequest().json(ReadingEnvelope::rejected(
            "validation_error",
            err.to_string(),
            Some(snapshot),
        )),
        // An ignored pick is a no-op, not a failure
        Some((Ok(_), snapshot)) => HttpResponse::Ok().json(ReadingEnvelope::state(snapshot)),
    }
}

/// Gate and perform the upstream draw. The session lock is never held
/// across the await: `begin_fetch` claims the draw, the fetch runs
/// unlocked, and `resolve` applies the outcome only if the reading is
/// still waiting for it.
async fn reveal(data: &AppState, id: &str) -> HttpResponse {
    let gate = data.sessions.with_reading(id, |reading| reading.begin_fetch());
    match gate {
        None => unknown_reading(id),
        Some(Err(err)) => {
            let snapshot = data.sessions.with_reading(id, |reading| reading.snapshot());
            HttpResponse::BadRequest().json(ReadingEnvelope::rejected(
                "validation_error",
                err.to_string(),
                snapshot,
            ))
        }
        Some(Ok(false)) => {
            // Already loading or already revealed; report state, fetch nothing
            match data.sessions.with_reading(id, |reading| reading.snapshot()) {
                Some(snapshot) => HttpResponse::Ok().json(ReadingEnvelope::state(snapshot)),
                None => unknown_reading(id),
            }
        }
        Some(Ok(true)) => {
            let outcome = data.upstream.fetch_spread(&data.draw.product_id).await;
            if let Err(err) = &outcome {
                warn!("Draw for reading {} failed: {}", id, err);
            }
            let snapshot = data.sessions.with_reading(id, |reading| {
                reading.resolve(outcome);
                reading.snapshot()
            });
            match snapshot {
                // A failed draw is view state, not a transport failure
                Some(snapshot) => HttpResponse::Ok().json(ReadingEnvelope::state(snapshot)),
                None => unknown_reading(id),
            }
        }
    }
}

fn reset(data: &AppState, id: &str) -> HttpResponse {
    let snapshot = data.sessions.with_reading(id, |reading| {
        reading.reset();
        reading.snapshot()
    });
    match snapshot {
        Some(snapshot) => HttpResponse::Ok().json(ReadingEnvelope::state(snapshot)),
        None => unknown_reading(id),
    }
}

fn mail(data: &AppState, id: &str, address: Option<&str>) -> HttpResponse {
    let Some(address) = address else {
        return HttpResponse::BadRequest().json(ReadingEnvelope::rejected(
            "validation_error",
            "Action 'mail' needs an address".to_string(),
            None,
        ));
    };
    let state = data
        .sessions
        .with_reading(id, |reading| (reading.spread().cloned(), reading.snapshot()));
    let Some((spread, snapshot)) = state else {
        return unknown_reading(id);
    };
    let Some(spread) = spread else {
        return HttpResponse::BadRequest().json(ReadingEnvelope::rejected(
            "validation_error",
            mailer::MailError::NothingToSend.to_string(),
            Some(snapshot),
        ));
    };
    match mailer::send_by_mail(address, &spread) {
        Ok(url) => HttpResponse::Ok().json(ReadingEnvelope::mail(url, snapshot)),
        Err(err) => HttpResponse::BadRequest().json(ReadingEnvelope::rejected(
            "validation_error",
            err.to_string(),
            Some(snapshot),
        )),
    }
}
