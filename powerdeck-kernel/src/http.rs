/**
 * SURFACE HTTP - réception des webhooks Slack
 *
 * ROUTES :
 * - GET  /health        : liveness, sans auth
 * - POST /slack/events  : Events API (handshake url_verification, commandes app_mention)
 * - POST /slack/actions : interactivité (champ `payload` contenant le JSON block_actions)
 *
 * SÉCURITÉ :
 * - Les deux routes Slack passent par le middleware de signature
 * - Corps brut lu une fois, vérifié, puis remis tel quel au handler
 * - Une requête rejetée n'atteint jamais de handler
 */

use axum::body::{to_bytes, Body, Bytes};
use axum::extract::rejection::FormRejection;
use axum::extract::{Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, warn};

use crate::dispatcher::Dispatched;
use crate::error::Error;
use crate::events::RouteOutcome;
use crate::models::InteractionPayload;
use crate::signature::SignatureVerifier;
use crate::state::AppState;

const MAX_BODY_BYTES: usize = 1024 * 1024;

pub fn build_router(app_state: AppState) -> Router {
    let slack = Router::new()
        .route("/slack/events", post(slack_events))
        .route("/slack/actions", post(slack_actions))
        .route_layer(middleware::from_fn_with_state(app_state.verifier.clone(), verify_slack_signature));

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(slack)
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
}

async fn verify_slack_signature(
    State(verifier): State<Arc<SignatureVerifier>>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let (parts, body) = req.into_parts();
    let bytes = to_bytes(body, MAX_BODY_BYTES).await.map_err(|e| {
        warn!(path = %parts.uri.path(), "unreadable request body: {e}");
        StatusCode::BAD_REQUEST
    })?;

    if let Err(e) = verifier.verify(&parts.headers, &bytes) {
        warn!(path = %parts.uri.path(), "rejected slack request: {e}");
        return Err(Error::from(e).status());
    }

    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}

// POST /slack/events
async fn slack_events(State(app): State<AppState>, body: Bytes) -> Response {
    match app.events.route(&body).await {
        Ok(RouteOutcome::Challenge(challenge)) => ([(CONTENT_TYPE, "text/plain")], challenge).into_response(),
        Ok(_) => StatusCode::OK.into_response(),
        Err(e) => {
            error!("event handling failed: {e}");
            e.status().into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
struct ActionForm {
    payload: String,
}

// POST /slack/actions
async fn slack_actions(State(app): State<AppState>, form: Result<Form<ActionForm>, FormRejection>) -> StatusCode {
    let Form(form) = match form {
        Ok(f) => f,
        Err(e) => {
            error!("interaction form rejected: {e}");
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
    };

    let payload: InteractionPayload = match serde_json::from_str(&form.payload) {
        Ok(p) => p,
        Err(e) => {
            let e = Error::from(e);
            error!("interaction payload invalid: {e}");
            return e.status();
        }
    };

    // la tâche actionneur éventuelle continue après l'envoi de la réponse
    match app.dispatcher.dispatch(&payload).await {
        Ok(Dispatched { task: Some(task), .. }) => {
            debug!(ticket = %task.ticket, "actuator detached from request");
            StatusCode::OK
        }
        Ok(_) => StatusCode::OK,
        Err(e) => {
            error!("interaction handling failed: {e}");
            e.status()
        }
    }
}
