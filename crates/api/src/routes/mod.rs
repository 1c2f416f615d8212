mod booking;

use axum::extract::{Extension, Multipart, Path, State};
use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    routing::post,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use wayfarer_domain::bucketing::DaySlot;
use wayfarer_domain::destinations::RawDestinationEntry;
use wayfarer_domain::identity::ActorIdentity;
use wayfarer_domain::itinerary::{HotelStay, Itinerary, ItineraryCreate, ItinerarySummary};
use wayfarer_domain::permissions::AccessLevel;
use wayfarer_domain::util::uuid_v7_without_dashes;

use crate::error::{ApiError, map_domain_error};
use crate::middleware::AuthContext;
use crate::{middleware as app_middleware, observability, state::AppState, validation};

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route(
            "/v1/itineraries",
            post(create_itinerary).get(list_itineraries),
        )
        .route(
            "/v1/itineraries/:itinerary_id",
            get(get_itinerary_summary).delete(delete_itinerary),
        )
        .route("/v1/itineraries/:itinerary_id/hotels", post(add_hotel))
        .route(
            "/v1/itineraries/:itinerary_id/destinations",
            post(append_destinations)
                .put(replace_destinations)
                .get(get_bucketed_destinations),
        )
        .route(
            "/v1/itineraries/:itinerary_id/access/:user_id",
            get(get_user_access),
        )
        .merge(booking::router())
        .route_layer(middleware::from_fn(
            app_middleware::require_auth_middleware,
        ));

    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(render_metrics))
        .merge(protected)
        .layer(middleware::from_fn(app_middleware::metrics_layer))
        .layer(app_middleware::timeout_layer())
        .layer(app_middleware::trace_layer())
        .layer(app_middleware::set_request_id_layer())
        .layer(app_middleware::propagate_request_id_layer())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            app_middleware::auth_middleware,
        ))
        .layer(middleware::from_fn(
            app_middleware::correlation_id_middleware,
        ))
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    environment: String,
    database: DatabaseHealth,
}

#[derive(Serialize)]
struct DatabaseHealth {
    name: &'static str,
    status: &'static str,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = match &state.db_adapter {
        Some(adapter) => match adapter.health_check().await {
            Ok(()) => DatabaseHealth {
                name: adapter.name(),
                status: "ok",
            },
            Err(err) => {
                tracing::warn!(error = %err, "database health check failed");
                DatabaseHealth {
                    name: adapter.name(),
                    status: "unavailable",
                }
            }
        },
        None => DatabaseHealth {
            name: "memory",
            status: "ok",
        },
    };
    let status = if database.status == "ok" {
        "ok"
    } else {
        "degraded"
    };
    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        environment: state.config.app_env.clone(),
        database,
    })
}

async fn render_metrics() -> Response {
    match observability::render_metrics() {
        Some(body) => (StatusCode::OK, body).into_response(),
        None => ApiError::Internal.into_response(),
    }
}

fn actor_identity(auth: &AuthContext) -> Result<ActorIdentity, ApiError> {
    let user_id = auth.user_id.clone().ok_or(ApiError::Unauthorized)?;
    let username = auth.username.clone().unwrap_or_else(|| user_id.clone());
    Ok(ActorIdentity { user_id, username })
}

#[derive(Debug, Deserialize, Validate)]
struct CreateItineraryRequest {
    #[validate(length(min = 1, max = 200))]
    title: String,
    #[validate(length(min = 1, max = 120))]
    location: String,
    #[validate(range(min = 1))]
    days: u32,
    #[validate(range(min = 0.0))]
    budget: f64,
}

async fn create_itinerary(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<CreateItineraryRequest>,
) -> Result<(StatusCode, Json<Itinerary>), ApiError> {
    validation::validate(&payload)?;
    let actor = actor_identity(&auth)?;
    let itinerary = state
        .itinerary_service()
        .create(
            actor,
            ItineraryCreate {
                title: payload.title,
                location: payload.location,
                days: payload.days,
                budget: payload.budget,
            },
        )
        .await
        .map_err(map_domain_error)?;
    Ok((StatusCode::CREATED, Json(itinerary)))
}

async fn list_itineraries(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<Itinerary>>, ApiError> {
    let actor = actor_identity(&auth)?;
    let itineraries = state
        .itinerary_service()
        .list_by_owner(&actor.user_id)
        .await
        .map_err(map_domain_error)?;
    Ok(Json(itineraries))
}

async fn get_itinerary_summary(
    State(state): State<AppState>,
    Path(itinerary_id): Path<String>,
) -> Result<Json<ItinerarySummary>, ApiError> {
    let summary = state
        .itinerary_service()
        .get_summary(&itinerary_id)
        .await
        .map_err(map_domain_error)?;
    Ok(Json(summary))
}

async fn delete_itinerary(
    State(state): State<AppState>,
    Path(itinerary_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .itinerary_service()
        .delete(&itinerary_id)
        .await
        .map_err(map_domain_error)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize, Validate)]
struct HotelStayRequest {
    #[validate(length(min = 1, max = 200))]
    name: String,
    description: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    #[validate(range(min = 0.0))]
    cost_per_day: f64,
}

/// Multipart upload: a `hotel` JSON part plus a `banner` file part. The
/// banner goes to external object storage first; only the returned reference
/// is stored on the itinerary.
async fn add_hotel(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(itinerary_id): Path<String>,
    mut multipart: Multipart,
) -> Result<StatusCode, ApiError> {
    actor_identity(&auth)?;

    let mut hotel: Option<HotelStayRequest> = None;
    let mut banner: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::Validation(format!("invalid multipart payload: {err}")))?
    {
        match field.name() {
            Some("hotel") => {
                let text = field.text().await.map_err(|err| {
                    ApiError::Validation(format!("invalid hotel payload: {err}"))
                })?;
                let parsed: HotelStayRequest = serde_json::from_str(&text).map_err(|err| {
                    ApiError::Validation(format!("invalid hotel payload: {err}"))
                })?;
                hotel = Some(parsed);
            }
            Some("banner") => {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| ApiError::Validation(format!("invalid banner file: {err}")))?
                    .to_vec();
                banner = Some((content_type, bytes));
            }
            _ => {}
        }
    }

    let hotel = hotel.ok_or_else(|| ApiError::Validation("hotel payload is required".into()))?;
    validation::validate(&hotel)?;
    let (content_type, bytes) =
        banner.ok_or_else(|| ApiError::Validation("banner file is required".into()))?;

    let object_key = format!("hotels/{}", uuid_v7_without_dashes());
    let banner_url = state
        .banner_store
        .store_banner(&object_key, &content_type, bytes)
        .await
        .map_err(map_domain_error)?;
    if banner_url.trim().is_empty() {
        return Err(ApiError::Upstream("banner_upload"));
    }

    state
        .itinerary_service()
        .append_hotel(
            &itinerary_id,
            HotelStay {
                name: hotel.name,
                description: hotel.description,
                start_date: hotel.start_date,
                end_date: hotel.end_date,
                cost_per_day: hotel.cost_per_day,
                banner_url,
            },
        )
        .await
        .map_err(map_domain_error)?;
    Ok(StatusCode::CREATED)
}

#[derive(Debug, Deserialize)]
struct DestinationWriteRequest {
    destinations: Vec<RawDestinationEntry>,
}

async fn append_destinations(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(itinerary_id): Path<String>,
    Json(payload): Json<DestinationWriteRequest>,
) -> Result<StatusCode, ApiError> {
    let actor = actor_identity(&auth)?;
    state
        .itinerary_service()
        .append_destinations(&actor, &itinerary_id, payload.destinations)
        .await
        .map_err(map_domain_error)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn replace_destinations(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(itinerary_id): Path<String>,
    Json(payload): Json<DestinationWriteRequest>,
) -> Result<StatusCode, ApiError> {
    let actor = actor_identity(&auth)?;
    state
        .itinerary_service()
        .replace_destinations(&actor, &itinerary_id, payload.destinations)
        .await
        .map_err(map_domain_error)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_bucketed_destinations(
    State(state): State<AppState>,
    Path(itinerary_id): Path<String>,
) -> Result<Json<Vec<Vec<DaySlot>>>, ApiError> {
    let buckets = state
        .itinerary_service()
        .get_bucketed_destinations(&itinerary_id)
        .await
        .map_err(map_domain_error)?;
    if buckets.overflow > 0 {
        tracing::warn!(
            itinerary_id = %itinerary_id,
            overflow = buckets.overflow,
            "destinations beyond day capacity truncated from view"
        );
        observability::register_destination_overflow(buckets.overflow);
    }
    Ok(Json(buckets.groups))
}

#[derive(Serialize)]
struct UserAccessResponse {
    user_id: String,
    access: AccessLevel,
}

async fn get_user_access(
    State(state): State<AppState>,
    Path((itinerary_id, user_id)): Path<(String, String)>,
) -> Result<Json<UserAccessResponse>, ApiError> {
    let access = state
        .itinerary_service()
        .get_user_access(&itinerary_id, &user_id)
        .await
        .map_err(map_domain_error)?;
    Ok(Json(UserAccessResponse { user_id, access }))
}
