use axum::extract::{Extension, State};
use axum::{Json, Router, routing::post};
use serde::Deserialize;
use serde_json::{Value, json};
use validator::Validate;

use wayfarer_infra::booking_client::BookingClientError;

use crate::error::ApiError;
use crate::middleware::AuthContext;
use crate::{state::AppState, validation};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/hotels/search", post(search_hotels))
        .route("/v1/hotels/prebook", post(pre_book_hotel))
        .route("/v1/hotels/book", post(book_hotel))
}

fn map_booking_error(err: BookingClientError) -> ApiError {
    match err {
        BookingClientError::Rejected { detail, .. } => ApiError::Validation(detail),
        BookingClientError::Configuration(detail) => {
            tracing::error!(detail, "booking client misconfigured");
            ApiError::Internal
        }
        BookingClientError::Upstream { operation, detail }
        | BookingClientError::Transport { operation, detail }
        | BookingClientError::InvalidResponse { operation, detail } => {
            tracing::error!(operation, detail, "booking provider call failed");
            ApiError::Upstream(operation)
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct SearchHotelsRequest {
    #[validate(length(min = 1, max = 120))]
    location: String,
    #[validate(length(min = 1, max = 32))]
    check_in_date: String,
    #[validate(length(min = 1, max = 32))]
    check_out_date: String,
    #[validate(range(min = 1, max = 16))]
    guests: u32,
}

async fn search_hotels(
    State(state): State<AppState>,
    Json(payload): Json<SearchHotelsRequest>,
) -> Result<Json<Value>, ApiError> {
    validation::validate(&payload)?;
    let body = json!({
        "location": payload.location,
        "checkInDate": payload.check_in_date,
        "checkOutDate": payload.check_out_date,
        "guests": payload.guests,
    });
    let result = state.booking.search(body).await.map_err(map_booking_error)?;
    Ok(Json(result))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct PreBookHotelRequest {
    #[validate(length(min = 1, max = 120))]
    hotel_id: String,
    #[validate(length(min = 1, max = 32))]
    check_in_date: String,
    #[validate(length(min = 1, max = 32))]
    check_out_date: String,
    #[validate(range(min = 1, max = 16))]
    guests: u32,
}

async fn pre_book_hotel(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<PreBookHotelRequest>,
) -> Result<Json<Value>, ApiError> {
    validation::validate(&payload)?;
    let user_id = auth.user_id.clone().ok_or(ApiError::Unauthorized)?;
    let body = json!({
        "hotelId": payload.hotel_id,
        "checkInDate": payload.check_in_date,
        "checkOutDate": payload.check_out_date,
        "guests": payload.guests,
        "userId": user_id,
    });
    let result = state
        .booking
        .pre_book(body)
        .await
        .map_err(map_booking_error)?;
    Ok(Json(result))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct BookHotelRequest {
    #[validate(length(min = 1, max = 120))]
    hotel_id: String,
    #[validate(length(min = 1, max = 120))]
    pre_book_token: String,
    #[validate(length(min = 1, max = 32))]
    check_in_date: String,
    #[validate(length(min = 1, max = 32))]
    check_out_date: String,
    #[validate(range(min = 1, max = 16))]
    guests: u32,
    payment_details: Value,
}

async fn book_hotel(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<BookHotelRequest>,
) -> Result<Json<Value>, ApiError> {
    validation::validate(&payload)?;
    let user_id = auth.user_id.clone().ok_or(ApiError::Unauthorized)?;
    let body = json!({
        "hotelId": payload.hotel_id,
        "preBookToken": payload.pre_book_token,
        "checkInDate": payload.check_in_date,
        "checkOutDate": payload.check_out_date,
        "guests": payload.guests,
        "userId": user_id,
        "paymentDetails": payload.payment_details,
    });
    let result = state.booking.book(body).await.map_err(map_booking_error)?;
    Ok(Json(result))
}
