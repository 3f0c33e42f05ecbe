use axum::{extract::State, Extension, Json};

use crate::{
    error::AppResult,
    middleware::request_id::RequestId,
    models::{
        OccasionParams, PersonalizedParams, PopularParams, RecommendationRequest,
        RecommendationResponse,
    },
    routes::AppState,
};

/// Handler for popular recommendations
pub async fn recommend_popular(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(params): Json<PopularParams>,
) -> AppResult<Json<RecommendationResponse>> {
    tracing::info!(request_id = %request_id, "Popular recommendations requested");

    let response = state
        .recommender
        .recommend(RecommendationRequest::Popular(params))
        .await?;

    Ok(Json(response))
}

/// Handler for occasion-based recommendations
pub async fn recommend_occasion(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(params): Json<OccasionParams>,
) -> AppResult<Json<RecommendationResponse>> {
    tracing::info!(
        request_id = %request_id,
        occasion = %params.occasion,
        "Occasion recommendations requested"
    );

    let response = state
        .recommender
        .recommend(RecommendationRequest::Occasion(params))
        .await?;

    Ok(Json(response))
}

/// Handler for personalized recommendations
pub async fn recommend_personalized(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(params): Json<PersonalizedParams>,
) -> AppResult<Json<RecommendationResponse>> {
    tracing::info!(
        request_id = %request_id,
        relationship = %params.relationship,
        "Personalized recommendations requested"
    );

    let response = state
        .recommender
        .recommend(RecommendationRequest::Personalized(params))
        .await?;

    Ok(Json(response))
}
