use crate::auth::{authenticate, check_credentials, hash_password, register};
use crate::error::{AppError, AppResult, ValidationError};
use crate::models::{CatalogOptions, Screenshot, ScreenshotFilter, SessionUser};
use crate::tagging::describe_screenshot;
use crate::uploads::is_uploaded_image;
use crate::validation::{parse_list, ScreenshotForm};
use crate::AppState;
use axum::{
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use serde::Deserialize;
use tokio::fs;
use tokio_util::io::ReaderStream;

#[derive(Deserialize)]
pub struct SearchQuery {
    q: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FilterQuery {
    app: Option<String>,
    genre: Option<String>,
    screen_task: Option<String>,
    ui_elements: Option<String>,
    tags: Option<String>,
}

impl From<FilterQuery> for ScreenshotFilter {
    fn from(query: FilterQuery) -> Self {
        ScreenshotFilter {
            app: query.app,
            genre: query.genre,
            screen_task: query.screen_task,
            ui_elements: query.ui_elements.as_deref().map(parse_list),
            tags: query.tags.as_deref().map(parse_list),
        }
    }
}

#[derive(Deserialize)]
pub struct Credentials {
    username: String,
    password: String,
}

fn screenshot_not_found() -> AppError {
    AppError::NotFound("Screenshot not found".into())
}

/// Ids that are not integers cannot name a record, so they read as not found.
fn parse_id(raw: &str) -> AppResult<i64> {
    raw.trim().parse().map_err(|_| screenshot_not_found())
}

pub async fn list_screenshots(State(state): State<AppState>) -> Json<Vec<Screenshot>> {
    let screenshots = state.storage.lock().await.get_all_screenshots();
    Json(screenshots)
}

pub async fn search_screenshots(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<Screenshot>>> {
    let q = query
        .q
        .ok_or_else(|| AppError::BadRequest("Search query required".into()))?;
    let results = state.storage.lock().await.search_screenshots(&q);
    Ok(Json(results))
}

pub async fn filter_screenshots(
    State(state): State<AppState>,
    Query(query): Query<FilterQuery>,
) -> Json<Vec<Screenshot>> {
    let filters = ScreenshotFilter::from(query);
    let results = state.storage.lock().await.filter_screenshots(&filters);
    Json(results)
}

pub async fn get_screenshot(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> AppResult<Json<Screenshot>> {
    let id = parse_id(&raw_id)?;
    let screenshot = state.storage.lock().await.get_screenshot(id).cloned();
    screenshot.map(Json).ok_or_else(screenshot_not_found)
}

pub async fn create_screenshot(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<Screenshot>)> {
    let form = ScreenshotForm::read(multipart).await?;
    let image = form.image.as_ref().ok_or(ValidationError::MissingImage)?;
    image.check(state.config.max_upload_bytes)?;

    // Validate and tag before anything lands on disk; only the store lock
    // is awaited between the write and the insert.
    let mut new = form.to_new_screenshot(String::new())?;
    let ai_tags = state.tagger.generate(&describe_screenshot(&new)).await;
    new.image_path = state.images.save(image).await?;

    let screenshot = state.storage.lock().await.create_screenshot(new, ai_tags);

    tracing::info!(
        id = screenshot.id,
        image = %screenshot.image_path,
        ai_tags = screenshot.ai_tags.len(),
        "screenshot created"
    );
    Ok((StatusCode::CREATED, Json(screenshot)))
}

pub async fn update_screenshot(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    multipart: Multipart,
) -> AppResult<Json<Screenshot>> {
    let id = parse_id(&raw_id)?;
    let previous_image = state
        .storage
        .lock()
        .await
        .get_screenshot(id)
        .map(|s| s.image_path.clone())
        .ok_or_else(screenshot_not_found)?;

    let form = ScreenshotForm::read(multipart).await?;
    let mut patch = form.to_patch(None)?;
    if let Some(image) = &form.image {
        image.check(state.config.max_upload_bytes)?;
        patch.image_path = Some(state.images.save(image).await?);
    }
    let new_image = patch.image_path.clone();

    let result = state.storage.lock().await.update_screenshot(id, patch);
    match result {
        Ok(updated) => {
            if new_image.is_some() && is_uploaded_image(&previous_image) {
                state.images.remove(&previous_image).await;
            }
            tracing::info!(id, "screenshot updated");
            Ok(Json(updated))
        }
        Err(err) => {
            // Deleted while the upload was in flight.
            if let Some(path) = new_image {
                state.images.remove(&path).await;
            }
            Err(err.into())
        }
    }
}

pub async fn delete_screenshot(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> AppResult<StatusCode> {
    let id = parse_id(&raw_id)?;
    let removed = state.storage.lock().await.delete_screenshot(id)?;
    state.images.remove(&removed.image_path).await;

    tracing::info!(id, "screenshot deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn catalog_options() -> Json<CatalogOptions> {
    Json(CatalogOptions::default())
}

pub async fn serve_upload(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<Response> {
    let not_found = || AppError::NotFound("File not found".into());
    let path = state.images.local_path(&name).ok_or_else(not_found)?;
    let file = fs::File::open(&path).await.map_err(|_| not_found())?;

    let stream = ReaderStream::new(file);
    let body = Body::from_stream(stream);
    let mime_type = mime_guess::from_path(&path).first_or_octet_stream();

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime_type.as_ref())
        .header(header::CACHE_CONTROL, "public, max-age=31536000")
        .body(body)
        .map_err(|err| AppError::Internal(err.to_string()))
}

/// Authentication is disabled, so every caller is the same admin.
pub async fn current_user() -> Json<SessionUser> {
    Json(SessionUser::guest_admin())
}

pub async fn register_user(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> AppResult<(StatusCode, Json<SessionUser>)> {
    check_credentials(&credentials.username, &credentials.password)?;

    let cost = state.config.bcrypt_cost;
    let password = credentials.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password, cost))
        .await
        .map_err(|err| AppError::Internal(err.to_string()))??;

    let user = register(
        &mut *state.storage.lock().await,
        &credentials.username,
        &password_hash,
    )?;
    tracing::info!(user_id = user.id, username = %user.username, "user registered");
    Ok((StatusCode::CREATED, Json(SessionUser::from(&user))))
}

pub async fn login_user(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> AppResult<Json<SessionUser>> {
    let account = state
        .storage
        .lock()
        .await
        .get_user_by_username(credentials.username.trim())
        .cloned();

    let password = credentials.password;
    let user = tokio::task::spawn_blocking(move || authenticate(account, &password))
        .await
        .map_err(|err| AppError::Internal(err.to_string()))??;
    Ok(Json(SessionUser::from(&user)))
}
