//! House listing HTTP handlers.
//!
//! This module implements the house-related API endpoints:
//! - GET /houses - List all houses
//! - GET /house/{id} - Get house by ID
//! - POST /house - Create a house (multipart form with image)
//! - PUT /house/{id} - Partially update a house (multipart form)
//! - DELETE /house/{id} - Delete a house
//!
//! Stored image filenames are turned into public URLs on the way out.

use axum::{
    Json,
    extract::{
        Multipart, Path, State,
        multipart::MultipartRejection,
        rejection::PathRejection,
    },
};

use crate::{
    error::AppError,
    models::{
        envelope::Envelope,
        house::{HouseForm, HouseResponse},
    },
    services::upload::UploadedFile,
    state::AppState,
};

type HouseResult<T> = Result<Json<Envelope<T>>, AppError>;

/// List all houses.
///
/// # Response (200)
///
/// ```json
/// {
///   "code": 200,
///   "data": [
///     { "id": 1, "name": "Sunny Loft", "image": "http://localhost:5000/uploads/...-loft.png", ... }
///   ]
/// }
/// ```
pub async fn list_houses(State(state): State<AppState>) -> HouseResult<Vec<HouseResponse>> {
    let base_url = state.uploads.base_url();
    let houses = state
        .houses
        .list()
        .await?
        .into_iter()
        .map(|house| HouseResponse::with_base_url(house, base_url))
        .collect();

    Ok(Envelope::ok(houses))
}

/// Get a specific house by ID.
///
/// # Response
///
/// - **Success (200 OK)**: house with public image URL
/// - **Error (404)**: no such house
pub async fn get_house(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> HouseResult<HouseResponse> {
    let Path(id) = path?;

    let house = state
        .houses
        .get(id)
        .await?
        .ok_or(AppError::HouseNotFound)?;

    Ok(Envelope::ok(HouseResponse::with_base_url(
        house,
        state.uploads.base_url(),
    )))
}

/// Create a new house.
///
/// # Request
///
/// `multipart/form-data` with the text fields `name`, `cityname`, `address`,
/// `price`, `type_rent`, `amenities` (JSON), `bedroom`, `bathroom`,
/// `description`, `area` and the file part `image`.
///
/// # Response
///
/// - **Success (200 OK)**: the created house
/// - **Error (422)**: missing or invalid field; nothing is stored
///
/// The form is validated before the image is written, and the file is deleted
/// again if the insert fails, so a rejected request leaves neither a row nor
/// a file behind.
pub async fn create_house(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> HouseResult<HouseResponse> {
    let (form, image) = read_house_form(multipart?).await?;

    let mut house = form.into_new_house()?;
    let image = image.ok_or_else(|| AppError::Validation("image is required".to_string()))?;
    house.image = state.uploads.save(image).await?;
    let stored_image = house.image.clone();

    let created = match state.houses.create(house).await {
        Ok(created) => created,
        Err(e) => {
            state.uploads.remove(&stored_image).await;
            return Err(e);
        }
    };
    tracing::info!(house_id = created.id, "house created");

    Ok(Envelope::ok(HouseResponse::with_base_url(
        created,
        state.uploads.base_url(),
    )))
}

/// Partially update a house.
///
/// Same form as [`create_house`], every field optional. Empty strings and
/// zero numbers leave the stored value unchanged; an `image` part replaces
/// the image, and the replaced file is deleted once the row is saved.
///
/// # Response
///
/// - **Success (200 OK)**: the updated house
/// - **Error (404)**: no such house
/// - **Error (422)**: a provided field is invalid
pub async fn update_house(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> HouseResult<HouseResponse> {
    let Path(id) = path?;
    let (form, image) = read_house_form(multipart?).await?;

    let mut house = state
        .houses
        .get(id)
        .await?
        .ok_or(AppError::HouseNotFound)?;

    let mut changes = form.into_changes(None)?;
    if let Some(image) = image {
        changes.image = Some(state.uploads.save(image).await?);
    }
    let new_image = changes.image.clone();
    let previous_image = house.image.clone();
    changes.apply(&mut house);

    let updated = match state.houses.update(&house).await {
        Ok(updated) => updated,
        Err(e) => {
            if let Some(name) = &new_image {
                state.uploads.remove(name).await;
            }
            return Err(e);
        }
    };
    if new_image.is_some() {
        state.uploads.remove(&previous_image).await;
    }

    Ok(Envelope::ok(HouseResponse::with_base_url(
        updated,
        state.uploads.base_url(),
    )))
}

/// Delete a house.
///
/// Transactions for the house are removed with it, and so is its image file.
///
/// # Response
///
/// - **Success (200 OK)**: the deleted house
/// - **Error (404)**: no such house
pub async fn delete_house(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> HouseResult<HouseResponse> {
    let Path(id) = path?;

    let house = state
        .houses
        .delete(id)
        .await?
        .ok_or(AppError::HouseNotFound)?;
    tracing::info!(house_id = id, "house deleted");
    state.uploads.remove(&house.image).await;

    Ok(Envelope::ok(HouseResponse::with_base_url(
        house,
        state.uploads.base_url(),
    )))
}

/// Split a multipart body into the text form and the optional image part.
///
/// An empty file part counts as no image.
async fn read_house_form(
    mut multipart: Multipart,
) -> Result<(HouseForm, Option<UploadedFile>), AppError> {
    let mut form = HouseForm::default();
    let mut image = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        if name.eq_ignore_ascii_case("image") {
            let file_name = field.file_name().unwrap_or("image").to_string();
            let content_type = field.content_type().map(str::to_string);
            let bytes = field.bytes().await?;
            if !bytes.is_empty() {
                image = Some(UploadedFile {
                    file_name,
                    content_type,
                    bytes,
                });
            }
        } else {
            let value = field.text().await?;
            if !form.set(&name, value) {
                tracing::debug!(field = %name, "ignoring unknown house form field");
            }
        }
    }

    Ok((form, image))
}
