use axum::{
    extract::{Json, Multipart, Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use chrono::Utc;

use crate::{
    error::Result,
    models::{
        analytics::InventoryView,
        book::{BookFilter, BookForm, BookSearchParams, Visibility},
    },
    services::{export_service, uploads::UploadedImage},
    state::AppState,
};

/// Every book regardless of stock, optionally filtered
pub async fn list_books(
    State(state): State<AppState>,
    Query(params): Query<BookSearchParams>,
) -> Result<impl IntoResponse> {
    let filter = BookFilter::try_from(params)?;
    let books = if filter == BookFilter::default() {
        state.books.list_all().await?
    } else {
        state.books.search(&filter, Visibility::Admin).await?
    };

    Ok((StatusCode::OK, Json(books)))
}

pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let book = state.books.find(id).await?;
    Ok((StatusCode::OK, Json(book)))
}

pub async fn create_book(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse> {
    let (form, image) = read_book_form(multipart).await?;
    let book = state.catalog.create(&form, image).await?;

    Ok((StatusCode::CREATED, Json(book)))
}

pub async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<impl IntoResponse> {
    let (form, image) = read_book_form(multipart).await?;
    let book = state.catalog.update(id, &form, image).await?;

    Ok((StatusCode::OK, Json(book)))
}

pub async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state.catalog.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Stock overview, lowest stock first
pub async fn inventory(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let view = InventoryView {
        books: state.books.list_by_stock().await?,
        low_stock: state.analytics.low_stock_alerts().await?,
        out_of_stock: state.analytics.out_of_stock_books().await?,
    };

    Ok((StatusCode::OK, Json(view)))
}

/// Inventory snapshot as a CSV download
pub async fn export_inventory(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let rows = state.analytics.inventory_snapshot().await?;
    let body = export_service::inventory_csv(&rows)?;
    let disposition = format!(
        "attachment; filename=inventory_export_{}.csv",
        Utc::now().format("%Y%m%d_%H%M%S")
    );

    tracing::info!("Exported inventory of {} books", rows.len());
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

/// Collect the multipart book form. An `image` part with no file is ignored.
async fn read_book_form(mut multipart: Multipart) -> Result<(BookForm, Option<UploadedImage>)> {
    let mut form = BookForm::default();
    let mut image = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        if name == "image" {
            let file_name = field.file_name().map(str::to_string).unwrap_or_default();
            let data = field.bytes().await?;
            if !file_name.is_empty() && !data.is_empty() {
                image = Some(UploadedImage {
                    file_name,
                    data: data.to_vec(),
                });
            }
            continue;
        }

        let value = field.text().await?;
        match name.as_str() {
            "title" => form.title = value,
            "author" => form.author = value,
            "description" => form.description = Some(value),
            "price" => form.price = value,
            "stock" => form.stock = value,
            "genre" => form.genre = Some(value),
            "stock_threshold" => form.stock_threshold = Some(value),
            other => tracing::debug!("Ignoring form field {}", other),
        }
    }

    Ok((form, image))
}
