use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::Result,
    models::book::{BookDetail, BookFilter, BookSearchParams, Visibility},
    state::AppState,
};

const RELATED_LIMIT: i64 = 4;

/// Storefront search. Only books in stock are listed.
pub async fn list_books(
    State(state): State<AppState>,
    Query(params): Query<BookSearchParams>,
) -> Result<impl IntoResponse> {
    let filter = BookFilter::try_from(params)?;
    let books = state.books.search(&filter, Visibility::Storefront).await?;

    Ok((StatusCode::OK, Json(books)))
}

/// A single book with a few related titles
pub async fn book_detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let book = state.books.find(id).await?;
    let related = state.books.related(&book, RELATED_LIMIT).await?;

    Ok((StatusCode::OK, Json(BookDetail { book, related })))
}

/// Distinct genres and authors for the filter sidebar
pub async fn filter_options(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let options = state.books.filter_options().await?;
    Ok((StatusCode::OK, Json(options)))
}
