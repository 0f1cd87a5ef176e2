use axum::{
    extract::{Json, Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};

use crate::{
    error::{AppError, Result},
    models::{
        cart::{AddToCartRequest, Cart, CartCount, UpdateCartRequest},
        order::CustomerDetails,
    },
    services::cart_service,
    sessions::{session_headers, session_id, session_id_or_new},
    state::AppState,
};

/// Current cart, re-priced against live stock
pub async fn view_cart(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse> {
    let Some(session) = session_id(&headers) else {
        let view = cart_service::materialize(&mut Cart::new(), &state.books).await?;
        return Ok((StatusCode::OK, HeaderMap::new(), Json(view)));
    };

    let mut cart = state.carts.lock(session).await;
    let view = cart_service::materialize(&mut cart, &state.books).await?;

    Ok((StatusCode::OK, session_headers(session), Json(view)))
}

pub async fn add_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<AddToCartRequest>,
) -> Result<impl IntoResponse> {
    // Unknown books are rejected up front
    let book = state.books.find(request.book_id).await?;

    let session = session_id_or_new(&headers);
    let mut cart = state.carts.lock(session).await;
    cart.add(book.id, request.quantity)?;
    let count = cart.count();

    tracing::debug!("Session {} added {} x book {}", session, request.quantity, book.id);
    Ok((StatusCode::OK, session_headers(session), Json(CartCount { count })))
}

/// Set a line's quantity; zero or less removes the line
pub async fn update_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(book_id): Path<i64>,
    Json(request): Json<UpdateCartRequest>,
) -> Result<impl IntoResponse> {
    let not_found = || AppError::NotFound("Cart item".into());
    let session = session_id(&headers).ok_or_else(not_found)?;
    let mut cart = state.carts.lock_existing(session).await.ok_or_else(not_found)?;
    if !cart.set_quantity(book_id, request.quantity)? {
        return Err(not_found());
    }
    let count = cart.count();

    Ok((StatusCode::OK, session_headers(session), Json(CartCount { count })))
}

pub async fn remove_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(book_id): Path<i64>,
) -> Result<impl IntoResponse> {
    let Some(session) = session_id(&headers) else {
        return Ok((StatusCode::OK, HeaderMap::new(), Json(CartCount { count: 0 })));
    };

    let count = match state.carts.lock_existing(session).await {
        Some(mut cart) => {
            cart.remove(book_id);
            cart.count()
        }
        None => 0,
    };

    Ok((StatusCode::OK, session_headers(session), Json(CartCount { count })))
}

pub async fn cart_count(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse> {
    let count = match session_id(&headers) {
        Some(session) => state.carts.snapshot(session).await.count(),
        None => 0,
    };

    Ok((StatusCode::OK, Json(CartCount { count })))
}

/// Place an order for the whole cart.
///
/// The session's cart stays locked for the whole checkout. It is emptied
/// only when the order commits; on any failure it is left as it was so the
/// customer can adjust and retry.
pub async fn checkout(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(customer): Json<CustomerDetails>,
) -> Result<impl IntoResponse> {
    let session = session_id(&headers);
    let cart = match session {
        Some(session) => state.carts.lock_existing(session).await,
        None => None,
    };

    let order = match cart {
        Some(mut cart) => state.checkout.checkout(&mut cart, &customer).await?,
        None => state.checkout.checkout(&mut Cart::new(), &customer).await?,
    };
    let headers = session.map(session_headers).unwrap_or_default();

    Ok((StatusCode::CREATED, headers, Json(order)))
}
