use crate::{
    db::book_store::BookStore,
    error::{AppError, Result},
    models::cart::{Cart, CartLine, CartView},
};

/// Price a cart against current stock.
///
/// Lines asking for more than is available are clamped, lines for books that
/// are sold out or gone are dropped. The cart is updated in place and every
/// adjustment produces a warning.
pub async fn materialize(cart: &mut Cart, books: &BookStore) -> Result<CartView> {
    let mut lines = Vec::with_capacity(cart.len());
    let mut warnings = Vec::new();
    let mut total_cents = 0;

    for (book_id, requested) in cart.iter().collect::<Vec<_>>() {
        let book = match books.find(book_id).await {
            Ok(book) => book,
            Err(AppError::NotFound(_)) => {
                cart.remove(book_id);
                warnings.push("A book in your cart is no longer available and was removed.".into());
                continue;
            }
            Err(e) => return Err(e),
        };

        if book.stock <= 0 {
            cart.remove(book_id);
            warnings.push(format!("\"{}\" is out of stock and removed from cart.", book.title));
            continue;
        }

        let quantity = if requested > book.stock {
            cart.set_quantity(book_id, book.stock)?;
            warnings.push(format!(
                "Quantity for \"{}\" adjusted to available stock.",
                book.title
            ));
            book.stock
        } else {
            requested
        };

        let line_total_cents = book.price_cents * quantity;
        total_cents += line_total_cents;
        lines.push(CartLine {
            book,
            quantity,
            line_total_cents,
        });
    }

    Ok(CartView {
        lines,
        total_cents,
        warnings,
    })
}
