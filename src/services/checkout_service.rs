use chrono::Utc;
use rand::Rng;

use crate::{
    db::{
        DbPool, book_store,
        notification_store,
        order_store::{self, NewOrderItem},
    },
    error::{AppError, Result},
    models::{
        cart::Cart,
        money::format_cents,
        notification::{NewNotification, crosses_threshold},
        order::{CustomerDetails, OrderDetail},
    },
    services::notifier::Notifier,
};

const ORDER_ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const ORDER_ID_LEN: usize = 10;

/// Random public order reference, e.g. `K3Z9Q0B7AM`
pub fn generate_order_id() -> String {
    let mut rng = rand::rng();
    (0..ORDER_ID_LEN)
        .map(|_| ORDER_ID_ALPHABET[rng.random_range(0..ORDER_ID_ALPHABET.len())] as char)
        .collect()
}

/// Turns a cart into an order
#[derive(Clone)]
pub struct CheckoutService {
    pool: DbPool,
    notifier: Notifier,
}

impl CheckoutService {
    pub fn new(pool: DbPool, notifier: Notifier) -> Self {
        Self { pool, notifier }
    }

    /// Place an order for everything in `cart`.
    ///
    /// Stock decrements, the order header, its lines and the resulting
    /// notifications are written in one transaction; if any line cannot be
    /// served the whole checkout is rolled back and the cart is left as is.
    /// On success the cart is emptied.
    pub async fn checkout(&self, cart: &mut Cart, customer: &CustomerDetails) -> Result<OrderDetail> {
        customer.validate()?;
        if cart.is_empty() {
            return Err(AppError::Validation("Your cart is empty.".into()));
        }

        let now = Utc::now();
        let order_id = generate_order_id();
        let mut tx = self.pool.begin().await?;

        // Stock check and decrement happen in the same statement, so this
        // is the first write of the transaction.
        let mut taken = Vec::with_capacity(cart.len());
        for (book_id, quantity) in cart.iter() {
            let stock = book_store::take_stock(&mut *tx, book_id, quantity, now).await?;
            taken.push((stock, quantity));
        }

        let total_cents = taken
            .iter()
            .try_fold(0i64, |acc, (stock, quantity)| {
                stock
                    .price_cents
                    .checked_mul(*quantity)
                    .and_then(|line| acc.checked_add(line))
            })
            .ok_or_else(|| AppError::Validation("Order total is out of range.".into()))?;

        let order = order_store::insert_order(&mut *tx, &order_id, customer, total_cents, now).await?;

        let mut items = Vec::with_capacity(taken.len());
        let mut notifications = Vec::new();
        for (stock, quantity) in &taken {
            let line = NewOrderItem {
                book_id: stock.id,
                title: &stock.title,
                author: &stock.author,
                quantity: *quantity,
                price_cents: stock.price_cents,
            };
            items.push(order_store::insert_item(&mut *tx, &order_id, &line, now).await?);

            if crosses_threshold(stock.stock + quantity, stock.stock, stock.stock_threshold) {
                let alert = NewNotification::low_stock(&stock.title, stock.stock);
                notifications.push(notification_store::insert(&mut *tx, &alert).await?);
            }
        }

        let new_order = NewNotification::new_order(
            &order_id,
            order.customer_name.as_str(),
            &format_cents(total_cents),
        );
        notifications.push(notification_store::insert(&mut *tx, &new_order).await?);

        tx.commit().await?;

        tracing::info!(
            order_id = %order.order_id,
            lines = items.len(),
            total = %format_cents(order.total_cents),
            "Order placed"
        );

        self.notifier.publish(&notifications).await;
        cart.clear();

        Ok(OrderDetail { order, items })
    }
}
