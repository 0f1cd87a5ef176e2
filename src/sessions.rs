use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use uuid::Uuid;

use crate::models::cart::Cart;

pub const CART_SESSION_HEADER: HeaderName = HeaderName::from_static("x-cart-session");

pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(2 * 60 * 60);
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

struct SessionEntry {
    cart: Arc<Mutex<Cart>>,
    touched: Instant,
}

impl SessionEntry {
    fn in_use(&self) -> bool {
        Arc::strong_count(&self.cart) > 1
    }
}

/// Carts keyed by session id.
///
/// Each cart sits behind its own mutex, so a request holds its session's cart
/// for the whole change while other sessions proceed. Sessions idle longer
/// than the timeout are evicted, and the map never holds more than
/// `max_sessions` carts.
pub struct CartSessions {
    carts: RwLock<HashMap<Uuid, SessionEntry>>,
    idle_timeout: Duration,
    max_sessions: usize,
}

impl Default for CartSessions {
    fn default() -> Self {
        Self::new()
    }
}

impl CartSessions {
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_IDLE_TIMEOUT, DEFAULT_MAX_SESSIONS)
    }

    pub fn with_limits(idle_timeout: Duration, max_sessions: usize) -> Self {
        Self {
            carts: RwLock::new(HashMap::new()),
            idle_timeout,
            max_sessions: max_sessions.max(1),
        }
    }

    /// Lock a session's cart, creating an empty one for a new session.
    /// Changes made through the guard are kept when it drops.
    pub async fn lock(&self, session: Uuid) -> OwnedMutexGuard<Cart> {
        let cart = {
            let mut carts = self.carts.write().await;
            let now = Instant::now();
            if !carts.contains_key(&session) {
                self.make_room(&mut carts, now);
            }
            let entry = carts.entry(session).or_insert_with(|| SessionEntry {
                cart: Arc::new(Mutex::new(Cart::new())),
                touched: now,
            });
            entry.touched = now;
            entry.cart.clone()
        };
        cart.lock_owned().await
    }

    /// Lock the cart of a known session; unknown sessions get `None`
    pub async fn lock_existing(&self, session: Uuid) -> Option<OwnedMutexGuard<Cart>> {
        let cart = {
            let mut carts = self.carts.write().await;
            let entry = carts.get_mut(&session)?;
            entry.touched = Instant::now();
            entry.cart.clone()
        };
        Some(cart.lock_owned().await)
    }

    /// Copy of a session's cart; unknown sessions have an empty cart
    pub async fn snapshot(&self, session: Uuid) -> Cart {
        let cart = {
            let carts = self.carts.read().await;
            carts.get(&session).map(|entry| entry.cart.clone())
        };
        match cart {
            Some(cart) => cart.lock().await.clone(),
            None => Cart::new(),
        }
    }

    pub async fn session_count(&self) -> usize {
        self.carts.read().await.len()
    }

    /// Drop idle sessions, then the least recently used ones until a new
    /// session fits. Carts a request is currently holding are never dropped.
    fn make_room(&self, carts: &mut HashMap<Uuid, SessionEntry>, now: Instant) {
        let before = carts.len();
        carts.retain(|_, entry| {
            entry.in_use() || now.duration_since(entry.touched) < self.idle_timeout
        });

        while carts.len() >= self.max_sessions {
            let oldest = carts
                .iter()
                .filter(|(_, entry)| !entry.in_use())
                .min_by_key(|(_, entry)| entry.touched)
                .map(|(id, _)| *id);
            match oldest {
                Some(id) => {
                    carts.remove(&id);
                }
                None => break,
            }
        }

        let evicted = before - carts.len();
        if evicted > 0 {
            tracing::debug!("Evicted {} cart sessions", evicted);
        }
    }
}

/// Session id sent by the client, if any
pub fn session_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get(&CART_SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Uuid::parse_str(value.trim()).ok())
}

/// Session id sent by the client, or a freshly minted one
pub fn session_id_or_new(headers: &HeaderMap) -> Uuid {
    session_id(headers).unwrap_or_else(Uuid::new_v4)
}

/// Response headers echoing the session id back to the client
pub fn session_headers(session: Uuid) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&session.to_string()) {
        headers.insert(CART_SESSION_HEADER, value);
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_carts_are_isolated_per_session() {
        let sessions = CartSessions::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        sessions.lock(a).await.add(1, 2).unwrap();

        assert_eq!(sessions.snapshot(a).await.quantity(1), Some(2));
        assert!(sessions.snapshot(b).await.is_empty());
        assert!(sessions.lock_existing(b).await.is_none());
        assert_eq!(sessions.session_count().await, 1);
    }

    #[tokio::test]
    async fn test_idle_sessions_are_evicted() {
        let sessions = CartSessions::with_limits(Duration::from_millis(50), 100);
        let idle = Uuid::new_v4();
        sessions.lock(idle).await.add(1, 1).unwrap();

        tokio::time::sleep(Duration::from_millis(80)).await;
        sessions.lock(Uuid::new_v4()).await.add(2, 1).unwrap();

        assert_eq!(sessions.session_count().await, 1);
        assert!(sessions.snapshot(idle).await.is_empty());
    }

    #[tokio::test]
    async fn test_session_map_is_capped() {
        let sessions = CartSessions::with_limits(DEFAULT_IDLE_TIMEOUT, 3);
        let first = Uuid::new_v4();
        sessions.lock(first).await.add(1, 1).unwrap();

        for _ in 0..200 {
            sessions.lock(Uuid::new_v4()).await.add(1, 1).unwrap();
        }

        assert_eq!(sessions.session_count().await, 3);
        assert!(sessions.lock_existing(first).await.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_changes_to_one_session_are_kept() {
        let sessions = Arc::new(CartSessions::new());
        let session = Uuid::new_v4();

        let tasks: Vec<_> = (0..50)
            .map(|i| {
                let sessions = sessions.clone();
                tokio::spawn(async move {
                    let mut cart = sessions.lock(session).await;
                    cart.add(i % 2, 1).unwrap();
                    tokio::task::yield_now().await;
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(sessions.snapshot(session).await.count(), 50);
    }

    #[test]
    fn test_session_header_parsing() {
        let id = Uuid::new_v4();
        let headers = session_headers(id);
        assert_eq!(session_id(&headers), Some(id));

        let mut garbage = HeaderMap::new();
        garbage.insert(CART_SESSION_HEADER, HeaderValue::from_static("not-a-uuid"));
        assert_eq!(session_id(&garbage), None);
    }
}
