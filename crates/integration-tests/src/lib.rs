//! Integration tests for the CountryFresh cart.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p countryfresh-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `http_remote` - `HttpCartClient` against the mock bakery server
//! - `reconcile_flow` - cart page, reconciler and server together
//! - `offline_store` - the file-backed offline cart
//!
//! The mock server keeps one cart per session cookie and answers form posts
//! with a redirect to `/cart`, like the storefront does.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::extract::{Form, Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

const SESSION_COOKIE: &str = "session";

type Cart = BTreeMap<String, u32>;

/// State shared by the mock's handlers and the test driving it.
#[derive(Debug, Default)]
pub struct BakeryState {
    carts: Mutex<HashMap<String, Cart>>,
    next_session: AtomicU64,
    updates: Mutex<Vec<(String, u32)>>,
    fail_updates: AtomicBool,
    fail_adds: AtomicBool,
    update_delay: Mutex<Duration>,
}

impl BakeryState {
    fn session_cart<R>(&self, session: &str, f: impl FnOnce(&mut Cart) -> R) -> R {
        let mut carts = self.carts.lock().unwrap_or_else(PoisonError::into_inner);
        f(carts.entry(session.to_string()).or_default())
    }
}

/// A running mock of the bakery storefront.
pub struct MockBakery {
    addr: SocketAddr,
    state: Arc<BakeryState>,
    task: JoinHandle<()>,
}

impl MockBakery {
    /// Start the mock on an ephemeral local port.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start() -> Self {
        let state = Arc::new(BakeryState::default());
        let app = Router::new()
            .route("/cart", get(cart_page))
            .route("/api/cart-count", get(cart_count))
            .route("/add-to-cart/{product_id}", post(add_to_cart))
            .route("/update-cart/{product_id}", post(update_cart))
            .with_state(Arc::clone(&state));

        #[allow(clippy::unwrap_used)]
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        #[allow(clippy::unwrap_used)]
        let addr = listener.local_addr().unwrap();
        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Mock bakery stopped");
            }
        });

        Self { addr, state, task }
    }

    /// Base URL of the mock.
    ///
    /// # Panics
    ///
    /// Panics if the bound address is not a valid URL, which cannot happen.
    #[must_use]
    pub fn base_url(&self) -> Url {
        #[allow(clippy::unwrap_used)]
        Url::parse(&format!("http://{}/", self.addr)).unwrap()
    }

    /// Make every update request fail with a 500.
    pub fn fail_updates(&self, fail: bool) {
        self.state.fail_updates.store(fail, Ordering::SeqCst);
    }

    /// Make every add request fail with a 500.
    pub fn fail_adds(&self, fail: bool) {
        self.state.fail_adds.store(fail, Ordering::SeqCst);
    }

    /// Delay each update response.
    pub fn set_update_delay(&self, delay: Duration) {
        *self
            .state
            .update_delay
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = delay;
    }

    /// Every update request received, as `(product, quantity)`.
    #[must_use]
    pub fn updates(&self) -> Vec<(String, u32)> {
        self.state
            .updates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of sessions the server has handed out.
    #[must_use]
    pub fn sessions(&self) -> u64 {
        self.state.next_session.load(Ordering::SeqCst)
    }
}

impl Drop for MockBakery {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Session id from the request cookie, or a new one with its `Set-Cookie`.
fn session(state: &BakeryState, headers: &HeaderMap) -> (String, Option<String>) {
    let existing = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|pair| {
            pair.trim()
                .strip_prefix(SESSION_COOKIE)
                .and_then(|rest| rest.strip_prefix('='))
                .map(str::to_string)
        });

    match existing {
        Some(id) => (id, None),
        None => {
            let id = format!("s{}", state.next_session.fetch_add(1, Ordering::SeqCst) + 1);
            let cookie = format!("{SESSION_COOKIE}={id}; Path=/");
            (id, Some(cookie))
        }
    }
}

fn with_cookie(cookie: Option<String>, response: impl IntoResponse) -> Response {
    match cookie {
        Some(cookie) => ([(header::SET_COOKIE, cookie)], response).into_response(),
        None => response.into_response(),
    }
}

/// Form quantity the way the storefront reads it: missing means 1.
fn form_quantity(form: &HashMap<String, String>) -> Result<i64, Response> {
    form.get("quantity").map_or(Ok(1), |raw| {
        raw.trim()
            .parse()
            .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid quantity").into_response())
    })
}

async fn cart_page(State(state): State<Arc<BakeryState>>, headers: HeaderMap) -> Response {
    let (id, cookie) = session(&state, &headers);
    let lines = state.session_cart(&id, |cart| cart.len());
    with_cookie(cookie, format!("<h1>Shopping Cart</h1><p>{lines} lines</p>"))
}

async fn cart_count(State(state): State<Arc<BakeryState>>, headers: HeaderMap) -> Response {
    let (id, cookie) = session(&state, &headers);
    let count: u32 = state.session_cart(&id, |cart| cart.values().sum());
    with_cookie(cookie, Json(serde_json::json!({ "count": count })))
}

async fn add_to_cart(
    State(state): State<Arc<BakeryState>>,
    Path(product_id): Path<String>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    if state.fail_adds.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "Add failed").into_response();
    }
    let quantity = match form_quantity(&form) {
        Ok(quantity) => u32::try_from(quantity).unwrap_or(0),
        Err(response) => return response,
    };

    let (id, cookie) = session(&state, &headers);
    state.session_cart(&id, |cart| {
        *cart.entry(product_id).or_default() += quantity;
    });
    with_cookie(cookie, Redirect::to("/cart"))
}

async fn update_cart(
    State(state): State<Arc<BakeryState>>,
    Path(product_id): Path<String>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let delay = *state
        .update_delay
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let quantity = match form_quantity(&form) {
        Ok(quantity) => quantity,
        Err(response) => return response,
    };
    state
        .updates
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push((product_id.clone(), u32::try_from(quantity).unwrap_or(0)));

    if state.fail_updates.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "Update failed").into_response();
    }

    let (id, cookie) = session(&state, &headers);
    state.session_cart(&id, |cart| match u32::try_from(quantity) {
        Ok(quantity) if quantity > 0 => {
            if let Some(line) = cart.get_mut(&product_id) {
                *line = quantity;
            }
        }
        _ => {
            cart.remove(&product_id);
        }
    });
    with_cookie(cookie, Redirect::to("/cart"))
}
