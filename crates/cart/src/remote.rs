//! The storefront server, as seen by the cart.
//!
//! Only success or failure matters for the form endpoints; the server renders
//! its own pages and flash messages.
//!
//! | Call | Request |
//! |---|---|
//! | add line item | `POST {form action}` |
//! | update line item | `POST {form action}` |
//! | cart badge count | `GET /api/cart-count` -> `{"count": n}` |
//! | quick add | `POST /add-to-cart/{productId}` with `quantity` |

use std::future::Future;

use countryfresh_core::{ProductId, Quantity};
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use crate::error::{CartError, Result};

/// Maximum characters of an error body kept for diagnostics.
const ERROR_BODY_LIMIT: usize = 200;

/// Remote cart operations.
pub trait CartRemote: Send + Sync + 'static {
    /// Submit an add-to-cart form.
    fn add_line(
        &self,
        action: &str,
        fields: &[(String, String)],
    ) -> impl Future<Output = Result<()>> + Send;

    /// Submit a cart row's update form.
    fn update_line(
        &self,
        action: &str,
        fields: &[(String, String)],
    ) -> impl Future<Output = Result<()>> + Send;

    /// Total item count for the header badge.
    fn cart_count(&self) -> impl Future<Output = Result<u32>> + Send;

    /// Add a product from a product card.
    fn quick_add(
        &self,
        product: &ProductId,
        quantity: Quantity,
    ) -> impl Future<Output = Result<()>> + Send;
}

#[derive(Debug, Deserialize)]
struct CartCountResponse {
    count: u32,
}

/// HTTP implementation of [`CartRemote`].
#[derive(Debug, Clone)]
pub struct HttpCartClient {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpCartClient {
    /// Create a client for the server at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(base_url: Url) -> Result<Self> {
        // Session cookies carry the server-side cart between requests.
        let client = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(Self { client, base_url })
    }

    /// Server this client talks to.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn resolve(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    async fn post_form(&self, action: &str, fields: &[(String, String)]) -> Result<()> {
        let url = self.resolve(action)?;
        debug!(url = %url, fields = fields.len(), "Posting cart form");

        let response = self.client.post(url).form(fields).send().await?;
        ensure_success(response).await?;
        Ok(())
    }
}

/// Turn a non-2xx response into `CartError::Server`.
async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::warn!(
        status = %status,
        body = %body.chars().take(ERROR_BODY_LIMIT * 2).collect::<String>(),
        "Cart server returned non-success status"
    );
    Err(CartError::Server {
        status: status.as_u16(),
        message: body.chars().take(ERROR_BODY_LIMIT).collect(),
    })
}

impl CartRemote for HttpCartClient {
    #[instrument(skip(self, fields))]
    async fn add_line(&self, action: &str, fields: &[(String, String)]) -> Result<()> {
        self.post_form(action, fields).await
    }

    #[instrument(skip(self, fields))]
    async fn update_line(&self, action: &str, fields: &[(String, String)]) -> Result<()> {
        self.post_form(action, fields).await
    }

    #[instrument(skip(self))]
    async fn cart_count(&self) -> Result<u32> {
        let url = self.resolve("/api/cart-count")?;
        let response = self.client.get(url).send().await?;
        let response = ensure_success(response).await?;
        let body: CartCountResponse = response.json().await?;
        Ok(body.count)
    }

    #[instrument(skip(self, product), fields(product = %product))]
    async fn quick_add(&self, product: &ProductId, quantity: Quantity) -> Result<()> {
        let path = format!("/add-to-cart/{product}");
        let fields = [(String::from("quantity"), quantity.to_string())];
        self.post_form(&path, &fields).await
    }
}
