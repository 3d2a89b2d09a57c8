//! Add-to-cart forms, quick add, and the header badge.
//!
//! Each action talks to the server once and reports the outcome on the
//! surface. Failures are shown to the user here; the returned error is only
//! for the caller's logs or exit status.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use countryfresh_core::{ProductId, Quantity};
use tracing::{debug, error, instrument, warn};

use crate::error::Result;
use crate::remote::CartRemote;
use crate::surface::{BadgeState, ButtonState, CartSurface, Notification};

const ADD_FAILED_MESSAGE: &str = "Failed to add to cart. Please try again.";
const QUICK_ADD_SUCCESS_MESSAGE: &str = "Product added to cart!";
const QUICK_ADD_FAILED_MESSAGE: &str = "Failed to add to cart";

/// An add-to-cart form on a product card or product page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddToCartForm {
    /// Identifies the form's submit button on the surface.
    pub id: String,
    /// Form action the fields are posted to.
    pub action: String,
    /// Submitted fields (quantity and any hidden inputs).
    pub fields: Vec<(String, String)>,
    /// Product shown next to the form, used in the confirmation.
    pub product_name: Option<String>,
}

impl AddToCartForm {
    /// Form for `/add-to-cart/{product}` with a quantity field.
    #[must_use]
    pub fn for_product(product: &ProductId, quantity: Quantity) -> Self {
        Self {
            id: format!("add-{product}"),
            action: format!("/add-to-cart/{product}"),
            fields: vec![("quantity".to_string(), quantity.to_string())],
            product_name: None,
        }
    }

    /// Attach the product name shown in the success notification.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.product_name = Some(name.into());
        self
    }
}

/// Cart actions outside the cart page.
pub struct CartActions<R, S> {
    remote: Arc<R>,
    surface: Arc<S>,
    button_reset: Duration,
    /// Forms whose button is not back to idle yet.
    busy: Arc<Mutex<HashSet<String>>>,
}

impl<R: CartRemote, S: CartSurface> CartActions<R, S> {
    /// Create the actions. Buttons return to idle `button_reset` after a result.
    #[must_use]
    pub fn new(remote: Arc<R>, surface: Arc<S>, button_reset: Duration) -> Self {
        Self {
            remote,
            surface,
            button_reset,
            busy: Arc::default(),
        }
    }

    /// Submit an add-to-cart form.
    ///
    /// Returns the button state shown with the result, or `None` if the
    /// form's button is still busy with an earlier submit. The button goes
    /// back to idle on its own after the reset delay, and only then accepts
    /// another submit.
    #[instrument(skip(self, form), fields(form = %form.id))]
    pub async fn submit_add_form(&self, form: &AddToCartForm) -> Option<ButtonState> {
        let accepted = self
            .busy
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(form.id.clone());
        if !accepted {
            debug!("Add to cart ignored while the button is busy");
            return None;
        }
        self.surface.set_button(&form.id, ButtonState::Adding);

        let outcome = match self.remote.add_line(&form.action, &form.fields).await {
            Ok(()) => {
                self.surface.set_button(&form.id, ButtonState::Added);
                // A stale badge is not worth interrupting the success path.
                let _ = self.refresh_badge().await;
                let name = form.product_name.as_deref().unwrap_or("Product");
                self.surface
                    .notify(Notification::success(format!("{name} added to cart!")));
                ButtonState::Added
            }
            Err(e) => {
                error!(error = %e, "Add to cart failed");
                self.surface.set_button(&form.id, ButtonState::Errored);
                self.surface.notify(Notification::error(ADD_FAILED_MESSAGE));
                ButtonState::Errored
            }
        };

        self.schedule_button_reset(form.id.clone());
        Some(outcome)
    }

    fn schedule_button_reset(&self, form_id: String) {
        let surface = Arc::clone(&self.surface);
        let busy = Arc::clone(&self.busy);
        let delay = self.button_reset;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            surface.set_button(&form_id, ButtonState::Idle);
            busy.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&form_id);
        });
    }

    /// Add a product straight from a product card.
    ///
    /// # Errors
    ///
    /// Returns the remote error after the failure has been shown to the user.
    #[instrument(skip(self, product), fields(product = %product))]
    pub async fn quick_add(&self, product: &ProductId, quantity: Quantity) -> Result<()> {
        match self.remote.quick_add(product, quantity).await {
            Ok(()) => {
                let _ = self.refresh_badge().await;
                self.surface
                    .notify(Notification::success(QUICK_ADD_SUCCESS_MESSAGE));
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Quick add failed");
                self.surface
                    .notify(Notification::error(QUICK_ADD_FAILED_MESSAGE));
                Err(e)
            }
        }
    }

    /// Fetch the cart count and update the badge. Failures are only logged.
    ///
    /// # Errors
    ///
    /// Returns the remote error; the badge is left as it was.
    #[instrument(skip(self))]
    pub async fn refresh_badge(&self) -> Result<u32> {
        match self.remote.cart_count().await {
            Ok(count) => {
                self.surface.set_badge(BadgeState::for_count(count));
                Ok(count)
            }
            Err(e) => {
                warn!(error = %e, "Failed to update cart count");
                Err(e)
            }
        }
    }
}
