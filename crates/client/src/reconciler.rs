//! The cart reconciliation state machine.
//!
//! One implementation, one entry point: every cart mutation goes through
//! [`CartSession::mutate`], which applies the remote-first / local-fallback
//! policy and records which view of the cart is currently authoritative.

use std::sync::Arc;

use bepviet_core::{CartItem, Phone, ProductId};

use crate::api::ApiClient;
use crate::cache::{LocalCache, Session};
use crate::error::ClientError;

/// Which view of the cart the session currently trusts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Remote and local agree as of the last operation.
    Synced,
    /// Not signed in; the local view is the only view.
    LocalOnly,
    /// Signed in, but the last remote attempt failed; local changes have not
    /// reached the server.
    Stale,
}

/// A cart mutation, expressed once and applied remotely or locally.
#[derive(Debug, Clone)]
enum CartOp {
    Add(CartItem),
    Update {
        product_id: ProductId,
        quantity: i64,
        note: Option<String>,
    },
    Remove(ProductId),
    Clear,
}

/// The reconciled cart for one storefront session.
pub struct CartSession {
    pub(crate) api: ApiClient,
    pub(crate) cache: Arc<dyn LocalCache>,
    pub(crate) items: Vec<CartItem>,
    pub(crate) user: Option<Phone>,
    state: SyncState,
}

impl CartSession {
    /// Create a session, seeding the in-memory cart from the local cache and
    /// restoring any persisted sign-in.
    #[must_use]
    pub fn new(api: ApiClient, cache: Arc<dyn LocalCache>) -> Self {
        let items = cache.load_cart();
        let user = cache.load_session().map(|s: Session| {
            api.set_token(&s.token);
            s.phone
        });

        Self {
            api,
            cache,
            items,
            user,
            state: SyncState::LocalOnly,
        }
    }

    /// The current line items.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Which view of the cart is authoritative right now.
    #[must_use]
    pub const fn state(&self) -> SyncState {
        self.state
    }

    /// Total unit count across lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// The signed-in user, if any.
    #[must_use]
    pub const fn user(&self) -> Option<&Phone> {
        self.user.as_ref()
    }

    /// The underlying API client (shares this session's bearer token).
    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Mark the session signed-in and pull the server cart.
    ///
    /// On a fresh sign-in the server cart wins over whatever the local cache
    /// accumulated while signed out.
    pub async fn sign_in(&mut self, session: Session) {
        self.api.set_token(&session.token);
        self.cache.store_session(Some(&session));
        self.user = Some(session.phone);
        self.refresh().await;
    }

    /// Drop the sign-in; the cart keeps its current lines, local-only.
    pub fn sign_out(&mut self) {
        self.api.clear_token();
        self.cache.store_session(None);
        self.user = None;
        self.state = SyncState::LocalOnly;
    }

    /// Re-fetch the remote cart and overwrite both local views.
    ///
    /// No-op while signed out. A transport failure leaves the current lines
    /// in place and marks the session stale.
    pub async fn refresh(&mut self) {
        let Some(user) = self.user.clone() else {
            self.state = SyncState::LocalOnly;
            return;
        };

        match self.api.get_cart(user.as_str()).await {
            Ok(cart) => {
                self.items = cart;
                self.cache.store_cart(&self.items);
                self.state = SyncState::Synced;
            }
            Err(e) if e.is_unreachable() => {
                tracing::warn!(error = %e, "cart refresh failed, keeping local view");
                self.state = SyncState::Stale;
            }
            Err(e) => {
                tracing::warn!(error = %e, "cart refresh rejected, keeping local view");
                self.state = SyncState::Stale;
            }
        }
    }

    /// Merge a line into the cart.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a non-positive quantity; remote
    /// rejections other than unavailability are surfaced unchanged.
    pub async fn add_item(
        &mut self,
        product_id: ProductId,
        quantity: u32,
        note: Option<String>,
    ) -> Result<(), ClientError> {
        if quantity == 0 {
            return Err(ClientError::Validation("quantity must be positive".to_owned()));
        }
        self.mutate(CartOp::Add(CartItem::new(product_id, quantity, note)))
            .await
    }

    /// Set a line's absolute quantity; zero or negative removes it.
    ///
    /// # Errors
    ///
    /// Remote rejections other than unavailability are surfaced unchanged.
    pub async fn update_item(
        &mut self,
        product_id: ProductId,
        quantity: i64,
        note: Option<String>,
    ) -> Result<(), ClientError> {
        self.mutate(CartOp::Update {
            product_id,
            quantity,
            note,
        })
        .await
    }

    /// Remove a line; no-op if absent.
    ///
    /// # Errors
    ///
    /// Remote rejections other than unavailability are surfaced unchanged.
    pub async fn remove_item(&mut self, product_id: ProductId) -> Result<(), ClientError> {
        self.mutate(CartOp::Remove(product_id)).await
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Remote rejections other than unavailability are surfaced unchanged.
    pub async fn clear(&mut self) -> Result<(), ClientError> {
        self.mutate(CartOp::Clear).await
    }

    /// The single reconciliation path.
    ///
    /// Signed in: try the remote store, then re-fetch for read-after-write
    /// consistency; if the tier is unreachable, mutate locally and mark the
    /// session stale. Signed out: mutate locally. Every branch ends by
    /// persisting the in-memory list to the local cache.
    async fn mutate(&mut self, op: CartOp) -> Result<(), ClientError> {
        match self.user.clone() {
            Some(user) => match self.apply_remote(user.as_str(), &op).await {
                Ok(()) => {
                    self.refresh().await;
                    if self.state != SyncState::Synced {
                        // The write landed but the read-back didn't; keep the
                        // user-visible effect by replaying the op locally.
                        self.apply_local(op);
                    }
                    Ok(())
                }
                Err(e) if e.is_unreachable() => {
                    tracing::warn!(error = %e, "cart service unreachable, applying locally");
                    self.apply_local(op);
                    self.state = SyncState::Stale;
                    Ok(())
                }
                Err(e) => Err(e),
            },
            None => {
                self.apply_local(op);
                self.state = SyncState::LocalOnly;
                Ok(())
            }
        }
    }

    async fn apply_remote(&self, user: &str, op: &CartOp) -> Result<(), ClientError> {
        match op {
            CartOp::Add(item) => {
                self.api.add_cart_item(user, item).await?;
            }
            CartOp::Update {
                product_id,
                quantity,
                note,
            } => {
                // The store treats an update of an absent line as 404; adding
                // locally then updating remotely while stale is legal, so map
                // that onto an add.
                let result = self
                    .api
                    .update_cart_item(user, *product_id, *quantity, note.as_deref())
                    .await;
                match result {
                    Ok(_) => {}
                    Err(ClientError::Api { status: 404, .. }) if *quantity > 0 => {
                        let quantity = u32::try_from(*quantity).map_err(|_| {
                            ClientError::Validation("quantity out of range".to_owned())
                        })?;
                        self.api
                            .add_cart_item(user, &CartItem::new(*product_id, quantity, note.clone()))
                            .await?;
                    }
                    Err(e) => return Err(e),
                }
            }
            CartOp::Remove(product_id) => {
                self.api.remove_cart_item(user, *product_id).await?;
            }
            CartOp::Clear => {
                self.api.clear_cart(user).await?;
            }
        }
        Ok(())
    }

    /// Apply an op to the in-memory list with the same merge semantics the
    /// store uses, then persist to the cache.
    fn apply_local(&mut self, op: CartOp) {
        match op {
            CartOp::Add(item) => {
                if let Some(existing) = self
                    .items
                    .iter_mut()
                    .find(|l| l.product_id == item.product_id)
                {
                    existing.quantity = existing.quantity.saturating_add(item.quantity);
                    existing.note = item.note;
                } else {
                    self.items.push(item);
                }
            }
            CartOp::Update {
                product_id,
                quantity,
                note,
            } => {
                if quantity <= 0 {
                    self.items.retain(|l| l.product_id != product_id);
                } else if let Some(line) =
                    self.items.iter_mut().find(|l| l.product_id == product_id)
                {
                    line.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
                    if let Some(note) = note.filter(|n| !n.trim().is_empty()) {
                        line.note = note;
                    }
                }
            }
            CartOp::Remove(product_id) => {
                self.items.retain(|l| l.product_id != product_id);
            }
            CartOp::Clear => self.items.clear(),
        }
        self.cache.store_cart(&self.items);
    }
}
