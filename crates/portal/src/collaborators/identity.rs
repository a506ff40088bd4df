//! Identity resolution for sign-in

use std::sync::Arc;

use async_trait::async_trait;
use ecole_database::{decode, Filter, Record, StoreAdapter};

use crate::entities::User;
use crate::types::PortalResult;
use crate::utils::validation::normalize_email;

/// Resolve the user behind an e-mail address. No credential is checked.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve_email(&self, email: &str) -> PortalResult<Option<User>>;
}

/// Looks the address up in the `users` table.
pub struct StoreIdentityResolver {
    store: Arc<dyn StoreAdapter>,
}

impl StoreIdentityResolver {
    pub fn new(store: Arc<dyn StoreAdapter>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl IdentityResolver for StoreIdentityResolver {
    async fn resolve_email(&self, email: &str) -> PortalResult<Option<User>> {
        let email = normalize_email(email);
        let rows = self
            .store
            .select_where(User::TABLE, &Filter::eq("email", email))
            .await?;

        match rows.into_iter().next() {
            Some(row) => Ok(Some(decode(row)?)),
            None => Ok(None),
        }
    }
}
