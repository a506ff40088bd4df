//! Optimistic writes shared by announcements, meets, exams and polls.

use ecole_database::codec;
use serde::Serialize;

use crate::entities::{ClassScoped, User};
use crate::pending::PendingChange;
use crate::portal::{non_empty_patch, patched, Portal};
use crate::state::{Entity, Mutation};
use crate::types::PortalResult;

impl Portal {
    /// Add class content locally and send it.
    pub(crate) async fn create_content<T: Entity + ClassScoped>(&self, value: T) -> PortalResult<T> {
        let row = codec::to_client_row(&value)?;
        let id = value.id().to_string();
        self.optimistic(Mutation::Insert(value.clone()), &id, PendingChange::Upsert { row })
            .await?;
        Ok(value)
    }

    /// Patch class content the actor manages.
    pub(crate) async fn update_content<T, P>(&self, actor: &User, id: &str, patch: &P) -> PortalResult<T>
    where
        T: Entity + ClassScoped,
        P: Serialize,
    {
        let current = self.managed::<T>(actor, id).await?;
        let row = non_empty_patch(patch)?;
        let updated = patched(&current, &row)?;
        self.optimistic(Mutation::Update(updated.clone()), id, PendingChange::Patch { row })
            .await?;
        Ok(updated)
    }

    /// Remove class content the actor manages. Returns the removed value.
    pub(crate) async fn delete_content<T: Entity + ClassScoped>(
        &self,
        actor: &User,
        id: &str,
    ) -> PortalResult<T> {
        let current = self.managed::<T>(actor, id).await?;
        self.optimistic(Mutation::<T>::Delete(id.to_string()), id, PendingChange::Delete)
            .await?;
        Ok(current)
    }
}
