use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::contract::model::User;
use crate::domain::error::StorageError;
use crate::domain::repo::UsersStore;

/// Collection-level operations over the store.
/// Every call is a full load, and mutations end with a full persist.
/// A missing record is reported as `Ok(None)`, never as an error.
#[derive(Clone)]
pub struct Service {
    store: Arc<dyn UsersStore>,
}

impl Service {
    pub fn new(store: Arc<dyn UsersStore>) -> Self {
        Self { store }
    }

    #[instrument(name = "users_info.service.list_users", skip(self))]
    pub async fn list_users(&self) -> Result<Vec<User>, StorageError> {
        let users = self.store.load().await?;
        debug!("Listed {} users", users.len());
        Ok(users)
    }

    #[instrument(name = "users_info.service.get_user", skip(self), fields(user_id = %id))]
    pub async fn get_user(&self, id: Uuid) -> Result<Option<User>, StorageError> {
        debug!("Getting user by id");
        let users = self.store.load().await?;
        Ok(users.into_iter().find(|u| u.id == id))
    }

    #[instrument(name = "users_info.service.create_user", skip(self, fields))]
    pub async fn create_user(&self, fields: Map<String, Value>) -> Result<User, StorageError> {
        info!("Creating new user");
        let mut users = self.store.load().await?;

        let mut id = Uuid::new_v4();
        while users.iter().any(|u| u.id == id) {
            id = Uuid::new_v4();
        }

        let user = User::new(id, fields);
        users.push(user.clone());
        self.store.persist(&users).await?;

        info!("Successfully created user with id={}", user.id);
        Ok(user)
    }

    #[instrument(name = "users_info.service.update_user", skip(self, patch), fields(user_id = %id))]
    pub async fn update_user(
        &self,
        id: Uuid,
        patch: Map<String, Value>,
    ) -> Result<Option<User>, StorageError> {
        info!("Updating user");
        let mut users = self.store.load().await?;

        let Some(current) = users.iter_mut().find(|u| u.id == id) else {
            debug!("User not found");
            return Ok(None);
        };
        current.merge(patch);
        let updated = current.clone();

        self.store.persist(&users).await?;
        info!("Successfully updated user");
        Ok(Some(updated))
    }

    #[instrument(name = "users_info.service.delete_user", skip(self), fields(user_id = %id))]
    pub async fn delete_user(&self, id: Uuid) -> Result<Option<User>, StorageError> {
        info!("Deleting user");
        let mut users = self.store.load().await?;

        let Some(pos) = users.iter().position(|u| u.id == id) else {
            debug!("User not found");
            return Ok(None);
        };
        let removed = users.remove(pos);

        self.store.persist(&users).await?;
        info!("Successfully deleted user");
        Ok(Some(removed))
    }
}
