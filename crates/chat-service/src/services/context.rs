//! Service context - dependency container for services
//!
//! Holds the store ports and the messaging settings every service needs.

use std::sync::Arc;

use chat_common::MessagingConfig;
use chat_core::{DirectoryStore, MessageStore};

use super::error::{ServiceError, ServiceResult};

/// Service context containing all dependencies
///
/// Cheap to clone; every clone shares the same stores.
#[derive(Clone)]
pub struct ServiceContext {
    message_store: Arc<dyn MessageStore>,
    directory_store: Arc<dyn DirectoryStore>,
    messaging: Arc<MessagingConfig>,
}

impl ServiceContext {
    /// Create a new service context with all dependencies
    pub fn new(
        message_store: Arc<dyn MessageStore>,
        directory_store: Arc<dyn DirectoryStore>,
        messaging: MessagingConfig,
    ) -> Self {
        Self {
            message_store,
            directory_store,
            messaging: Arc::new(messaging),
        }
    }

    /// Context backed by one store serving both ports
    pub fn with_store<S>(store: Arc<S>, messaging: MessagingConfig) -> Self
    where
        S: MessageStore + DirectoryStore + 'static,
    {
        let message_store: Arc<dyn MessageStore> = store.clone();
        let directory_store: Arc<dyn DirectoryStore> = store;
        Self::new(message_store, directory_store, messaging)
    }

    /// Get the message store
    pub fn message_store(&self) -> &dyn MessageStore {
        self.message_store.as_ref()
    }

    /// Shared handle to the message store, for long-lived owners
    pub fn message_store_handle(&self) -> Arc<dyn MessageStore> {
        Arc::clone(&self.message_store)
    }

    /// Get the directory store
    pub fn directory_store(&self) -> &dyn DirectoryStore {
        self.directory_store.as_ref()
    }

    /// Get the messaging settings
    pub fn messaging(&self) -> &MessagingConfig {
        &self.messaging
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("message_store", &"dyn MessageStore")
            .field("directory_store", &"dyn DirectoryStore")
            .field("messaging", &self.messaging)
            .finish()
    }
}

/// Builder for creating ServiceContext with custom configuration
#[derive(Default)]
pub struct ServiceContextBuilder {
    message_store: Option<Arc<dyn MessageStore>>,
    directory_store: Option<Arc<dyn DirectoryStore>>,
    messaging: Option<MessagingConfig>,
}

impl ServiceContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn message_store(mut self, store: Arc<dyn MessageStore>) -> Self {
        self.message_store = Some(store);
        self
    }

    pub fn directory_store(mut self, store: Arc<dyn DirectoryStore>) -> Self {
        self.directory_store = Some(store);
        self
    }

    pub fn messaging(mut self, messaging: MessagingConfig) -> Self {
        self.messaging = Some(messaging);
        self
    }

    /// Build the ServiceContext
    ///
    /// Messaging settings fall back to their defaults.
    ///
    /// # Errors
    /// Returns `ServiceError::Validation` if a store is missing
    pub fn build(self) -> ServiceResult<ServiceContext> {
        Ok(ServiceContext::new(
            self.message_store
                .ok_or_else(|| ServiceError::validation("message_store is required"))?,
            self.directory_store
                .ok_or_else(|| ServiceError::validation("directory_store is required"))?,
            self.messaging.unwrap_or_default(),
        ))
    }
}
