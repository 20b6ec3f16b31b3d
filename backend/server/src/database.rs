//! # Document store
//!
//! Every collection is one Redis hash: `<db_name>:<collection>`, field = document
//! id, value = the document as JSON. Collections stay small (tens of units and
//! doctors, a few thousand appointments), so filtering and sorting happen in
//! process after an `HVALS`.
//!
//! ## Layers
//!
//! - [`Store`]: raw JSON by collection and id, implemented by [`RedisStore`]
//!   and [`MemoryStore`]
//! - [`Db`]: typed facade, one generic call per operation for any [`Document`]
use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use records::{
    Appointment, Doctor, DocumentTemplate, InventoryItem, InventoryMovement, Patient, Service,
    Staff, Unit,
};
use redis::{
    AsyncCommands, Client,
    aio::{ConnectionManager, ConnectionManagerConfig},
};
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::RwLock;
use tracing::warn;

use crate::error::AppError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Collection {
    Patients,
    Staff,
    Units,
    Services,
    Doctors,
    Appointments,
    Inventory,
    Movements,
    Templates,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Patients => "users",
            Collection::Staff => "staff",
            Collection::Units => "units",
            Collection::Services => "services",
            Collection::Doctors => "doctors",
            Collection::Appointments => "appointments",
            Collection::Inventory => "inventory",
            Collection::Movements => "inventory_movements",
            Collection::Templates => "document_templates",
        }
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn fetch(&self, collection: Collection, id: &str) -> Result<Option<String>, AppError>;

    async fn fetch_all(&self, collection: Collection) -> Result<Vec<String>, AppError>;

    async fn store(
        &self,
        collection: Collection,
        id: &str,
        document: String,
    ) -> Result<(), AppError>;

    /// Returns whether a document was removed.
    async fn delete(&self, collection: Collection, id: &str) -> Result<bool, AppError>;
}

pub struct RedisStore {
    connection: ConnectionManager,
    prefix: String,
}

impl RedisStore {
    pub async fn connect(redis_url: &str, db_name: &str) -> Result<Self, AppError> {
        let config = ConnectionManagerConfig::new()
            .set_number_of_retries(1)
            .set_connection_timeout(Duration::from_millis(500));

        let client = Client::open(redis_url)?;
        let connection = client.get_connection_manager_with_config(config).await?;

        Ok(Self {
            connection,
            prefix: db_name.to_string(),
        })
    }

    fn key(&self, collection: Collection) -> String {
        format!("{}:{}", self.prefix, collection.as_str())
    }
}

#[async_trait]
impl Store for RedisStore {
    async fn fetch(&self, collection: Collection, id: &str) -> Result<Option<String>, AppError> {
        let mut connection = self.connection.clone();
        let document: Option<String> = connection.hget(self.key(collection), id).await?;

        Ok(document)
    }

    async fn fetch_all(&self, collection: Collection) -> Result<Vec<String>, AppError> {
        let mut connection = self.connection.clone();
        let documents: Vec<String> = connection.hvals(self.key(collection)).await?;

        Ok(documents)
    }

    async fn store(
        &self,
        collection: Collection,
        id: &str,
        document: String,
    ) -> Result<(), AppError> {
        let mut connection = self.connection.clone();
        let _: () = connection.hset(self.key(collection), id, document).await?;

        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<bool, AppError> {
        let mut connection = self.connection.clone();
        let removed: i64 = connection.hdel(self.key(collection), id).await?;

        Ok(removed > 0)
    }
}

/// Process-local store for tests and throwaway runs.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn fetch(&self, collection: Collection, id: &str) -> Result<Option<String>, AppError> {
        let collections = self.collections.read().await;

        Ok(collections
            .get(&collection)
            .and_then(|documents| documents.get(id))
            .cloned())
    }

    async fn fetch_all(&self, collection: Collection) -> Result<Vec<String>, AppError> {
        let collections = self.collections.read().await;

        Ok(collections
            .get(&collection)
            .map(|documents| documents.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn store(
        &self,
        collection: Collection,
        id: &str,
        document: String,
    ) -> Result<(), AppError> {
        self.collections
            .write()
            .await
            .entry(collection)
            .or_default()
            .insert(id.to_string(), document);

        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<bool, AppError> {
        let mut collections = self.collections.write().await;

        Ok(collections
            .get_mut(&collection)
            .and_then(|documents| documents.remove(id))
            .is_some())
    }
}

pub trait Document: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: Collection;

    fn key(&self) -> &str;
}

macro_rules! document {
    ($ty:ty, $collection:expr) => {
        impl Document for $ty {
            const COLLECTION: Collection = $collection;

            fn key(&self) -> &str {
                &self.id
            }
        }
    };
}

document!(Patient, Collection::Patients);
document!(Staff, Collection::Staff);
document!(Unit, Collection::Units);
document!(Service, Collection::Services);
document!(Doctor, Collection::Doctors);
document!(Appointment, Collection::Appointments);
document!(InventoryItem, Collection::Inventory);
document!(InventoryMovement, Collection::Movements);

/// Templates are addressed by their type, one per type.
impl Document for DocumentTemplate {
    const COLLECTION: Collection = Collection::Templates;

    fn key(&self) -> &str {
        self.kind.as_str()
    }
}

#[derive(Clone)]
pub struct Db {
    store: Arc<dyn Store>,
}

impl Db {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub async fn get<T: Document>(&self, id: &str) -> Result<Option<T>, AppError> {
        match self.store.fetch(T::COLLECTION, id).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Undecodable documents are skipped so one bad record cannot hide a listing.
    pub async fn all<T: Document>(&self) -> Result<Vec<T>, AppError> {
        let documents = self
            .store
            .fetch_all(T::COLLECTION)
            .await?
            .into_iter()
            .filter_map(|raw| match serde_json::from_str(&raw) {
                Ok(document) => Some(document),
                Err(e) => {
                    warn!("Skipping malformed {} document: {e}", T::COLLECTION.as_str());
                    None
                }
            })
            .collect();

        Ok(documents)
    }

    pub async fn find<T, P>(&self, predicate: P) -> Result<Vec<T>, AppError>
    where
        T: Document,
        P: Fn(&T) -> bool + Send,
    {
        let mut documents = self.all::<T>().await?;
        documents.retain(|document| predicate(document));

        Ok(documents)
    }

    pub async fn find_one<T, P>(&self, predicate: P) -> Result<Option<T>, AppError>
    where
        T: Document,
        P: Fn(&T) -> bool + Send,
    {
        Ok(self.all::<T>().await?.into_iter().find(|document| predicate(document)))
    }

    pub async fn count<T: Document>(&self) -> Result<usize, AppError> {
        Ok(self.store.fetch_all(T::COLLECTION).await?.len())
    }

    pub async fn save<T: Document>(&self, document: &T) -> Result<(), AppError> {
        let raw = serde_json::to_string(document)?;

        self.store.store(T::COLLECTION, document.key(), raw).await
    }

    /// Writes the document and returns it as read back from the store.
    pub async fn save_and_reload<T: Document>(&self, document: &T) -> Result<T, AppError> {
        self.save(document).await?;

        self.get(document.key()).await?.ok_or_else(|| {
            AppError::InternalError(
                format!("{} {} vanished after write", T::COLLECTION.as_str(), document.key())
                    .into(),
            )
        })
    }

    pub async fn remove<T: Document>(&self, id: &str) -> Result<bool, AppError> {
        self.store.delete(T::COLLECTION, id).await
    }
}
