//! In-memory caching using moka
//!
//! Vehicle models are near-static reference data looked up on every resolver
//! and quote call, so they are cached by id. Seat capacity is never cached.

use moka::future::Cache;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::VehicleModel;
use crate::store::{BookingStore, StoreResult};

/// Engine cache holding vehicle models
#[derive(Clone)]
pub struct AppCache {
    /// Vehicle models (id -> VehicleModel)
    pub vehicle_models: Cache<Uuid, Arc<VehicleModel>>,
}

impl AppCache {
    /// Create a new cache instance with the given TTL
    pub fn new(vehicle_model_ttl: Duration) -> Self {
        Self {
            vehicle_models: Cache::builder()
                .max_capacity(1_000)
                .time_to_live(vehicle_model_ttl)
                .build(),
        }
    }

    /// Get cache statistics for monitoring
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            vehicle_models_size: self.vehicle_models.entry_count(),
        }
    }

    /// Invalidate all caches
    pub fn invalidate_all(&self) {
        self.vehicle_models.invalidate_all();
        info!("All caches invalidated");
    }

    /// Invalidate one vehicle model after it was edited
    pub async fn invalidate_vehicle_model(&self, id: Uuid) {
        self.vehicle_models.invalidate(&id).await;
        info!("Cache invalidated for vehicle model: {}", id);
    }

    /// Look up vehicle models, reading through to the store for misses.
    ///
    /// Ids that do not resolve are simply absent from the result.
    pub async fn vehicle_models<S>(
        &self,
        store: &S,
        ids: &[Uuid],
    ) -> StoreResult<HashMap<Uuid, Arc<VehicleModel>>>
    where
        S: BookingStore + ?Sized,
    {
        let mut found = HashMap::new();
        let mut missing = Vec::new();

        for id in ids {
            if found.contains_key(id) || missing.contains(id) {
                continue;
            }
            match self.vehicle_models.get(id).await {
                Some(model) => {
                    found.insert(*id, model);
                }
                None => missing.push(*id),
            }
        }

        if missing.is_empty() {
            debug!("Cache HIT for {} vehicle models", found.len());
            return Ok(found);
        }

        debug!("Cache MISS for {} vehicle models", missing.len());
        for model in store.vehicle_models(&missing).await? {
            let model = Arc::new(model);
            self.vehicle_models.insert(model.id, model.clone()).await;
            found.insert(model.id, model);
        }

        Ok(found)
    }

    /// Look up a single vehicle model through the cache
    pub async fn vehicle_model<S>(&self, store: &S, id: Uuid) -> StoreResult<Option<Arc<VehicleModel>>>
    where
        S: BookingStore + ?Sized,
    {
        Ok(self.vehicle_models(store, &[id]).await?.remove(&id))
    }
}

impl Default for AppCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(10 * 60))
    }
}

/// Cache statistics for monitoring
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub vehicle_models_size: u64,
}
