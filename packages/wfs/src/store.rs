//! In-memory holder of the remote point collection.
//!
//! The collection is fetched once (typically at startup) and then read by
//! every filter run. Readers get a cheap [`Arc`] snapshot; a reload swaps
//! the whole collection at once.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use envmap_feature_models::{PointsStatus, RemotePoint};

use crate::{FeatureSource, WfsError};

#[derive(Debug)]
struct Inner {
    points: Option<Arc<Vec<RemotePoint>>>,
    status: PointsStatus,
    generation: u64,
}

/// Shared, cloneable handle to the loaded points.
#[derive(Debug, Clone)]
pub struct PointStore {
    inner: Arc<Mutex<Inner>>,
}

impl Default for PointStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PointStore {
    /// Creates an empty store in the [`PointsStatus::NotLoaded`] state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                points: None,
                status: PointsStatus::NotLoaded,
                generation: 0,
            })),
        }
    }

    /// Creates a store that already holds `points`.
    #[must_use]
    pub fn with_points(points: Vec<RemotePoint>) -> Self {
        let store = Self::new();
        store.replace(points);
        store
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current load state.
    #[must_use]
    pub fn status(&self) -> PointsStatus {
        self.lock().status.clone()
    }

    /// Returns the loaded points.
    ///
    /// # Errors
    ///
    /// Returns [`WfsError::NotLoaded`] if no load has completed yet.
    pub fn points(&self) -> Result<Arc<Vec<RemotePoint>>, WfsError> {
        let inner = self.lock();
        inner.points.clone().ok_or_else(|| WfsError::NotLoaded {
            status: inner.status.clone(),
        })
    }

    /// Returns the loaded points, or an empty collection if nothing is
    /// loaded yet.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Vec<RemotePoint>> {
        self.lock().points.clone().unwrap_or_default()
    }

    /// Replaces the collection directly.
    pub fn replace(&self, points: Vec<RemotePoint>) {
        let mut inner = self.lock();
        inner.generation += 1;
        inner.status = PointsStatus::Loaded {
            count: points.len(),
        };
        inner.points = Some(Arc::new(points));
    }

    /// Fetches the full collection from `source` and stores it.
    ///
    /// If a newer load was started while this one was in flight, the
    /// result of this one is dropped. A failed load keeps previously
    /// loaded points available.
    ///
    /// # Errors
    ///
    /// Returns the [`WfsError`] from the source if the fetch fails.
    pub async fn load(&self, source: &dyn FeatureSource) -> Result<usize, WfsError> {
        let generation = {
            let mut inner = self.lock();
            inner.generation += 1;
            if inner.points.is_none() {
                inner.status = PointsStatus::Loading;
            }
            inner.generation
        };

        log::info!("{}: loading points", source.id());
        let result = source.fetch_points().await;

        let mut inner = self.lock();
        if inner.generation != generation {
            log::debug!(
                "{}: discarding result of superseded load {generation}",
                source.id()
            );
            return result.map(|points| points.len());
        }

        match result {
            Ok(points) => {
                let count = points.len();
                log::info!("{}: loaded {count} points", source.id());
                inner.status = PointsStatus::Loaded { count };
                inner.points = Some(Arc::new(points));
                Ok(count)
            }
            Err(e) => {
                log::error!("{}: point load failed: {e}", source.id());
                match &inner.points {
                    Some(points) => {
                        inner.status = PointsStatus::Loaded {
                            count: points.len(),
                        };
                    }
                    None => {
                        inner.status = PointsStatus::Failed {
                            message: e.to_string(),
                        };
                    }
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use envmap_feature_models::PointAttributes;
    use envmap_geometry_models::LonLat;

    use super::*;

    struct StaticSource(Vec<RemotePoint>);

    #[async_trait]
    impl FeatureSource for StaticSource {
        fn id(&self) -> &str {
            "static"
        }

        async fn fetch_points(&self) -> Result<Vec<RemotePoint>, WfsError> {
            Ok(self.0.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl FeatureSource for FailingSource {
        fn id(&self) -> &str {
            "failing"
        }

        async fn fetch_points(&self) -> Result<Vec<RemotePoint>, WfsError> {
            Err(WfsError::ServiceException {
                message: "down".to_string(),
            })
        }
    }

    fn point(lon: f64, lat: f64) -> RemotePoint {
        RemotePoint {
            id: None,
            position: LonLat::new(lon, lat),
            attributes: PointAttributes::default(),
        }
    }

    #[test]
    fn new_store_is_not_loaded() {
        let store = PointStore::new();
        assert_eq!(store.status(), PointsStatus::NotLoaded);
        assert!(matches!(
            store.points(),
            Err(WfsError::NotLoaded {
                status: PointsStatus::NotLoaded
            })
        ));
        assert!(store.snapshot().is_empty());
    }

    #[tokio::test]
    async fn load_stores_points() {
        let store = PointStore::new();
        let source = StaticSource(vec![point(19.1, 48.7), point(19.2, 48.8)]);

        assert_eq!(store.load(&source).await.unwrap(), 2);
        assert_eq!(store.status(), PointsStatus::Loaded { count: 2 });
        assert_eq!(store.points().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn failed_first_load_reports_failure() {
        let store = PointStore::new();
        assert!(store.load(&FailingSource).await.is_err());
        assert!(matches!(store.status(), PointsStatus::Failed { .. }));
        assert!(store.points().is_err());
    }

    #[tokio::test]
    async fn failed_reload_keeps_previous_points() {
        let store = PointStore::with_points(vec![point(19.1, 48.7)]);
        assert!(store.load(&FailingSource).await.is_err());
        assert_eq!(store.status(), PointsStatus::Loaded { count: 1 });
        assert_eq!(store.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn clones_share_state() {
        let store = PointStore::new();
        let reader = store.clone();
        store
            .load(&StaticSource(vec![point(19.1, 48.7)]))
            .await
            .unwrap();
        assert_eq!(reader.snapshot().len(), 1);
    }
}
