//! Read-only lookup operations over the camera range table.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, warn};

use super::error::{LookupError, Mutation};
use super::range_index::RangeIndex;
use super::result::LookupResult;
use crate::repository::{RangeConnection, RangeStore, StoreError};

type StoreFuture<'c, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'c>>;

/// Validates input, queries the store and shapes results.
///
/// Cheap to clone; holds no per-request state.
#[derive(Clone)]
pub struct LookupService {
    store: Arc<dyn RangeStore>,
    query_timeout: Option<Duration>,
}

impl LookupService {
    pub fn new(store: Arc<dyn RangeStore>) -> Self {
        Self {
            store,
            query_timeout: None,
        }
    }

    /// Bound every store interaction (connect, query and close) by `timeout`.
    pub fn with_query_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// Every range, ordered by id, as a single page.
    pub async fn list_all(&self) -> Result<LookupResult, LookupError> {
        let ranges = self
            .with_connection("list_all", |conn| conn.query_all())
            .await?;
        Ok(LookupResult::many(ranges))
    }

    /// The range with primary key `raw_id`.
    pub async fn find_by_id(&self, raw_id: &str) -> Result<LookupResult, LookupError> {
        let value = parse_non_negative(raw_id, "id")?;
        let Ok(id) = i32::try_from(value) else {
            debug!("id {} is beyond the key space", value);
            return Err(LookupError::NotFound);
        };

        let found = self
            .with_connection("find_by_id", move |conn| conn.query_by_id(id))
            .await?;

        match found {
            Some(range) => Ok(LookupResult::one(range)),
            None => {
                debug!("No camera range with id {}", id);
                Err(LookupError::NotFound)
            }
        }
    }

    /// The range whose serial bounds contain `raw_serial`.
    pub async fn find_by_serial(&self, raw_serial: &str) -> Result<LookupResult, LookupError> {
        let serial = parse_non_negative(raw_serial, "serial number")?;

        let ranges = self
            .with_connection("find_by_serial", |conn| conn.query_all())
            .await?;
        let index = RangeIndex::new(ranges);

        match index.find(serial) {
            Some(range) => Ok(LookupResult::one(range.clone())),
            None => {
                debug!("Serial {} matches none of {} ranges", serial, index.len());
                Err(LookupError::NotFound)
            }
        }
    }

    /// Always rejected; the table is read-only.
    pub fn create(&self, _payload: &serde_json::Value) -> Result<LookupResult, LookupError> {
        reject(Mutation::Create)
    }

    /// Always rejected; the table is read-only.
    pub fn update(
        &self,
        _raw_id: &str,
        _payload: &serde_json::Value,
    ) -> Result<LookupResult, LookupError> {
        reject(Mutation::Update)
    }

    /// Always rejected; the table is read-only.
    pub fn delete(&self, _raw_id: &str) -> Result<LookupResult, LookupError> {
        reject(Mutation::Delete)
    }

    /// Connect, run `op`, close.
    ///
    /// Close failures are logged and dropped so they never replace the
    /// result of `op`. On timeout the whole future is dropped, which
    /// releases the connection.
    async fn with_connection<T, F>(&self, operation: &'static str, op: F) -> Result<T, LookupError>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut dyn RangeConnection) -> StoreFuture<'c, T> + Send,
    {
        let work = async {
            let mut conn = self
                .store
                .connect()
                .await
                .map_err(|e| store_failure(operation, e))?;

            let result = op(conn.as_mut()).await;

            if let Err(e) = conn.close().await {
                warn!(operation, error = %e, "Failed to release store connection");
            }

            result.map_err(|e| store_failure(operation, e))
        };

        match self.query_timeout {
            Some(limit) => match tokio::time::timeout(limit, work).await {
                Ok(result) => result,
                Err(_) => {
                    error!(
                        operation,
                        timeout_ms = limit.as_millis() as u64,
                        "Store operation timed out"
                    );
                    Err(LookupError::Upstream)
                }
            },
            None => work.await,
        }
    }
}

fn parse_non_negative(raw: &str, what: &str) -> Result<i64, LookupError> {
    match raw.parse::<i64>() {
        Ok(value) if value >= 0 => Ok(value),
        _ => {
            debug!("Rejected {} {:?}", what, raw);
            Err(LookupError::Validation(format!(
                "{} must be a non-negative integer",
                what
            )))
        }
    }
}

fn reject(mutation: Mutation) -> Result<LookupResult, LookupError> {
    debug!("Rejected {} on read-only camera ranges", mutation);
    Err(LookupError::MethodNotAllowed(mutation))
}

fn store_failure(operation: &'static str, err: StoreError) -> LookupError {
    error!(operation, error = %err, "Camera range store failure");
    LookupError::from(&err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CameraRange;
    use crate::service::LookupData;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counters {
        connects: AtomicUsize,
        queries: AtomicUsize,
        closes: AtomicUsize,
        released: AtomicUsize,
    }

    #[derive(Clone, Copy, Default)]
    struct Faults {
        connect: bool,
        query: bool,
        close: bool,
        stall: bool,
    }

    struct FakeStore {
        ranges: Vec<CameraRange>,
        faults: Faults,
        counters: Arc<Counters>,
    }

    impl FakeStore {
        fn new(ranges: Vec<CameraRange>) -> Self {
            Self {
                ranges,
                faults: Faults::default(),
                counters: Arc::new(Counters::default()),
            }
        }

        fn with_faults(mut self, faults: Faults) -> Self {
            self.faults = faults;
            self
        }
    }

    struct FakeConnection {
        ranges: Vec<CameraRange>,
        faults: Faults,
        counters: Arc<Counters>,
    }

    impl FakeConnection {
        async fn query(&self) -> Result<(), StoreError> {
            self.counters.queries.fetch_add(1, Ordering::SeqCst);
            if self.faults.stall {
                std::future::pending::<()>().await;
            }
            if self.faults.query {
                return Err(StoreError::Query(
                    diesel::result::Error::BrokenTransactionManager,
                ));
            }
            Ok(())
        }
    }

    impl Drop for FakeConnection {
        fn drop(&mut self) {
            self.counters.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl RangeStore for FakeStore {
        async fn connect(&self) -> Result<Box<dyn RangeConnection>, StoreError> {
            self.counters.connects.fetch_add(1, Ordering::SeqCst);
            if self.faults.connect {
                return Err(StoreError::Connection("password authentication failed".into()));
            }
            Ok(Box::new(FakeConnection {
                ranges: self.ranges.clone(),
                faults: self.faults,
                counters: self.counters.clone(),
            }))
        }
    }

    #[async_trait]
    impl RangeConnection for FakeConnection {
        async fn query_all(&mut self) -> Result<Vec<CameraRange>, StoreError> {
            self.query().await?;
            let mut ranges = self.ranges.clone();
            ranges.sort_by_key(|r| r.id);
            Ok(ranges)
        }

        async fn query_by_id(&mut self, id: i32) -> Result<Option<CameraRange>, StoreError> {
            self.query().await?;
            Ok(self.ranges.iter().find(|r| r.id == id).cloned())
        }

        async fn close(&mut self) -> Result<(), StoreError> {
            self.counters.closes.fetch_add(1, Ordering::SeqCst);
            if self.faults.close {
                return Err(StoreError::Connection("socket already closed".into()));
            }
            Ok(())
        }
    }

    fn rolleiflex() -> CameraRange {
        CameraRange::new(1, 100000, 199999, "Rolleiflex 2.8F")
    }

    fn service(store: FakeStore) -> (LookupService, Arc<Counters>) {
        let counters = store.counters.clone();
        (LookupService::new(Arc::new(store)), counters)
    }

    #[tokio::test]
    async fn test_find_by_id_returns_stored_row() {
        let mut full = CameraRange::new(2, 200000, 299999, "Rolleicord V");
        full.year_produced = Some(1954);
        full.taking_lens = Some("Xenar 3.5/75".to_string());
        full.looking_lens = Some("Heidosmat 3.2/75".to_string());
        full.description = Some("Last Rolleicord with a film advance knob".to_string());
        let (svc, counters) = service(FakeStore::new(vec![rolleiflex(), full.clone()]));

        let result = svc.find_by_id("2").await.unwrap();
        assert!(matches!(result.data, LookupData::One(_)));
        assert!(result.meta.pagination.is_none());
        assert_eq!(result.into_ranges(), vec![full]);
        assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
        assert_eq!(counters.released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_find_by_id_absent_is_not_found() {
        let (svc, counters) = service(FakeStore::new(vec![rolleiflex()]));
        assert_eq!(svc.find_by_id("999").await, Err(LookupError::NotFound));
        assert_eq!(counters.queries.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalid_ids_never_reach_the_store() {
        let (svc, counters) = service(FakeStore::new(vec![rolleiflex()]));

        for raw in ["abc", "-1", "1.5", "", " 1", "NaN", "1e3", "99999999999999999999"] {
            assert!(
                matches!(svc.find_by_id(raw).await, Err(LookupError::Validation(_))),
                "{raw:?} should be rejected"
            );
            assert!(matches!(
                svc.find_by_serial(raw).await,
                Err(LookupError::Validation(_))
            ));
        }
        assert_eq!(counters.connects.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_id_beyond_key_space_is_not_found_without_query() {
        let (svc, counters) = service(FakeStore::new(vec![rolleiflex()]));
        assert_eq!(svc.find_by_id("2147483648").await, Err(LookupError::NotFound));
        assert_eq!(counters.connects.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_list_all_pagination() {
        let ranges = vec![
            CameraRange::new(3, 300000, 399999, "Rolleiflex 3.5F"),
            rolleiflex(),
            CameraRange::new(2, 200000, 299999, "Rolleicord V"),
        ];
        let (svc, _) = service(FakeStore::new(ranges));

        let result = svc.list_all().await.unwrap();
        let pagination = result.meta.pagination.clone().unwrap();
        assert_eq!(pagination.total, result.entries().len());
        assert_eq!(pagination.total, 3);
        assert_eq!(pagination.page, 1);
        assert_eq!(pagination.page_size, 3);
        assert_eq!(pagination.page_count, 1);
        let ids: Vec<i32> = result.entries().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_list_all_empty_table() {
        let (svc, _) = service(FakeStore::new(Vec::new()));
        let result = svc.list_all().await.unwrap();
        let pagination = result.meta.pagination.unwrap();
        assert_eq!(pagination.total, 0);
        assert_eq!(pagination.page_count, 1);
    }

    #[tokio::test]
    async fn test_mutations_rejected_without_store_calls() {
        let (svc, counters) = service(FakeStore::new(vec![rolleiflex()]));
        let payload = serde_json::json!({"data": {"model_name": "Rolleiflex SL66"}});

        assert_eq!(
            svc.create(&payload),
            Err(LookupError::MethodNotAllowed(Mutation::Create))
        );
        assert_eq!(
            svc.update("1", &payload),
            Err(LookupError::MethodNotAllowed(Mutation::Update))
        );
        assert_eq!(
            svc.delete("abc"),
            Err(LookupError::MethodNotAllowed(Mutation::Delete))
        );
        assert_eq!(counters.connects.load(Ordering::SeqCst), 0);

        assert_eq!(svc.list_all().await.unwrap().entries().len(), 1);
    }

    #[tokio::test]
    async fn test_close_failure_never_changes_outcome() {
        let faults = Faults {
            close: true,
            ..Faults::default()
        };
        let (svc, counters) = service(FakeStore::new(vec![rolleiflex()]).with_faults(faults));

        assert_eq!(svc.find_by_id("1").await.unwrap().into_ranges(), vec![rolleiflex()]);
        assert_eq!(svc.find_by_id("999").await, Err(LookupError::NotFound));
        assert_eq!(svc.list_all().await.unwrap().entries().len(), 1);
        assert_eq!(counters.closes.load(Ordering::SeqCst), 3);

        let faults = Faults {
            close: true,
            query: true,
            ..Faults::default()
        };
        let (svc, _) = service(FakeStore::new(vec![rolleiflex()]).with_faults(faults));
        assert_eq!(svc.find_by_id("1").await, Err(LookupError::Upstream));
    }

    #[tokio::test]
    async fn test_connection_failure_is_opaque() {
        let faults = Faults {
            connect: true,
            ..Faults::default()
        };
        let (svc, counters) = service(FakeStore::new(vec![rolleiflex()]).with_faults(faults));

        let err = svc.list_all().await.unwrap_err();
        assert_eq!(err, LookupError::Connection);
        assert!(!err.to_string().contains("password"));
        assert_eq!(counters.queries.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_query_failure_is_upstream_and_still_closes() {
        let faults = Faults {
            query: true,
            ..Faults::default()
        };
        let (svc, counters) = service(FakeStore::new(vec![rolleiflex()]).with_faults(faults));

        assert_eq!(svc.find_by_serial("150000").await, Err(LookupError::Upstream));
        assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
        assert_eq!(counters.released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stalled_store_times_out_and_releases() {
        let faults = Faults {
            stall: true,
            ..Faults::default()
        };
        let (svc, counters) = service(FakeStore::new(vec![rolleiflex()]).with_faults(faults));
        let svc = svc.with_query_timeout(Some(Duration::from_millis(20)));

        assert_eq!(svc.list_all().await, Err(LookupError::Upstream));
        assert_eq!(counters.closes.load(Ordering::SeqCst), 0);
        assert_eq!(counters.released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_find_by_serial() {
        let ranges = vec![
            rolleiflex(),
            CameraRange::new(2, 200000, 249999, "Rolleicord V"),
        ];
        let (svc, _) = service(FakeStore::new(ranges));

        let hit = svc.find_by_serial("150000").await.unwrap();
        assert_eq!(hit.entries()[0].attributes.model_name, "Rolleiflex 2.8F");
        let edge = svc.find_by_serial("249999").await.unwrap();
        assert_eq!(edge.entries()[0].id, 2);

        assert_eq!(svc.find_by_serial("99999").await, Err(LookupError::NotFound));
        assert_eq!(svc.find_by_serial("250000").await, Err(LookupError::NotFound));
        assert_eq!(
            svc.find_by_serial("9999999999").await,
            Err(LookupError::NotFound)
        );
    }

    #[tokio::test]
    async fn test_scenario() {
        let (svc, _) = service(FakeStore::new(vec![rolleiflex()]));

        assert_eq!(svc.find_by_id("1").await.unwrap().into_ranges(), vec![rolleiflex()]);
        assert_eq!(svc.find_by_id("999").await, Err(LookupError::NotFound));
        assert!(matches!(
            svc.find_by_id("abc").await,
            Err(LookupError::Validation(_))
        ));

        let all = svc.list_all().await.unwrap();
        assert_eq!(all.entries().len(), 1);
        let pagination = all.meta.pagination.unwrap();
        assert_eq!(pagination.total, 1);
        assert_eq!(pagination.page_count, 1);
    }
}
