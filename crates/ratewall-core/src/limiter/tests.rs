use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{ListKind, Rejection, Verdict};
use crate::error::LimiterError;
use crate::ports::{
    CounterError, MembershipStore, PubSubError, Publisher, StoreError, WindowCounter,
};

use super::{LimiterConfig, LimiterConfigBuilder, RateLimiter};

#[derive(Default)]
struct FakeCounter {
    counts: Mutex<HashMap<String, u64>>,
    expiries: Mutex<Vec<(String, Duration)>>,
    fail: AtomicBool,
}

impl FakeCounter {
    fn count(&self, key: &str) -> Option<u64> {
        self.counts.lock().unwrap().get(key).copied()
    }

    fn check_fail(&self) -> Result<(), CounterError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(CounterError::Operation("counter down".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl WindowCounter for FakeCounter {
    async fn increment(
        &self,
        key: &str,
        _window: Duration,
        ceiling: u64,
    ) -> Result<u64, CounterError> {
        self.check_fail()?;
        let mut counts = self.counts.lock().unwrap();
        let count = counts.entry(key.to_string()).or_insert(0);
        *count += 1;
        if ceiling > 0 && *count > ceiling {
            return Err(CounterError::LimitReached);
        }
        Ok(*count)
    }

    async fn delete(&self, key: &str) -> Result<(), CounterError> {
        self.check_fail()?;
        self.counts.lock().unwrap().remove(key);
        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), CounterError> {
        self.check_fail()?;
        self.expiries.lock().unwrap().push((key.to_string(), ttl));
        Ok(())
    }
}

#[derive(Default)]
struct FakeStore {
    sets: Mutex<HashMap<String, Vec<String>>>,
    fail: AtomicBool,
}

impl FakeStore {
    fn with_set(key: &str, members: &[&str]) -> Self {
        let store = Self::default();
        store.sets.lock().unwrap().insert(
            key.to_string(),
            members.iter().map(|m| m.to_string()).collect(),
        );
        store
    }

    fn set(&self, key: &str) -> Vec<String> {
        self.sets.lock().unwrap().get(key).cloned().unwrap_or_default()
    }

    fn check_fail(&self) -> Result<(), StoreError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError::Connection("store down".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl MembershipStore for FakeStore {
    async fn members(&self, set_key: &str) -> Result<Vec<String>, StoreError> {
        self.check_fail()?;
        Ok(self.set(set_key))
    }

    async fn add(&self, set_key: &str, member: &str) -> Result<(), StoreError> {
        self.check_fail()?;
        let mut sets = self.sets.lock().unwrap();
        let set = sets.entry(set_key.to_string()).or_default();
        if !set.iter().any(|m| m == member) {
            set.push(member.to_string());
        }
        Ok(())
    }

    async fn remove(&self, set_key: &str, member: &str) -> Result<(), StoreError> {
        self.check_fail()?;
        if let Some(set) = self.sets.lock().unwrap().get_mut(set_key) {
            set.retain(|m| m != member);
        }
        Ok(())
    }
}

#[derive(Default)]
struct RecordingPublisher {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingPublisher {
    fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish(&self, channel: &str, message: &str) -> Result<(), PubSubError> {
        self.sent
            .lock()
            .unwrap()
            .push((channel.to_string(), message.to_string()));
        Ok(())
    }
}

struct Harness {
    limiter: RateLimiter,
    counter: Arc<FakeCounter>,
    store: Arc<FakeStore>,
    publisher: Arc<RecordingPublisher>,
}

fn builder() -> LimiterConfigBuilder {
    LimiterConfig::builder("api", Duration::from_secs(60))
}

async fn harness_with(builder: LimiterConfigBuilder, store: FakeStore) -> Harness {
    let counter = Arc::new(FakeCounter::default());
    let store = Arc::new(store);
    let publisher = Arc::new(RecordingPublisher::default());
    let config = builder.publisher(publisher.clone()).build().unwrap();
    let limiter = RateLimiter::new(config, counter.clone(), store.clone()).await;
    Harness {
        limiter,
        counter,
        store,
        publisher,
    }
}

async fn harness(builder: LimiterConfigBuilder) -> Harness {
    harness_with(builder, FakeStore::default()).await
}

fn strings(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_whitelist_wins_over_blocklist() {
    let h = harness(builder().block_times(1).white_list(["vip"]).block_list(["vip"])).await;

    for _ in 0..3 {
        let decision = h.limiter.check("vip").await.unwrap();
        assert_eq!(decision.attempts, 0);
        assert_eq!(decision.verdict, Verdict::Allow);
    }
    assert_eq!(h.counter.count("api:vip"), None);
}

#[tokio::test]
async fn test_blocklisted_id_skips_counter() {
    let h = harness(builder().block_list(["bad"])).await;

    let decision = h.limiter.check("bad").await.unwrap();
    assert_eq!(decision.attempts, 0);
    assert_eq!(decision.verdict, Verdict::Block(Rejection::forbidden()));
    assert_eq!(h.counter.count("api:bad"), None);
}

#[tokio::test]
async fn test_threshold_promotes_to_blocklist() {
    let h = harness(builder().block_times(3)).await;

    let first = h.limiter.check("u1").await.unwrap();
    let second = h.limiter.check("u1").await.unwrap();
    let third = h.limiter.check("u1").await.unwrap();

    assert_eq!((first.attempts, first.is_allowed()), (1, true));
    assert_eq!((second.attempts, second.is_allowed()), (2, true));
    assert_eq!(third.attempts, 3);
    assert!(third.is_blocked());

    assert_eq!(h.limiter.block_list(Some("u1")).await, strings(&["u1"]));
    assert_eq!(h.store.set("api-block"), strings(&["u1"]));
    assert_eq!(h.publisher.sent(), vec![("api".to_string(), "ab-u1".to_string())]);

    let fourth = h.limiter.check("u1").await.unwrap();
    assert_eq!(fourth.attempts, 0);
    assert!(fourth.is_blocked());
    assert_eq!(h.counter.count("api:u1"), Some(3));
}

#[tokio::test]
async fn test_timed_block_extends_counter() {
    let h = harness(builder().block_times(2).block_duration(Duration::from_secs(600))).await;

    h.limiter.check("u2").await.unwrap();
    let decision = h.limiter.check("u2").await.unwrap();
    assert_eq!(decision.attempts, 2);
    assert!(decision.is_blocked());

    assert!(h.limiter.block_list(Some("u2")).await.is_empty());
    assert_eq!(
        *h.counter.expiries.lock().unwrap(),
        vec![("api:u2".to_string(), Duration::from_secs(600))]
    );
    assert!(h.publisher.sent().is_empty());

    // Past the ceiling the counter itself refuses.
    let decision = h.limiter.check("u2").await.unwrap();
    assert_eq!(decision.attempts, 0);
    assert!(decision.is_blocked());
}

#[tokio::test]
async fn test_zero_threshold_never_blocks() {
    let h = harness(builder()).await;

    for expected in 1..=10 {
        let decision = h.limiter.check("u3").await.unwrap();
        assert_eq!(decision.attempts, expected);
        assert_eq!(decision.verdict, Verdict::Allow);
    }
}

#[tokio::test]
async fn test_counter_failure_propagates() {
    let h = harness(builder().block_times(1)).await;
    h.counter.fail.store(true, Ordering::SeqCst);

    let err = h.limiter.check("u4").await.unwrap_err();
    assert!(matches!(err, LimiterError::Counter(CounterError::Operation(_))));
    assert!(h.limiter.block_list(None).await.is_empty());
}

#[tokio::test]
async fn test_custom_handler_sees_count() {
    let h = harness(builder().block_times(5).custom_handler(|count| {
        if count >= 3 {
            Verdict::Warn(format!("{count} attempts"))
        } else {
            Verdict::Allow
        }
    }))
    .await;

    assert_eq!(h.limiter.check("u5").await.unwrap().verdict, Verdict::Allow);
    assert_eq!(h.limiter.check("u5").await.unwrap().verdict, Verdict::Allow);
    assert_eq!(
        h.limiter.check("u5").await.unwrap().verdict,
        Verdict::Warn("3 attempts".to_string())
    );
    h.limiter.check("u5").await.unwrap();
    // At the threshold the block wins over the handler.
    assert!(h.limiter.check("u5").await.unwrap().is_blocked());
}

#[tokio::test]
async fn test_custom_rejection_reported() {
    let h = harness(
        builder()
            .block_times(1)
            .rejection(Rejection::too_many_requests()),
    )
    .await;

    let decision = h.limiter.check("u6").await.unwrap();
    assert_eq!(decision.rejection(), Some(&Rejection::too_many_requests()));
}

#[tokio::test]
async fn test_duplicate_add_signals_exists() {
    let h = harness(builder()).await;

    h.limiter.add_white_list("u7", true).await.unwrap();
    let err = h.limiter.add_white_list("u7", true).await.unwrap_err();

    assert!(matches!(err, LimiterError::AlreadyExists(ListKind::White)));
    assert_eq!(err.to_string(), "whiteList exists");
    assert_eq!(h.limiter.white_list(None).await, strings(&["u7"]));
    assert_eq!(h.publisher.sent(), vec![("api".to_string(), "aw-u7".to_string())]);
}

#[tokio::test]
async fn test_seeded_id_add_signals_exists() {
    let h = harness(builder().block_list(["seed"])).await;

    let err = h.limiter.add_block_list("seed", false).await.unwrap_err();
    assert!(err.is_already_exists());
    // The store now holds the seed as well.
    assert_eq!(h.store.set("api-block"), strings(&["seed"]));
}

#[tokio::test]
async fn test_failed_add_leaves_mirror_untouched() {
    let h = harness(builder()).await;
    h.store.fail.store(true, Ordering::SeqCst);

    let err = h.limiter.add_block_list("u8", true).await.unwrap_err();
    assert!(matches!(err, LimiterError::Membership(_)));
    assert!(h.limiter.block_list(None).await.is_empty());
    assert!(h.publisher.sent().is_empty());

    h.store.fail.store(false, Ordering::SeqCst);
    h.limiter.add_block_list("u8", false).await.unwrap();
}

#[tokio::test]
async fn test_remove_block_resets_counter() {
    let h = harness(builder().block_times(2)).await;

    h.limiter.check("u9").await.unwrap();
    assert!(h.limiter.check("u9").await.unwrap().is_blocked());

    h.limiter.remove_block_list("u9", true).await.unwrap();

    assert!(h.limiter.block_list(Some("u9")).await.is_empty());
    assert!(h.store.set("api-block").is_empty());
    assert_eq!(h.counter.count("api:u9"), None);
    assert_eq!(h.publisher.sent().last().unwrap().1, "rb-u9");

    let decision = h.limiter.check("u9").await.unwrap();
    assert_eq!(decision.attempts, 1);
    assert!(decision.is_allowed());
}

#[tokio::test]
async fn test_remove_white_keeps_counter() {
    let h = harness(builder()).await;

    h.limiter.check("u10").await.unwrap();
    h.limiter.add_white_list("u10", false).await.unwrap();
    h.limiter.remove_white_list("u10", false).await.unwrap();

    assert_eq!(h.counter.count("api:u10"), Some(1));
    assert_eq!(h.limiter.check("u10").await.unwrap().attempts, 2);
}

#[tokio::test]
async fn test_remove_absent_is_noop() {
    let h = harness(builder()).await;

    h.limiter.remove_white_list("ghost", false).await.unwrap();
    h.limiter.remove_block_list("ghost", false).await.unwrap();
    assert!(h.limiter.white_list(None).await.is_empty());
}

#[tokio::test]
async fn test_remove_store_failure_propagates() {
    let h = harness(builder().white_list(["u11"])).await;
    h.store.fail.store(true, Ordering::SeqCst);

    assert!(h.limiter.remove_white_list("u11", true).await.is_err());
    assert_eq!(h.limiter.white_list(None).await, strings(&["u11"]));
    assert!(h.publisher.sent().is_empty());
}

#[tokio::test]
async fn test_add_remove_round_trip() {
    let h = harness(builder().white_list(["a"])).await;
    let before = h.limiter.white_list(None).await;

    h.limiter.add_white_list("b", false).await.unwrap();
    h.limiter.remove_white_list("b", false).await.unwrap();

    assert_eq!(h.limiter.white_list(None).await, before);
    assert!(h.limiter.white_list(Some("b")).await.is_empty());
}

#[tokio::test]
async fn test_notification_applies_without_rebroadcast() {
    let h = harness(builder()).await;

    h.limiter.apply_notification("aw-42").await.unwrap();
    h.limiter.apply_notification("ab-7").await.unwrap();

    assert_eq!(h.limiter.white_list(Some("42")).await, strings(&["42"]));
    assert_eq!(h.limiter.block_list(Some("7")).await, strings(&["7"]));
    assert!(h.publisher.sent().is_empty());

    h.limiter.apply_notification("rw-42").await.unwrap();
    h.limiter.apply_notification("rb-7").await.unwrap();
    assert!(h.limiter.white_list(None).await.is_empty());
    assert!(h.limiter.block_list(None).await.is_empty());
    assert!(h.publisher.sent().is_empty());
}

#[tokio::test]
async fn test_malformed_notifications_ignored() {
    let h = harness(builder()).await;

    for message in ["bogus", "x-y-z", "zz-1", "aw-1-2", ""] {
        h.limiter.apply_notification(message).await.unwrap();
    }
    assert!(h.limiter.white_list(None).await.is_empty());
    assert!(h.limiter.block_list(None).await.is_empty());
}

#[tokio::test]
async fn test_bootstrap_merges_seeds_with_store() {
    let store = FakeStore::with_set("api-white", &["stored", "seed"]);
    let h = harness_with(builder().white_list(["seed", "other"]), store).await;

    assert_eq!(
        h.limiter.white_list(None).await,
        strings(&["seed", "other", "stored"])
    );
    // Seeds are not written back to the store.
    assert_eq!(h.store.set("api-white"), strings(&["stored", "seed"]));
}

#[tokio::test]
async fn test_bootstrap_store_failure_uses_seeds() {
    let store = FakeStore::default();
    store.fail.store(true, Ordering::SeqCst);
    let h = harness_with(builder().block_list(["seed"]), store).await;

    assert_eq!(h.limiter.block_list(None).await, strings(&["seed"]));
}

#[tokio::test]
async fn test_storage_keys_use_app_prefix() {
    let h = harness(builder().app_prefix("shop").block_times(1)).await;

    h.limiter.check("u12").await.unwrap();

    assert_eq!(h.limiter.channel(), "shop-api");
    assert_eq!(h.counter.count("shop-api:u12"), Some(1));
    assert_eq!(h.store.set("shop-api-block"), strings(&["u12"]));
    assert_eq!(
        h.publisher.sent(),
        vec![("shop-api".to_string(), "ab-u12".to_string())]
    );
}
