// ==========================================
// 配送计划后端 - 显式 TTL 缓存
// ==========================================
// 职责: 可注入的键值缓存（会话身份、商品计数）
// 实现: moka 同步缓存，写入后按 TTL 过期
// 约束: 不提供进程级全局实例，由调用方创建并注入
// ==========================================

use moka::sync::Cache;
use std::hash::Hash;
use std::time::Duration;

pub struct TtlCache<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    ttl: Duration,
    inner: Cache<K, V>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(ttl: Duration) -> Self {
        let inner = Cache::builder().time_to_live(ttl).build();
        Self { ttl, inner }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// 读取未过期的值
    pub fn get(&self, key: &K) -> Option<V> {
        self.inner.get(key)
    }

    /// 写入（覆盖旧值并重置过期时间）
    pub fn insert(&self, key: K, value: V) {
        self.inner.insert(key, value);
    }

    pub fn invalidate(&self, key: &K) {
        self.inner.invalidate(key);
    }

    pub fn clear(&self) {
        self.inner.invalidate_all();
    }

    /// 当前条目数（先处理挂起的过期/失效任务）
    pub fn len(&self) -> usize {
        self.inner.run_pending_tasks();
        usize::try_from(self.inner.entry_count()).unwrap_or(usize::MAX)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_after_insert() {
        let cache: TtlCache<String, i64> = TtlCache::new(Duration::from_secs(60));
        cache.insert("count:".to_string(), 42);
        assert_eq!(cache.get(&"count:".to_string()), Some(42));
        assert_eq!(cache.get(&"count:x".to_string()), None);
    }

    #[test]
    fn test_expired_entry_is_not_returned() {
        let cache: TtlCache<&'static str, i64> = TtlCache::new(Duration::from_millis(20));
        cache.insert("k", 1);
        std::thread::sleep(Duration::from_millis(60));
        assert_eq!(cache.get(&"k"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalidate_and_clear() {
        let cache: TtlCache<&'static str, i64> = TtlCache::new(Duration::from_secs(60));
        cache.insert("a", 1);
        cache.insert("b", 2);

        cache.invalidate(&"a");
        assert_eq!(cache.get(&"a"), None);
        assert_eq!(cache.get(&"b"), Some(2));
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert_eq!(cache.get(&"b"), None);
        assert!(cache.is_empty());
    }
}
