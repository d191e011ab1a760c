//! Query Cache
//!
//! Keeps pricing and enrollment answers per course for a fixed time so that
//! several buttons on one page share a single fetch.

use std::cell::RefCell;
use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use course_checkout_core::{CourseId, CoursePricing, EnrollmentQuery, EnrollmentStatus, PricingQuery, Result};

type Clock = Box<dyn Fn() -> DateTime<Utc>>;
type InvalidationListener = Box<dyn Fn(&CourseId)>;

struct Entry<T> {
    value: T,
    fetched_at: DateTime<Utc>,
}

/// TTL cache in front of a pricing and/or enrollment source
pub struct CachedQuery<Q> {
    inner: Q,
    ttl: chrono::Duration,
    clock: Clock,
    pricing: RefCell<HashMap<CourseId, Entry<CoursePricing>>>,
    enrollment: RefCell<HashMap<CourseId, Entry<EnrollmentStatus>>>,
    listeners: RefCell<Vec<InvalidationListener>>,
}

impl<Q> CachedQuery<Q> {
    pub fn new(inner: Q, ttl: Duration) -> Self {
        Self {
            inner,
            ttl: chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::days(365)),
            clock: Box::new(Utc::now),
            pricing: RefCell::new(HashMap::new()),
            enrollment: RefCell::new(HashMap::new()),
            listeners: RefCell::new(Vec::new()),
        }
    }

    /// Replace the time source (for testing expiry)
    #[must_use]
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub const fn inner(&self) -> &Q {
        &self.inner
    }

    /// Called after every `invalidate`, so each consumer can refetch
    pub fn on_invalidate(&self, listener: impl Fn(&CourseId) + 'static) {
        self.listeners.borrow_mut().push(Box::new(listener));
    }

    /// Forget everything cached for `course` and tell the listeners
    pub fn invalidate(&self, course: &CourseId) {
        tracing::debug!(course_id = %course, "Invalidating cached queries");
        self.pricing.borrow_mut().remove(course);
        self.enrollment.borrow_mut().remove(course);

        for listener in self.listeners.borrow().iter() {
            listener(course);
        }
    }

    fn fresh<T: Clone>(&self, map: &RefCell<HashMap<CourseId, Entry<T>>>, course: &CourseId) -> Option<T> {
        let now = (self.clock)();
        map.borrow()
            .get(course)
            .filter(|entry| now - entry.fetched_at < self.ttl)
            .map(|entry| entry.value.clone())
    }

    fn store<T>(&self, map: &RefCell<HashMap<CourseId, Entry<T>>>, course: &CourseId, value: T) {
        map.borrow_mut().insert(
            course.clone(),
            Entry {
                value,
                fetched_at: (self.clock)(),
            },
        );
    }
}

#[async_trait(?Send)]
impl<Q: PricingQuery> PricingQuery for CachedQuery<Q> {
    async fn pricing(&self, course: &CourseId) -> Result<CoursePricing> {
        if let Some(hit) = self.fresh(&self.pricing, course) {
            return Ok(hit);
        }

        let value = self.inner.pricing(course).await?;
        self.store(&self.pricing, course, value.clone());
        Ok(value)
    }
}

#[async_trait(?Send)]
impl<Q: EnrollmentQuery> EnrollmentQuery for CachedQuery<Q> {
    async fn enrollment(&self, course: &CourseId) -> Result<EnrollmentStatus> {
        if let Some(hit) = self.fresh(&self.enrollment, course) {
            return Ok(hit);
        }

        let value = self.inner.enrollment(course).await?;
        self.store(&self.enrollment, course, value.clone());
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    use course_checkout_core::mock::StaticQueries;
    use rust_decimal_macros::dec;

    fn queries() -> StaticQueries {
        StaticQueries::new(
            CoursePricing {
                full_price: dec!(59),
                regional_price: dec!(29),
                is_eligible_for_discount: false,
            },
            EnrollmentStatus::default(),
        )
    }

    #[tokio::test]
    async fn test_hits_within_ttl() {
        let cache = CachedQuery::new(queries(), Duration::from_secs(60));
        let sql = CourseId::new("sql");

        let first = cache.pricing(&sql).await.unwrap();
        let second = cache.pricing(&sql).await.unwrap();
        cache.enrollment(&sql).await.unwrap();
        cache.enrollment(&sql).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(cache.inner().calls(), 2);
    }

    #[tokio::test]
    async fn test_expiry_and_invalidate() {
        let now = Rc::new(Cell::new(Utc::now()));
        let clock = now.clone();
        let cache = CachedQuery::new(queries(), Duration::from_secs(60)).with_clock(move || clock.get());
        let sql = CourseId::new("sql");

        cache.pricing(&sql).await.unwrap();
        now.set(now.get() + chrono::Duration::seconds(61));
        cache.pricing(&sql).await.unwrap();
        assert_eq!(cache.inner().calls(), 2);

        cache.invalidate(&sql);
        cache.pricing(&sql).await.unwrap();
        assert_eq!(cache.inner().calls(), 3);
    }

    #[tokio::test]
    async fn test_courses_cached_separately() {
        let cache = CachedQuery::new(queries(), Duration::from_secs(60));

        cache.pricing(&CourseId::new("sql")).await.unwrap();
        cache.pricing(&CourseId::new("rust")).await.unwrap();

        assert_eq!(cache.inner().calls(), 2);
    }

    #[test]
    fn test_invalidate_notifies_every_listener() {
        let cache = CachedQuery::new(queries(), Duration::from_secs(300));
        let seen = Rc::new(RefCell::new(Vec::new()));
        for name in ["main", "top-nav"] {
            let sink = seen.clone();
            cache.on_invalidate(move |course| sink.borrow_mut().push(format!("{name}:{course}")));
        }

        cache.invalidate(&CourseId::new("sql"));

        assert_eq!(*seen.borrow(), vec!["main:sql".to_string(), "top-nav:sql".to_string()]);
    }
}
