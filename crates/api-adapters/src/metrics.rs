//! Prometheus counters for the social graph, exposed at `/metrics`.

use std::fmt;

use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::registry::Registry;

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct ActionLabels {
    pub action: String,
}

pub struct Metrics {
    registry: Registry,
    friend_requests: Family<ActionLabels, Counter>,
    badges_awarded: Counter,
    visits_tracked: Counter,
    reviews_created: Counter,
}

impl Metrics {
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let friend_requests = Family::<ActionLabels, Counter>::default();
        registry.register(
            "friend_requests",
            "Friend request transitions by action (sent, accepted, declined)",
            friend_requests.clone(),
        );

        let badges_awarded = Counter::default();
        registry.register("badges_awarded", "Badges newly awarded", badges_awarded.clone());

        let visits_tracked = Counter::default();
        registry.register("visits_tracked", "Tracked visits that created a row", visits_tracked.clone());

        let reviews_created = Counter::default();
        registry.register("reviews_created", "Reviews stored", reviews_created.clone());

        Self {
            registry,
            friend_requests,
            badges_awarded,
            visits_tracked,
            reviews_created,
        }
    }

    pub fn friend_request(&self, action: &str) {
        self.friend_requests
            .get_or_create(&ActionLabels { action: action.to_string() })
            .inc();
    }

    pub fn badges_awarded(&self, count: usize) {
        self.badges_awarded.inc_by(count as u64);
    }

    pub fn visit_tracked(&self) {
        self.visits_tracked.inc();
    }

    pub fn review_created(&self) {
        self.reviews_created.inc();
    }

    /// OpenMetrics text exposition of every registered metric.
    pub fn render(&self) -> Result<String, fmt::Error> {
        let mut body = String::new();
        encode(&mut body, &self.registry)?;
        Ok(body)
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
