/// Configuration for subscriptions created by a [`crate::Subscriber`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberConfig {
    /// Re-open a collection subscription when only its constraints change.
    ///
    /// When false, only a change of collection name re-subscribes and
    /// constraint changes leave the running listener in place.
    pub resubscribe_on_constraint_change: bool,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            resubscribe_on_constraint_change: true,
        }
    }
}
