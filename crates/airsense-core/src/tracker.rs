//! Category transition tracking and notification gating.
//!
//! One [`TransitionTracker`] belongs to one reading stream. It remembers the
//! last category it saw and when each category was last recorded, and
//! decides whether a new classification deserves a user-facing alert.
//!
//! # Rules
//!
//! | State | Incoming | Decision |
//! |-------|----------|----------|
//! | Uninitialized | any | silent, `Initial`; category recorded |
//! | Tracking | same category | silent, `Same`; nothing changes |
//! | Tracking | category recorded within the window | silent; last-seen advances |
//! | Tracking | other change | notify; category recorded |
//!
//! # Example
//!
//! ```
//! use airsense_core::tracker::{AlertContext, TransitionTracker};
//! use airsense_types::{Category, Direction};
//! use time::{Duration, OffsetDateTime};
//!
//! let mut tracker = TransitionTracker::default();
//! let t0 = OffsetDateTime::UNIX_EPOCH;
//!
//! let first = tracker.observe(Category::Good, t0, AlertContext::default());
//! assert!(!first.should_notify);
//! assert_eq!(first.direction, Direction::Initial);
//!
//! let second = tracker.observe(Category::Moderate, t0 + Duration::minutes(1), AlertContext::default());
//! assert!(second.should_notify);
//! assert_eq!(second.direction, Direction::Worsened);
//!
//! // Back to Good one minute later: Good was recorded under ten minutes ago.
//! let third = tracker.observe(Category::Good, t0 + Duration::minutes(2), AlertContext::default());
//! assert!(!third.should_notify);
//! ```

use time::{Duration, OffsetDateTime};
use tracing::{debug, info, warn};

use airsense_types::{Category, Direction, NotificationDecision, PollutantVector};

use crate::message::format_alert;

/// Default hysteresis window.
pub const DEFAULT_SUPPRESSION_WINDOW: Duration = Duration::minutes(10);

/// Mutable per-stream record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransitionState {
    last_seen: Option<Category>,
    last_notified: Option<(Category, OffsetDateTime)>,
    recorded_at: [Option<OffsetDateTime>; Category::COUNT],
}

impl TransitionState {
    /// Whether a category has been recorded since the last reset.
    #[must_use]
    pub fn is_tracking(&self) -> bool {
        self.last_seen.is_some()
    }

    /// The most recently observed category.
    #[must_use]
    pub fn last_seen(&self) -> Option<Category> {
        self.last_seen
    }

    /// The most recent notification and when it was raised.
    #[must_use]
    pub fn last_notified(&self) -> Option<(Category, OffsetDateTime)> {
        self.last_notified
    }

    /// When a category was last recorded (initial reading or notification).
    #[must_use]
    pub fn recorded_at(&self, category: Category) -> Option<OffsetDateTime> {
        self.recorded_at[category.rank() as usize]
    }

    fn record(&mut self, category: Category, at: OffsetDateTime) {
        self.recorded_at[category.rank() as usize] = Some(at);
    }
}

/// Extra detail folded into a notification message.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlertContext<'a> {
    /// Where the reading was taken.
    pub location: Option<&'a str>,
    /// Pollutant snapshot of the reading.
    pub pollutants: Option<&'a PollutantVector>,
}

/// Stateful gate between classification results and notifications.
#[derive(Debug, Clone)]
pub struct TransitionTracker {
    state: TransitionState,
    window: Duration,
    notifications_enabled: bool,
}

impl Default for TransitionTracker {
    fn default() -> Self {
        Self::new(DEFAULT_SUPPRESSION_WINDOW)
    }
}

impl TransitionTracker {
    /// Create a tracker with the given suppression window.
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            state: TransitionState::default(),
            window,
            notifications_enabled: true,
        }
    }

    /// Enable or disable notifications. A disabled tracker still tracks.
    #[must_use]
    pub fn with_notifications(mut self, enabled: bool) -> Self {
        self.notifications_enabled = enabled;
        self
    }

    /// Change the suppression window, keeping every other setting.
    #[must_use]
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// The suppression window.
    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Whether changes may raise notifications.
    #[must_use]
    pub fn notifications_enabled(&self) -> bool {
        self.notifications_enabled
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &TransitionState {
        &self.state
    }

    /// Feed one classification into the tracker.
    pub fn observe(
        &mut self,
        category: Category,
        now: OffsetDateTime,
        context: AlertContext<'_>,
    ) -> NotificationDecision {
        let Some(previous) = self.state.last_seen else {
            debug!(category = %category, "First category on stream");
            self.state.last_seen = Some(category);
            self.state.record(category, now);
            return NotificationDecision::silent(Direction::Initial, category, None);
        };

        let direction = Direction::between(previous, category);
        if direction == Direction::Same {
            return NotificationDecision::silent(direction, category, Some(previous));
        }

        self.state.last_seen = Some(category);

        if let Some(recorded) = self.state.recorded_at(category)
            && now - recorded < self.window
        {
            warn!(
                from = %previous,
                to = %category,
                since_last = %(now - recorded),
                "Suppressing repeat alert inside hysteresis window"
            );
            return NotificationDecision::silent(direction, category, Some(previous));
        }

        if !self.notifications_enabled {
            debug!(from = %previous, to = %category, "Notifications disabled");
            return NotificationDecision::silent(direction, category, Some(previous));
        }

        let message = format_alert(category, Some(previous), context.location, context.pollutants);
        self.state.record(category, now);
        self.state.last_notified = Some((category, now));
        info!(from = %previous, to = %category, %direction, "Air quality category changed");

        NotificationDecision::notify(direction, category, previous, message)
    }

    /// Forget everything and return to the uninitialized state.
    pub fn reset(&mut self) {
        self.state = TransitionState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use airsense_types::Pollutant;
    use proptest::prelude::*;

    fn t(minutes: i64) -> OffsetDateTime {
        OffsetDateTime::UNIX_EPOCH + Duration::minutes(minutes)
    }

    fn observe(tracker: &mut TransitionTracker, category: Category, at: OffsetDateTime) -> NotificationDecision {
        tracker.observe(category, at, AlertContext::default())
    }

    #[test]
    fn test_first_observation_is_silent_initial() {
        for category in Category::ALL {
            let mut tracker = TransitionTracker::default();
            let decision = observe(&mut tracker, category, t(0));
            assert!(!decision.should_notify);
            assert_eq!(decision.direction, Direction::Initial);
            assert_eq!(decision.previous, None);
            assert!(decision.message.is_none());
            assert!(tracker.state().is_tracking());
            assert_eq!(tracker.state().last_notified(), None);
        }
    }

    #[test]
    fn test_same_category_is_silent_and_changes_nothing() {
        let mut tracker = TransitionTracker::default();
        observe(&mut tracker, Category::Moderate, t(0));
        let before = tracker.state().clone();

        let decision = observe(&mut tracker, Category::Moderate, t(30));
        assert!(!decision.should_notify);
        assert_eq!(decision.direction, Direction::Same);
        assert_eq!(tracker.state(), &before);
    }

    #[test]
    fn test_change_notifies_with_direction() {
        let mut tracker = TransitionTracker::default();
        observe(&mut tracker, Category::Good, t(0));

        let worse = observe(&mut tracker, Category::VeryUnhealthy, t(1));
        assert!(worse.should_notify);
        assert_eq!(worse.direction, Direction::Worsened);
        assert_eq!(worse.previous, Some(Category::Good));
        assert_eq!(
            worse.message.as_deref(),
            Some("Air quality declined from Good to Very Unhealthy. Avoid outdoor activity.")
        );

        let better = observe(&mut tracker, Category::Moderate, t(2));
        assert!(better.should_notify);
        assert_eq!(better.direction, Direction::Improved);
        assert_eq!(
            tracker.state().last_notified(),
            Some((Category::Moderate, t(2)))
        );
    }

    #[test]
    fn test_return_within_window_is_suppressed() {
        let mut tracker = TransitionTracker::default();
        observe(&mut tracker, Category::Good, t(0));
        assert!(observe(&mut tracker, Category::Moderate, t(2)).should_notify);

        let back = observe(&mut tracker, Category::Good, t(5));
        assert!(!back.should_notify);
        assert_eq!(back.direction, Direction::Improved);
        assert_eq!(tracker.state().last_seen(), Some(Category::Good));

        // Oscillating straight back to Moderate is suppressed too.
        let again = observe(&mut tracker, Category::Moderate, t(6));
        assert!(!again.should_notify);
        assert_eq!(again.direction, Direction::Worsened);
    }

    #[test]
    fn test_return_after_window_notifies() {
        let mut tracker = TransitionTracker::default();
        observe(&mut tracker, Category::Good, t(0));
        observe(&mut tracker, Category::Moderate, t(1));

        let back = observe(&mut tracker, Category::Good, t(10));
        assert!(back.should_notify);
        assert_eq!(back.direction, Direction::Improved);
    }

    #[test]
    fn test_window_boundary_is_exclusive() {
        let mut tracker = TransitionTracker::default();
        observe(&mut tracker, Category::Good, t(0));
        observe(&mut tracker, Category::Moderate, t(0));
        // Exactly ten minutes after Good was recorded.
        assert!(observe(&mut tracker, Category::Good, t(10)).should_notify);
    }

    #[test]
    fn test_new_category_inside_window_notifies() {
        let mut tracker = TransitionTracker::default();
        observe(&mut tracker, Category::Good, t(0));
        assert!(observe(&mut tracker, Category::Moderate, t(1)).should_notify);
        assert!(observe(&mut tracker, Category::Hazardous, t(2)).should_notify);
    }

    #[test]
    fn test_custom_window() {
        let mut tracker = TransitionTracker::new(Duration::seconds(30));
        observe(&mut tracker, Category::Good, t(0));
        observe(&mut tracker, Category::Moderate, t(0));
        assert!(observe(&mut tracker, Category::Good, t(1)).should_notify);
    }

    #[test]
    fn test_with_window_keeps_notification_setting() {
        let tracker = TransitionTracker::default()
            .with_notifications(false)
            .with_window(Duration::minutes(5));
        assert_eq!(tracker.window(), Duration::minutes(5));
        assert!(!tracker.notifications_enabled());
    }

    #[test]
    fn test_multi_step_return_within_window_is_suppressed() {
        // Suppression is per category: Good was recorded at t(0), so coming
        // back to it inside the window stays silent even though the last
        // alert was for a different category.
        let mut tracker = TransitionTracker::default();
        observe(&mut tracker, Category::Good, t(0));
        assert!(observe(&mut tracker, Category::Moderate, t(2)).should_notify);
        assert!(observe(&mut tracker, Category::VeryUnhealthy, t(4)).should_notify);

        let back = observe(&mut tracker, Category::Good, t(6));
        assert!(!back.should_notify);
        assert_eq!(back.direction, Direction::Improved);
        assert_eq!(back.previous, Some(Category::VeryUnhealthy));
        assert_eq!(tracker.state().last_seen(), Some(Category::Good));
        assert_eq!(
            tracker.state().last_notified(),
            Some((Category::VeryUnhealthy, t(4)))
        );

        // Once the window has passed since Good was recorded, it alerts again.
        observe(&mut tracker, Category::Moderate, t(7));
        assert!(observe(&mut tracker, Category::Good, t(11)).should_notify);
    }

    #[test]
    fn test_disabled_notifications_still_track() {
        let mut tracker = TransitionTracker::default().with_notifications(false);
        observe(&mut tracker, Category::Good, t(0));
        let decision = observe(&mut tracker, Category::Hazardous, t(20));
        assert!(!decision.should_notify);
        assert_eq!(decision.direction, Direction::Worsened);
        assert_eq!(tracker.state().last_seen(), Some(Category::Hazardous));
        assert_eq!(tracker.state().last_notified(), None);
    }

    #[test]
    fn test_reset_returns_to_uninitialized() {
        let mut tracker = TransitionTracker::default();
        observe(&mut tracker, Category::Good, t(0));
        observe(&mut tracker, Category::Hazardous, t(1));
        tracker.reset();
        assert!(!tracker.state().is_tracking());
        assert_eq!(tracker.state().recorded_at(Category::Good), None);

        let decision = observe(&mut tracker, Category::Moderate, t(2));
        assert_eq!(decision.direction, Direction::Initial);
        assert!(!decision.should_notify);
    }

    #[test]
    fn test_message_uses_context() {
        let mut tracker = TransitionTracker::default();
        let v = PollutantVector::new().with(Pollutant::Pm25, 80.0);
        tracker.observe(Category::Good, t(0), AlertContext::default());
        let decision = tracker.observe(
            Category::UnhealthyForSensitive,
            t(1),
            AlertContext {
                location: Some("Surabaya"),
                pollutants: Some(&v),
            },
        );
        let message = decision.message.unwrap();
        assert!(message.starts_with("Air quality in Surabaya declined from Good to"));
        assert!(message.ends_with("Readings: PM2.5 80.0 µg/m³."));
    }

    proptest! {
        #[test]
        fn prop_no_repeat_alert_inside_window(
            steps in proptest::collection::vec((0u8..5, 0i64..15), 1..40)
        ) {
            let mut tracker = TransitionTracker::default();
            let mut now = OffsetDateTime::UNIX_EPOCH;
            let mut alerts: Vec<(Category, OffsetDateTime)> = Vec::new();

            for (rank, gap) in steps {
                now += Duration::minutes(gap);
                let category = Category::from_rank(rank).unwrap();
                let decision = observe(&mut tracker, category, now);
                if decision.should_notify {
                    prop_assert!(decision.direction.is_change());
                    if let Some((_, at)) = alerts.iter().rev().find(|(c, _)| *c == category) {
                        prop_assert!(now - *at >= DEFAULT_SUPPRESSION_WINDOW);
                    }
                    alerts.push((category, now));
                }
                prop_assert_eq!(tracker.state().last_seen(), Some(category));
            }
        }
    }
}
