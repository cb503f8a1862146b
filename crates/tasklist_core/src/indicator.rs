//! Cosmetic "Saving…" / "Saved" status indicator.
//!
//! Each save restarts a short delay; the label flips to "Saved" once the
//! delay elapses without another save. Time is pushed in through `tick`, so
//! no timer thread is involved.

/// Delay between "Saving…" and "Saved".
pub const SAVED_DELAY_MS: i64 = 350;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SaveIndicator {
    #[default]
    Idle,
    Saving { settles_at_ms: i64 },
    Saved,
    /// Last write failed; holds the warning shown to the user.
    Failed(String),
}

impl SaveIndicator {
    /// Starts (or restarts) the saving phase; any pending deadline is replaced.
    pub fn mark_saving(&mut self, now_ms: i64) {
        *self = Self::Saving {
            settles_at_ms: now_ms + SAVED_DELAY_MS,
        };
    }

    pub fn mark_failed(&mut self, message: impl Into<String>) {
        *self = Self::Failed(message.into());
    }

    /// Advances time. Returns `true` when the label changed.
    pub fn tick(&mut self, now_ms: i64) -> bool {
        match self {
            Self::Saving { settles_at_ms } if now_ms >= *settles_at_ms => {
                *self = Self::Saved;
                true
            }
            _ => false,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Idle => "",
            Self::Saving { .. } => "Saving…",
            Self::Saved => "Saved",
            Self::Failed(message) => message.as_str(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{SaveIndicator, SAVED_DELAY_MS};

    #[test]
    fn settles_after_delay() {
        let mut indicator = SaveIndicator::default();
        indicator.mark_saving(1_000);
        assert_eq!(indicator.label(), "Saving…");
        assert!(!indicator.tick(1_000 + SAVED_DELAY_MS - 1));
        assert!(indicator.tick(1_000 + SAVED_DELAY_MS));
        assert_eq!(indicator, SaveIndicator::Saved);
    }

    #[test]
    fn rapid_saves_replace_pending_deadline() {
        let mut indicator = SaveIndicator::default();
        indicator.mark_saving(0);
        indicator.mark_saving(300);
        assert!(!indicator.tick(SAVED_DELAY_MS));
        assert_eq!(indicator.label(), "Saving…");
        assert!(indicator.tick(300 + SAVED_DELAY_MS));
    }

    #[test]
    fn failure_is_sticky_until_next_save() {
        let mut indicator = SaveIndicator::default();
        indicator.mark_failed("Not saved");
        assert!(!indicator.tick(10_000));
        assert_eq!(indicator.label(), "Not saved");
        indicator.mark_saving(10_000);
        assert_eq!(indicator.label(), "Saving…");
    }
}
