//! New-activity detection for an open ticket's comment thread.

/// Tracks comment counts across silent polls and raises a banner flag when
/// new comments arrive.
#[derive(Debug, Clone, Default)]
pub struct NewActivityDetector {
    baseline: Option<usize>,
    has_new_activity: bool,
}

impl NewActivityDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the comment count fetched by a silent poll.
    ///
    /// Returns true when this observation raised the flag. Polls skipped
    /// during an edit leave the baseline alone, so the increase is reported
    /// by the first poll after the edit ends.
    pub fn observe(&mut self, comment_count: usize) -> bool {
        let Some(baseline) = self.baseline else {
            self.baseline = Some(comment_count);
            return false;
        };

        if comment_count <= baseline {
            self.baseline = Some(comment_count);
            return false;
        }

        self.baseline = Some(comment_count);
        let raised = !self.has_new_activity;
        self.has_new_activity = true;
        raised
    }

    /// Reset the baseline after a visible reload.
    pub fn reset(&mut self, comment_count: usize) {
        self.baseline = Some(comment_count);
        self.has_new_activity = false;
    }

    /// Dismiss the banner. Returns whether it was showing.
    pub fn dismiss(&mut self) -> bool {
        std::mem::replace(&mut self.has_new_activity, false)
    }

    pub fn has_new_activity(&self) -> bool {
        self.has_new_activity
    }

    pub fn baseline(&self) -> Option<usize> {
        self.baseline
    }
}
