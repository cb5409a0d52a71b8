//! When to re-run layout.
//!
//! Structural changes mark the layout dirty. A dirty layout runs on the next
//! tick unless a node is being dragged or the post-drag cooldown is still
//! running. A forced run (reorganize) ignores the cooldown but still waits
//! for an active drag to finish.

#[derive(Debug, Clone)]
pub struct LayoutScheduler {
    dirty: bool,
    forced: bool,
    dragging: bool,
    cooldown_ms: f64,
    cooldown_until: Option<f64>,
}

impl LayoutScheduler {
    pub fn new(cooldown_ms: f64) -> Self {
        Self {
            dirty: false,
            forced: false,
            dragging: false,
            cooldown_ms,
            cooldown_until: None,
        }
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn force(&mut self) {
        self.forced = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty || self.forced
    }

    pub fn drag_started(&mut self) {
        self.dragging = true;
    }

    /// `moved` is false for clicks and cancelled drags, which leave no
    /// manual placement to protect.
    pub fn drag_ended(&mut self, now_ms: f64, moved: bool) {
        self.dragging = false;
        if moved {
            self.cooldown_until = Some(now_ms + self.cooldown_ms);
        }
    }

    pub fn should_run(&self, now_ms: f64) -> bool {
        if self.dragging {
            return false;
        }
        if self.forced {
            return true;
        }
        self.dirty && self.cooldown_until.is_none_or(|until| now_ms >= until)
    }

    pub fn ran(&mut self) {
        self.dirty = false;
        self.forced = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dirty_runs_on_next_check() {
        let mut s = LayoutScheduler::new(1000.0);
        assert!(!s.should_run(0.0));
        s.mark_dirty();
        assert!(s.should_run(0.0));
        s.ran();
        assert!(!s.should_run(1.0));
    }

    #[test]
    fn suppressed_while_dragging_and_during_cooldown() {
        let mut s = LayoutScheduler::new(1000.0);
        s.drag_started();
        s.mark_dirty();
        assert!(!s.should_run(0.0));
        s.drag_ended(100.0, true);
        assert!(!s.should_run(500.0));
        assert!(s.should_run(1100.0));
    }

    #[test]
    fn click_does_not_start_cooldown() {
        let mut s = LayoutScheduler::new(1000.0);
        s.drag_started();
        s.drag_ended(100.0, false);
        s.mark_dirty();
        assert!(s.should_run(101.0));
    }

    #[test]
    fn force_ignores_cooldown_but_not_drag() {
        let mut s = LayoutScheduler::new(1000.0);
        s.drag_started();
        s.drag_ended(0.0, true);
        s.force();
        assert!(s.should_run(10.0));
        s.drag_started();
        assert!(!s.should_run(20.0));
        s.drag_ended(30.0, true);
        assert!(s.should_run(31.0));
    }
}
