//! # Gesture Timers
//!
//! Two cancellable timers used while the user interacts with the tree:
//!
//! - [`HoverExpand`]: hovering a collapsed folder during a drag for long enough expands
//!   it, so nested drop targets become reachable.
//! - [`LongPress`]: holding a pointer still on a node opens its context menu.
//!
//! Both are plain state machines. The caller feeds events and passes the current
//! [`Instant`] to `poll`; nothing here sleeps, spawns or touches the store. Expanding
//! a folder is a view-state change only.

use std::time::{Duration, Instant};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingHover {
    target: Uuid,
    since: Instant,
}

#[derive(Debug, Clone)]
pub struct HoverExpand {
    delay: Duration,
    pending: Option<PendingHover>,
}

impl HoverExpand {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// The drag is over `target`. Only collapsed folders start the timer; moving to a
    /// different target restarts it, staying on the same one keeps it running.
    pub fn drag_over(&mut self, target: Uuid, is_collapsed_folder: bool, now: Instant) {
        if !is_collapsed_folder {
            self.pending = None;
            return;
        }
        match self.pending {
            Some(p) if p.target == target => {}
            _ => {
                self.pending = Some(PendingHover {
                    target,
                    since: now,
                })
            }
        }
    }

    /// The drag left the target or ended.
    pub fn leave(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Returns the folder to expand once the delay has elapsed. Fires once per hover.
    pub fn poll(&mut self, now: Instant) -> Option<Uuid> {
        let pending = self.pending?;
        if now.saturating_duration_since(pending.since) >= self.delay {
            self.pending = None;
            Some(pending.target)
        } else {
            None
        }
    }
}

/// Pointer position in screen units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    fn distance(&self, other: &Point) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Movement allowed during a press before it stops counting as "holding still".
/// Zero means any move cancels; touch clients can widen it with [`LongPress::with_slop`].
pub const DEFAULT_SLOP: f32 = 0.0;

#[derive(Debug, Clone)]
pub struct LongPress {
    delay: Duration,
    slop: f32,
    down: Option<(Point, Instant)>,
}

impl LongPress {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            slop: DEFAULT_SLOP,
            down: None,
        }
    }

    pub fn with_slop(mut self, slop: f32) -> Self {
        self.slop = slop;
        self
    }

    pub fn pointer_down(&mut self, pos: Point, now: Instant) {
        self.down = Some((pos, now));
    }

    /// Cancels the press once the pointer drifts beyond the slop.
    pub fn pointer_move(&mut self, pos: Point) {
        if let Some((start, _)) = self.down {
            if start.distance(&pos) > self.slop {
                self.down = None;
            }
        }
    }

    pub fn pointer_up(&mut self) {
        self.down = None;
    }

    /// True exactly once, when the press has been held for the delay.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.down {
            Some((_, since)) if now.saturating_duration_since(since) >= self.delay => {
                self.down = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOVER: Duration = Duration::from_millis(500);
    const PRESS: Duration = Duration::from_millis(600);

    #[test]
    fn hover_fires_after_delay_once() {
        let start = Instant::now();
        let folder = Uuid::new_v4();
        let mut hover = HoverExpand::new(HOVER);

        hover.drag_over(folder, true, start);
        assert_eq!(hover.poll(start + Duration::from_millis(499)), None);

        // Repeated drag-over events on the same folder do not restart the timer
        hover.drag_over(folder, true, start + Duration::from_millis(300));
        assert_eq!(hover.poll(start + HOVER), Some(folder));
        assert_eq!(hover.poll(start + HOVER * 2), None);
    }

    #[test]
    fn hover_cancelled_by_leave_or_target_change() {
        let start = Instant::now();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut hover = HoverExpand::new(HOVER);

        hover.drag_over(a, true, start);
        hover.leave();
        assert_eq!(hover.poll(start + HOVER), None);

        hover.drag_over(a, true, start);
        hover.drag_over(b, true, start + Duration::from_millis(400));
        assert_eq!(hover.poll(start + HOVER), None);
        assert_eq!(hover.poll(start + Duration::from_millis(900)), Some(b));
    }

    #[test]
    fn hover_ignores_files_and_open_folders() {
        let start = Instant::now();
        let mut hover = HoverExpand::new(HOVER);
        hover.drag_over(Uuid::new_v4(), false, start);
        assert!(!hover.is_pending());
        assert_eq!(hover.poll(start + HOVER), None);
    }

    #[test]
    fn long_press_fires_when_held_still() {
        let start = Instant::now();
        let mut press = LongPress::new(PRESS);

        press.pointer_down(Point::new(5.0, 5.0), start);
        press.pointer_move(Point::new(5.0, 5.0));
        assert!(!press.poll(start + Duration::from_millis(599)));
        assert!(press.poll(start + PRESS));
        assert!(!press.poll(start + PRESS * 2));
    }

    #[test]
    fn long_press_cancelled_by_move_or_release() {
        let start = Instant::now();
        let mut press = LongPress::new(PRESS);

        press.pointer_down(Point::new(0.0, 0.0), start);
        press.pointer_move(Point::new(1.0, 0.0));
        assert!(!press.poll(start + PRESS));

        press.pointer_down(Point::new(0.0, 0.0), start);
        press.pointer_up();
        assert!(!press.poll(start + PRESS));
    }

    #[test]
    fn long_press_with_slop_tolerates_jitter() {
        let start = Instant::now();
        let mut press = LongPress::new(PRESS).with_slop(10.0);

        press.pointer_down(Point::new(5.0, 5.0), start);
        press.pointer_move(Point::new(8.0, 9.0));
        assert!(press.poll(start + PRESS));

        press.pointer_down(Point::new(0.0, 0.0), start);
        press.pointer_move(Point::new(30.0, 0.0));
        assert!(!press.poll(start + PRESS));
    }
}
