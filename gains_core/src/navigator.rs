//! Directional input to navigation intents.
//!
//! A horizontal swipe or an arrow key becomes "advance" or "retreat". The
//! navigator keeps only the coordinates of the gesture in progress; nothing
//! carries over from one gesture to the next.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavIntent {
    Advance,
    Retreat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavKey {
    ArrowLeft,
    ArrowRight,
    Other,
}

/// Anything that can be stepped forwards and backwards
pub trait Navigable {
    fn advance(&mut self);
    fn retreat(&mut self);

    fn navigate(&mut self, intent: NavIntent) {
        match intent {
            NavIntent::Advance => self.advance(),
            NavIntent::Retreat => self.retreat(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct SwipeNavigator {
    threshold_px: f64,
    start_x: Option<f64>,
    end_x: Option<f64>,
}

impl SwipeNavigator {
    pub fn new(threshold_px: f64) -> Self {
        Self {
            threshold_px,
            start_x: None,
            end_x: None,
        }
    }

    pub fn threshold_px(&self) -> f64 {
        self.threshold_px
    }

    pub fn touch_start(&mut self, x: f64) {
        self.start_x = Some(x);
        self.end_x = None;
    }

    pub fn touch_move(&mut self, x: f64) {
        self.end_x = Some(x);
    }

    /// Finish the gesture. A finger moving left advances, right retreats;
    /// a tap without movement or a short swipe does nothing.
    pub fn touch_end(&mut self) -> Option<NavIntent> {
        let (start, end) = (self.start_x.take(), self.end_x.take());
        let delta = start? - end?;

        if delta.abs() <= self.threshold_px {
            return None;
        }
        if delta > 0.0 {
            Some(NavIntent::Advance)
        } else {
            Some(NavIntent::Retreat)
        }
    }

    pub fn key(&self, key: NavKey) -> Option<NavIntent> {
        match key {
            NavKey::ArrowRight => Some(NavIntent::Advance),
            NavKey::ArrowLeft => Some(NavIntent::Retreat),
            NavKey::Other => None,
        }
    }
}

/// A bounded row of pages, e.g. the top-level home/progress screens
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageCarousel {
    index: usize,
    count: usize,
}

impl PageCarousel {
    pub fn new(count: usize, initial: usize) -> Self {
        Self {
            index: initial.min(count.saturating_sub(1)),
            count,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

impl Navigable for PageCarousel {
    fn advance(&mut self) {
        if self.index + 1 < self.count {
            self.index += 1;
        }
    }

    fn retreat(&mut self) {
        self.index = self.index.saturating_sub(1);
    }
}
