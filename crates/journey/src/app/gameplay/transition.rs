use super::doors::Door;

pub(crate) const FADE_SECONDS: f32 = 0.35;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TransitionState {
    Steady,
    Transitioning { remaining: f32, door: Door },
}

/// Runs one door transition at a time; a started transition cannot be
/// cancelled.
#[derive(Debug, Clone)]
pub(crate) struct TransitionController {
    state: TransitionState,
}

impl Default for TransitionController {
    fn default() -> Self {
        Self {
            state: TransitionState::Steady,
        }
    }
}

impl TransitionController {
    pub(crate) fn state(&self) -> &TransitionState {
        &self.state
    }

    pub(crate) fn is_transitioning(&self) -> bool {
        matches!(self.state, TransitionState::Transitioning { .. })
    }

    /// Starts a transition through `door`. Ignored while one is running.
    pub(crate) fn request(&mut self, door: &Door) -> bool {
        if self.is_transitioning() {
            return false;
        }
        self.state = TransitionState::Transitioning {
            remaining: FADE_SECONDS,
            door: door.clone(),
        };
        true
    }

    /// Advances the fade; yields the door once the fade has finished.
    pub(crate) fn tick(&mut self, dt: f32) -> Option<Door> {
        let TransitionState::Transitioning { remaining, .. } = &mut self.state else {
            return None;
        };
        *remaining -= dt;
        if *remaining > 0.0 {
            return None;
        }
        match std::mem::replace(&mut self.state, TransitionState::Steady) {
            TransitionState::Transitioning { door, .. } => Some(door),
            TransitionState::Steady => None,
        }
    }

    /// Opacity of the black fade overlay.
    pub(crate) fn fade_alpha(&self) -> u8 {
        match &self.state {
            TransitionState::Steady => 0,
            TransitionState::Transitioning { remaining, .. } => {
                let progress = 1.0 - (remaining / FADE_SECONDS).clamp(0.0, 1.0);
                (progress * 255.0).round() as u8
            }
        }
    }
}
