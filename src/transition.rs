//! Door transition table.
//!
//! Every `(current state, request)` pair maps either to a no-op or to a
//! [`Transition`]: how many relay clicks to send, which state to report
//! immediately, and what to do with the motion timer.
//!
//! The table below is the contract. Openers differ in how a press while
//! moving behaves, and the click counts are not derived from any one
//! opener's cycle.
//!
//! | current  | Open               | Close              | Stop               |
//! |----------|--------------------|--------------------|--------------------|
//! | Closed   | 1 click, Opening   | no-op              | no-op              |
//! | Opening  | no-op              | 2 clicks, Closing  | 1 click, Stopped   |
//! | Open     | no-op              | 1 click, Closing   | no-op              |
//! | Closing  | 2 clicks, Opening  | no-op              | 2 clicks, Stopped  |
//! | Stopped  | 2 clicks, Opening  | 2 clicks, Closing  | no-op              |
//!
//! # Example
//!
//! ```rust
//! use rs_garage::transition::{transition, MotionAction};
//! use rs_garage::{DoorRequest, DoorState};
//!
//! let t = transition(DoorState::Opening, DoorRequest::Close).unwrap();
//! assert_eq!(t.clicks, 2);
//! assert_eq!(t.target, DoorState::Closing);
//! assert_eq!(t.motion, MotionAction::Restart);
//!
//! assert!(transition(DoorState::Open, DoorRequest::Open).is_none());
//! ```

use crate::door::{DoorRequest, DoorState};

/// What a transition does to the motion timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MotionAction {
    /// Start timing a full travel from now.
    Restart,
    /// Cancel any travel in progress.
    Stop,
}

/// Outcome of a request that changes the door state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    /// Relay clicks to send, always at least one.
    pub clicks: u8,
    /// State reported as soon as the clicks are scheduled.
    pub target: DoorState,
    /// Motion timer handling.
    pub motion: MotionAction,
}

impl Transition {
    const fn moving(clicks: u8, target: DoorState) -> Self {
        Self {
            clicks,
            target,
            motion: MotionAction::Restart,
        }
    }

    const fn halt(clicks: u8) -> Self {
        Self {
            clicks,
            target: DoorState::Stopped,
            motion: MotionAction::Stop,
        }
    }
}

/// Look up the transition for `request` while in `current`.
///
/// Returns `None` when the request is a no-op for that state.
pub const fn transition(current: DoorState, request: DoorRequest) -> Option<Transition> {
    use DoorRequest as R;
    use DoorState as S;

    match (current, request) {
        (S::Closed, R::Open) => Some(Transition::moving(1, S::Opening)),
        (S::Opening, R::Close) => Some(Transition::moving(2, S::Closing)),
        (S::Opening, R::Stop) => Some(Transition::halt(1)),
        (S::Open, R::Close) => Some(Transition::moving(1, S::Closing)),
        (S::Closing, R::Open) => Some(Transition::moving(2, S::Opening)),
        (S::Closing, R::Stop) => Some(Transition::halt(2)),
        (S::Stopped, R::Open) => Some(Transition::moving(2, S::Opening)),
        (S::Stopped, R::Close) => Some(Transition::moving(2, S::Closing)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATES: [DoorState; 5] = [
        DoorState::Closed,
        DoorState::Opening,
        DoorState::Open,
        DoorState::Closing,
        DoorState::Stopped,
    ];

    const REQUESTS: [DoorRequest; 3] = [DoorRequest::Open, DoorRequest::Close, DoorRequest::Stop];

    #[test]
    fn closed_only_opens() {
        let t = transition(DoorState::Closed, DoorRequest::Open).unwrap();
        assert_eq!((t.clicks, t.target), (1, DoorState::Opening));
        assert!(transition(DoorState::Closed, DoorRequest::Close).is_none());
        assert!(transition(DoorState::Closed, DoorRequest::Stop).is_none());
    }

    #[test]
    fn closing_reverses_with_two_clicks() {
        let t = transition(DoorState::Closing, DoorRequest::Open).unwrap();
        assert_eq!((t.clicks, t.target), (2, DoorState::Opening));
        assert_eq!(t.motion, MotionAction::Restart);
    }

    #[test]
    fn stop_requests_cancel_motion() {
        for state in STATES {
            if let Some(t) = transition(state, DoorRequest::Stop) {
                assert_eq!(t.target, DoorState::Stopped);
                assert_eq!(t.motion, MotionAction::Stop);
            }
        }
    }

    #[test]
    fn requests_for_current_direction_are_noops() {
        assert!(transition(DoorState::Opening, DoorRequest::Open).is_none());
        assert!(transition(DoorState::Closing, DoorRequest::Close).is_none());
        assert!(transition(DoorState::Open, DoorRequest::Open).is_none());
        assert!(transition(DoorState::Stopped, DoorRequest::Stop).is_none());
    }

    #[test]
    fn every_transition_clicks_at_most_twice() {
        for state in STATES {
            for request in REQUESTS {
                if let Some(t) = transition(state, request) {
                    assert!((1..=2).contains(&t.clicks), "{state:?} {request:?}");
                    assert_ne!(t.target, state);
                }
            }
        }
    }

    #[test]
    fn unknown_state_has_no_transitions() {
        for request in REQUESTS {
            assert!(transition(DoorState::Unknown, request).is_none());
        }
    }
}
