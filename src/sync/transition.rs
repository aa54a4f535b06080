//! Pure state transition function for one paginated collection
//!
//! Given the same state and event this always produces the same result; all
//! I/O happens in the synchronizer while it executes the returned effects.

use super::{Effect, Event};
use crate::pagination::PaginationCursor;
use crate::state::PageState;
use thiserror::Error;

/// Request currently awaiting a gateway answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InFlight {
    pub generation: u64,
    /// For a load-more: how many items were loaded when it was requested.
    /// The next page goes there, ahead of any tail received since.
    pub merge_at: Option<usize>,
}

/// Everything the synchronizer tracks for one collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionState<T> {
    pub page_state: PageState<T>,
    pub cursor: PaginationCursor,
    /// Bumped for every request issued; never reused
    pub generation: u64,
    pub in_flight: Option<InFlight>,
    /// Items displaced by a fresh load, shown again if that load fails
    pub retained: Vec<T>,
}

impl<T> Default for CollectionState<T> {
    fn default() -> Self {
        Self {
            page_state: PageState::Idle,
            cursor: PaginationCursor::new(),
            generation: 0,
            in_flight: None,
            retained: Vec::new(),
        }
    }
}

impl<T> CollectionState<T> {
    /// Empty collection that keeps counting generations where `previous`
    /// left off, so answers addressed to the old collection stay stale.
    pub fn succeeding<U>(previous: &CollectionState<U>) -> Self {
        Self {
            generation: previous.generation,
            ..Self::default()
        }
    }
}

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult<T> {
    pub new_state: CollectionState<T>,
    pub effects: Vec<Effect>,
}

impl<T> TransitionResult<T> {
    pub fn new(state: CollectionState<T>) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Events the current state cannot act on. All of them mean "do nothing".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("No more pages to load")]
    NoMorePages,
    #[error("A page load is already in flight")]
    LoadInFlight,
    #[error("Collection has no loaded page")]
    NotLoaded,
    #[error("Answer for generation {0} is stale")]
    Stale(u64),
}

pub fn transition<T: Clone>(
    state: &CollectionState<T>,
    event: Event<T>,
) -> Result<TransitionResult<T>, TransitionError> {
    match event {
        // Fresh load: always allowed, supersedes anything in flight
        Event::LoadRequested { more: false } => {
            let generation = state.generation + 1;
            let retained = match &state.page_state {
                PageState::Success { items, .. } => items.clone(),
                PageState::Error { last_items, .. } => last_items.clone(),
                PageState::Idle | PageState::Loading => state.retained.clone(),
            };
            let mut cursor = state.cursor;
            cursor.reset();

            Ok(TransitionResult::new(CollectionState {
                page_state: PageState::Loading,
                cursor,
                generation,
                in_flight: Some(InFlight {
                    generation,
                    merge_at: None,
                }),
                retained,
            })
            .with_effect(Effect::Publish)
            .with_effect(Effect::fetch(cursor.next_page(), generation)))
        }

        Event::LoadRequested { more: true } => {
            if !state.cursor.can_load_more() {
                return Err(TransitionError::NoMorePages);
            }
            if state.in_flight.is_some() {
                return Err(TransitionError::LoadInFlight);
            }
            let PageState::Success { items, .. } = &state.page_state else {
                return Err(TransitionError::NotLoaded);
            };

            let generation = state.generation + 1;
            Ok(TransitionResult::new(CollectionState {
                page_state: PageState::Success {
                    items: items.clone(),
                    is_loading_more: true,
                    can_load_more: true,
                },
                cursor: state.cursor,
                generation,
                in_flight: Some(InFlight {
                    generation,
                    merge_at: Some(items.len()),
                }),
                retained: Vec::new(),
            })
            .with_effect(Effect::Publish)
            .with_effect(Effect::fetch(state.cursor.next_page(), generation)))
        }

        Event::PageLoaded { generation, page } => {
            let in_flight = current_request(state, generation)?;

            let items = match in_flight.merge_at {
                // Existing items first; server order is trusted, never re-sorted
                Some(at) => {
                    let existing = state.page_state.items();
                    let (history, tail) = existing.split_at(at.min(existing.len()));
                    let mut merged = Vec::with_capacity(existing.len() + page.items.len());
                    merged.extend_from_slice(history);
                    merged.extend(page.items);
                    merged.extend_from_slice(tail);
                    merged
                }
                None => page.items,
            };

            let mut cursor = state.cursor;
            cursor.advance(page.page, page.total_pages);

            Ok(TransitionResult::new(CollectionState {
                page_state: PageState::success(items, cursor.can_load_more()),
                cursor,
                generation: state.generation,
                in_flight: None,
                retained: Vec::new(),
            })
            .with_effect(Effect::Publish))
        }

        Event::LoadFailed {
            generation,
            message,
        } => {
            current_request(state, generation)?;

            let last_items = match &state.page_state {
                PageState::Success { items, .. } => items.clone(),
                _ => state.retained.clone(),
            };

            Ok(TransitionResult::new(CollectionState {
                page_state: PageState::Error {
                    message,
                    last_items,
                },
                cursor: state.cursor,
                generation: state.generation,
                in_flight: None,
                retained: Vec::new(),
            })
            .with_effect(Effect::Publish))
        }

        // Cancellation frees the in-flight slot but publishes nothing
        Event::Abandoned { generation } => {
            current_request(state, generation)?;
            Ok(TransitionResult::new(CollectionState {
                in_flight: None,
                ..state.clone()
            }))
        }

        Event::TailReceived { items: tail } => {
            let PageState::Success {
                items,
                is_loading_more,
                can_load_more,
            } = &state.page_state
            else {
                return Err(TransitionError::NotLoaded);
            };

            let mut items = items.clone();
            items.extend(tail);

            Ok(TransitionResult::new(CollectionState {
                page_state: PageState::Success {
                    items,
                    is_loading_more: *is_loading_more,
                    can_load_more: *can_load_more,
                },
                ..state.clone()
            })
            .with_effect(Effect::Publish))
        }
    }
}

fn current_request<T>(
    state: &CollectionState<T>,
    generation: u64,
) -> Result<InFlight, TransitionError> {
    match state.in_flight {
        Some(in_flight) if in_flight.generation == generation => Ok(in_flight),
        _ => Err(TransitionError::Stale(generation)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::Page;

    fn apply(state: &CollectionState<u32>, event: Event<u32>) -> TransitionResult<u32> {
        transition(state, event).unwrap()
    }

    fn loaded(items: Vec<u32>, page: u32, total_pages: u32) -> CollectionState<u32> {
        let requested = apply(&CollectionState::default(), Event::LoadRequested { more: false });
        let generation = requested.new_state.generation;
        apply(
            &requested.new_state,
            Event::PageLoaded {
                generation,
                page: Page::new(items, page, total_pages),
            },
        )
        .new_state
    }

    #[test]
    fn test_fresh_load_requests_page_one() {
        let result = apply(&CollectionState::default(), Event::LoadRequested { more: false });
        assert_eq!(result.new_state.page_state, PageState::Loading);
        assert_eq!(
            result.effects,
            vec![Effect::Publish, Effect::fetch(1, 1)]
        );
        assert_eq!(
            result.new_state.in_flight,
            Some(InFlight {
                generation: 1,
                merge_at: None
            })
        );
    }

    #[test]
    fn test_first_page_replaces_items() {
        let state = loaded(vec![1, 2], 1, 3);
        assert_eq!(state.page_state, PageState::success(vec![1, 2], true));
        assert_eq!(state.cursor.current_page(), 1);
        assert!(state.in_flight.is_none());
    }

    #[test]
    fn test_load_more_appends_in_order() {
        let state = loaded(vec![1, 2], 1, 3);
        let requested = apply(&state, Event::LoadRequested { more: true });
        assert!(requested.new_state.page_state.is_loading_more());
        assert_eq!(requested.new_state.page_state.items(), &[1, 2]);
        assert_eq!(requested.effects[1], Effect::fetch(2, 2));

        let done = apply(
            &requested.new_state,
            Event::PageLoaded {
                generation: 2,
                page: Page::new(vec![3, 4], 2, 3),
            },
        );
        assert_eq!(done.new_state.page_state, PageState::success(vec![1, 2, 3, 4], true));
    }

    #[test]
    fn test_load_more_on_last_page_is_rejected() {
        let state = loaded(vec![1], 1, 1);
        assert_eq!(
            transition(&state, Event::LoadRequested { more: true }).unwrap_err(),
            TransitionError::NoMorePages
        );
    }

    #[test]
    fn test_empty_collection_cannot_load_more() {
        let state = loaded(vec![], 1, 0);
        assert_eq!(state.page_state, PageState::success(vec![], false));
        assert_eq!(
            transition(&state, Event::LoadRequested { more: true }).unwrap_err(),
            TransitionError::NoMorePages
        );
    }

    #[test]
    fn test_overlapping_load_more_is_rejected() {
        let state = loaded(vec![1], 1, 3);
        let requested = apply(&state, Event::LoadRequested { more: true });
        assert_eq!(
            transition(&requested.new_state, Event::LoadRequested { more: true }).unwrap_err(),
            TransitionError::LoadInFlight
        );
    }

    #[test]
    fn test_fresh_load_supersedes_in_flight() {
        let state = loaded(vec![1], 1, 3);
        let more = apply(&state, Event::LoadRequested { more: true });
        let fresh = apply(&more.new_state, Event::LoadRequested { more: false });
        assert_eq!(fresh.new_state.generation, 3);

        // The load-more answer arrives late and is dropped
        let late = transition(
            &fresh.new_state,
            Event::PageLoaded {
                generation: 2,
                page: Page::new(vec![2], 2, 3),
            },
        );
        assert_eq!(late.unwrap_err(), TransitionError::Stale(2));
    }

    #[test]
    fn test_failure_keeps_last_items() {
        let state = loaded(vec![1, 2], 1, 3);
        let more = apply(&state, Event::LoadRequested { more: true });
        let failed = apply(
            &more.new_state,
            Event::LoadFailed {
                generation: 2,
                message: "offline".to_string(),
            },
        );
        assert_eq!(
            failed.new_state.page_state,
            PageState::Error {
                message: "offline".to_string(),
                last_items: vec![1, 2]
            }
        );
        assert_eq!(failed.effects, vec![Effect::Publish]);
    }

    #[test]
    fn test_failed_refresh_shows_previous_items() {
        let state = loaded(vec![5], 1, 1);
        let fresh = apply(&state, Event::LoadRequested { more: false });
        assert_eq!(fresh.new_state.page_state, PageState::Loading);
        let failed = apply(
            &fresh.new_state,
            Event::LoadFailed {
                generation: fresh.new_state.generation,
                message: "500".to_string(),
            },
        );
        assert_eq!(failed.new_state.page_state.items(), &[5]);
    }

    #[test]
    fn test_first_load_failure_has_no_items() {
        let fresh = apply(&CollectionState::default(), Event::LoadRequested { more: false });
        let failed = apply(
            &fresh.new_state,
            Event::LoadFailed {
                generation: 1,
                message: "boom".to_string(),
            },
        );
        assert!(failed.new_state.page_state.items().is_empty());
        assert_eq!(failed.new_state.page_state.error_message(), Some("boom"));
    }

    #[test]
    fn test_load_more_after_error_is_rejected() {
        let state = loaded(vec![1], 1, 3);
        let more = apply(&state, Event::LoadRequested { more: true });
        let failed = apply(
            &more.new_state,
            Event::LoadFailed {
                generation: 2,
                message: "x".to_string(),
            },
        );
        assert_eq!(
            transition(&failed.new_state, Event::LoadRequested { more: true }).unwrap_err(),
            TransitionError::NotLoaded
        );
    }

    #[test]
    fn test_abandoned_frees_slot_without_publishing() {
        let state = loaded(vec![1], 1, 3);
        let more = apply(&state, Event::LoadRequested { more: true });
        let abandoned = apply(&more.new_state, Event::Abandoned { generation: 2 });
        assert!(abandoned.new_state.in_flight.is_none());
        assert!(abandoned.effects.is_empty());
        assert!(transition(&abandoned.new_state, Event::LoadRequested { more: true }).is_ok());
    }

    #[test]
    fn test_tail_appends_to_success() {
        let state = loaded(vec![1], 1, 1);
        let result = apply(&state, Event::TailReceived { items: vec![2, 3] });
        assert_eq!(result.new_state.page_state, PageState::success(vec![1, 2, 3], false));
        assert_eq!(result.new_state.cursor, state.cursor);
    }

    #[test]
    fn test_tail_during_load_more_stays_after_next_page() {
        let state = loaded(vec![1], 1, 2);
        let more = apply(&state, Event::LoadRequested { more: true });
        assert_eq!(more.new_state.in_flight.unwrap().merge_at, Some(1));

        let tail = apply(&more.new_state, Event::TailReceived { items: vec![99] });
        assert!(tail.new_state.page_state.is_loading_more());
        assert_eq!(tail.new_state.page_state.items(), &[1, 99]);

        let done = apply(
            &tail.new_state,
            Event::PageLoaded {
                generation: 2,
                page: Page::new(vec![2], 2, 2),
            },
        );
        assert_eq!(done.new_state.page_state, PageState::success(vec![1, 2, 99], false));
    }

    #[test]
    fn test_tail_requires_success() {
        assert_eq!(
            transition(
                &CollectionState::<u32>::default(),
                Event::TailReceived { items: vec![1] }
            )
            .unwrap_err(),
            TransitionError::NotLoaded
        );
    }

    #[test]
    fn test_succeeding_keeps_generation() {
        let state = loaded(vec![1], 1, 1);
        let next: CollectionState<String> = CollectionState::succeeding(&state);
        assert_eq!(next.generation, state.generation);
        assert_eq!(next.page_state, PageState::Idle);
    }
}
