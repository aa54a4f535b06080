//! Property-based tests for the collection state machine

use super::transition::*;
use super::*;
use crate::gateway::Page;
use crate::state::PageState;
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

/// Events addressed either to the current generation or to a nearby one
fn arb_event() -> impl Strategy<Value = (Event<u32>, bool)> {
    let items = proptest::collection::vec(0u32..100, 0..4);
    prop_oneof![
        any::<bool>().prop_map(|more| (Event::LoadRequested { more }, false)),
        (items.clone(), 0u32..6, 0u32..6, any::<bool>()).prop_map(
            |(items, page, total, current)| (
                Event::PageLoaded {
                    generation: 0,
                    page: Page::new(items, page, total),
                },
                current
            )
        ),
        any::<bool>().prop_map(|current| (
            Event::LoadFailed {
                generation: 0,
                message: "failed".to_string(),
            },
            current
        )),
        any::<bool>().prop_map(|current| (Event::Abandoned { generation: 0 }, current)),
        items.prop_map(|items| (Event::TailReceived { items }, false)),
    ]
}

/// Point an answer at the in-flight request, or at a generation that never
/// existed.
fn address(event: Event<u32>, state: &CollectionState<u32>, current: bool) -> Event<u32> {
    let generation = if current {
        state.in_flight.map_or(state.generation, |f| f.generation)
    } else {
        state.generation + 100
    };
    match event {
        Event::PageLoaded { page, .. } => Event::PageLoaded { generation, page },
        Event::LoadFailed { message, .. } => Event::LoadFailed {
            generation,
            message,
        },
        Event::Abandoned { .. } => Event::Abandoned { generation },
        other => other,
    }
}

proptest! {
    #[test]
    fn prop_invariants_hold(events in proptest::collection::vec(arb_event(), 0..40)) {
        let mut state = CollectionState::<u32>::default();

        for (event, current) in events {
            let event = address(event, &state, current);
            let Ok(result) = transition(&state, event) else {
                continue;
            };
            let next = result.new_state;

            prop_assert!(next.cursor.current_page() <= next.cursor.total_pages());
            prop_assert!(next.generation >= state.generation);

            for effect in &result.effects {
                if let Effect::Fetch { page, generation } = *effect {
                    prop_assert_eq!(generation, next.generation);
                    prop_assert_eq!(next.in_flight.map(|f| f.generation), Some(generation));
                    prop_assert!(page >= 1);
                }
            }

            if let PageState::Success { is_loading_more: false, can_load_more, .. } = &next.page_state {
                prop_assert_eq!(*can_load_more, next.cursor.can_load_more());
            }

            state = next;
        }
    }

    #[test]
    fn prop_sequential_pages_concatenate(
        pages in proptest::collection::vec(proptest::collection::vec(0u32..1000, 0..5), 1..6)
    ) {
        let total = u32::try_from(pages.len()).unwrap();
        let mut state = CollectionState::<u32>::default();
        let mut expected = Vec::new();

        for (index, items) in pages.into_iter().enumerate() {
            let more = index > 0;
            let requested = transition(&state, Event::LoadRequested { more }).unwrap();
            let Some(Effect::Fetch { page, generation }) = requested.effects.last().copied() else {
                panic!("load did not fetch");
            };
            prop_assert_eq!(page, u32::try_from(index).unwrap() + 1);

            expected.extend(items.iter().copied());
            let loaded = transition(
                &requested.new_state,
                Event::PageLoaded { generation, page: Page::new(items, page, total) },
            )
            .unwrap();
            state = loaded.new_state;
        }

        prop_assert_eq!(&state.page_state, &PageState::success(expected, false));
        prop_assert_eq!(
            transition(&state, Event::LoadRequested { more: true }).unwrap_err(),
            TransitionError::NoMorePages
        );
    }
}
