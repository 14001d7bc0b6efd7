//! Property-based tests for the App state machine and layout engine.
//!
//! Tests verify that invariants hold under arbitrary action sequences and
//! terminal sizes.

use chrono::{DateTime, Utc};
use proptest::prelude::*;
use sigil_app::{
    Action, Address, App, Availability, ColorTag, Config, DisplayMode, Line, Nav, Presence,
    layout::{self, PLACEHOLDER},
};

const CONTACTS: [&str; 5] = ["a@x", "b@x", "c@x", "d@x", "lounge@rooms"];

fn now() -> DateTime<Utc> {
    DateTime::from_timestamp(1_709_373_600, 0).unwrap_or_default()
}

/// App with `n` contacts, each with one online session.
fn app_with_online(n: usize) -> App {
    let mut app = App::new(Config::default());
    for idx in 0..n {
        let bare = format!("user{idx}@x");
        let _ = app.handle(
            Action::ContactAdded { address: Address::bare(&bare), color: ColorTag::Default },
            now(),
        );
        let _ = app.handle(
            Action::Presence {
                address: Address::full(bare, "desk"),
                presence: Presence::Online(Availability::Available),
                status: String::new(),
            },
            now(),
        );
    }
    app
}

fn address_strategy() -> impl Strategy<Value = Address> {
    (0..CONTACTS.len(), prop::option::of(prop::sample::select(vec!["desk", "phone"])))
        .prop_map(|(idx, resource)| match resource {
            Some(r) => Address::full(CONTACTS[idx], r),
            None => Address::bare(CONTACTS[idx]),
        })
}

/// Generate random actions from every producer.
fn action_strategy() -> impl Strategy<Value = Action> {
    prop_oneof![
        3 => prop::sample::select(vec![Nav::Up, Nav::Down]).prop_map(Action::NavigateBuddyList),
        2 => prop::sample::select(vec![Nav::Up, Nav::Down]).prop_map(Action::NavigateMessages),
        1 => Just(Action::ToggleShowOffline),
        1 => Just(Action::ToggleExpand),
        1 => Just(Action::ToggleLastActive),
        1 => Just(Action::CycleDisplayMode),
        1 => Just(Action::TransportFailure { reason: "reset".into() }),
        2 => prop::sample::select(vec!['a', 'z']).prop_map(Action::InsertChar),
        1 => Just(Action::Submit),
        2 => address_strategy().prop_map(|address| Action::ContactAdded {
            address: address.bare_only(),
            color: ColorTag::Default,
        }),
        1 => address_strategy().prop_map(|address| Action::ContactRemoved { address: address.bare_only() }),
        1 => address_strategy().prop_map(|address| Action::RoomJoined { room: address.bare_only(), nick: "me".into() }),
        1 => address_strategy().prop_map(|address| Action::RoomLeft { room: address.bare_only() }),
        3 => (address_strategy(), any::<bool>()).prop_map(|(address, online)| Action::Presence {
            address,
            presence: if online { Presence::Online(Availability::Away) } else { Presence::Offline },
            status: String::new(),
        }),
        2 => address_strategy().prop_map(|address| Action::MessageReceived {
            address,
            body: "hi".into(),
            encrypted: false,
            timestamp: None,
        }),
    ]
}

proptest! {
    #[test]
    fn prop_active_pointer_always_visible(actions in prop::collection::vec(action_strategy(), 0..80)) {
        let mut app = App::new(Config::default());

        for action in actions {
            let _ = app.handle(action, now());

            let visible = app.visible();
            prop_assert!(!visible.is_empty());
            prop_assert!(app.active_index(&visible).is_some(), "active {} not in {:?}", app.view().active, visible);
            prop_assert!(app.contacts().resolves(&app.view().active));

            let mut seen = app.view().notifications.clone();
            seen.sort();
            seen.dedup();
            prop_assert_eq!(seen.len(), app.view().notifications.len());

            if app.view().scrollback == 0 {
                prop_assert!(!app.view().is_notified(&app.view().active.bare));
            }
        }
    }

    #[test]
    fn prop_degenerate_sizes_render_placeholder(
        width in 0u16..200,
        height in 0u16..80,
        log_steps in 0usize..25,
        buddy_steps in 0usize..40,
        mode_steps in 0usize..3,
    ) {
        let mut app = app_with_online(3);
        for _ in 0..log_steps {
            let _ = app.handle(Action::AdjustLogHeight, now());
        }
        for _ in 0..buddy_steps {
            let _ = app.handle(Action::AdjustBuddyWidth, now());
        }
        for _ in 0..mode_steps {
            let _ = app.handle(Action::CycleDisplayMode, now());
        }

        let view = app.view();
        let main = if view.log_height + 10 > height {
            height.saturating_sub(2)
        } else {
            height - view.log_height - 3
        };
        let chat = match view.mode {
            DisplayMode::BuddyList => width.saturating_sub(view.buddy_width + 1),
            DisplayMode::FullScreen | DisplayMode::Raw => width,
        };

        let out = layout::render((width, height), &Line::raw("> "), &app, now());
        if main <= 4 || chat <= 20 {
            prop_assert_eq!(out.image, vec![Line::raw(PLACEHOLDER)]);
            prop_assert_eq!(out.cursor, 1);
        } else {
            prop_assert_eq!(out.image.len(), usize::from(height));
            prop_assert!(out.image.iter().all(|row| row.width() == usize::from(width)));
            prop_assert_eq!(out.cursor, 2);
        }
    }

    #[test]
    fn prop_buddy_window_contains_active(len in 1usize..200, height in 5usize..100, pick in any::<prop::sample::Index>()) {
        let active = pick.index(len);
        let start = layout::buddy_window(active, height, len);
        let shown = height.min(len);

        prop_assert!(start + shown <= len);
        prop_assert!(start <= active && active < start + shown);
    }

    #[test]
    fn prop_navigation_is_cyclic(contacts in 0usize..8, steps in 0usize..30) {
        let mut app = app_with_online(contacts);
        let len = app.visible().len();
        prop_assert_eq!(len, contacts + 1);

        for step in 1..=steps {
            let _ = app.handle(Action::NavigateBuddyList(Nav::Down), now());
            let visible = app.visible();
            prop_assert_eq!(app.active_index(&visible), Some(step % len));
        }
    }

    #[test]
    fn prop_scrollback_floor_clears_notification(moves in prop::collection::vec(any::<bool>(), 0..40)) {
        let mut app = app_with_online(1);
        let _ = app.handle(Action::NavigateBuddyList(Nav::Down), now());
        let mut expected = 0usize;

        for up in moves {
            if up {
                expected += 1;
                let _ = app.handle(Action::NavigateMessages(Nav::Up), now());
                let _ = app.handle(
                    Action::MessageReceived {
                        address: Address::full("user0@x", "desk"),
                        body: "ping".into(),
                        encrypted: false,
                        timestamp: None,
                    },
                    now(),
                );
                prop_assert!(app.view().is_notified("user0@x"));
            } else {
                expected = expected.saturating_sub(1);
                let _ = app.handle(Action::NavigateMessages(Nav::Down), now());
                if expected == 0 {
                    prop_assert!(!app.view().is_notified("user0@x"));
                }
            }
            prop_assert_eq!(app.view().scrollback, expected);
        }
    }

    #[test]
    fn prop_display_mode_cycle_is_identity(prefix in 0usize..5) {
        let mut app = App::new(Config::default());
        for _ in 0..prefix {
            let _ = app.handle(Action::CycleDisplayMode, now());
        }
        let before = app.view().mode;
        for _ in 0..3 {
            let _ = app.handle(Action::CycleDisplayMode, now());
        }
        prop_assert_eq!(app.view().mode, before);
    }
}
