//! Property-based tests for scan assembly.
//!
//! Random digit sequences and random interleavings across readers must
//! always reassemble into exactly the codes each reader typed.

use cardrelay_core::StationId;
use cardrelay_hardware::CaptureStateMachine;
use cardrelay_hardware::types::{KeyEvent, KeyState, KeySymbol};
use proptest::prelude::*;
use std::path::{Path, PathBuf};

/// Strategy for card codes as digit vectors (0-20 digits).
fn card_digits() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(0u8..=9, 0..20)
}

fn press(d: u8) -> [KeyEvent; 2] {
    [
        KeyEvent::down(KeySymbol::Digit(d)),
        KeyEvent::up(KeySymbol::Digit(d)),
    ]
}

fn as_string(digits: &[u8]) -> String {
    digits.iter().map(|d| char::from(b'0' + d)).collect()
}

proptest! {
    /// Property: the card number is the digits in arrival order and the
    /// buffer is empty afterwards.
    #[test]
    fn prop_digits_concatenate(digits in card_digits()) {
        let mut capture = CaptureStateMachine::new(StationId::new("kiosk"));
        let dev = Path::new("/dev/input/event3");

        for d in &digits {
            for event in press(*d) {
                prop_assert!(capture.handle_event(dev, &event).is_none());
            }
        }

        let scan = capture
            .handle_event(dev, &KeyEvent::down(KeySymbol::ENTER))
            .expect("terminator must complete a scan");

        prop_assert_eq!(scan.card_number, as_string(&digits));
        prop_assert_eq!(capture.pending(dev), None);
    }

    /// Property: interleaving two readers' key streams never mixes digits.
    ///
    /// `schedule` picks which reader's next event is fed at each step.
    #[test]
    fn prop_interleaved_readers_isolated(
        a in card_digits(),
        b in card_digits(),
        schedule in prop::collection::vec(any::<bool>(), 0..100),
    ) {
        let mut capture = CaptureStateMachine::new(StationId::new("kiosk"));
        let dev_a = PathBuf::from("/dev/input/event3");
        let dev_b = PathBuf::from("/dev/input/event4");

        let stream = |digits: &[u8]| -> Vec<KeyEvent> {
            digits
                .iter()
                .flat_map(|d| press(*d))
                .chain([KeyEvent::down(KeySymbol::ENTER), KeyEvent::up(KeySymbol::ENTER)])
                .collect()
        };
        let mut events_a = stream(&a).into_iter();
        let mut events_b = stream(&b).into_iter();

        let mut scans_a = Vec::new();
        let mut scans_b = Vec::new();
        let mut pick = schedule.into_iter();

        loop {
            let use_a = pick.next().unwrap_or(true);
            let (next, dev, out) = if use_a {
                (events_a.next(), &dev_a, &mut scans_a)
            } else {
                (events_b.next(), &dev_b, &mut scans_b)
            };

            match next {
                Some(event) => out.extend(capture.handle_event(dev, &event)),
                None => {
                    // Drain whichever reader still has events.
                    for event in events_a.by_ref() {
                        scans_a.extend(capture.handle_event(&dev_a, &event));
                    }
                    for event in events_b.by_ref() {
                        scans_b.extend(capture.handle_event(&dev_b, &event));
                    }
                    break;
                }
            }
        }

        prop_assert_eq!(scans_a.len(), 1);
        prop_assert_eq!(scans_b.len(), 1);
        prop_assert_eq!(&scans_a[0].card_number, &as_string(&a));
        prop_assert_eq!(&scans_b[0].card_number, &as_string(&b));
    }

    /// Property: key-up and autorepeat never change what gets captured.
    #[test]
    fn prop_non_down_transitions_ignored(
        digits in card_digits(),
        noise in prop::collection::vec((0u16..120, prop::bool::ANY), 0..30),
    ) {
        let mut capture = CaptureStateMachine::new(StationId::new("kiosk"));
        let dev = Path::new("/dev/input/event3");

        for (code, repeat) in noise {
            let state = if repeat { KeyState::Repeat } else { KeyState::Up };
            let event = KeyEvent::new(KeySymbol::from_code(code), state);
            prop_assert!(capture.handle_event(dev, &event).is_none());
        }
        for d in &digits {
            capture.handle_event(dev, &KeyEvent::down(KeySymbol::Digit(*d)));
        }

        let scan = capture
            .handle_event(dev, &KeyEvent::down(KeySymbol::ENTER))
            .expect("terminator must complete a scan");
        prop_assert_eq!(scan.card_number, as_string(&digits));
    }

    /// Property: every terminator yields exactly one scan, and scans come out
    /// in the order the codes were typed.
    #[test]
    fn prop_scans_in_typing_order(cards in prop::collection::vec(card_digits(), 1..10)) {
        let mut capture = CaptureStateMachine::new(StationId::new("kiosk"));
        let dev = Path::new("/dev/input/event3");

        let events: Vec<KeyEvent> = cards
            .iter()
            .flat_map(|digits| {
                digits
                    .iter()
                    .map(|d| KeyEvent::down(KeySymbol::Digit(*d)))
                    .chain(std::iter::once(KeyEvent::down(KeySymbol::ENTER)))
                    .collect::<Vec<_>>()
            })
            .collect();

        let scans = capture.handle_batch(dev, &events);
        let got: Vec<String> = scans.into_iter().map(|s| s.card_number).collect();
        let expected: Vec<String> = cards.iter().map(|c| as_string(c)).collect();
        prop_assert_eq!(got, expected);
    }
}
