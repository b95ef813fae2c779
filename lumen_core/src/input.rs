// Copyright 2026 the Lumen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Key and touch input translation.
//!
//! [`InputDispatcher`] turns raw platform input into canonical [`Key`] and
//! [`TouchPhase`] events and delivers them to an [`InputSink`]. Only key
//! delivery can report consumption; motion events are always handled.

/// Motion action masks and values.
mod motion {
    pub(super) const ACTION_MASK: i32 = 0xff;
    pub(super) const POINTER_INDEX_MASK: i32 = 0xff00;
    pub(super) const POINTER_INDEX_SHIFT: u32 = 8;
    pub(super) const DOWN: i32 = 0;
    pub(super) const UP: i32 = 1;
    pub(super) const MOVE: i32 = 2;
    pub(super) const CANCEL: i32 = 3;
    pub(super) const OUTSIDE: i32 = 4;
    pub(super) const POINTER_DOWN: i32 = 5;
    pub(super) const POINTER_UP: i32 = 6;
}

/// Key action values.
mod key_action {
    pub(super) const DOWN: i32 = 0;
    pub(super) const UP: i32 = 1;
    pub(super) const MULTIPLE: i32 = 2;
}

/// Key codes.
mod key_code {
    pub(super) const BACK: i32 = 4;
    pub(super) const DIGIT_0: i32 = 7;
    pub(super) const DIGIT_9: i32 = 16;
    pub(super) const DPAD_UP: i32 = 19;
    pub(super) const DPAD_DOWN: i32 = 20;
    pub(super) const DPAD_LEFT: i32 = 21;
    pub(super) const DPAD_RIGHT: i32 = 22;
    pub(super) const DPAD_CENTER: i32 = 23;
    pub(super) const LETTER_A: i32 = 29;
    pub(super) const LETTER_Z: i32 = 54;
    pub(super) const TAB: i32 = 61;
    pub(super) const SPACE: i32 = 62;
    pub(super) const ENTER: i32 = 66;
    pub(super) const MENU: i32 = 82;
}

/// Most simultaneous touches tracked with multitouch on.
pub const MAX_SIMULTANEOUS_TOUCHES: usize = 5;

/// A canonical key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    /// Left arrow.
    Left,
    /// Right arrow.
    Right,
    /// Up arrow.
    Up,
    /// Down arrow.
    Down,
    /// Enter, including the directional pad center.
    Enter,
    /// Tab.
    Tab,
    /// Space bar.
    Space,
    /// System back navigation.
    NavBack,
    /// System menu.
    NavMenu,
    /// Digit key `0..=9`.
    Digit(u8),
    /// Letter key `'A'..='Z'`.
    Letter(char),
}

impl Key {
    /// Maps a platform key code; unmapped codes yield `None`.
    #[must_use]
    pub fn from_code(code: i32) -> Option<Self> {
        use key_code::*;
        let key = match code {
            DPAD_LEFT => Self::Left,
            DPAD_RIGHT => Self::Right,
            DPAD_UP => Self::Up,
            DPAD_DOWN => Self::Down,
            ENTER | DPAD_CENTER => Self::Enter,
            TAB => Self::Tab,
            SPACE => Self::Space,
            BACK => Self::NavBack,
            MENU => Self::NavMenu,
            DIGIT_0..=DIGIT_9 => Self::Digit(u8::try_from(code - DIGIT_0).ok()?),
            LETTER_A..=LETTER_Z => Self::Letter(char::from(b'A' + u8::try_from(code - LETTER_A).ok()?)),
            _ => return None,
        };
        Some(key)
    }
}

/// What happened to a key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyAction {
    /// First press.
    Pressed,
    /// Auto-repeat while held.
    Repeated,
    /// Release.
    Released,
}

/// Stage of a touch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TouchPhase {
    /// The pointer went down.
    Began,
    /// The pointer moved.
    Moved,
    /// The pointer went up or left the window.
    Ended,
    /// The gesture was cancelled by the system.
    Cancelled,
}

impl TouchPhase {
    /// Maps the masked motion action; unsupported actions yield `None`.
    #[must_use]
    pub const fn from_action(masked: i32) -> Option<Self> {
        match masked {
            motion::DOWN | motion::POINTER_DOWN => Some(Self::Began),
            motion::UP | motion::POINTER_UP | motion::OUTSIDE => Some(Self::Ended),
            motion::MOVE => Some(Self::Moved),
            motion::CANCEL => Some(Self::Cancelled),
            _ => None,
        }
    }
}

/// A raw key event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyInput {
    /// Platform key code.
    pub key_code: i32,
    /// Platform key action.
    pub action: i32,
    /// Repeat count; for a "multiple" action, the number of presses.
    pub repeat_count: i32,
    /// Modifier meta state, used for character lookup.
    pub meta_state: i32,
}

/// One pointer of a motion event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pointer {
    /// Platform pointer id.
    pub id: i32,
    /// X position in pixels.
    pub x: f32,
    /// Y position in pixels.
    pub y: f32,
}

/// A raw motion event.
#[derive(Clone, Debug, PartialEq)]
pub struct MotionInput {
    /// Platform motion action, including the pointer index bits.
    pub action: i32,
    /// Every pointer currently down.
    pub pointers: Vec<Pointer>,
}

/// A raw input event.
#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    /// Key event.
    Key(KeyInput),
    /// Touch event.
    Motion(MotionInput),
}

/// Receiver of translated input.
pub trait InputSink {
    /// Delivers a key event; returns whether it was consumed.
    fn key(&mut self, key: Key, action: KeyAction) -> bool;

    /// Whether key events are wanted at all. Without them the back key is
    /// left to the platform.
    fn wants_keys(&self) -> bool;

    /// Whether characters are wanted at all.
    fn wants_characters(&self) -> bool;

    /// Delivers a printable character.
    fn character(&mut self, ch: char);

    /// Delivers a touch event.
    fn touch(&mut self, slot: usize, phase: TouchPhase, x: f64, y: f64);

    /// Looks up the character a key produces.
    fn unicode_char(&self, key_code: i32, meta_state: i32) -> Option<u32>;

    /// Asks the host to background the task; returns whether it complied.
    fn move_task_to_back(&mut self) -> bool;
}

/// Bounded mapping from pointer ids to touch slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TouchSlots {
    max_touches: usize,
}

impl TouchSlots {
    /// One slot, or [`MAX_SIMULTANEOUS_TOUCHES`] with multitouch.
    #[must_use]
    pub const fn new(multitouch: bool) -> Self {
        Self {
            max_touches: if multitouch { MAX_SIMULTANEOUS_TOUCHES } else { 1 },
        }
    }

    /// Number of slots.
    #[must_use]
    pub const fn max_touches(&self) -> usize {
        self.max_touches
    }

    /// Slot for a pointer id, or `None` if the id is out of range.
    #[must_use]
    pub fn slot(&self, pointer_id: i32) -> Option<usize> {
        usize::try_from(pointer_id)
            .ok()
            .filter(|slot| *slot < self.max_touches)
    }
}

/// Translates raw input for an [`InputSink`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InputDispatcher {
    slots: TouchSlots,
}

impl InputDispatcher {
    /// Creates a dispatcher.
    #[must_use]
    pub const fn new(multitouch: bool) -> Self {
        Self {
            slots: TouchSlots::new(multitouch),
        }
    }

    /// Switches multitouch on or off.
    pub fn set_multitouch(&mut self, multitouch: bool) {
        self.slots = TouchSlots::new(multitouch);
    }

    /// Whether more than one touch is reported.
    #[must_use]
    pub const fn is_multitouch(&self) -> bool {
        self.slots.max_touches() > 1
    }

    /// Translates and delivers one event; returns whether it was handled.
    pub fn dispatch(&self, event: &InputEvent, sink: &mut dyn InputSink) -> bool {
        match event {
            InputEvent::Key(key) => self.dispatch_key(key, sink),
            InputEvent::Motion(motion) => {
                self.dispatch_motion(motion, sink);
                true
            }
        }
    }

    fn dispatch_key(&self, input: &KeyInput, sink: &mut dyn InputSink) -> bool {
        let mut handled = false;
        if sink.wants_keys()
            && let Some(key) = Key::from_code(input.key_code)
        {
            match input.action {
                key_action::UP => {
                    handled = sink.key(key, KeyAction::Released);
                    if !handled && key == Key::NavBack {
                        handled = sink.move_task_to_back();
                    }
                }
                key_action::DOWN => {
                    let action = if input.repeat_count > 0 {
                        KeyAction::Repeated
                    } else {
                        KeyAction::Pressed
                    };
                    handled = sink.key(key, action);
                }
                key_action::MULTIPLE => {
                    for _ in 0..input.repeat_count {
                        handled |= sink.key(key, KeyAction::Pressed);
                        handled |= sink.key(key, KeyAction::Released);
                    }
                }
                _ => {}
            }
        }

        let repeats = match input.action {
            key_action::DOWN => 1,
            key_action::MULTIPLE => input.repeat_count,
            _ => 0,
        };
        if repeats > 0 && sink.wants_characters() {
            let ch = sink
                .unicode_char(input.key_code, input.meta_state)
                .filter(|c| *c >= 0x20)
                .and_then(char::from_u32);
            if let Some(ch) = ch {
                for _ in 0..repeats {
                    sink.character(ch);
                }
            }
        }
        handled
    }

    fn dispatch_motion(&self, input: &MotionInput, sink: &mut dyn InputSink) {
        let Some(phase) = TouchPhase::from_action(input.action & motion::ACTION_MASK) else {
            return;
        };
        if phase == TouchPhase::Moved {
            for pointer in &input.pointers {
                self.deliver(pointer, phase, sink);
            }
        } else {
            let index = (input.action & motion::POINTER_INDEX_MASK) >> motion::POINTER_INDEX_SHIFT;
            let pointer = usize::try_from(index)
                .ok()
                .and_then(|i| input.pointers.get(i));
            if let Some(pointer) = pointer {
                self.deliver(pointer, phase, sink);
            }
        }
    }

    fn deliver(&self, pointer: &Pointer, phase: TouchPhase, sink: &mut dyn InputSink) {
        if let Some(slot) = self.slots.slot(pointer.id) {
            sink.touch(slot, phase, f64::from(pointer.x), f64::from(pointer.y));
        }
    }
}
