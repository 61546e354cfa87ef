//! Keyboard and mouse input types
//!
//! Key codes and mouse buttons use the GLFW numbering so that values coming
//! from the native backend convert without a lookup table. The state records
//! are fixed-size bitsets cached in each window's `Properties`.

use bitflags::bitflags;

macro_rules! key_codes {
    ($($(#[$meta:meta])* $name:ident = $value:literal,)*) => {
        /// Keyboard key codes
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(i32)]
        pub enum KeyCode {
            $($(#[$meta])* $name = $value,)*
        }

        impl KeyCode {
            /// Every key code, in ascending order of its raw value
            pub const ALL: &'static [KeyCode] = &[$(KeyCode::$name,)*];

            /// Convert a raw backend key value, mapping anything unrecognised to `Unknown`
            pub fn from_raw(value: i32) -> Self {
                match value {
                    $($value => KeyCode::$name,)*
                    _ => KeyCode::Unknown,
                }
            }
        }
    };
}

key_codes! {
    /// Key not known to the backend
    Unknown = -1,
    /// Space bar
    Space = 32,
    /// `'`
    Apostrophe = 39,
    /// `,`
    Comma = 44,
    /// `-`
    Minus = 45,
    /// `.`
    Period = 46,
    /// `/`
    Slash = 47,
    /// 0
    Zero = 48,
    /// 1
    One = 49,
    /// 2
    Two = 50,
    /// 3
    Three = 51,
    /// 4
    Four = 52,
    /// 5
    Five = 53,
    /// 6
    Six = 54,
    /// 7
    Seven = 55,
    /// 8
    Eight = 56,
    /// 9
    Nine = 57,
    /// `;`
    Semicolon = 59,
    /// `=`
    Equal = 61,
    /// A key
    A = 65,
    /// B key
    B = 66,
    /// C key
    C = 67,
    /// D key
    D = 68,
    /// E key
    E = 69,
    /// F key
    F = 70,
    /// G key
    G = 71,
    /// H key
    H = 72,
    /// I key
    I = 73,
    /// J key
    J = 74,
    /// K key
    K = 75,
    /// L key
    L = 76,
    /// M key
    M = 77,
    /// N key
    N = 78,
    /// O key
    O = 79,
    /// P key
    P = 80,
    /// Q key
    Q = 81,
    /// R key
    R = 82,
    /// S key
    S = 83,
    /// T key
    T = 84,
    /// U key
    U = 85,
    /// V key
    V = 86,
    /// W key
    W = 87,
    /// X key
    X = 88,
    /// Y key
    Y = 89,
    /// Z key
    Z = 90,
    /// `[`
    LeftBracket = 91,
    /// `\`
    BackSlash = 92,
    /// `]`
    RightBracket = 93,
    /// `` ` ``
    GraveAccent = 96,
    /// Non-US #1
    World1 = 161,
    /// Non-US #2
    World2 = 162,
    /// Escape
    Escape = 256,
    /// Enter
    Enter = 257,
    /// Tab
    Tab = 258,
    /// Backspace
    Backspace = 259,
    /// Insert
    Insert = 260,
    /// Delete
    Delete = 261,
    /// Right arrow
    Right = 262,
    /// Left arrow
    Left = 263,
    /// Down arrow
    Down = 264,
    /// Up arrow
    Up = 265,
    /// Page up
    PageUp = 266,
    /// Page down
    PageDown = 267,
    /// Home
    Home = 268,
    /// End
    End = 269,
    /// Caps lock
    CapsLock = 280,
    /// Scroll lock
    ScrollLock = 281,
    /// Num lock
    NumLock = 282,
    /// Print screen
    PrintScreen = 283,
    /// Pause
    Pause = 284,
    /// F1
    F1 = 290,
    /// F2
    F2 = 291,
    /// F3
    F3 = 292,
    /// F4
    F4 = 293,
    /// F5
    F5 = 294,
    /// F6
    F6 = 295,
    /// F7
    F7 = 296,
    /// F8
    F8 = 297,
    /// F9
    F9 = 298,
    /// F10
    F10 = 299,
    /// F11
    F11 = 300,
    /// F12
    F12 = 301,
    /// F13
    F13 = 302,
    /// F14
    F14 = 303,
    /// F15
    F15 = 304,
    /// F16
    F16 = 305,
    /// F17
    F17 = 306,
    /// F18
    F18 = 307,
    /// F19
    F19 = 308,
    /// F20
    F20 = 309,
    /// F21
    F21 = 310,
    /// F22
    F22 = 311,
    /// F23
    F23 = 312,
    /// F24
    F24 = 313,
    /// F25
    F25 = 314,
    /// Keypad 0
    Keypad0 = 320,
    /// Keypad 1
    Keypad1 = 321,
    /// Keypad 2
    Keypad2 = 322,
    /// Keypad 3
    Keypad3 = 323,
    /// Keypad 4
    Keypad4 = 324,
    /// Keypad 5
    Keypad5 = 325,
    /// Keypad 6
    Keypad6 = 326,
    /// Keypad 7
    Keypad7 = 327,
    /// Keypad 8
    Keypad8 = 328,
    /// Keypad 9
    Keypad9 = 329,
    /// Keypad `.`
    KeypadDecimal = 330,
    /// Keypad `/`
    KeypadDivide = 331,
    /// Keypad `*`
    KeypadMultiply = 332,
    /// Keypad `-`
    KeypadSubtract = 333,
    /// Keypad `+`
    KeypadAdd = 334,
    /// Keypad enter
    KeypadEnter = 335,
    /// Keypad `=`
    KeypadEqual = 336,
    /// Left shift
    LeftShift = 340,
    /// Left control
    LeftControl = 341,
    /// Left alt
    LeftAlt = 342,
    /// Left super
    LeftSuper = 343,
    /// Right shift
    RightShift = 344,
    /// Right control
    RightControl = 345,
    /// Right alt
    RightAlt = 346,
    /// Right super
    RightSuper = 347,
    /// Menu
    Menu = 348,
}

impl KeyCode {
    /// Bit position inside a `KeyStateRecord`
    fn bit_pos(self) -> usize {
        // Unknown (-1) lands on bit 0
        (self as i32 + 1) as usize
    }
}

/// Key action reported by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyState {
    /// Key released
    Release,
    /// Key pressed
    Press,
    /// Key held long enough to auto-repeat
    Repeat,
}

/// Mouse buttons, numbered like GLFW (`Left` is button 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MouseButton {
    /// Left mouse button
    Left = 0,
    /// Right mouse button
    Right = 1,
    /// Middle mouse button
    Middle = 2,
    /// Extra button 4
    Button4 = 3,
    /// Extra button 5
    Button5 = 4,
    /// Extra button 6
    Button6 = 5,
    /// Extra button 7
    Button7 = 6,
    /// Extra button 8
    Button8 = 7,
}

impl MouseButton {
    /// Convert a raw backend button index
    pub fn from_raw(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Left),
            1 => Some(Self::Right),
            2 => Some(Self::Middle),
            3 => Some(Self::Button4),
            4 => Some(Self::Button5),
            5 => Some(Self::Button6),
            6 => Some(Self::Button7),
            7 => Some(Self::Button8),
            _ => None,
        }
    }
}

/// Mouse button action reported by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButtonState {
    /// Button released
    Release,
    /// Button pressed
    Press,
}

bitflags! {
    /// Modifier keys held while a key or button event happened
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ModifierKey: u8 {
        /// Either shift key
        const SHIFT = 0x01;
        /// Either control key
        const CONTROL = 0x02;
        /// Either alt key
        const ALT = 0x04;
        /// Either super key
        const SUPER = 0x08;
        /// Caps lock enabled
        const CAPS_LOCK = 0x10;
        /// Num lock enabled
        const NUM_LOCK = 0x20;
    }
}

impl ModifierKey {
    /// Derive the held modifiers from a key state record
    ///
    /// Lock keys are toggles and cannot be recovered from held-key state, so
    /// only shift, control, alt and super are reported.
    pub fn from_key_state(keys: &KeyStateRecord) -> Self {
        let mut mods = Self::empty();
        mods.set(Self::SHIFT, keys.any_pressed(&[KeyCode::LeftShift, KeyCode::RightShift]));
        mods.set(Self::CONTROL, keys.any_pressed(&[KeyCode::LeftControl, KeyCode::RightControl]));
        mods.set(Self::ALT, keys.any_pressed(&[KeyCode::LeftAlt, KeyCode::RightAlt]));
        mods.set(Self::SUPER, keys.any_pressed(&[KeyCode::LeftSuper, KeyCode::RightSuper]));
        mods
    }
}

const KEY_RECORD_WORDS: usize = (KeyCode::Menu as usize + 2).div_ceil(64);

/// Pressed/released state of every key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyStateRecord {
    state: [u64; KEY_RECORD_WORDS],
}

impl KeyStateRecord {
    /// Create a record with every key released
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether a key is held
    pub fn is_pressed(&self, key: KeyCode) -> bool {
        let pos = key.bit_pos();
        self.state[pos / 64] & (1 << (pos % 64)) != 0
    }

    /// Check whether every key in the list is held
    pub fn all_pressed(&self, keys: &[KeyCode]) -> bool {
        keys.iter().all(|&key| self.is_pressed(key))
    }

    /// Check whether at least one key in the list is held
    pub fn any_pressed(&self, keys: &[KeyCode]) -> bool {
        keys.iter().any(|&key| self.is_pressed(key))
    }

    /// Iterate the keys currently held
    pub fn pressed_keys(&self) -> impl Iterator<Item = KeyCode> + '_ {
        KeyCode::ALL.iter().copied().filter(|&key| self.is_pressed(key))
    }

    /// Set a single key state
    pub fn set_value(&mut self, key: KeyCode, pressed: bool) -> &mut Self {
        let pos = key.bit_pos();
        if pressed {
            self.state[pos / 64] |= 1 << (pos % 64);
        } else {
            self.state[pos / 64] &= !(1 << (pos % 64));
        }
        self
    }

    /// Release every key
    pub fn clear(&mut self) {
        self.state = [0; KEY_RECORD_WORDS];
    }
}

/// Pressed/released state of every mouse button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MouseButtonStateRecord {
    state: u8,
}

impl MouseButtonStateRecord {
    /// Create a record with every button released
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether a button is held
    pub fn is_pressed(&self, button: MouseButton) -> bool {
        self.state & (1 << button as u8) != 0
    }

    /// Check whether every button in the list is held
    pub fn all_pressed(&self, buttons: &[MouseButton]) -> bool {
        buttons.iter().all(|&button| self.is_pressed(button))
    }

    /// Check whether at least one button in the list is held
    pub fn any_pressed(&self, buttons: &[MouseButton]) -> bool {
        buttons.iter().any(|&button| self.is_pressed(button))
    }

    /// Set a single button state
    pub fn set_value(&mut self, button: MouseButton, pressed: bool) -> &mut Self {
        if pressed {
            self.state |= 1 << button as u8;
        } else {
            self.state &= !(1 << button as u8);
        }
        self
    }

    /// Release every button
    pub fn clear(&mut self) {
        self.state = 0;
    }
}
