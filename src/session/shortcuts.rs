use crate::session::messages::Msg;

/// Keys the session reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Character(char),
}

/// Modifier state at the time of a key press
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub control: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        control: false,
        shift: false,
        alt: false,
    };
    pub const CTRL: Modifiers = Modifiers {
        control: true,
        shift: false,
        alt: false,
    };
}

/// Map a key press to a session message
///
/// While the inline text editor is open it owns the keyboard, so nothing is
/// mapped.
pub fn handle_key_event(key: Key, modifiers: Modifiers, text_editing: bool) -> Option<Msg> {
    if text_editing {
        return None;
    }

    let plain_ctrl = modifiers.control && !modifiers.alt;
    match key {
        Key::Escape => Some(Msg::close()),
        Key::Character(c) if plain_ctrl && !modifiers.shift => match c.to_ascii_lowercase() {
            'z' => Some(Msg::undo()),
            'c' => Some(Msg::copy()),
            's' => Some(Msg::save()),
            'm' => Some(Msg::toggle_magnifier()),
            _ => None,
        },
        Key::Character(_) => None,
    }
}
