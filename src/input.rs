use std::collections::HashSet;

use winit::keyboard::{KeyCode, PhysicalKey};

/// Keys the render loop reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Escape,
}

impl Key {
    /// Maps a winit physical key. Keys the loop never queries map to `None`.
    pub fn from_winit(key: PhysicalKey) -> Option<Self> {
        match key {
            PhysicalKey::Code(KeyCode::Escape) => Some(Self::Escape),
            _ => None,
        }
    }
}

/// Keys currently held, as reported by the window's keyboard events.
#[derive(Debug, Default)]
pub struct InputState {
    keys: HashSet<Key>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_key_down(&mut self, key: Key) {
        self.keys.insert(key);
    }

    pub fn set_key_up(&mut self, key: Key) {
        self.keys.remove(&key);
    }

    pub fn is_key_down(&self, key: Key) -> bool {
        self.keys.contains(&key)
    }
}
