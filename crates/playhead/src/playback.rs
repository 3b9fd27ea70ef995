//! Media player collaborator.

use std::cell::RefCell;
use std::rc::Rc;

use reelsync_common::clock::Millis;

/// The subset of a media player the controller drives.
pub trait MediaPlayback {
    /// Seek the player. Positions are whole milliseconds.
    fn set_position(&mut self, position_ms: Millis);
    fn play(&mut self);
    fn pause(&mut self);
    fn is_playing(&self) -> bool;
}

/// Lets the caller keep a handle to a player it gives to the controller.
impl<P: MediaPlayback> MediaPlayback for Rc<RefCell<P>> {
    fn set_position(&mut self, position_ms: Millis) {
        self.borrow_mut().set_position(position_ms);
    }

    fn play(&mut self) {
        self.borrow_mut().play();
    }

    fn pause(&mut self) {
        self.borrow_mut().pause();
    }

    fn is_playing(&self) -> bool {
        self.borrow().is_playing()
    }
}

/// In-memory player for headless runs. Records every seek it receives.
#[derive(Debug, Clone, Default)]
pub struct SimulatedPlayback {
    pub position_ms: Millis,
    pub playing: bool,
    pub seeks: Vec<Millis>,
    pub pauses: usize,
    pub plays: usize,
}

impl SimulatedPlayback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn playing() -> Self {
        Self {
            playing: true,
            ..Self::default()
        }
    }
}

impl MediaPlayback for SimulatedPlayback {
    fn set_position(&mut self, position_ms: Millis) {
        self.position_ms = position_ms;
        self.seeks.push(position_ms);
    }

    fn play(&mut self) {
        self.playing = true;
        self.plays += 1;
    }

    fn pause(&mut self) {
        self.playing = false;
        self.pauses += 1;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}
