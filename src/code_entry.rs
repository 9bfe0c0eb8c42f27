//! Five-slot verification code input.
//!
//! The shell renders one box per slot; all editing rules live here so both
//! platforms behave identically: typing advances focus, paste fills forward,
//! backspace on an empty slot carries into the previous one.

use serde::{Deserialize, Serialize};

pub const CODE_LENGTH: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeEntry {
    slots: [Option<u8>; CODE_LENGTH],
    focus: Option<usize>,
}

impl Default for CodeEntry {
    fn default() -> Self {
        Self {
            slots: [None; CODE_LENGTH],
            focus: Some(0),
        }
    }
}

impl CodeEntry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the slot that should hold keyboard focus, or `None` when the
    /// code is complete.
    #[must_use]
    pub const fn focus(&self) -> Option<usize> {
        self.focus
    }

    #[must_use]
    pub fn digits(&self) -> Vec<Option<u8>> {
        self.slots.to_vec()
    }

    /// A single character typed into `index`. Non-digits are ignored.
    pub fn insert(&mut self, index: usize, ch: char) {
        let Some(digit) = ch.to_digit(10) else {
            return;
        };
        if index >= CODE_LENGTH {
            return;
        }
        self.slots[index] = Some(digit as u8);
        self.focus = self.first_empty_from(index + 1);
    }

    /// Pasted text starting at `index`. Non-digit characters are stripped
    /// before filling, so "4 2-0 1 9" fills all five slots.
    pub fn paste(&mut self, index: usize, text: &str) {
        if index >= CODE_LENGTH {
            return;
        }
        let mut at = index;
        for ch in text.chars() {
            let Some(digit) = ch.to_digit(10) else {
                continue;
            };
            if at >= CODE_LENGTH {
                break;
            }
            self.slots[at] = Some(digit as u8);
            at += 1;
        }
        self.focus = self.first_empty_from(at);
    }

    /// Backspace pressed while `index` is focused. A filled slot clears in
    /// place; an empty slot clears the previous slot and moves focus there.
    pub fn backspace(&mut self, index: usize) {
        if index >= CODE_LENGTH {
            return;
        }
        if self.slots[index].is_some() {
            self.slots[index] = None;
            self.focus = Some(index);
        } else if index > 0 {
            self.slots[index - 1] = None;
            self.focus = Some(index - 1);
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// The full code as a string, only once every slot is filled.
    #[must_use]
    pub fn value(&self) -> Option<String> {
        if !self.is_complete() {
            return None;
        }
        Some(self.slots.iter().flatten().map(|d| char::from(b'0' + d)).collect())
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    fn first_empty_from(&self, index: usize) -> Option<usize> {
        (index..CODE_LENGTH)
            .find(|&i| self.slots[i].is_none())
            .or_else(|| (0..index.min(CODE_LENGTH)).find(|&i| self.slots[i].is_none()))
    }
}
