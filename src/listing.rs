//! Generic logic for flat code listings.

use std::{
    fmt::{self, Display, Formatter},
    slice::Iter,
};

/// An ordered sequence of instructions, addressed by line index.
#[derive(Debug)]
pub struct Listing<T> {
    lines: Vec<T>,
}

impl<T> Default for Listing<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Listing<T> {
    pub fn new() -> Self {
        Self { lines: vec![] }
    }

    pub fn push(&mut self, line: T) {
        self.lines.push(line);
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn iter_instructions(&self) -> Iter<T> {
        self.lines.iter()
    }
}

impl<T: Display> Display for Listing<T> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
