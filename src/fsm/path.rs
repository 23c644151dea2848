//! Pre-planned paths and the cursor that walks them.
//!
//! The upstream planner sends a path as a digit string, one digit per
//! intersection:
//!
//! | digit | command    |
//! |-------|------------|
//! | `1`   | `Left`     |
//! | `2`   | `Right`    |
//! | `3`   | `UTurn`    |
//! | `4`   | `Straight` |
//! | `5`   | `End`      |
//!
//! Any other character is kept as a [`PathStep::Malformed`] step and
//! skipped when the robot reaches it.

use core::fmt;

/// Maximum number of steps a path may hold.
pub const MAX_PATH_LEN: usize = 64;

/// One turn decision executed at an intersection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PathCommand {
    Left = 1,
    Right = 2,
    UTurn = 3,
    Straight = 4,
    End = 5,
}

impl PathCommand {
    /// Decode a single wire digit.
    pub fn from_digit(c: char) -> Option<Self> {
        match c {
            '1' => Some(Self::Left),
            '2' => Some(Self::Right),
            '3' => Some(Self::UTurn),
            '4' => Some(Self::Straight),
            '5' => Some(Self::End),
            _ => None,
        }
    }

    /// The wire digit for this command.
    pub fn digit(self) -> char {
        char::from(b'0' + self as u8)
    }
}

/// A path element as received.  Malformed steps survive parsing so the
/// cursor still moves past them at execution time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStep {
    Command(PathCommand),
    Malformed(char),
}

impl PathStep {
    pub fn from_char(c: char) -> Self {
        PathCommand::from_digit(c).map_or(Self::Malformed(c), Self::Command)
    }

    pub fn as_char(self) -> char {
        match self {
            Self::Command(cmd) => cmd.digit(),
            Self::Malformed(c) => c,
        }
    }
}

/// Why a path string was refused outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathError {
    Empty,
    TooLong,
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "path is empty"),
            Self::TooLong => write!(f, "path exceeds {} steps", MAX_PATH_LEN),
        }
    }
}

/// An ordered, immutable sequence of path steps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Path {
    steps: heapless::Vec<PathStep, MAX_PATH_LEN>,
}

impl Path {
    /// Parse a planner digit string.  Only emptiness and length are
    /// validated; unknown digits become malformed steps.
    pub fn parse(s: &str) -> Result<Self, PathError> {
        if s.is_empty() {
            return Err(PathError::Empty);
        }
        let mut steps = heapless::Vec::new();
        for c in s.chars() {
            steps
                .push(PathStep::from_char(c))
                .map_err(|_| PathError::TooLong)?;
        }
        Ok(Self { steps })
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<PathStep> {
        self.steps.get(index).copied()
    }

    /// Re-encode as the wire digit string.
    pub fn to_digits(&self) -> heapless::String<MAX_PATH_LEN> {
        let mut out = heapless::String::new();
        for step in &self.steps {
            // A parsed path never holds more chars than MAX_PATH_LEN, but a
            // multi-byte malformed char can still overflow the byte budget.
            if out.push(step.as_char()).is_err() {
                break;
            }
        }
        out
    }
}

/// A path plus its forward-only cursor and the running flag.
#[derive(Debug, Clone, Default)]
pub struct Route {
    path: Path,
    cursor: usize,
    running: bool,
}

impl Route {
    /// Replace the path and restart from its head.
    pub fn assign(&mut self, path: Path) {
        self.path = path;
        self.cursor = 0;
        self.running = true;
    }

    /// Step at the cursor, or `None` once the path is exhausted.
    pub fn current(&self) -> Option<PathStep> {
        self.path.get(self.cursor)
    }

    /// Move the cursor one step on.  Never rewinds.
    pub fn advance(&mut self) {
        if self.cursor < self.path.len() {
            self.cursor += 1;
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn halt(&mut self) {
        self.running = false;
    }
}
