//! Logical stack depth across straight-line code and jumps.
//!
//! Code right after a `goto` is only reachable through a label. When a
//! label is reached with no known depth, the code after it is tracked
//! relative to the label's unknown entry depth, remembering the lowest
//! point it reaches. A later jump to that label with a known depth fixes
//! the entry depth and checks the lowest point against it.

use std::collections::HashMap;

use crate::ast::{Command, Command::*};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Depth {
    Known(usize),
    /// `offset` values above the (still unknown) entry depth of `base`.
    Relative { base: String, offset: isize },
}

#[derive(Debug, Default)]
struct Base {
    lowest: isize,
    resolved: Option<usize>,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum DepthError {
    Underflow { required: usize, available: usize },
    Mismatch(String),
}

/// (values consumed, values produced)
fn stack_effect(command: &Command) -> (usize, usize) {
    match command {
        Push(..) => (0, 1),
        Pop(..) => (1, 0),
        Add | Sub | And | Or | Eq | Gt | Lt => (2, 1),
        Neg | Not => (1, 1),
        Label(_) | Goto(_) => (0, 0),
        IfGoto(_) => (1, 0),
    }
}

#[derive(Debug)]
pub(crate) struct StackTracker {
    /// `None` while the code is unreachable (after a `goto`).
    current: Option<Depth>,
    /// Depth at each label already passed.
    labels: HashMap<String, Depth>,
    /// Depth carried by jumps to labels not reached yet.
    forward: HashMap<String, Depth>,
    bases: HashMap<String, Base>,
}

impl StackTracker {
    pub fn new() -> Self {
        StackTracker {
            current: Some(Depth::Known(0)),
            labels: HashMap::new(),
            forward: HashMap::new(),
            bases: HashMap::new(),
        }
    }

    /// The depth after the commands seen so far, when it is known.
    pub fn known(&self) -> Option<usize> {
        match self.current.clone().map(|d| self.normalize(d)) {
            Some(Depth::Known(d)) => Some(d),
            _ => None,
        }
    }

    pub fn step(&mut self, command: &Command) -> Result<(), DepthError> {
        let (consumed, produced) = stack_effect(command);
        self.apply(consumed, produced)?;

        match command {
            Goto(label) => {
                self.jump(label)?;
                self.current = None;
            }
            IfGoto(label) => self.jump(label)?,
            Label(label) => self.label(label)?,
            _ => {}
        }
        Ok(())
    }

    fn normalize(&self, depth: Depth) -> Depth {
        if let Depth::Relative { base, offset } = &depth {
            if let Some(entry) = self.bases.get(base).and_then(|b| b.resolved) {
                return Depth::Known((entry as isize + offset) as usize);
            }
        }
        depth
    }

    fn apply(&mut self, consumed: usize, produced: usize) -> Result<(), DepthError> {
        let Some(depth) = self.current.clone().map(|d| self.normalize(d)) else {
            return Ok(());
        };

        self.current = Some(match depth {
            Depth::Known(d) => {
                if d < consumed {
                    return Err(DepthError::Underflow {
                        required: consumed,
                        available: d,
                    });
                }
                Depth::Known(d - consumed + produced)
            }
            Depth::Relative { base, offset } => {
                let low = offset - consumed as isize;
                let entry = self.bases.entry(base.clone()).or_default();
                entry.lowest = entry.lowest.min(low);
                Depth::Relative {
                    base,
                    offset: low + produced as isize,
                }
            }
        });
        Ok(())
    }

    fn jump(&mut self, label: &str) -> Result<(), DepthError> {
        let Some(depth) = self.current.clone() else {
            return Ok(());
        };

        if let Some(target) = self.labels.get(label).cloned() {
            let merged = self.unify(depth, target, label)?;
            self.labels.insert(label.to_string(), merged);
        } else {
            let merged = match self.forward.remove(label) {
                Some(earlier) => self.unify(earlier, depth, label)?,
                None => depth,
            };
            self.forward.insert(label.to_string(), merged);
        }
        Ok(())
    }

    fn label(&mut self, label: &str) -> Result<(), DepthError> {
        let incoming = self.forward.remove(label);
        let mut depth = match (self.current.clone(), incoming) {
            (Some(fall_through), Some(jumped)) => Some(self.unify(fall_through, jumped, label)?),
            (fall_through, jumped) => fall_through.or(jumped),
        };
        if let (Some(d), Some(earlier)) = (depth.clone(), self.labels.get(label).cloned()) {
            depth = Some(self.unify(d, earlier, label)?);
        }

        let depth = depth.unwrap_or_else(|| {
            log::debug!("label {} reached with unknown depth", label);
            Depth::Relative {
                base: label.to_string(),
                offset: 0,
            }
        });
        self.labels.insert(label.to_string(), depth.clone());
        self.current = Some(depth);
        Ok(())
    }

    /// Both depths describe the same program point; make them agree.
    fn unify(&mut self, a: Depth, b: Depth, label: &str) -> Result<Depth, DepthError> {
        match (self.normalize(a), self.normalize(b)) {
            (Depth::Known(x), Depth::Known(y)) if x == y => Ok(Depth::Known(x)),
            (Depth::Known(x), Depth::Known(y)) => Err(DepthError::Mismatch(format!(
                "label {} is reached with {} and with {} value(s) on the stack",
                label, x, y
            ))),
            (Depth::Known(v), Depth::Relative { base, offset })
            | (Depth::Relative { base, offset }, Depth::Known(v)) => {
                self.resolve(&base, v as isize - offset, label)?;
                Ok(Depth::Known(v))
            }
            (
                Depth::Relative { base, offset },
                Depth::Relative {
                    base: other,
                    offset: other_offset,
                },
            ) => {
                if base == other && offset != other_offset {
                    return Err(DepthError::Mismatch(format!(
                        "label {} is reached with stack depths that differ by {}",
                        label,
                        (offset - other_offset).abs()
                    )));
                }
                Ok(Depth::Relative { base, offset })
            }
        }
    }

    fn resolve(&mut self, base: &str, entry: isize, label: &str) -> Result<(), DepthError> {
        let slot = self.bases.entry(base.to_string()).or_default();
        if entry < 0 {
            return Err(DepthError::Mismatch(format!(
                "label {} would be entered with a negative stack depth",
                label
            )));
        }
        if entry + slot.lowest < 0 {
            return Err(DepthError::Underflow {
                required: (-slot.lowest) as usize,
                available: entry as usize,
            });
        }
        log::debug!("label {} is entered with depth {}", base, entry);
        slot.resolved = Some(entry as usize);
        Ok(())
    }
}
