//! Prefix sub-wizard: one prefix per selected skin, entered step by step.

use std::collections::HashMap;

/// Used when a step is submitted blank
pub const DEFAULT_PREFIX: &str = "bum";

/// A skin the user is asked to pick a prefix for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixTarget {
    pub champion: String,
    pub skin_name: String,
    pub skin_id: u32,
    /// Composite id; prefixes are keyed by it
    pub full_id: String,
}

/// Where the wizard is after a forward move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixStep {
    Next { step: usize, total: usize },
    Complete,
}

/// Prefix per composite skin id
pub type PrefixMap = HashMap<String, String>;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PrefixError {
    #[error("Prefix for {0} has not been entered yet")]
    Incomplete(String),
    #[error("No skins to pick prefixes for")]
    Empty,
}

/// Linear prefix entry over every target.
///
/// Entered values survive stepping back and forth; the input box shows the
/// stored value of whatever step becomes current.
#[derive(Debug, Clone)]
pub struct PrefixWizard {
    targets: Vec<PrefixTarget>,
    prefixes: Vec<Option<String>>,
    step: usize,
    input: String,
    complete: bool,
}

fn effective(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        DEFAULT_PREFIX.to_string()
    } else {
        trimmed.to_string()
    }
}

impl PrefixWizard {
    pub fn new(targets: Vec<PrefixTarget>) -> Result<Self, PrefixError> {
        if targets.is_empty() {
            return Err(PrefixError::Empty);
        }
        let prefixes = vec![None; targets.len()];
        Ok(Self {
            targets,
            prefixes,
            step: 0,
            input: String::new(),
            complete: false,
        })
    }

    /// Zero-based current step
    pub fn step(&self) -> usize {
        self.step
    }

    pub fn total(&self) -> usize {
        self.targets.len()
    }

    pub fn current(&self) -> &PrefixTarget {
        &self.targets[self.step]
    }

    pub fn targets(&self) -> &[PrefixTarget] {
        &self.targets
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
    }

    /// Stored prefix for step `index`, if entered
    pub fn prefix_at(&self, index: usize) -> Option<&str> {
        self.prefixes.get(index)?.as_deref()
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    fn enter(&mut self, step: usize) {
        self.step = step;
        self.input = self.prefixes[step].clone().unwrap_or_default();
    }

    /// Store the current input (blank means the default) and move forward
    pub fn submit(&mut self) -> PrefixStep {
        self.prefixes[self.step] = Some(effective(&self.input));
        if self.step + 1 < self.targets.len() {
            self.enter(self.step + 1);
            PrefixStep::Next {
                step: self.step,
                total: self.total(),
            }
        } else {
            self.complete = true;
            PrefixStep::Complete
        }
    }

    /// Go to the previous step, recalling what was entered there.
    /// Returns `false` on the first step.
    pub fn back(&mut self) -> bool {
        if self.step == 0 {
            return false;
        }
        if !self.input.trim().is_empty() {
            self.prefixes[self.step] = Some(self.input.trim().to_string());
        }
        self.complete = false;
        self.enter(self.step - 1);
        true
    }

    /// Use the current input for this step and every later one, then finish.
    /// Earlier steps keep their values.
    pub fn apply_to_remaining(&mut self) -> PrefixStep {
        let prefix = effective(&self.input);
        for slot in &mut self.prefixes[self.step..] {
            *slot = Some(prefix.clone());
        }
        self.step = self.targets.len() - 1;
        self.input = prefix;
        self.complete = true;
        PrefixStep::Complete
    }

    /// The full prefix mapping, once the last step has been completed.
    /// Stepping back reopens the wizard even when every slot holds a value.
    pub fn finish(&self) -> Result<PrefixMap, PrefixError> {
        let map = self
            .targets
            .iter()
            .zip(&self.prefixes)
            .map(|(target, prefix)| match prefix {
                Some(p) => Ok((target.full_id.clone(), p.clone())),
                None => Err(PrefixError::Incomplete(target.skin_name.clone())),
            })
            .collect::<Result<PrefixMap, PrefixError>>()?;
        if !self.complete {
            return Err(PrefixError::Incomplete(self.current().skin_name.clone()));
        }
        Ok(map)
    }
}
