//! Selected skins and chromas for one extraction or repath run

use std::fmt;
use std::str::FromStr;

use crate::catalog::{Champion, Chroma, Skin};

/// One skin (optionally one of its chromas) picked by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub champion: Champion,
    pub skin: Skin,
    pub chroma: Option<Chroma>,
}

impl Selection {
    pub fn new(champion: Champion, skin: Skin, chroma: Option<Chroma>) -> Self {
        Self {
            champion,
            skin,
            chroma,
        }
    }

    /// Name shown in lists: the chroma name when a chroma is picked
    pub fn display_name(&self) -> &str {
        match &self.chroma {
            Some(chroma) => &chroma.name,
            None => &self.skin.name,
        }
    }

    /// `Champion - Skin` label for logs and progress lines
    pub fn label(&self) -> String {
        format!("{} - {}", self.champion.name, self.display_name())
    }

    /// Toggle identity: display name plus owning champion name
    pub fn same_entry(&self, other: &Selection) -> bool {
        self.display_name() == other.display_name() && self.champion.name == other.champion.name
    }
}

/// Ordered list of selections
#[derive(Debug, Clone, Default)]
pub struct SelectionList {
    items: Vec<Selection>,
}

impl SelectionList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `selection`, or remove it when already present.
    /// Returns whether it is selected afterwards.
    pub fn toggle(&mut self, selection: Selection) -> bool {
        if let Some(pos) = self.items.iter().position(|s| s.same_entry(&selection)) {
            self.items.remove(pos);
            false
        } else {
            self.items.push(selection);
            true
        }
    }

    /// Add `selection` unless already present
    pub fn insert(&mut self, selection: Selection) -> bool {
        if self.contains(&selection) {
            return false;
        }
        self.items.push(selection);
        true
    }

    pub fn contains(&self, selection: &Selection) -> bool {
        self.items.iter().any(|s| s.same_entry(selection))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Selection> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[Selection] {
        &self.items
    }
}

/// `champion:skin[:chroma]` as typed on the command line.
///
/// The champion part matches a name, alias or id; skin is the skin number
/// and chroma the chroma's skin id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionSpec {
    pub champion: String,
    pub skin: u32,
    pub chroma: Option<u64>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Invalid selection '{input}': expected champion:skin[:chroma]")]
pub struct SelectionSpecError {
    input: String,
}

impl FromStr for SelectionSpec {
    type Err = SelectionSpecError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let err = || SelectionSpecError {
            input: input.to_string(),
        };
        let mut parts = input.split(':');
        let champion = parts.next().map(str::trim).filter(|s| !s.is_empty()).ok_or_else(err)?;
        let skin = parts
            .next()
            .and_then(|s| s.trim().parse().ok())
            .ok_or_else(err)?;
        let chroma = match parts.next() {
            Some(c) => Some(c.trim().parse().map_err(|_| err())?),
            None => None,
        };
        if parts.next().is_some() {
            return Err(err());
        }
        Ok(Self {
            champion: champion.to_string(),
            skin,
            chroma,
        })
    }
}

impl fmt::Display for SelectionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.champion, self.skin)?;
        if let Some(chroma) = self.chroma {
            write!(f, ":{}", chroma)?;
        }
        Ok(())
    }
}
