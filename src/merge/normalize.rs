//! Entry normalization
//!
//! Classifies a raw directory entry into the identity used to group entries
//! across layers, plus the ordering information numbered files carry.
//!
//! Numbered ("ordered") files follow the pattern
//! `NNN[_pre|_post]_<rest>`, e.g. `020_pre_setup.ps1`. All ordered files in
//! one directory share a single identity so that they compete for one
//! sequence; everything else is identified by its literal name.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

/// `[0-9]` rather than `\d`: `\d` matches any Unicode digit.
static ORDERED_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]{3})(_(pre|post))?_(.*)$").expect("ordered entry pattern is valid")
});

/// Preference tag of an ordered file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Preference {
    /// `NNN_pre_name`: placed before every neutral step
    Pre,
    /// `NNN_name`
    Neutral,
    /// `NNN_post_name`: placed after every neutral step
    Post,
}

impl Preference {
    fn from_tag(tag: Option<&str>) -> Result<Self> {
        match tag {
            None | Some("") => Ok(Preference::Neutral),
            Some("pre") => Ok(Preference::Pre),
            Some("post") => Ok(Preference::Post),
            Some(other) => Err(Error::internal(format!(
                "unexpected ordering preference '{}'",
                other
            ))),
        }
    }
}

/// Grouping key for entries at one directory level.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    pub ordered: bool,
    /// Entry name; empty when `ordered` is true
    pub name: String,
}

impl Identity {
    pub fn unordered(name: impl Into<String>) -> Self {
        Self {
            ordered: false,
            name: name.into(),
        }
    }

    pub fn ordered() -> Self {
        Self {
            ordered: true,
            name: String::new(),
        }
    }
}

/// Ordering classification of a file entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderClass {
    Unordered,
    Ordered { index: u16, preference: Preference },
}

impl OrderClass {
    pub fn is_ordered(&self) -> bool {
        matches!(self, OrderClass::Ordered { .. })
    }
}

/// Result of normalizing one directory entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedEntry {
    pub identity: Identity,
    /// Base name the entry keeps in the output (prefix stripped for ordered files)
    pub target_name: String,
    pub class: OrderClass,
}

/// Normalize an entry name.
///
/// Directories always keep their literal name as identity, even when the
/// name looks numbered. The only failures are internal invariant violations.
pub fn normalize(name: &str, is_dir: bool) -> Result<NormalizedEntry> {
    if is_dir {
        return Ok(unordered(name));
    }

    let Some(captures) = ORDERED_NAME.captures(name) else {
        return Ok(unordered(name));
    };

    let digits = captures
        .get(1)
        .ok_or_else(|| Error::internal(format!("missing order index in '{}'", name)))?
        .as_str();
    let index = digits.parse::<u16>().map_err(|e| {
        Error::internal(format!("failed to parse order index '{}': {}", digits, e))
    })?;
    let preference = Preference::from_tag(captures.get(3).map(|m| m.as_str()))?;
    let target_name = captures.get(4).map(|m| m.as_str()).unwrap_or_default();

    Ok(NormalizedEntry {
        identity: Identity::ordered(),
        target_name: target_name.to_string(),
        class: OrderClass::Ordered { index, preference },
    })
}

fn unordered(name: &str) -> NormalizedEntry {
    NormalizedEntry {
        identity: Identity::unordered(name),
        target_name: name.to_string(),
        class: OrderClass::Unordered,
    }
}
