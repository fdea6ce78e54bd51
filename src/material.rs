use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

/// Material name to share, in the order the page lists them.
///
/// Shares are kept as written on the page ("58%", sometimes "58"); use
/// [`parse_percentage`] for the numeric value. Shares are not guaranteed to
/// sum to 100.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Composition {
    entries: Vec<(String, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseMatch {
    Sensitive,
    Insensitive,
}

impl Composition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses "58% Cotton, 42% Polyester" into `{"Cotton": "58%", "Polyester": "42%"}`.
    pub fn parse(text: &str) -> Self {
        let mut composition = Self::new();
        for segment in text.split(',') {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            match split_segment(segment) {
                Some((share, name)) => composition.insert(name, share),
                None => debug!(segment, "composition segment without share"),
            }
        }
        composition
    }

    /// Later shares for a known material replace the value but keep its position.
    pub fn insert(&mut self, name: impl Into<String>, share: impl Into<String>) {
        let name = name.into();
        let share = share.into();
        match self.entries.iter_mut().find(|(known, _)| *known == name) {
            Some(entry) => entry.1 = share,
            None => self.entries.push((name, share)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(known, _)| known == name)
            .map(|(_, share)| share.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn percentage(&self, name: &str) -> Option<u32> {
        self.get(name).and_then(parse_percentage)
    }

    pub fn percentage_by_suffix(&self, code: &str, case: CaseMatch) -> Option<u32> {
        self.entries
            .iter()
            .find(|(name, _)| ends_with(name, code, case))
            .and_then(|(_, share)| parse_percentage(share))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, share)| (name.as_str(), share.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for Composition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (name, share)) in self.entries.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{share} {name}")?;
        }
        Ok(())
    }
}

impl Serialize for Composition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, share) in &self.entries {
            map.serialize_entry(name, share)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Composition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CompositionVisitor;

        impl<'de> Visitor<'de> for CompositionVisitor {
            type Value = Composition;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of material name to share")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut composition = Composition::new();
                while let Some((name, share)) = access.next_entry::<String, String>()? {
                    composition.insert(name, share);
                }
                Ok(composition)
            }
        }

        deserializer.deserialize_map(CompositionVisitor)
    }
}

/// "58% Cotton" -> ("58%", "Cotton"): share first, the rest is the name.
/// A detached sign ("30 % Wool") stays with the share.
fn split_segment(segment: &str) -> Option<(&str, &str)> {
    let (number, rest) = segment.split_once(' ')?;
    let (share, name) = match rest.trim_start().strip_prefix('%') {
        Some(name) => {
            let share_end = segment.len() - name.len();
            (segment[..share_end].trim_end(), name)
        }
        None => (number, rest),
    };
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((share, name))
}

/// Parses "80%", "80 %" or "80" into 80.
pub fn parse_percentage(text: &str) -> Option<u32> {
    let stripped = text.trim();
    let stripped = stripped.strip_suffix('%').unwrap_or(stripped).trim();
    stripped.parse().ok()
}

/// Looks up the share of the first `"<pct> <name>"` segment whose name ends
/// with `code`.
pub fn percentage_by_suffix<S: AsRef<str>>(
    segments: &[S],
    code: &str,
    case: CaseMatch,
) -> Option<u32> {
    segments
        .iter()
        .filter_map(|segment| split_segment(segment.as_ref().trim()))
        .find(|(_, name)| ends_with(name, code, case))
        .and_then(|(share, _)| parse_percentage(share))
}

fn ends_with(name: &str, code: &str, case: CaseMatch) -> bool {
    match case {
        CaseMatch::Sensitive => name.ends_with(code),
        CaseMatch::Insensitive => name.to_lowercase().ends_with(&code.to_lowercase()),
    }
}
