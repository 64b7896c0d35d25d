use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;
use core::str::FromStr;

/// A hierarchical content name, e.g. `/video/seg/7`.
///
/// Components are opaque byte strings. The root name `/` has zero components
/// and is a prefix of every name.
///
/// The URI form percent-escapes every byte outside `A-Z a-z 0-9 - . _ ~ = +`.
/// A component made only of periods is written with three extra periods, so
/// `...` is the empty component. Printing a name and parsing the result
/// always gives back the same name.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Name {
    components: Vec<Box<[u8]>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    /// Names are absolute; the URI form must start with `/`.
    NotAbsolute,
    /// A `%` not followed by two hex digits.
    BadEscape,
}

impl fmt::Display for NameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameError::NotAbsolute => f.write_str("name must start with '/'"),
            NameError::BadEscape => f.write_str("'%' must be followed by two hex digits"),
        }
    }
}

impl core::error::Error for NameError {}

impl Name {
    pub fn root() -> Self {
        Self::default()
    }

    /// Parses the URI form. Empty components (`/a//b`) are skipped.
    pub fn parse(uri: &str) -> Result<Self, NameError> {
        let rest = uri.strip_prefix('/').ok_or(NameError::NotAbsolute)?;
        let components = rest
            .split('/')
            .filter(|c| !c.is_empty())
            .map(decode_component)
            .collect::<Result<_, _>>()?;
        Ok(Self { components })
    }

    pub fn from_components<I, C>(components: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: AsRef<[u8]>,
    {
        Self {
            components: components.into_iter().map(|c| Box::from(c.as_ref())).collect(),
        }
    }

    /// Returns a new name with `component` appended.
    pub fn child(&self, component: impl AsRef<[u8]>) -> Self {
        let mut components = self.components.clone();
        components.push(Box::from(component.as_ref()));
        Self { components }
    }

    pub fn components(&self) -> impl Iterator<Item = &[u8]> {
        self.components.iter().map(|c| &**c)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn is_prefix_of(&self, other: &Name) -> bool {
        self.components.len() <= other.components.len()
            && self
                .components
                .iter()
                .zip(other.components.iter())
                .all(|(a, b)| a == b)
    }
}

impl FromStr for Name {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Name::parse(s)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.components.is_empty() {
            return f.write_str("/");
        }
        for component in &self.components {
            f.write_str("/")?;
            if component.iter().all(|&b| b == b'.') {
                f.write_str("...")?;
            }
            for &byte in component.iter() {
                if is_unreserved(byte) {
                    write!(f, "{}", byte as char)?;
                } else {
                    write!(f, "%{:02X}", byte)?;
                }
            }
        }
        Ok(())
    }
}

fn is_unreserved(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~' | b'=' | b'+')
}

fn decode_component(text: &str) -> Result<Box<[u8]>, NameError> {
    let raw = text.as_bytes();
    if raw.len() >= 3 && raw.iter().all(|&b| b == b'.') {
        return Ok(Box::from(&raw[3..]));
    }
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'%' {
            let hi = raw.get(i + 1).and_then(|&b| hex_value(b));
            let lo = raw.get(i + 2).and_then(|&b| hex_value(b));
            match (hi, lo) {
                (Some(hi), Some(lo)) => out.push((hi << 4) | lo),
                _ => return Err(NameError::BadEscape),
            }
            i += 3;
        } else {
            out.push(raw[i]);
            i += 1;
        }
    }
    Ok(out.into_boxed_slice())
}

fn hex_value(digit: u8) -> Option<u8> {
    match digit {
        b'0'..=b'9' => Some(digit - b'0'),
        b'a'..=b'f' => Some(digit - b'a' + 10),
        b'A'..=b'F' => Some(digit - b'A' + 10),
        _ => None,
    }
}
