use std::fmt;
use thiserror::Error;

/// Lines in a browser "Decoded:" dump that belong to the protobuf debug view.
const DECODED_MARKER: &str = "Decoded:";
const SKIP_PREFIXES: [&str; 4] = ["message ", "//", "repeated ", "int32 "];

/// Past this offset a `": "` is more likely inside a value than after a name.
const MAX_NAME_OFFSET: usize = 50;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HeaderError {
    #[error("Headers cannot be empty")]
    Empty,

    #[error(
        "Invalid headers format. Each header name must have a corresponding value. \
         Got {count} lines (should be even). Last line: '{last_line}'"
    )]
    Malformed { count: usize, last_line: String },
}

/// Ordered `name: value` pairs as pasted by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet {
    entries: Vec<(String, String)>,
}

impl HeaderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repeated names keep their first position and take the latest value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .entries
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for HeaderSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{}: {}", name, value)?;
        }
        Ok(())
    }
}

/// Turns a copy-pasted header blob into a [`HeaderSet`].
///
/// Accepts either canonical `name: value` lines or the alternating
/// name/value layout that browser dev tools produce, with any `Decoded:`
/// protobuf section stripped out. A real header that starts with one of the
/// skip prefixes right after a `Decoded:` block is dropped as well.
pub fn normalize(raw: &str) -> Result<HeaderSet, HeaderError> {
    if raw.trim().is_empty() {
        return Err(HeaderError::Empty);
    }

    let lines: Vec<&str> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    if lines.first().is_some_and(|first| is_canonical_line(first)) {
        let mut headers = HeaderSet::new();
        for &line in &lines {
            let (name, value) = line.split_once(": ").unwrap_or((line, ""));
            headers.insert(name, value);
        }
        return Ok(headers);
    }

    let kept = strip_decoded_sections(&lines);
    if kept.len() % 2 != 0 {
        return Err(HeaderError::Malformed {
            count: kept.len(),
            last_line: kept.last().map(|l| l.to_string()).unwrap_or_default(),
        });
    }

    let mut headers = HeaderSet::new();
    for pair in kept.chunks_exact(2) {
        headers.insert(pair[0], pair[1]);
    }

    if headers.is_empty() {
        return Err(HeaderError::Empty);
    }
    Ok(headers)
}

fn is_canonical_line(line: &str) -> bool {
    match line.find(": ") {
        Some(byte_pos) => {
            let pos = line[..byte_pos].chars().count();
            pos > 0 && pos < MAX_NAME_OFFSET
        }
        None => false,
    }
}

fn strip_decoded_sections<'a>(lines: &[&'a str]) -> Vec<&'a str> {
    let mut kept = Vec::with_capacity(lines.len());
    let mut skipping = false;

    for &line in lines {
        if line == DECODED_MARKER {
            skipping = true;
            continue;
        }
        if skipping {
            if is_decoded_line(line) {
                continue;
            }
            skipping = false;
        }
        kept.push(line);
    }

    kept
}

fn is_decoded_line(line: &str) -> bool {
    SKIP_PREFIXES.iter().any(|prefix| line.starts_with(prefix))
        || line == "}"
        || line.contains('{')
}
