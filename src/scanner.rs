use std::ops::Range;

use regex::Regex;

/// A `:name` reference found in the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    /// Byte range of the whole reference, marker included.
    pub span: Range<usize>,
    /// Parameter name without the marker.
    pub name: String,
}

/// Finds parameter references after a cursor.
///
/// A marker starts a parameter only when it is followed by at least one word
/// character (letters, digits, underscore), so purely numeric names like `:0`
/// are accepted. A run of two or more markers (`x::int`) is skipped as a whole,
/// and a marker at the very end of the buffer is plain text.
#[derive(Debug, Clone)]
pub struct Scanner {
    regex: Regex,
}

impl Scanner {
    /// Builds a scanner for the given marker character.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`](crate::Error::Parse) if the pattern cannot be compiled.
    pub fn new(marker: char) -> crate::Result<Self> {
        let m = regex::escape(marker.encode_utf8(&mut [0; 4]));
        let regex = Regex::new(&format!(r"(?:{m}){{2,}}|{m}(\w+)"))?;
        Ok(Self { regex })
    }

    /// Returns the first parameter reference starting at or after `from`.
    pub fn next_marker(&self, buf: &str, mut from: usize) -> Option<Marker> {
        while let Some(caps) = self.regex.captures_at(buf, from) {
            let whole = caps.get(0)?;
            match caps.get(1) {
                Some(name) => {
                    return Some(Marker {
                        span: whole.range(),
                        name: name.as_str().to_owned(),
                    })
                }
                None => from = whole.end(),
            }
        }
        None
    }
}
