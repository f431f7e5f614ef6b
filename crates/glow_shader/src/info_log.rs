/// Default number of bytes of compiler/linker output we keep.
pub const INFO_LOG_CAPACITY: usize = 512;

/// Driver diagnostics from a compile or link step, capped at a fixed size.
///
/// Drivers can produce arbitrarily long logs for broken shaders.
/// We keep the first `capacity` bytes and remember whether anything was cut.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InfoLog {
    text: String,
    truncated: bool,
}

impl InfoLog {
    /// Keep at most `capacity` bytes of `raw`, cut on a character boundary.
    pub fn capture(raw: &str, capacity: usize) -> Self {
        // Some drivers include the terminating NUL in the reported length.
        let raw = raw.trim_end_matches(|c: char| c == '\0' || c.is_whitespace());

        if raw.len() <= capacity {
            return Self {
                text: raw.to_owned(),
                truncated: false,
            };
        }

        let mut end = capacity;
        while !raw.is_char_boundary(end) {
            end -= 1;
        }
        Self {
            text: raw[..end].to_owned(),
            truncated: true,
        }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// True if the driver produced more text than we kept.
    #[inline]
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}

impl std::fmt::Display for InfoLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.text.is_empty() {
            f.write_str("<no driver log>")
        } else if self.truncated {
            write!(f, "{}…", self.text)
        } else {
            f.write_str(&self.text)
        }
    }
}
