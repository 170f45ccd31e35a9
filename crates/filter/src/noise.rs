use once_cell::sync::Lazy;
use regex::RegexSet;

/// Header/envelope line patterns stripped by the default policy.
///
/// Matched case-insensitively and only at line start; a pattern
/// appearing mid-line is body text and must survive cleaning.
const DEFAULT_LINE_PATTERNS: &[&str] = &[
    r"(?i)^message-id:",
    r"(?i)^mime-version:",
    r"(?i)^content-type:",
    r"(?i)^content-transfer-encoding:",
    r"(?i)^x-.*?:",
    r"(?i)^from:",
    r"(?i)^to:",
    r"(?i)^cc:",
    r"(?i)^bcc:",
    r"(?i)^subject:",
    r"(?i)^date:",
    r"(?i)^received:",
    r"(?i)^forwarded by",
    r"(?i)^-+ forwarded by",
];

static DEFAULT_SET: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new(DEFAULT_LINE_PATTERNS).expect("default noise patterns are valid regexes")
});

/// Replaceable noise-pattern policy: decides which lines are
/// transport/envelope noise rather than body text.
#[derive(Debug, Clone)]
pub struct NoisePolicy {
    patterns: RegexSet,
}

impl Default for NoisePolicy {
    fn default() -> Self {
        Self {
            patterns: DEFAULT_SET.clone(),
        }
    }
}

impl NoisePolicy {
    /// Build a policy from custom line-anchored patterns.
    pub fn from_patterns<I, S>(patterns: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self {
            patterns: RegexSet::new(patterns)?,
        })
    }

    /// Whether a single line (without its terminator) is header noise.
    pub fn is_noise(&self, line: &str) -> bool {
        self.patterns.is_match(line)
    }

    /// Strip header noise and blank lines from raw mail text.
    ///
    /// Two line-by-line passes, header stripping first so headers
    /// followed by blank separators leave no stray blanks behind.
    /// Removed lines take their trailing newline with them; surviving
    /// lines keep their original terminators. Idempotent: cleaning
    /// already-cleaned text is a no-op.
    pub fn clean(&self, raw: &str) -> String {
        let mut cleaned = String::with_capacity(raw.len());
        for line in raw.split_inclusive('\n') {
            let content = line.trim_end_matches(['\n', '\r']);
            if self.is_noise(content) {
                continue;
            }
            if content.trim().is_empty() {
                continue;
            }
            cleaned.push_str(line);
        }
        cleaned
    }
}
