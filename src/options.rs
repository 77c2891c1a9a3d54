//! Scanner and parser configuration.

/// Start/end delimiter pair that encloses code in mixed mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MixedDelimiter {
    pub start: String,
    pub end: String,
}

impl Default for MixedDelimiter {
    fn default() -> Self {
        Self {
            start: "#{".to_string(),
            end: "}".to_string(),
        }
    }
}

impl MixedDelimiter {
    #[must_use]
    pub fn new(start: &str, end: &str) -> Self {
        Self {
            start: start.to_string(),
            end: end.to_string(),
        }
    }
}

/// Options consumed by [`Scanner`](crate::scanner::Scanner).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct ScannerOptions {
    /// Emit comment tokens instead of skipping them.
    pub comments: bool,
    /// Never convert newlines into semicolons.
    pub no_auto_semicolons: bool,
    /// Start in text mode, with code between delimiters.
    pub mixed_mode: bool,
    /// Treat `# gad:` lines as ordinary comments.
    pub no_pragma: bool,
    /// A code block holding a lone expression emits its value.
    pub mixed_value_sugar: bool,
    /// Scan float literals as decimals.
    pub floats_as_decimal: bool,
    /// Scan quoted char literals as strings.
    pub char_as_string: bool,
    pub mixed_delimiter: MixedDelimiter,
}

impl ScannerOptions {
    #[must_use]
    pub fn comments(mut self, on: bool) -> Self {
        self.comments = on;
        self
    }

    #[must_use]
    pub fn no_auto_semicolons(mut self, on: bool) -> Self {
        self.no_auto_semicolons = on;
        self
    }

    #[must_use]
    pub fn mixed(mut self, on: bool) -> Self {
        self.mixed_mode = on;
        self
    }

    #[must_use]
    pub fn no_pragma(mut self, on: bool) -> Self {
        self.no_pragma = on;
        self
    }

    #[must_use]
    pub fn mixed_value_sugar(mut self, on: bool) -> Self {
        self.mixed_value_sugar = on;
        self
    }

    #[must_use]
    pub fn floats_as_decimal(mut self, on: bool) -> Self {
        self.floats_as_decimal = on;
        self
    }

    #[must_use]
    pub fn char_as_string(mut self, on: bool) -> Self {
        self.char_as_string = on;
        self
    }

    #[must_use]
    pub fn delimiter(mut self, start: &str, end: &str) -> Self {
        self.mixed_delimiter = MixedDelimiter::new(start, end);
        self
    }
}

/// Options consumed by [`Parser`](crate::parser::Parser).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserOptions {
    pub scanner: ScannerOptions,
    /// Stop after this many recorded errors.
    pub max_errors: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            scanner: ScannerOptions::default(),
            max_errors: 10,
        }
    }
}

impl ParserOptions {
    #[must_use]
    pub fn scanner(mut self, scanner: ScannerOptions) -> Self {
        self.scanner = scanner;
        self
    }

    #[must_use]
    pub fn max_errors(mut self, n: usize) -> Self {
        self.max_errors = n;
        self
    }
}
