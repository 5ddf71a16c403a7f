//! Primitive type inference from a small sample of raw text values.
//!
//! The sampler makes a single pass over the sample, tracking whether every
//! meaningful value looks like a number, a whole number, or a logical flag.
//! Values that are empty, whitespace-only, or start with an `NA`/`Na` marker
//! are skipped. The decision cascade is:
//!
//! 1. nothing but skipped values → `string`
//! 2. all numeric → `double` if any fractional literal was seen or a double
//!    is preferred, `integer` otherwise
//! 3. all logical (`t`, `f`, `true`, `false`, any case) → `boolean`
//! 4. otherwise → `string`
//!
//! Numbers are checked first, so a sample is never classified as boolean
//! if it is also numeric.
//!
//! # Example
//!
//! ```rust
//! use term_stats::sampler::{infer_type, InferredType};
//!
//! assert_eq!(infer_type(["1", "2", "3"], false), InferredType::Integer);
//! assert_eq!(infer_type(["1.5", "2", "NA"], false), InferredType::Double);
//! assert_eq!(infer_type(["T", "F", "true"], false), InferredType::Boolean);
//! assert_eq!(infer_type(["NA", "NA"], false), InferredType::String);
//! ```

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::schema::ColumnKind;

/// Best-fit primitive type for a sampled column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InferredType {
    String,
    Integer,
    Double,
    Boolean,
}

impl InferredType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InferredType::String => "string",
            InferredType::Integer => "integer",
            InferredType::Double => "double",
            InferredType::Boolean => "boolean",
        }
    }

    /// Column kind a column of this type is declared with.
    pub fn column_kind(&self) -> ColumnKind {
        match self {
            InferredType::Integer => ColumnKind::Integral,
            InferredType::Double => ColumnKind::Fractional,
            InferredType::String | InferredType::Boolean => ColumnKind::Other,
        }
    }
}

impl fmt::Display for InferredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Matches 123 | -123 | 1,234 | 1,234.5 | 12. | .5
static NUMBER: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^-?(?:\d+(?:,\d+)*(?:\.\d*)?|\.\d+)$")
        .expect("Hard-coded regex pattern should be valid")
});

/// A decimal point followed by at least one digit.
static FRACTION: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"\.\d+$").expect("Hard-coded regex pattern should be valid")
});

/// Running state of the single classification pass.
#[derive(Debug, Clone, Copy)]
struct SampleFlags {
    is_number: bool,
    is_integer: bool,
    is_logical: bool,
    all_na: bool,
}

impl SampleFlags {
    fn new() -> Self {
        Self {
            is_number: true,
            is_integer: true,
            is_logical: true,
            all_na: true,
        }
    }

    fn observe(&mut self, value: Option<&str>) {
        let Some(value) = value else {
            return;
        };
        if is_missing(value) {
            return;
        }
        self.all_na = false;

        if self.is_number {
            if !NUMBER.is_match(value) {
                self.is_number = false;
            } else if self.is_integer && FRACTION.is_match(value) {
                self.is_integer = false;
            }
        }

        if self.is_logical && !is_logical_literal(value) {
            self.is_logical = false;
        }
    }

    fn decide(&self, prefer_double: bool) -> InferredType {
        if self.all_na {
            InferredType::String
        } else if self.is_number {
            if !self.is_integer || prefer_double {
                InferredType::Double
            } else {
                InferredType::Integer
            }
        } else if self.is_logical {
            InferredType::Boolean
        } else {
            InferredType::String
        }
    }
}

fn is_missing(value: &str) -> bool {
    value.starts_with("NA") || value.starts_with("Na") || value.trim().is_empty()
}

fn is_logical_literal(value: &str) -> bool {
    ["t", "f", "true", "false"]
        .iter()
        .any(|literal| value.eq_ignore_ascii_case(literal))
}

/// Infers the type of a column from its raw sampled values.
pub fn infer_type<I, S>(sample: I, prefer_double: bool) -> InferredType
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut flags = SampleFlags::new();
    for value in sample {
        flags.observe(Some(value.as_ref()));
    }
    flags.decide(prefer_double)
}

/// Like [`infer_type`], with `None` entries treated as missing values.
pub fn infer_nullable_type<I, S>(sample: I, prefer_double: bool) -> InferredType
where
    I: IntoIterator<Item = Option<S>>,
    S: AsRef<str>,
{
    let mut flags = SampleFlags::new();
    for value in sample {
        flags.observe(value.as_ref().map(|v| AsRef::<str>::as_ref(v)));
    }
    flags.decide(prefer_double)
}

/// Configuration for sampling delimited text lines.
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    /// Number of lines to inspect, the header line included (default: 5)
    pub sample_size: usize,
    /// Field separator (default: ",")
    pub separator: String,
    /// Whether the first line holds column names (default: false)
    pub has_header: bool,
    /// Classify numeric columns as double even when all values are whole (default: true)
    pub prefer_double: bool,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            sample_size: 5,
            separator: ",".to_string(),
            has_header: false,
            prefer_double: true,
        }
    }
}

/// Builder for [`TypeSampler`].
pub struct TypeSamplerBuilder {
    config: SamplerConfig,
}

impl TypeSamplerBuilder {
    pub fn sample_size(mut self, size: usize) -> Self {
        self.config.sample_size = size;
        self
    }

    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.config.separator = separator.into();
        self
    }

    pub fn has_header(mut self, has_header: bool) -> Self {
        self.config.has_header = has_header;
        self
    }

    pub fn prefer_double(mut self, prefer: bool) -> Self {
        self.config.prefer_double = prefer;
        self
    }

    pub fn build(self) -> TypeSampler {
        TypeSampler {
            config: self.config,
        }
    }
}

/// Infers a column layout from the first lines of a delimited text source.
#[derive(Debug, Clone, Default)]
pub struct TypeSampler {
    config: SamplerConfig,
}

impl TypeSampler {
    pub fn builder() -> TypeSamplerBuilder {
        TypeSamplerBuilder {
            config: SamplerConfig::default(),
        }
    }

    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Infers a single column's type using the configured double preference.
    pub fn infer_column<I, S>(&self, sample: I) -> InferredType
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        infer_type(sample, self.config.prefer_double)
    }

    /// Returns `(column name, inferred type)` for every column of the sample.
    ///
    /// Without a header, columns are named `V1..Vn`; a header line counts
    /// toward `sample_size`. The column count comes from the first line;
    /// cells missing from shorter lines count as NA.
    #[instrument(skip(self, lines), fields(sample_size = self.config.sample_size))]
    pub fn infer_line_schema<S: AsRef<str>>(&self, lines: &[S]) -> Vec<(String, InferredType)> {
        let separator = self.config.separator.as_str();
        let mut lines = lines.iter().map(|line| AsRef::<str>::as_ref(line));

        let Some(first) = lines.next() else {
            return Vec::new();
        };
        let first_split: Vec<&str> = first.split(separator).collect();

        let (headers, data_lines): (Vec<String>, Vec<&str>) = if self.config.has_header {
            (
                first_split.iter().map(|name| name.trim().to_string()).collect(),
                lines
                    .take(self.config.sample_size.saturating_sub(1))
                    .collect(),
            )
        } else {
            (
                (1..=first_split.len()).map(|i| format!("V{i}")).collect(),
                std::iter::once(first)
                    .chain(lines)
                    .take(self.config.sample_size)
                    .collect(),
            )
        };

        let rows: Vec<Vec<&str>> = data_lines
            .iter()
            .map(|line| line.split(separator).collect())
            .collect();

        debug!(columns = headers.len(), rows = rows.len(), "Sampled lines");

        headers
            .into_iter()
            .enumerate()
            .map(|(index, name)| {
                let column = rows.iter().map(|row| row.get(index).copied());
                (name, infer_nullable_type(column, self.config.prefer_double))
            })
            .collect()
    }
}
