//! Attribute validators
//!
//! Validators are attached to attributes through
//! [`AttributeBuilder::validator`](crate::schema::AttributeBuilder::validator)
//! and run by [`Schema::validate`](crate::schema::Schema::validate).
//! Null and unknown values are skipped; presence is checked separately.

use crate::types::{AttributePath, Diagnostic, Dynamic};
use regex::Regex;

pub trait Validator: Send + Sync {
    /// Human-readable description
    fn description(&self) -> String;

    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Vec<Diagnostic>);
}

/// Accepts only the listed strings
pub struct StringOneOf {
    allowed: Vec<String>,
}

impl StringOneOf {
    pub fn new<S: AsRef<str>>(allowed: &[S]) -> Self {
        Self {
            allowed: allowed.iter().map(|s| s.as_ref().to_string()).collect(),
        }
    }
}

impl Validator for StringOneOf {
    fn description(&self) -> String {
        format!("value must be one of: {}", self.allowed.join(", "))
    }

    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Vec<Diagnostic>) {
        if let Some(s) = value.as_str() {
            if !self.allowed.iter().any(|a| a == s) {
                diagnostics.push(
                    Diagnostic::error(
                        format!("Invalid value for {}", path),
                        format!("got \"{}\", {}", s, self.description()),
                    )
                    .with_attribute(path.clone()),
                );
            }
        }
    }
}

/// Requires the string to match a regular expression
pub struct StringPattern {
    pattern: String,
    description: String,
}

impl StringPattern {
    pub fn new(pattern: &str, description: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            description: description.to_string(),
        }
    }
}

impl Validator for StringPattern {
    fn description(&self) -> String {
        self.description.clone()
    }

    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Vec<Diagnostic>) {
        let Some(s) = value.as_str() else {
            return;
        };
        match Regex::new(&self.pattern) {
            Ok(re) if re.is_match(s) => {}
            Ok(_) => diagnostics.push(
                Diagnostic::error(
                    format!("Invalid value for {}", path),
                    format!("\"{}\" {}", s, self.description),
                )
                .with_attribute(path.clone()),
            ),
            Err(e) => diagnostics.push(Diagnostic::error(
                format!("Invalid pattern for {}", path),
                e.to_string(),
            )),
        }
    }
}

/// Accepts only the listed whole numbers
pub struct IntOneOf {
    allowed: Vec<i64>,
}

impl IntOneOf {
    pub fn new(allowed: impl IntoIterator<Item = i64>) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
        }
    }
}

impl Validator for IntOneOf {
    fn description(&self) -> String {
        let allowed: Vec<String> = self.allowed.iter().map(i64::to_string).collect();
        format!("value must be one of: {}", allowed.join(", "))
    }

    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Vec<Diagnostic>) {
        if let Some(n) = value.as_number() {
            if n.fract() != 0.0 || !self.allowed.contains(&(n as i64)) {
                diagnostics.push(
                    Diagnostic::error(
                        format!("Invalid value for {}", path),
                        format!("got {}, {}", n, self.description()),
                    )
                    .with_attribute(path.clone()),
                );
            }
        }
    }
}

pub struct NumberRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Validator for NumberRange {
    fn description(&self) -> String {
        match (self.min, self.max) {
            (Some(min), Some(max)) => format!("value must be between {} and {}", min, max),
            (Some(min), None) => format!("value must be at least {}", min),
            (None, Some(max)) => format!("value must be at most {}", max),
            (None, None) => "any number".to_string(),
        }
    }

    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Vec<Diagnostic>) {
        if let Some(n) = value.as_number() {
            let below = self.min.is_some_and(|min| n < min);
            let above = self.max.is_some_and(|max| n > max);
            if below || above {
                diagnostics.push(
                    Diagnostic::error(
                        format!("Invalid value for {}", path),
                        format!("got {}, {}", n, self.description()),
                    )
                    .with_attribute(path.clone()),
                );
            }
        }
    }
}

pub struct ListLength {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl Validator for ListLength {
    fn description(&self) -> String {
        format!(
            "list must have between {} and {} items",
            self.min.unwrap_or(0),
            self.max.map_or("unlimited".to_string(), |m| m.to_string())
        )
    }

    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Vec<Diagnostic>) {
        if let Some(items) = value.as_list() {
            let len = items.len();
            if self.min.is_some_and(|min| len < min) || self.max.is_some_and(|max| len > max) {
                diagnostics.push(
                    Diagnostic::error(
                        format!("Invalid number of items for {}", path),
                        format!("got {} items, {}", len, self.description()),
                    )
                    .with_attribute(path.clone()),
                );
            }
        }
    }
}

/// Applies the inner validator to every element of a list
pub struct Each<V>(pub V);

impl<V: Validator> Validator for Each<V> {
    fn description(&self) -> String {
        format!("each element: {}", self.0.description())
    }

    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Vec<Diagnostic>) {
        if let Some(items) = value.as_list() {
            for (idx, item) in items.iter().enumerate() {
                self.0
                    .validate(item, &path.clone().index(idx as i64), diagnostics);
            }
        }
    }
}
