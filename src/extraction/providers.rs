use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use super::TextProcessor;
use crate::models::Identifier;

static PROVIDER_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(.+) ?=.+ (\d*\.*\d*\.*\d*)""#).expect("provider version pattern is valid")
});

/// Collects `name = "<constraint>"` entries of `required_providers` blocks.
///
/// Only the numeric tail of the constraint is kept, so `"~> 1.41"` becomes
/// `v1.41`.
#[derive(Debug, Default)]
pub struct RequiredProvidersProcessor {
    in_required_providers: bool,
    providers: Vec<Identifier>,
}

impl RequiredProvidersProcessor {
    /// Create a processor outside of any `required_providers` block.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TextProcessor for RequiredProvidersProcessor {
    fn process(&mut self, line: &str) {
        if !self.in_required_providers {
            self.in_required_providers = line.contains("required_providers");
        }

        if self.in_required_providers {
            if let Some(captures) = PROVIDER_VERSION.captures(line) {
                let name = captures.get(1).map_or("", |m| m.as_str()).trim();
                let version = captures.get(2).map_or("", |m| m.as_str()).trim();
                if name.is_empty() {
                    warn!(line, "Failed to parse provider version specification");
                } else {
                    let constraint =
                        if version.starts_with('v') { version.to_string() } else { format!("v{version}") };
                    self.providers.push(Identifier::provider(name, constraint));
                }
            }
        }

        if self.in_required_providers && line == "}" {
            self.in_required_providers = false;
        }
    }

    fn identifiers(&mut self) -> Vec<Identifier> {
        std::mem::take(&mut self.providers)
    }
}
