use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::TextProcessor;
use crate::models::Identifier;

static MODULE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^module.+\{$").expect("module block pattern is valid"));
static QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""[^"]*""#).expect("quoted string pattern is valid"));

/// Collects `source` attributes of `module` blocks.
#[derive(Debug, Default)]
pub struct ModuleSourceProcessor {
    in_module: bool,
    sources: Vec<String>,
}

impl ModuleSourceProcessor {
    /// Create a processor outside of any module block.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TextProcessor for ModuleSourceProcessor {
    fn process(&mut self, line: &str) {
        if !self.in_module {
            self.in_module = MODULE_BLOCK.is_match(line);
        }

        if self.in_module && line.starts_with("source") {
            if let Some(quoted) = QUOTED.find(line) {
                let raw = quoted.as_str();
                self.sources.push(raw[1..raw.len() - 1].to_string());
            }
        }

        if self.in_module && line == "}" {
            self.in_module = false;
        }
    }

    fn identifiers(&mut self) -> Vec<Identifier> {
        std::mem::take(&mut self.sources)
            .into_iter()
            .filter(|source| {
                if source.is_empty() {
                    debug!("Module block without a source");
                    return false;
                }
                if source.starts_with("./") || source.starts_with("../") {
                    debug!(source = %source, "Local module sources are not checked");
                    return false;
                }
                true
            })
            .map(Identifier::module)
            .collect()
    }
}
