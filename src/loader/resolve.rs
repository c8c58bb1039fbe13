//! Identifier resolution hook

use std::collections::BTreeMap;

/// Maps a raw resource identifier to the one handed to the importer.
///
/// Must be pure: the same input yields the same output for the life of a load.
pub trait Resolve: Send + Sync {
    fn resolve(&self, url: &str) -> String;
}

/// Returns identifiers unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityResolver;

impl Resolve for IdentityResolver {
    fn resolve(&self, url: &str) -> String {
        url.to_string()
    }
}

/// Expands `@alias/rest` to `base/rest` for configured aliases
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasResolver {
    aliases: BTreeMap<String, String>,
}

impl AliasResolver {
    pub fn new(aliases: BTreeMap<String, String>) -> Self {
        Self { aliases }
    }

    pub fn with_alias(mut self, alias: impl Into<String>, base: impl Into<String>) -> Self {
        self.aliases.insert(alias.into(), base.into());
        self
    }
}

impl Resolve for AliasResolver {
    fn resolve(&self, url: &str) -> String {
        let Some(rest) = url.strip_prefix('@') else {
            return url.to_string();
        };
        let alias = rest.split('/').next().unwrap_or(rest);
        match self.aliases.get(alias) {
            Some(base) => format!("{}{}", base, &rest[alias.len()..]),
            None => url.to_string(),
        }
    }
}
