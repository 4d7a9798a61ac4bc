use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

pub const FALLBACK_LANGUAGE: &str = "en";

const BUILTIN: &[(&str, &str)] = &[
    ("en", include_str!("../locales/active.en.toml")),
    ("it", include_str!("../locales/active.it.toml")),
];

/// Looks up user-facing strings by key for a chat's language.
pub trait Localizer: Send + Sync {
    /// Renders `key` in `language`, substituting `{Param}` placeholders.
    fn localize(&self, language: &str, key: &str, params: &[(&str, &str)]) -> String;

    fn has_language(&self, language: &str) -> bool;

    fn languages(&self) -> Vec<String>;
}

/// Message bundles keyed by language, loaded from `active.<lang>.toml` files.
#[derive(Debug, Clone)]
pub struct Locales {
    bundles: BTreeMap<String, HashMap<String, String>>,
}

impl Locales {
    /// The English and Italian bundles compiled into the binary.
    pub fn builtin() -> Result<Self> {
        let mut bundles = BTreeMap::new();
        for (language, source) in BUILTIN {
            bundles.insert(language.to_string(), parse_bundle(source)?);
        }
        Ok(Self { bundles })
    }

    /// Loads every `active.<lang>.toml` file in `dir`.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let mut bundles = BTreeMap::new();
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("reading locales directory {}", dir.display()))?;

        for entry in entries {
            let path = entry?.path();
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else { continue };
            let Some(language) = file_name
                .strip_prefix("active.")
                .and_then(|rest| rest.strip_suffix(".toml"))
            else {
                continue;
            };

            let source = std::fs::read_to_string(&path)?;
            let bundle = parse_bundle(&source).with_context(|| format!("parsing {}", path.display()))?;
            bundles.insert(language.to_string(), bundle);
        }

        if !bundles.contains_key(FALLBACK_LANGUAGE) {
            bail!("locales directory {} has no {} bundle", dir.display(), FALLBACK_LANGUAGE);
        }

        info!("Loaded locales: {}", bundles.keys().cloned().collect::<Vec<_>>().join(", "));
        Ok(Self { bundles })
    }

    fn template(&self, language: &str, key: &str) -> Option<&str> {
        self.bundles
            .get(language)
            .and_then(|b| b.get(key))
            .or_else(|| self.bundles.get(FALLBACK_LANGUAGE).and_then(|b| b.get(key)))
            .map(String::as_str)
    }
}

impl Localizer for Locales {
    fn localize(&self, language: &str, key: &str, params: &[(&str, &str)]) -> String {
        let Some(template) = self.template(language, key) else {
            warn!("Missing locale key {} ({})", key, language);
            return key.to_string();
        };

        params.iter().fold(template.to_string(), |text, (name, value)| {
            text.replace(&format!("{{{name}}}"), value)
        })
    }

    fn has_language(&self, language: &str) -> bool {
        self.bundles.contains_key(language)
    }

    fn languages(&self) -> Vec<String> {
        self.bundles.keys().cloned().collect()
    }
}

fn parse_bundle(source: &str) -> Result<HashMap<String, String>> {
    Ok(toml::from_str(source)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_bundles_share_keys() {
        let locales = Locales::builtin().unwrap();
        assert_eq!(locales.languages(), vec!["en", "it"]);

        let en = &locales.bundles["en"];
        let it = &locales.bundles["it"];
        let mut missing: Vec<&String> = en.keys().filter(|k| !it.contains_key(*k)).collect();
        missing.sort();
        assert!(missing.is_empty(), "missing in it: {missing:?}");
    }

    #[test]
    fn substitutes_params() {
        let locales = Locales::builtin().unwrap();
        assert_eq!(locales.localize("en", "Join", &[("Name", "Catan")]), "Join Catan");
        assert_eq!(locales.localize("it", "Join", &[("Name", "Catan")]), "Partecipa a Catan");
    }

    #[test]
    fn falls_back_to_english_then_key() {
        let locales = Locales::builtin().unwrap();
        assert_eq!(locales.localize("xx", "NotComing", &[]), "I'm not coming");
        assert_eq!(locales.localize("en", "NoSuchKey", &[]), "NoSuchKey");
        assert!(!locales.has_language("xx"));
    }
}
