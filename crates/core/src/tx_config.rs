//! Parser for the Transifex client configuration (`.tx/config`).
//!
//! The file is an ini-style document: one reserved `[main]` section holding
//! global client settings, and one section per resource whose name encodes
//! the organization, project and resource slugs:
//!
//! ```ini
//! [main]
//! host = https://app.transifex.com
//!
//! [o:acme:p:website:r:messages]
//! file_filter = locales/<lang>.json
//! source_file = locales/en.json
//! source_lang = en
//! type = KEYVALUEJSON
//! ```
//!
//! Only this composite naming is recognized. Sections whose names do not
//! match are skipped.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

use regex_lite::Regex;
use serde::Serialize;
use tracing::{debug, info};

use crate::errors::ConfigError;

/// Name of the section holding global client settings.
pub const MAIN_SECTION: &str = "main";

/// Key naming the file whose edits trigger a push.
pub const SOURCE_FILE_KEY: &str = "source_file";

// ---------------------------------------------------------------------------
// Resource keys
// ---------------------------------------------------------------------------

/// The organization / project / resource triple encoded in a section name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ResourceKey {
    pub organization: String,
    pub project: String,
    pub resource: String,
}

impl ResourceKey {
    /// The `<project>.<resource>` form accepted by `tx push`.
    pub fn push_target(&self) -> String {
        format!("{}.{}", self.project, self.resource)
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "o:{}:p:{}:r:{}",
            self.organization, self.project, self.resource
        )
    }
}

fn resource_key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?:o|org):(.+?):(?:p|project):(.+?):(?:r|resource):(.+)$")
            .unwrap_or_else(|e| panic!("invalid resource key pattern: {e}"))
    })
}

/// Parse a section name of the form `o:<org>:p:<project>:r:<resource>`.
///
/// The long tags `org:`, `project:` and `resource:` are accepted as well.
/// Returns `None` for anything else, including the reserved `main` section.
pub fn parse_resource_key(name: &str) -> Option<ResourceKey> {
    let caps = resource_key_pattern().captures(name.trim())?;
    Some(ResourceKey {
        organization: caps.get(1)?.as_str().to_string(),
        project: caps.get(2)?.as_str().to_string(),
        resource: caps.get(3)?.as_str().to_string(),
    })
}

// ---------------------------------------------------------------------------
// Document model
// ---------------------------------------------------------------------------

/// One translatable resource and the file that feeds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceEntry {
    /// The section name as written in the config file.
    pub key: String,
    pub parsed: ResourceKey,
    /// Path (relative to the repository root) of the source-language file.
    pub source_file: String,
    /// Every other option of the section, e.g. `file_filter`, `type`.
    pub options: BTreeMap<String, String>,
}

/// Global settings from the reserved `[main]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MainSection {
    pub settings: BTreeMap<String, String>,
}

impl MainSection {
    /// The Transifex host, if configured.
    pub fn host(&self) -> Option<&str> {
        self.settings.get("host").map(String::as_str)
    }
}

/// A parsed Transifex config: global settings plus resources in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TxConfig {
    pub main: MainSection,
    resources: Vec<ResourceEntry>,
}

impl TxConfig {
    /// Read and parse the config file at `path`.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading Transifex config");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse the contents of a Transifex config.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let sections = parse_sections(contents)?;

        let mut config = TxConfig::default();
        for (name, mut values) in sections {
            if name.is_empty() || name == MAIN_SECTION {
                config.main.settings.append(&mut values);
                continue;
            }

            let Some(parsed) = parse_resource_key(&name) else {
                debug!(section = %name, "skipping section that is not a resource key");
                continue;
            };

            let source_file =
                values
                    .remove(SOURCE_FILE_KEY)
                    .ok_or_else(|| ConfigError::MissingKey {
                        section: name.clone(),
                        key: SOURCE_FILE_KEY.into(),
                    })?;

            config.resources.push(ResourceEntry {
                key: name,
                parsed,
                source_file,
                options: values,
            });
        }

        debug!(count = config.resources.len(), "parsed resources");
        Ok(config)
    }

    /// Resources in the order their sections first appear.
    pub fn resources(&self) -> &[ResourceEntry] {
        &self.resources
    }

    /// Look up a resource by its section name.
    pub fn get(&self, key: &str) -> Option<&ResourceEntry> {
        self.resources.iter().find(|r| r.key == key)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Ini tokenizer
// ---------------------------------------------------------------------------

/// Split the document into sections in first-appearance order.
///
/// Keys before the first header land in a section named `""`. A repeated
/// header merges into the earlier section; later values win.
fn parse_sections(contents: &str) -> Result<Vec<(String, BTreeMap<String, String>)>, ConfigError> {
    let mut sections: Vec<(String, BTreeMap<String, String>)> = vec![(String::new(), BTreeMap::new())];
    let mut current = 0;

    for (idx, raw) in contents.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();

        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if let Some(rest) = line.strip_prefix('[') {
            let name = rest.strip_suffix(']').ok_or_else(|| ConfigError::ParseError {
                line: line_no,
                detail: format!("unterminated section header: {line}"),
            })?;
            let name = name.trim();
            if name.is_empty() {
                return Err(ConfigError::ParseError {
                    line: line_no,
                    detail: "empty section name".into(),
                });
            }

            current = match sections.iter().position(|(n, _)| n == name) {
                Some(pos) => pos,
                None => {
                    sections.push((name.to_string(), BTreeMap::new()));
                    sections.len() - 1
                }
            };
            continue;
        }

        let (key, value) = line.split_once('=').ok_or_else(|| ConfigError::ParseError {
            line: line_no,
            detail: format!("expected 'key = value', found: {line}"),
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(ConfigError::ParseError {
                line: line_no,
                detail: "empty key".into(),
            });
        }

        sections[current]
            .1
            .insert(key.to_string(), value.trim().to_string());
    }

    Ok(sections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_config() -> &'static str {
        r#"
[main]
host = https://app.transifex.com

[o:acme:p:website:r:messages]
file_filter = locales/<lang>.json
source_file = locales/en.json
source_lang = en
type = KEYVALUEJSON

; emails are translated separately
[o:acme:p:website:r:emails]
file_filter = emails/<lang>/templates.json
source_file = emails/en/templates.json
source_lang = en
"#
    }

    #[test]
    fn test_parse_resource_key() {
        let key = parse_resource_key("o:acme:p:website:r:messages").unwrap();
        assert_eq!(key.organization, "acme");
        assert_eq!(key.project, "website");
        assert_eq!(key.resource, "messages");
        assert_eq!(key.push_target(), "website.messages");
        assert_eq!(key.to_string(), "o:acme:p:website:r:messages");
    }

    #[test]
    fn test_parse_resource_key_long_tags() {
        let key = parse_resource_key("org:acme:project:app:resource:strings").unwrap();
        assert_eq!(key.project, "app");
        assert_eq!(key.resource, "strings");
    }

    #[test]
    fn test_parse_resource_key_rejects_other_dialects() {
        assert_eq!(parse_resource_key("main"), None);
        assert_eq!(parse_resource_key("website.messages"), None);
        assert_eq!(parse_resource_key("o::p:website:r:messages"), None);
        assert_eq!(parse_resource_key("o:acme:p:website:r:"), None);
        assert_eq!(parse_resource_key("x:o:acme:p:website:r:messages"), None);
    }

    #[test]
    fn test_parse_full_config() {
        let config = TxConfig::parse(sample_config()).unwrap();
        assert_eq!(config.len(), 2);
        assert_eq!(config.main.host(), Some("https://app.transifex.com"));

        let messages = config.get("o:acme:p:website:r:messages").unwrap();
        assert_eq!(messages.source_file, "locales/en.json");
        assert_eq!(messages.options.get("type").map(String::as_str), Some("KEYVALUEJSON"));
        assert!(!messages.options.contains_key(SOURCE_FILE_KEY));

        let keys: Vec<_> = config.resources().iter().map(|r| r.parsed.resource.as_str()).collect();
        assert_eq!(keys, vec!["messages", "emails"]);
    }

    #[test]
    fn test_main_section_is_not_a_resource() {
        let config = TxConfig::parse(sample_config()).unwrap();
        assert!(config.get(MAIN_SECTION).is_none());
        assert!(config.resources().iter().all(|r| r.key != MAIN_SECTION));
    }

    #[test]
    fn test_section_count_matches_resource_count() {
        let mut doc = String::from("[main]\nhost = https://example.com\n");
        for i in 0..7 {
            doc.push_str(&format!("[o:acme:p:proj:r:res{i}]\nsource_file = src/{i}/en.po\n"));
        }
        let first = TxConfig::parse(&doc).unwrap();
        let second = TxConfig::parse(&doc).unwrap();
        assert_eq!(first.len(), 7);
        assert_eq!(first, second);
    }

    #[test]
    fn test_non_matching_sections_are_skipped() {
        let doc = "\
[website.legacy]
source_file = legacy/en.json

[o:acme:p:website:r:messages]
source_file = locales/en.json
";
        let config = TxConfig::parse(doc).unwrap();
        assert_eq!(config.len(), 1);
        assert!(config.get("website.legacy").is_none());
    }

    #[test]
    fn test_missing_source_file_is_an_error() {
        let doc = "[o:acme:p:website:r:messages]\nsource_lang = en\n";
        let result = TxConfig::parse(doc);
        assert!(matches!(
            result,
            Err(ConfigError::MissingKey { ref key, .. }) if key == SOURCE_FILE_KEY
        ));
    }

    #[test]
    fn test_malformed_line_is_a_parse_error() {
        let doc = "[main]\nhost = x\nthis line is garbage\n";
        let result = TxConfig::parse(doc);
        assert!(matches!(result, Err(ConfigError::ParseError { line: 3, .. })));
    }

    #[test]
    fn test_unterminated_header_is_a_parse_error() {
        let result = TxConfig::parse("[o:acme:p:website:r:messages\nsource_file = a\n");
        assert!(matches!(result, Err(ConfigError::ParseError { line: 1, .. })));
    }

    #[test]
    fn test_duplicate_sections_merge() {
        let doc = "\
[o:acme:p:web:r:a]
source_file = old/en.json
[o:acme:p:web:r:b]
source_file = b/en.json
[o:acme:p:web:r:a]
source_file = new/en.json
";
        let config = TxConfig::parse(doc).unwrap();
        assert_eq!(config.len(), 2);
        assert_eq!(config.resources()[0].source_file, "new/en.json");
    }

    #[test]
    fn test_values_keep_embedded_equals() {
        let doc = "[main]\nhost = https://example.com/?a=b\n";
        let config = TxConfig::parse(doc).unwrap();
        assert_eq!(config.main.host(), Some("https://example.com/?a=b"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(sample_config().as_bytes()).unwrap();

        let config = TxConfig::load_from_file(&path).unwrap();
        assert_eq!(config.len(), 2);
    }

    #[test]
    fn test_file_not_found() {
        let result = TxConfig::load_from_file("/nonexistent/.tx/config");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }
}
