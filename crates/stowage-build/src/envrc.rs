//! `.envrc` generation.
//!
//! Each config contributes one block of `export KEY="VALUE"` lines, keys
//! sorted. Blocks are written in reverse config order, so when the file is
//! sourced top to bottom the first config's exports run last and win:
//!
//! ```text
//! stowage compose web data
//!
//! export KEY="from data"   # data's block
//! export KEY="from web"    # web's block, last assignment wins
//! ```
//!
//! [`merged_environment()`] computes the same result as a map.
//!
//! Values are escaped so the shell reads them back literally. Keys that
//! are not shell identifiers cannot be exported and are skipped with a
//! warning, in both the document and the merged map.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use stowage_core::Configuration;

static SHELL_IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("shell identifier pattern is valid")
});

/// Whether `key` can be the name in `export KEY=...`.
pub fn is_exportable(key: &str) -> bool {
    SHELL_IDENTIFIER.is_match(key)
}

/// The `export` lines for one config, sorted by key.
pub fn export_block(config: &Configuration) -> String {
    let mut lines: Vec<String> = exportable(config)
        .map(|(key, value)| format!("export {key}=\"{}\"", escape(value)))
        .collect();
    lines.sort();
    lines.join("\n")
}

/// The full `.envrc` text for an ordered list of configs.
///
/// Configs without env contribute no block. A non-empty document ends
/// with a newline.
pub fn env_document(configs: &[Configuration]) -> String {
    let blocks: Vec<String> = configs
        .iter()
        .rev()
        .map(export_block)
        .filter(|block| !block.is_empty())
        .collect();
    if blocks.is_empty() {
        return String::new();
    }
    let mut document = blocks.join("\n");
    document.push('\n');
    document
}

/// The environment a shell ends up with after sourcing [`env_document()`].
///
/// Configs are applied in reverse order, so `configs[0]` wins per key.
pub fn merged_environment(configs: &[Configuration]) -> BTreeMap<String, String> {
    let mut merged = BTreeMap::new();
    for config in configs.iter().rev() {
        merged.extend(exportable(config).map(|(k, v)| (k.clone(), v.clone())));
    }
    merged
}

fn exportable(config: &Configuration) -> impl Iterator<Item = (&String, &String)> {
    config.env.iter().filter(move |(key, _)| {
        let ok = is_exportable(key);
        if !ok {
            tracing::warn!(
                config = %config.name,
                key = %key,
                "env key is not a shell identifier; leaving it out of .envrc"
            );
        }
        ok
    })
}

/// Backslash-escape everything a double-quoted shell string would
/// otherwise interpret.
fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '"' | '$' | '`') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
