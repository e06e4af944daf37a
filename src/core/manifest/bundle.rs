use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::core::error::{UniverseError, UniverseResult};

pub const KEY_NAME: &str = "OpenIDE-Module-Name";
pub const KEY_DISPLAY_CATEGORY: &str = "OpenIDE-Module-Display-Category";
pub const KEY_SHORT_DESCRIPTION: &str = "OpenIDE-Module-Short-Description";
pub const KEY_LONG_DESCRIPTION: &str = "OpenIDE-Module-Long-Description";

/// Localized display data of a module, from its localizing bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedBundleInfo {
    pub display_name: Option<String>,
    pub category: Option<String>,
    pub short_description: Option<String>,
    pub long_description: Option<String>,
}

impl LocalizedBundleInfo {
    pub const EMPTY: Self = Self {
        display_name: None,
        category: None,
        short_description: None,
        long_description: None,
    };

    /// Build from `.properties` text.
    pub fn parse(text: &str) -> Self {
        let mut props = parse_properties(text);
        let mut take = |key: &str| props.remove(key).filter(|v| !v.trim().is_empty());
        Self {
            display_name: take(KEY_NAME),
            category: take(KEY_DISPLAY_CATEGORY),
            short_description: take(KEY_SHORT_DESCRIPTION),
            long_description: take(KEY_LONG_DESCRIPTION),
        }
    }

    /// Read the bundle `resource` out of `jar`. A missing resource gives
    /// [`LocalizedBundleInfo::EMPTY`].
    pub fn read_from_jar(jar: &Path, resource: &str) -> UniverseResult<Self> {
        let file = File::open(jar).map_err(|e| UniverseError::io(jar, e))?;
        let mut archive = zip::ZipArchive::new(file)?;
        let mut entry = match archive.by_name(resource.trim_start_matches('/')) {
            Ok(entry) => entry,
            Err(zip::result::ZipError::FileNotFound) => return Ok(Self::EMPTY),
            Err(e) => return Err(e.into()),
        };
        let mut bytes = Vec::new();
        entry
            .read_to_end(&mut bytes)
            .map_err(|e| UniverseError::io(jar, e))?;
        // Property files are ISO-8859-1.
        let text: String = bytes.iter().map(|&b| char::from(b)).collect();
        Ok(Self::parse(&text))
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }
}

/// Minimal `java.util.Properties` reader: comments, `=`/`:`/blank
/// separators, backslash line continuation and escapes.
fn parse_properties(text: &str) -> HashMap<String, String> {
    let mut props = HashMap::new();
    let mut lines = text.lines();

    while let Some(first) = lines.next() {
        let mut logical = first.trim_start().to_string();
        if logical.is_empty() || logical.starts_with('#') || logical.starts_with('!') {
            continue;
        }
        while ends_with_continuation(&logical) {
            logical.pop();
            match lines.next() {
                Some(next) => logical.push_str(next.trim_start()),
                None => break,
            }
        }

        let (key, value) = split_key_value(&logical);
        props.insert(unescape(key), unescape(value));
    }

    props
}

fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

fn split_key_value(line: &str) -> (&str, &str) {
    let mut escaped = false;
    for (idx, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => return (&line[..idx], line[idx + 1..].trim_start()),
            c if c.is_whitespace() => {
                let rest = line[idx..].trim_start();
                let rest = rest
                    .strip_prefix('=')
                    .or_else(|| rest.strip_prefix(':'))
                    .unwrap_or(rest);
                return (&line[..idx], rest.trim_start());
            }
            _ => {}
        }
    }
    (line, "")
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => out.push_str(&hex),
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testutil::write_jar;

    #[test]
    fn bundle_keys_are_extracted() {
        let info = LocalizedBundleInfo::parse(
            "# comment\n\
             OpenIDE-Module-Name=Foo API\n\
             OpenIDE-Module-Display-Category: Libraries\n\
             OpenIDE-Module-Short-Description Short one\n\
             OpenIDE-Module-Long-Description=Line one \\\n    line two\n\
             unrelated=1\n",
        );
        assert_eq!(info.display_name.as_deref(), Some("Foo API"));
        assert_eq!(info.category.as_deref(), Some("Libraries"));
        assert_eq!(info.short_description.as_deref(), Some("Short one"));
        assert_eq!(info.long_description.as_deref(), Some("Line one line two"));
    }

    #[test]
    fn escapes_are_decoded() {
        let props = parse_properties("a\\:b=x\\ty\nname=Caf\\u00e9\n! bang comment\n");
        assert_eq!(props.get("a:b").map(String::as_str), Some("x\ty"));
        assert_eq!(props.get("name").map(String::as_str), Some("Café"));
        assert_eq!(props.len(), 2);
    }

    #[test]
    fn even_backslashes_do_not_continue() {
        let props = parse_properties("path=C:\\\\\nnext=1\n");
        assert_eq!(props.get("path").map(String::as_str), Some("C:\\"));
        assert_eq!(props.get("next").map(String::as_str), Some("1"));
    }

    #[test]
    fn bundle_is_read_from_jar_as_latin1() {
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("b.jar");
        let mut bytes = b"OpenIDE-Module-Name=Caf".to_vec();
        bytes.push(0xE9);
        write_jar(&jar, &[("org/foo/Bundle.properties", bytes)], None);

        let info = LocalizedBundleInfo::read_from_jar(&jar, "org/foo/Bundle.properties").unwrap();
        assert_eq!(info.display_name.as_deref(), Some("Café"));

        let missing = LocalizedBundleInfo::read_from_jar(&jar, "org/foo/Other.properties").unwrap();
        assert!(missing.is_empty());
    }
}
