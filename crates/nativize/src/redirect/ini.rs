//! Host configuration redirect entries
//!
//! The host reads redirect tables from a plain-text configuration section,
//! one line per entry:
//!
//! ```text
//! +StructRedirects=(OldName="/Game/Structs/FStatInfo.FStatInfo",NewName="/Script/SLF.StatInfo")
//! ```
//!
//! The driver never edits this file; it verifies the required lines are
//! present and prints the exact missing ones as remediation.

use std::fmt;

use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectKind {
    Struct,
    Enum,
    Property,
}

impl RedirectKind {
    fn key(&self) -> &'static str {
        match self {
            RedirectKind::Struct => "StructRedirects",
            RedirectKind::Enum => "EnumRedirects",
            RedirectKind::Property => "PropertyRedirects",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectEntry {
    pub kind: RedirectKind,
    pub old: String,
    pub new: String,
}

impl RedirectEntry {
    pub fn new(kind: RedirectKind, old: impl Into<String>, new: impl Into<String>) -> Self {
        Self { kind, old: old.into(), new: new.into() }
    }

    /// The exact configuration line for this entry.
    pub fn config_line(&self) -> String {
        format!(
            "+{}=(OldName=\"{}\",NewName=\"{}\")",
            self.kind.key(),
            self.old,
            self.new
        )
    }
}

impl fmt::Display for RedirectEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.config_line())
    }
}

/// Parse every redirect entry out of a configuration text.
pub fn parse_config(text: &str) -> Vec<RedirectEntry> {
    let re = Regex::new(
        r#"\+(StructRedirects|EnumRedirects|PropertyRedirects)=\(OldName="([^"]+)",\s*NewName="([^"]+)"\)"#,
    )
    .unwrap();
    text.lines()
        .filter_map(|line| {
            let caps = re.captures(line.trim())?;
            let kind = match &caps[1] {
                "StructRedirects" => RedirectKind::Struct,
                "EnumRedirects" => RedirectKind::Enum,
                _ => RedirectKind::Property,
            };
            Some(RedirectEntry::new(kind, &caps[2], &caps[3]))
        })
        .collect()
}

/// Required entries the configuration does not yet contain.
pub fn missing_entries(text: &str, required: &[RedirectEntry]) -> Vec<RedirectEntry> {
    let present = parse_config(text);
    required
        .iter()
        .filter(|r| !present.contains(r))
        .cloned()
        .collect()
}

/// Copy-pasteable remediation for a set of missing entries.
pub fn remediation_lines(missing: &[RedirectEntry]) -> String {
    let mut out = String::from("Add these lines to the redirects section of the host configuration:\n");
    for entry in missing {
        out.push_str(&entry.config_line());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
[/Script/Engine.Engine]
+StructRedirects=(OldName="/Game/Structs/FStatInfo.FStatInfo",NewName="/Script/SLF.StatInfo")
+EnumRedirects=(OldName="/Game/Enums/EStatType.EStatType",NewName="/Script/SLF.EStatType")
"#;

    #[test]
    fn parses_struct_and_enum_lines() {
        let entries = parse_config(CONFIG);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, RedirectKind::Struct);
        assert_eq!(entries[0].old, "/Game/Structs/FStatInfo.FStatInfo");
        assert_eq!(entries[1].kind, RedirectKind::Enum);
    }

    #[test]
    fn reports_missing_entries_with_exact_lines() {
        let required = vec![
            RedirectEntry::new(
                RedirectKind::Struct,
                "/Game/Structs/FStatInfo.FStatInfo",
                "/Script/SLF.StatInfo",
            ),
            RedirectEntry::new(
                RedirectKind::Struct,
                "/Game/Structs/FRegen.FRegen",
                "/Script/SLF.Regen",
            ),
        ];

        let missing = missing_entries(CONFIG, &required);
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].old, "/Game/Structs/FRegen.FRegen");
        assert!(remediation_lines(&missing).contains(
            r#"+StructRedirects=(OldName="/Game/Structs/FRegen.FRegen",NewName="/Script/SLF.Regen")"#
        ));
    }
}
