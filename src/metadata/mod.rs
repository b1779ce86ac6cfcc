use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::settings::ParsingSettings;

/// Catalog ids are assumed to be larger than any plausible version number.
const MIN_CATALOG_ID: u64 = 1000;

/// Errors raised when a folder name does not fit the naming heuristics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataError {
    #[error("Folder name is empty")]
    EmptyName,
    #[error("No version found in folder name '{name}'")]
    NoVersionToken { name: String },
}

/// Metadata derived from a mod folder's name and modification time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModMetadata {
    pub title: String,
    /// Catalog id, when the name carries one.
    pub id: Option<u64>,
    pub version: String,
    pub variant: Option<String>,
    /// Upload time encoded as a trailing epoch-seconds token.
    pub posted_time: Option<DateTime<Utc>>,
    pub modified_time: DateTime<Utc>,
}

/// Parses mod folder names such as `Expansion Delay-47588-1-3-1612481103`.
///
/// Names are split on spaces, dashes and underscores. A trailing all-digit
/// token is read as the posted time when it decodes to a date inside the
/// configured window. The first "versiony" token ends the title; a trailing
/// run of non-versiony tokens is the variant.
#[derive(Debug, Clone)]
pub struct ModNameParser {
    min_date: NaiveDate,
    max_date: NaiveDate,
}

impl Default for ModNameParser {
    fn default() -> Self {
        Self::from_settings(&ParsingSettings::default())
    }
}

impl ModNameParser {
    /// Creates a parser accepting posted timestamps between the two dates, inclusive.
    pub fn new(min_date: NaiveDate, max_date: NaiveDate) -> Self {
        Self { min_date, max_date }
    }

    pub fn from_settings(settings: &ParsingSettings) -> Self {
        Self::new(settings.min_date_folder_timestamp, settings.max_date_folder_timestamp)
    }

    /// Parses a folder name into metadata.
    ///
    /// # Arguments
    ///
    /// * `folder_name` - The mod folder's name.
    /// * `modified_time` - The folder's modification time, read by the caller.
    ///
    /// # Errors
    ///
    /// Returns `MetadataError::EmptyName` for a name without tokens and
    /// `MetadataError::NoVersionToken` when no token looks like a version.
    pub fn parse(&self, folder_name: &str, modified_time: DateTime<Utc>) -> Result<ModMetadata, MetadataError> {
        let normalized = folder_name.replace(['-', '_'], " ");
        let mut parts: Vec<&str> = normalized.split_whitespace().collect();

        let last = parts.last().copied().ok_or(MetadataError::EmptyName)?;
        let posted_time = self.posted_time(last);
        if posted_time.is_some() {
            parts.pop();
        }

        let versiony: Vec<bool> = parts.iter().map(|p| is_versiony(p)).collect();
        let no_version = || MetadataError::NoVersionToken { name: folder_name.to_string() };
        let mut version_start = versiony.iter().position(|&v| v).ok_or_else(no_version)?;
        // The last token exists because a versiony one does.
        let has_variant = !versiony[versiony.len() - 1];

        let title = split_pascal_case(parts[..version_start].join(" ").trim());

        let id = catalog_id(parts[version_start]);
        if id.is_some() {
            version_start += 1;
        }

        let (version, variant) = if has_variant {
            let variant_start = versiony.iter().rposition(|&v| v).map_or(0, |i| i + 1);
            let version_end = variant_start.max(version_start);
            (
                format_version(&parts[version_start..version_end]),
                Some(format_variant(&parts[variant_start..])),
            )
        } else {
            (format_version(&parts[version_start..]), None)
        };

        Ok(ModMetadata { title, id, version, variant, posted_time, modified_time })
    }

    fn posted_time(&self, token: &str) -> Option<DateTime<Utc>> {
        if !is_all_digits(token) {
            return None;
        }
        let seconds: i64 = token.parse().ok()?;
        let time = DateTime::<Utc>::from_timestamp(seconds, 0)?;
        let date = time.date_naive();
        (self.min_date <= date && date <= self.max_date).then_some(time)
    }
}

/// A token belongs to the version when it has more digits than letters, or
/// when its only letter is a `v`.
fn is_versiony(token: &str) -> bool {
    let letters = token.chars().filter(char::is_ascii_alphabetic).count();
    let digits = token.chars().filter(char::is_ascii_digit).count();
    digits > letters || (letters == 1 && token.contains(['v', 'V']))
}

fn is_all_digits(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_digit())
}

fn catalog_id(token: &str) -> Option<u64> {
    if !is_all_digits(token) {
        return None;
    }
    token.parse::<u64>().ok().filter(|&id| id > MIN_CATALOG_ID)
}

/// Inserts a space at every lowercase-to-uppercase transition.
fn split_pascal_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut previous: Option<char> = None;
    for c in s.chars() {
        if previous.is_some_and(|p| p.is_ascii_lowercase()) && c.is_ascii_uppercase() {
            out.push(' ');
        }
        out.push(c);
        previous = Some(c);
    }
    out
}

fn format_version(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.to_lowercase())
        .collect::<Vec<_>>()
        .join(".")
        .trim_matches('.')
        .trim()
        .to_string()
}

fn format_variant(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.to_uppercase())
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn parse(name: &str) -> ModMetadata {
        ModNameParser::default().parse(name, epoch(0)).unwrap()
    }

    fn epoch(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(seconds, 0).unwrap()
    }

    #[test]
    fn parses_nexus_name_with_id_and_timestamp() {
        let meta = parse("Expansion Delay-47588-1-3-1612481103");
        assert_eq!(meta.title, "Expansion Delay");
        assert_eq!(meta.id, Some(47588));
        assert_eq!(meta.version, "1.3");
        assert_eq!(meta.variant, None);
        assert_eq!(meta.posted_time, Some(epoch(1612481103)));
    }

    #[test]
    fn parses_other_nexus_names() {
        let cases = [
            ("Fonts-46854-1-0-1559397215", "Fonts", 46854, "1.0", 1559397215),
            ("Morrowind Optimization Patch-45384-14-1648563790", "Morrowind Optimization Patch", 45384, "14", 1648563790),
            ("Patch for Purists-45096-4-0-2-1593803721", "Patch for Purists", 45096, "4.0.2", 1593803721),
        ];
        for (name, title, id, version, posted) in cases {
            let meta = parse(name);
            assert_eq!(meta.title, title, "{name}");
            assert_eq!(meta.id, Some(id), "{name}");
            assert_eq!(meta.version, version, "{name}");
            assert_eq!(meta.variant, None, "{name}");
            assert_eq!(meta.posted_time, Some(epoch(posted)), "{name}");
        }
    }

    #[test]
    fn parses_v_prefixed_version() {
        let meta = parse("Pickpocket_Fix_v101");
        assert_eq!(meta.title, "Pickpocket Fix");
        assert_eq!(meta.version, "v101");
        assert_eq!(meta.id, None);
        assert_eq!(meta.posted_time, None);
    }

    #[test]
    fn parses_trailing_variant() {
        let meta = parse("Tamriel_Data_v8 - HD");
        assert_eq!(meta.title, "Tamriel Data");
        assert_eq!(meta.version, "v8");
        assert_eq!(meta.variant.as_deref(), Some("HD"));
    }

    #[test]
    fn multi_word_variant_is_uppercased() {
        let meta = parse("Better Bodies 2.2 Nude Edition");
        assert_eq!(meta.title, "Better Bodies");
        assert_eq!(meta.version, "2.2");
        assert_eq!(meta.variant.as_deref(), Some("NUDE EDITION"));
    }

    #[test]
    fn splits_pascal_case_titles_and_keeps_small_numbers() {
        let meta = parse("TamrielRebuilt_21-01-01");
        assert_eq!(meta.title, "Tamriel Rebuilt");
        assert_eq!(meta.version, "21.01.01");
        assert_eq!(meta.posted_time, None);

        let meta = parse("TamrielRebuilt_21-01");
        assert_eq!(meta.title, "Tamriel Rebuilt");
        assert_eq!(meta.version, "21.01");
    }

    #[test]
    fn id_with_variant_and_no_version_leaves_version_empty() {
        let meta = parse("Graphic Herbalism-46599-HD");
        assert_eq!(meta.id, Some(46599));
        assert_eq!(meta.version, "");
        assert_eq!(meta.variant.as_deref(), Some("HD"));
    }

    #[test]
    fn any_id_followed_by_dotted_version_is_captured() {
        for id in [1001u64, 45384, 999_999] {
            let meta = parse(&format!("Some Mod-{id}-3-2"));
            assert_eq!(meta.id, Some(id));
            assert_eq!(meta.version, "3.2");
            assert_eq!(meta.variant, None);
        }
    }

    #[test]
    fn timestamp_outside_window_is_part_of_version() {
        let parser = ModNameParser::new(
            NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2022, 12, 31).unwrap(),
        );
        let meta = parser.parse("Old Mod-1-2-1612481103", epoch(0)).unwrap();
        assert_eq!(meta.posted_time, None);
        assert_eq!(meta.id, None);
        assert_eq!(meta.version, "1.2.1612481103");
    }

    #[test]
    fn modified_time_is_passed_through() {
        let meta = ModNameParser::default().parse("Mod 1.0", epoch(42)).unwrap();
        assert_eq!(meta.modified_time, epoch(42));
    }

    #[test]
    fn returns_error_without_version_token() {
        let parser = ModNameParser::default();
        assert_eq!(
            parser.parse("Just A Title", epoch(0)),
            Err(MetadataError::NoVersionToken { name: "Just A Title".to_string() })
        );
        assert_eq!(parser.parse(" - _ ", epoch(0)), Err(MetadataError::EmptyName));
    }

    #[test]
    fn lone_timestamp_leaves_nothing_to_parse() {
        let result = ModNameParser::default().parse("1612481103", epoch(0));
        assert!(matches!(result, Err(MetadataError::NoVersionToken { .. })));
    }

    #[test]
    fn versiony_heuristic() {
        assert!(is_versiony("1"));
        assert!(is_versiony("v8"));
        assert!(is_versiony("V"));
        assert!(is_versiony("2b3"));
        assert!(is_versiony("1a2"));
        assert!(!is_versiony("HD"));
        assert!(!is_versiony("x1"));
        assert!(!is_versiony("Data"));
    }

    #[test]
    fn pascal_case_split() {
        assert_eq!(split_pascal_case("TamrielRebuilt"), "Tamriel Rebuilt");
        assert_eq!(split_pascal_case("OAAB Data"), "OAAB Data");
        assert_eq!(split_pascal_case("aBcD"), "a Bc D");
        assert_eq!(split_pascal_case(""), "");
    }
}
