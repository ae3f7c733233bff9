//! Release-Dokument der Update-Quelle
//!
//! Erwartet ein JSON-Objekt mit `tag_name` und `assets[0].browser_download_url`
//! (GitHub-Releases-Format). Alle anderen Felder werden ignoriert.

use core::fmt;
use core::marker::PhantomData;

use serde::de::{Deserializer, IgnoredAny, SeqAccess, Visitor};
use serde::Deserialize;

use crate::types::{UrlText, VersionText};

/// Version und Download-Ort eines Releases
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    pub version: VersionText,
    pub download_url: UrlText,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReleaseError {
    /// Kein gültiges JSON oder unerwartete Struktur
    Malformed,
    /// `tag_name` fehlt oder ist leer
    MissingVersion,
    /// Kein Asset mit `browser_download_url`
    MissingAsset,
    /// Version oder URL überschreitet die Puffergröße
    TooLong,
}

impl fmt::Display for ReleaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => f.write_str("parse error"),
            Self::MissingVersion => f.write_str("parse error (no version)"),
            Self::MissingAsset => f.write_str("parse error (no asset)"),
            Self::TooLong => f.write_str("parse error (field too long)"),
        }
    }
}

#[derive(Deserialize)]
struct ReleaseDoc<'a> {
    #[serde(borrow, default)]
    tag_name: Option<&'a str>,
    #[serde(borrow, default)]
    assets: FirstAsset<'a>,
}

#[derive(Deserialize)]
struct Asset<'a> {
    #[serde(borrow, default)]
    browser_download_url: Option<&'a str>,
}

/// Nimmt nur das erste Element von `assets`, der Rest wird übersprungen
#[derive(Default)]
struct FirstAsset<'a>(Option<&'a str>);

impl<'de: 'a, 'a> Deserialize<'de> for FirstAsset<'a> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FirstAssetVisitor<'a>(PhantomData<&'a ()>);

        impl<'de: 'a, 'a> Visitor<'de> for FirstAssetVisitor<'a> {
            type Value = FirstAsset<'a>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an array of release assets")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let first = seq
                    .next_element::<Asset<'a>>()?
                    .and_then(|asset| asset.browser_download_url);
                while seq.next_element::<IgnoredAny>()?.is_some() {}
                Ok(FirstAsset(first))
            }
        }

        deserializer.deserialize_seq(FirstAssetVisitor(PhantomData))
    }
}

/// Parst das Release-Dokument
pub fn parse_release(body: &[u8]) -> Result<Release, ReleaseError> {
    let (doc, _) = serde_json_core::from_slice::<ReleaseDoc<'_>>(body)
        .map_err(|_| ReleaseError::Malformed)?;

    let tag = doc
        .tag_name
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .ok_or(ReleaseError::MissingVersion)?;
    let url = doc.assets.0.ok_or(ReleaseError::MissingAsset)?;

    let mut version = VersionText::new();
    version.push_str(tag).map_err(|_| ReleaseError::TooLong)?;
    let mut download_url = UrlText::new();
    download_url
        .push_str(url)
        .map_err(|_| ReleaseError::TooLong)?;

    Ok(Release {
        version,
        download_url,
    })
}

/// `true` genau dann, wenn `tag == "v" + running` (case-sensitiv)
pub fn is_current_version(tag: &str, running: &str) -> bool {
    tag.strip_prefix('v') == Some(running)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_release_with_extra_fields() {
        let body = br#"{
            "url": "https://api.example.com/releases/1",
            "tag_name": "v1.2.0",
            "draft": false,
            "author": {"login": "ci", "id": 7},
            "assets": [
                {"name": "firmware.bin", "size": 912384,
                 "browser_download_url": "http://updates.local/v1.2.0/firmware.bin"},
                {"name": "firmware.elf",
                 "browser_download_url": "http://updates.local/v1.2.0/firmware.elf"}
            ],
            "body": "notes"
        }"#;
        let release = parse_release(body).unwrap();
        assert_eq!(release.version.as_str(), "v1.2.0");
        assert_eq!(
            release.download_url.as_str(),
            "http://updates.local/v1.2.0/firmware.bin"
        );
    }

    #[test]
    fn test_parse_release_malformed() {
        assert_eq!(parse_release(b"<html>"), Err(ReleaseError::Malformed));
        assert_eq!(parse_release(b""), Err(ReleaseError::Malformed));
    }

    #[test]
    fn test_parse_release_missing_parts() {
        assert_eq!(
            parse_release(br#"{"tag_name": "", "assets": []}"#),
            Err(ReleaseError::MissingVersion)
        );
        assert_eq!(
            parse_release(br#"{"tag_name": "v2.0.0", "assets": []}"#),
            Err(ReleaseError::MissingAsset)
        );
    }

    #[test]
    fn test_is_current_version_exact() {
        assert!(is_current_version("v1.0.0", "1.0.0"));
        assert!(!is_current_version("1.0.0", "1.0.0"));
        assert!(!is_current_version("V1.0.0", "1.0.0"));
        assert!(!is_current_version("v1.0.0-rc1", "1.0.0"));
    }
}
