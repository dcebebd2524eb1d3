//! Font definition schema.
//!
//! A definition is a JSON document produced by a font-conversion tool. It
//! carries metrics for a single-byte encoding and, for embedded fonts, the
//! name and segment lengths of the font program.

use crate::error::{Error, Result};
use crate::object::Object;
use indexmap::IndexMap;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Font program flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum FontType {
    /// One of the standard 14 fonts, never embedded
    Core,
    /// TrueType or OpenType outlines (`/FontFile2`)
    TrueType,
    /// PostScript Type 1 (`/FontFile`)
    Type1,
}

impl FontType {
    /// PDF `/Subtype` name.
    pub fn subtype(self) -> &'static str {
        match self {
            FontType::Core | FontType::Type1 => "Type1",
            FontType::TrueType => "TrueType",
        }
    }
}

/// Entry of the Unicode table: one code point, or a run of `count` code
/// points starting at `first` mapped to consecutive byte codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum UnicodeValue {
    /// Single code point
    Single(u32),
    /// `[first, count]`
    Range([u32; 2]),
}

/// Metrics and embedding data for one family+style.
#[derive(Debug, Clone, Deserialize)]
pub struct FontDefinition {
    /// Font program flavour
    #[serde(rename = "type")]
    pub font_type: FontType,
    /// PostScript name, written as `/BaseFont`
    pub name: String,
    /// Encoding name, lowercase (e.g. "cp1252")
    #[serde(default)]
    pub enc: Option<String>,
    /// Underline position
    #[serde(default = "default_up")]
    pub up: i32,
    /// Underline thickness
    #[serde(default = "default_ut")]
    pub ut: i32,
    /// Glyph widths indexed by byte value, in 1/1000 em
    #[serde(deserialize_with = "deserialize_widths")]
    pub cw: Vec<u16>,
    /// Font descriptor entries, written in order
    #[serde(default)]
    pub desc: IndexMap<String, serde_json::Value>,
    /// Font program file name, relative to the font directory
    #[serde(default)]
    pub file: Option<String>,
    /// Uncompressed length of a TrueType program
    #[serde(default)]
    pub originalsize: Option<u64>,
    /// Length of the clear-text Type 1 segment
    #[serde(default)]
    pub size1: Option<u64>,
    /// Length of the encrypted Type 1 segment
    #[serde(default)]
    pub size2: Option<u64>,
    /// Whether the program is a subset
    #[serde(default)]
    pub subsetted: bool,
    /// Encoding differences against WinAnsi, e.g. "128 /Euro 130 /quotesinglbase"
    #[serde(default)]
    pub diff: Option<String>,
    /// Byte code to Unicode table for ToUnicode generation
    #[serde(default, deserialize_with = "deserialize_unicode_table")]
    pub uv: Option<Vec<(u8, UnicodeValue)>>,
}

fn default_up() -> i32 {
    -100
}

fn default_ut() -> i32 {
    50
}

fn deserialize_widths<'de, D>(deserializer: D) -> std::result::Result<Vec<u16>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let cw = Vec::<u16>::deserialize(deserializer)?;
    if cw.len() != 256 {
        return Err(serde::de::Error::invalid_length(cw.len(), &"256 glyph widths"));
    }
    Ok(cw)
}

fn deserialize_unicode_table<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<Vec<(u8, UnicodeValue)>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<IndexMap<String, UnicodeValue>>::deserialize(deserializer)?;
    let Some(raw) = raw else {
        return Ok(None);
    };
    let mut table = Vec::with_capacity(raw.len());
    for (code, value) in raw {
        let code: u8 = code
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid byte code {:?}", code)))?;
        table.push((code, value));
    }
    table.sort_by_key(|(code, _)| *code);
    Ok(Some(table))
}

impl FontDefinition {
    /// Load a definition from `dir/file`.
    ///
    /// `file` is a bare file name; path separators are rejected.
    pub fn load(dir: &Path, file: &str) -> Result<Self> {
        if file.contains(['/', '\\']) {
            return Err(Error::InvalidFontDefinition {
                file: file.to_string(),
                reason: "incorrect font definition file name".to_string(),
            });
        }
        let path = dir.join(file);
        let handle = File::open(&path).map_err(|e| Error::InvalidFontDefinition {
            file: file.to_string(),
            reason: e.to_string(),
        })?;
        let invalid = |e: serde_json::Error| Error::InvalidFontDefinition {
            file: file.to_string(),
            reason: e.to_string(),
        };
        let value: serde_json::Value = serde_json::from_reader(BufReader::new(handle)).map_err(invalid)?;
        if let Some(ty) = value.get("type").and_then(|t| t.as_str()) {
            if !matches!(ty, "Core" | "TrueType" | "Type1") {
                return Err(Error::UnsupportedFontType(ty.to_string()));
            }
        }
        let mut def: FontDefinition = serde_json::from_value(value).map_err(invalid)?;
        def.enc = def.enc.map(|e| e.to_lowercase());
        def.validate(file)?;
        log::debug!("Loaded font definition {} ({:?}) from {}", def.name, def.font_type, path.display());
        Ok(def)
    }

    fn validate(&self, file: &str) -> Result<()> {
        let missing = |field: &str| Error::InvalidFontDefinition {
            file: file.to_string(),
            reason: format!("embedded font without {}", field),
        };
        if self.file.is_some() {
            match self.font_type {
                FontType::TrueType if self.originalsize.is_none() => return Err(missing("originalsize")),
                FontType::Type1 if self.size1.is_none() || self.size2.is_none() => {
                    return Err(missing("size1/size2"))
                },
                _ => {},
            }
        }
        Ok(())
    }

    /// Width of byte `b` in 1/1000 em.
    pub fn width(&self, b: u8) -> u16 {
        self.cw.get(b as usize).copied().unwrap_or(0)
    }

    /// `/BaseFont` value, with the subset tag when applicable.
    pub fn base_font(&self) -> String {
        if self.subsetted {
            format!("AAAAAA+{}", self.name)
        } else {
            self.name.clone()
        }
    }

    /// Key under which the ToUnicode CMap is shared.
    pub fn cmap_key(&self) -> &str {
        self.enc.as_deref().unwrap_or(&self.name)
    }

    /// Parse the differences fragment into `/Differences` array items.
    pub fn differences(&self) -> Option<Vec<Object>> {
        let diff = self.diff.as_deref()?;
        Some(
            diff.split_whitespace()
                .map(|token| match token.strip_prefix('/') {
                    Some(name) => Object::Name(name.to_string()),
                    None => token
                        .parse::<i64>()
                        .map(Object::Integer)
                        .unwrap_or_else(|_| Object::Name(token.to_string())),
                })
                .collect(),
        )
    }

    /// Descriptor entries converted to PDF objects.
    ///
    /// Numbers stay numbers, `[...]` strings become arrays, `/X` strings names.
    pub fn descriptor_entries(&self) -> Vec<(String, Object)> {
        self.desc
            .iter()
            .map(|(k, v)| (k.clone(), json_to_object(v)))
            .collect()
    }
}

fn json_to_object(value: &serde_json::Value) -> Object {
    match value {
        serde_json::Value::Null => Object::Null,
        serde_json::Value::Bool(b) => Object::Boolean(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Object::Integer(i),
            None => Object::Real(n.as_f64().unwrap_or(0.0)),
        },
        serde_json::Value::String(s) => token_to_object(s.trim()),
        serde_json::Value::Array(items) => Object::Array(items.iter().map(json_to_object).collect()),
        serde_json::Value::Object(map) => Object::Dictionary(
            map.iter()
                .map(|(k, v)| (k.clone(), json_to_object(v)))
                .collect(),
        ),
    }
}

fn token_to_object(s: &str) -> Object {
    if let Some(inner) = s.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
        return Object::Array(inner.split_whitespace().map(token_to_object).collect());
    }
    if let Some(name) = s.strip_prefix('/') {
        return Object::Name(name.to_string());
    }
    if let Ok(i) = s.parse::<i64>() {
        return Object::Integer(i);
    }
    if let Ok(r) = s.parse::<f64>() {
        return Object::Real(r);
    }
    Object::String(s.as_bytes().to_vec())
}
