//! Font registry.
//!
//! Fonts are keyed by lowercase family plus canonical style (`""`, `"B"`,
//! `"I"`, `"BI"`). Each font receives a 1-based index on first
//! registration, used as its `/F<i>` resource name. Embedded font programs
//! are tracked separately by file name since several faces may share one.

pub mod cmap;
pub mod standard;
pub mod definition;

pub use definition::{FontDefinition, FontType, UnicodeValue};

use crate::error::{Error, Result};
use bitflags::bitflags;
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

bitflags! {
    /// Font style flags parsed from strings such as `"BIU"`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FontStyle: u8 {
        /// Bold face
        const BOLD = 0b001;
        /// Italic face
        const ITALIC = 0b010;
        /// Underlined text (rendering only, not part of the face)
        const UNDERLINE = 0b100;
    }
}

impl FontStyle {
    /// Parse a style string; letters other than B, I and U are ignored.
    pub fn parse(style: &str) -> Self {
        let mut flags = FontStyle::empty();
        for ch in style.chars() {
            match ch.to_ascii_uppercase() {
                'B' => flags |= FontStyle::BOLD,
                'I' => flags |= FontStyle::ITALIC,
                'U' => flags |= FontStyle::UNDERLINE,
                _ => {},
            }
        }
        flags
    }

    /// Canonical face suffix: `""`, `"B"`, `"I"` or `"BI"`.
    pub fn face(self) -> &'static str {
        match (self.contains(FontStyle::BOLD), self.contains(FontStyle::ITALIC)) {
            (false, false) => "",
            (true, false) => "B",
            (false, true) => "I",
            (true, true) => "BI",
        }
    }

    /// Same style without the underline flag.
    pub fn without_underline(self) -> Self {
        self - FontStyle::UNDERLINE
    }
}

/// A registered font.
#[derive(Debug, Clone)]
pub struct Font {
    /// 1-based resource index
    pub index: usize,
    /// Metrics and embedding data
    pub def: FontDefinition,
}

impl Font {
    /// Resource name without the slash, e.g. `F1`.
    pub fn resource_name(&self) -> String {
        format!("F{}", self.index)
    }
}

/// Segment lengths of an embedded font program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontFileInfo {
    /// TrueType original size, or Type 1 clear-text length
    pub length1: u64,
    /// Type 1 encrypted length
    pub length2: Option<u64>,
}

/// Outcome of resolving a selection request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFont {
    /// Family after aliasing (lowercase)
    pub family: String,
    /// Canonical face, without underline
    pub style: FontStyle,
    /// Whether underline was requested
    pub underline: bool,
    /// Registry key
    pub key: String,
}

/// Instance-owned font cache.
#[derive(Debug, Clone)]
pub struct FontRegistry {
    font_path: PathBuf,
    fonts: IndexMap<String, Font>,
    files: IndexMap<String, FontFileInfo>,
}

impl FontRegistry {
    /// Create an empty registry reading definitions from `font_path`.
    pub fn new(font_path: impl Into<PathBuf>) -> Self {
        Self {
            font_path: font_path.into(),
            fonts: IndexMap::new(),
            files: IndexMap::new(),
        }
    }

    /// Directory holding definitions and font programs.
    pub fn font_path(&self) -> &Path {
        &self.font_path
    }

    /// Registry key for a family and style.
    pub fn key(family: &str, style: FontStyle) -> String {
        format!("{}{}", family, style.face())
    }

    /// Register a font from a definition file.
    ///
    /// When `file` is `None` the name is derived from the family and style,
    /// e.g. `("DejaVu Sans", "B")` reads `dejavusansb.json`. Registering an
    /// existing key is a no-op returning the existing index.
    pub fn add_font(&mut self, family: &str, style: &str, file: Option<&str>) -> Result<usize> {
        let family = family.to_lowercase();
        let style = FontStyle::parse(style).without_underline();
        let key = Self::key(&family, style);
        if let Some(font) = self.fonts.get(&key) {
            return Ok(font.index);
        }
        let file = match file {
            Some(f) => f.to_string(),
            None => format!("{}{}.json", family.replace(' ', ""), style.face().to_lowercase()),
        };
        let def = FontDefinition::load(&self.font_path, &file)?;
        Ok(self.insert(key, def))
    }

    /// Register a core face under `key` if not present.
    fn add_core(&mut self, key: &str) -> Result<usize> {
        if let Some(font) = self.fonts.get(key) {
            return Ok(font.index);
        }
        match standard::core_definition(key) {
            Some(def) => Ok(self.insert(key.to_string(), def)),
            None => Err(Error::UndefinedFont {
                family: key.to_string(),
                style: String::new(),
            }),
        }
    }

    fn insert(&mut self, key: String, def: FontDefinition) -> usize {
        let index = self.fonts.len() + 1;
        if let Some(file) = &def.file {
            let info = match def.font_type {
                FontType::Type1 => FontFileInfo {
                    length1: def.size1.unwrap_or(0),
                    length2: def.size2,
                },
                _ => FontFileInfo {
                    length1: def.originalsize.unwrap_or(0),
                    length2: None,
                },
            };
            self.files.insert(file.clone(), info);
        }
        log::debug!("Registered font {} as F{} ({})", key, index, def.name);
        self.fonts.insert(key, Font { index, def });
        index
    }

    /// Resolve a selection request, registering a core font on demand.
    ///
    /// `current_family` replaces an empty `family`. Fails with
    /// [`Error::UndefinedFont`] for an unknown non-core family.
    pub fn resolve(&mut self, family: &str, style: &str, current_family: &str) -> Result<ResolvedFont> {
        let family = if family.is_empty() {
            current_family.to_string()
        } else {
            family.to_lowercase()
        };
        let parsed = FontStyle::parse(style);
        let underline = parsed.contains(FontStyle::UNDERLINE);

        let (family, style) = self.normalize(&family, parsed);
        let key = Self::key(&family, style);
        if !self.fonts.contains_key(&key) {
            if !standard::is_core_family(&family) {
                return Err(Error::UndefinedFont {
                    family,
                    style: style.face().to_string(),
                });
            }
            self.add_core(&key)?;
        }
        Ok(ResolvedFont {
            family,
            style,
            underline,
            key,
        })
    }

    /// Family and face a lowercase request selects, without registering
    /// anything. Registered fonts win over the `arial` alias and the
    /// style-less symbolic core faces.
    pub fn normalize(&self, family: &str, style: FontStyle) -> (String, FontStyle) {
        let style = style.without_underline();
        if self.fonts.contains_key(&Self::key(family, style)) {
            return (family.to_string(), style);
        }
        let family = if family == "arial" { "helvetica" } else { family };
        let style = if family == "symbol" || family == "zapfdingbats" {
            FontStyle::empty()
        } else {
            style
        };
        (family.to_string(), style)
    }

    /// Look up a registered font.
    pub fn get(&self, key: &str) -> Option<&Font> {
        self.fonts.get(key)
    }

    /// Registered fonts in index order.
    pub fn fonts(&self) -> impl Iterator<Item = (&str, &Font)> {
        self.fonts.iter().map(|(k, f)| (k.as_str(), f))
    }

    /// Embedded font programs in registration order.
    pub fn files(&self) -> impl Iterator<Item = (&str, &FontFileInfo)> {
        self.files.iter().map(|(k, f)| (k.as_str(), f))
    }

    /// Number of registered fonts.
    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    /// Whether no font has been registered.
    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_parsing() {
        assert_eq!(FontStyle::parse("ib").face(), "BI");
        assert_eq!(FontStyle::parse("BU").without_underline(), FontStyle::BOLD);
        assert!(FontStyle::parse("u").contains(FontStyle::UNDERLINE));
        assert_eq!(FontStyle::parse("").face(), "");
    }

    #[test]
    fn test_core_fonts_register_on_demand() {
        let mut reg = FontRegistry::new("fonts");
        let r = reg.resolve("Arial", "IU", "").unwrap();
        assert_eq!(r.key, "helveticaI");
        assert!(r.underline);
        assert_eq!(reg.get("helveticaI").unwrap().index, 1);

        let sym = reg.resolve("symbol", "B", "").unwrap();
        assert_eq!(sym.key, "symbol");
        assert_eq!(reg.get("symbol").unwrap().index, 2);

        // Second resolve reuses the index
        reg.resolve("helvetica", "I", "").unwrap();
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn test_normalize_matches_resolve() {
        let reg = FontRegistry::new("fonts");
        assert_eq!(reg.normalize("arial", FontStyle::BOLD), ("helvetica".to_string(), FontStyle::BOLD));
        assert_eq!(
            reg.normalize("zapfdingbats", FontStyle::parse("BIU")),
            ("zapfdingbats".to_string(), FontStyle::empty())
        );
        assert_eq!(reg.normalize("times", FontStyle::parse("IU")), ("times".to_string(), FontStyle::ITALIC));
    }

    #[test]
    fn test_empty_family_keeps_current() {
        let mut reg = FontRegistry::new("fonts");
        let r = reg.resolve("", "B", "times").unwrap();
        assert_eq!(r.key, "timesB");
    }

    #[test]
    fn test_undefined_font() {
        let mut reg = FontRegistry::new("fonts");
        let err = reg.resolve("comic sans", "", "").unwrap_err();
        assert!(matches!(err, Error::UndefinedFont { ref family, .. } if family == "comic sans"));
        assert!(reg.is_empty());
    }

    #[test]
    fn test_add_font_missing_definition() {
        let dir = tempfile::tempdir().unwrap();
        let mut reg = FontRegistry::new(dir.path());
        assert!(matches!(
            reg.add_font("DejaVu Sans", "B", None),
            Err(Error::InvalidFontDefinition { ref file, .. }) if file == "dejavusansb.json"
        ));
    }
}
