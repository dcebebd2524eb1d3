//! ToUnicode CMap generation.
//!
//! Maps the single-byte codes of a simple font back to Unicode so text can
//! be extracted from the output. Explicit `[first, count]` entries and runs
//! of consecutive single code points become `bfrange` lines; isolated code
//! points become `bfchar` lines.

use super::definition::UnicodeValue;
use std::fmt::Write;

/// Build the CMap program text for a Unicode table sorted by byte code.
pub fn to_unicode_cmap(uv: &[(u8, UnicodeValue)]) -> String {
    let mut ranges = String::new();
    let mut nbr = 0;
    let mut chars = String::new();
    let mut nbc = 0;

    for (code, first, count) in collapse_runs(uv) {
        if count > 1 {
            let last = code as u32 + count - 1;
            let _ = writeln!(ranges, "<{:02X}> <{:02X}> <{:04X}>", code, last, first);
            nbr += 1;
        } else {
            let _ = writeln!(chars, "<{:02X}> <{:04X}>", code, first);
            nbc += 1;
        }
    }

    let mut s = String::new();
    s.push_str("/CIDInit /ProcSet findresource begin\n");
    s.push_str("12 dict begin\n");
    s.push_str("begincmap\n");
    s.push_str("/CIDSystemInfo\n");
    s.push_str("<</Registry (Adobe)\n");
    s.push_str("/Ordering (UCS)\n");
    s.push_str("/Supplement 0\n");
    s.push_str(">> def\n");
    s.push_str("/CMapName /Adobe-Identity-UCS def\n");
    s.push_str("/CMapType 2 def\n");
    s.push_str("1 begincodespacerange\n");
    s.push_str("<00> <FF>\n");
    s.push_str("endcodespacerange\n");
    if nbr > 0 {
        let _ = writeln!(s, "{} beginbfrange", nbr);
        s.push_str(&ranges);
        s.push_str("endbfrange\n");
    }
    if nbc > 0 {
        let _ = writeln!(s, "{} beginbfchar", nbc);
        s.push_str(&chars);
        s.push_str("endbfchar\n");
    }
    s.push_str("endcmap\n");
    s.push_str("CMapName currentdict /CMap defineresource pop\n");
    s.push_str("end\n");
    s.push_str("end");
    s
}

/// Normalize to `(code, first code point, count)` triples, merging adjacent
/// singles whose code points are consecutive.
fn collapse_runs(uv: &[(u8, UnicodeValue)]) -> Vec<(u8, u32, u32)> {
    let mut out: Vec<(u8, u32, u32)> = Vec::new();
    // Only runs built from singles may grow
    let mut open_run = false;
    for &(code, value) in uv {
        match value {
            UnicodeValue::Range([first, count]) => {
                out.push((code, first, count.max(1)));
                open_run = false;
            },
            UnicodeValue::Single(cp) => {
                if let Some(last) = out.last_mut().filter(|_| open_run) {
                    let (start, first, count) = *last;
                    if start as u32 + count == code as u32 && first + count == cp {
                        last.2 += 1;
                        continue;
                    }
                }
                out.push((code, cp, 1));
                open_run = true;
            },
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_and_char_sections() {
        let uv = vec![
            (0, UnicodeValue::Range([0, 128])),
            (128, UnicodeValue::Single(0x20AC)),
        ];
        let cmap = to_unicode_cmap(&uv);
        assert!(cmap.contains("1 beginbfrange\n<00> <7F> <0000>\nendbfrange\n"));
        assert!(cmap.contains("1 beginbfchar\n<80> <20AC>\nendbfchar\n"));
        assert!(cmap.ends_with("end\nend"));
    }

    #[test]
    fn test_consecutive_singles_collapse() {
        let uv = vec![
            (0xA0, UnicodeValue::Single(0xA0)),
            (0xA1, UnicodeValue::Single(0xA1)),
            (0xA2, UnicodeValue::Single(0xA2)),
            (0xB0, UnicodeValue::Single(0x2022)),
        ];
        let cmap = to_unicode_cmap(&uv);
        assert!(cmap.contains("1 beginbfrange\n<A0> <A2> <00A0>\n"));
        assert!(cmap.contains("1 beginbfchar\n<B0> <2022>\n"));
    }

    #[test]
    fn test_range_is_not_extended_by_following_single() {
        let uv = vec![(0, UnicodeValue::Range([0, 2])), (2, UnicodeValue::Single(2))];
        let runs = collapse_runs(&uv);
        assert_eq!(runs, vec![(0, 0, 2), (2, 2, 1)]);
    }
}
