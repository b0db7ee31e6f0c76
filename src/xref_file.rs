// Xref file parsing (SUPPLEMENTAL FEATURES; grounded in
// `original_source/main.cpp::ParseXrefFile`): a companion text file of
// `<type> <addr> <label> [<description>]` lines, `#`-comments and blank
// lines ignored, folded into the Mcu's xref table via the same relabeling
// path the static analyzer uses.

use crate::error::ConfigError;
use crate::mcu::Mcu;
use crate::xref::{Xref, XrefType};
use regex::Regex;
use std::fs;

fn parse_addr(s: &str) -> u32 {
    if let Some(hex) = s.strip_prefix("0x") {
        u32::from_str_radix(hex, 16).unwrap_or(0)
    } else {
        s.parse().unwrap_or(0)
    }
}

/// Reads `path` and adds every entry to `mcu`'s xref table. Lines that are
/// neither a valid entry nor blank/comment are reported via `ConfigError`
/// but do not stop the rest of the file from loading, matching the
/// original tool's behavior of printing "unknown line" and continuing.
pub fn load(mcu: &mut Mcu, path: &str) -> Result<(), ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed { path: path.to_string(), source })?;
    let entry = Regex::new(r"^([jcd])\s+(0x[0-9a-fA-F]+|[0-9]+)\s+([-_:*.a-zA-Z0-9]+)(?:\s+(.*?))?\s*$").unwrap();
    let blank = Regex::new(r"^\s*(?:#.*)?$").unwrap();

    for line in text.lines() {
        if let Some(caps) = entry.captures(line) {
            let kind = match &caps[1] {
                "j" => XrefType::JMP,
                "c" => XrefType::CALL,
                "d" => XrefType::DATA,
                _ => unreachable!(),
            };
            let addr = parse_addr(&caps[2]);
            let label = caps[3].to_string();
            let description = caps.get(4).map(|m| m.as_str()).unwrap_or("").to_string();
            mcu.xrefs_mut().add(Xref::new(addr, kind, label, description));
        } else if !blank.is_match(line) {
            return Err(ConfigError::BadXrefLine(line.to_string()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chips::new_atmega328p;
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> String {
        let path = std::env::temp_dir().join(name);
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path.into_os_string().into_string().unwrap()
    }

    #[test]
    fn parses_entries_and_skips_comments() {
        let path = write_temp("avremu-xref-test-ok.txt", "# a comment\n\nc 0x10 MyFunc do the thing\nj 20 Loop\n");
        let mut mcu = new_atmega328p();
        load(&mut mcu, &path).unwrap();
        assert_eq!(mcu.xrefs().by_label("MyFunc").unwrap().addr, 0x10);
        assert_eq!(mcu.xrefs().by_label("Loop").unwrap().addr, 20);
    }

    #[test]
    fn rejects_malformed_line() {
        let path = write_temp("avremu-xref-test-bad.txt", "not a valid line\n");
        let mut mcu = new_atmega328p();
        assert!(load(&mut mcu, &path).is_err());
    }
}
