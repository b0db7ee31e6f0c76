// Static cross-reference analysis: one pass over flash producing a label
// graph keyed by target address.

use crate::instructions::Descriptor;
use std::collections::HashMap;

bitflags::bitflags! {
    #[derive(Default)]
    pub struct XrefType: u8 {
        const JMP  = 1 << 0;
        const CALL = 1 << 1;
        const DATA = 1 << 2;
    }
}

#[derive(Debug, Clone)]
pub struct Xref {
    pub addr: u32,
    pub kind: XrefType,
    pub label: String,
    pub description: String,
    pub sources: Vec<u32>,
}

impl Xref {
    pub fn new(addr: u32, kind: XrefType, label: impl Into<String>, description: impl Into<String>) -> Self {
        Xref { addr, kind, label: label.into(), description: description.into(), sources: Vec::new() }
    }
}

/// Owning store of xref entries plus the two lookup indices the component
/// design calls for. The indices hold addresses/labels, not references, so
/// there's nothing to borrow-check: both point back into `entries`.
#[derive(Default)]
pub struct XrefTable {
    entries: HashMap<u32, Xref>,
    by_label: HashMap<String, u32>,
}

impl XrefTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.by_label.clear();
    }

    pub fn by_addr(&self, addr: u32) -> Option<&Xref> {
        self.entries.get(&addr)
    }

    pub fn by_label(&self, label: &str) -> Option<&Xref> {
        self.by_label.get(label).and_then(|addr| self.entries.get(addr))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Xref> {
        self.entries.values()
    }

    /// Relabeling path: if an xref already exists at `xref.addr`, erase its
    /// old label entry before inserting the new one, so the label and
    /// address maps never go out of sync.
    pub fn add(&mut self, xref: Xref) {
        if let Some(existing) = self.entries.get(&xref.addr) {
            self.by_label.remove(&existing.label);
        }
        self.by_label.insert(xref.label.clone(), xref.addr);
        self.entries.insert(xref.addr, xref);
    }

    /// Auto-labelling xref-or-create-and-append-source path used by the
    /// analyzer and by LDS/STS/branch/call sites during the flash walk.
    pub fn add_source(&mut self, kind: XrefType, target: u32, source: u32) {
        let label_needed = !self.entries.contains_key(&target);
        let label = if label_needed {
            // call > jmp > data priority, matching the shipped analyzer.
            if kind.contains(XrefType::CALL) {
                format!("Fct_{:05x}", target)
            } else if kind.contains(XrefType::JMP) {
                format!("Lbl_{:05x}", target)
            } else if kind.contains(XrefType::DATA) {
                format!("Dat_{:05x}", target)
            } else {
                format!("Xrf_{:05x}", target)
            }
        } else {
            String::new()
        };

        if label_needed {
            self.by_label.insert(label.clone(), target);
            self.entries.insert(target, Xref::new(target, XrefType::empty(), label, ""));
        }
        let entry = self.entries.get_mut(&target).expect("just inserted or pre-existing");
        entry.kind |= kind;
        if !entry.sources.contains(&source) {
            entry.sources.push(source);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Runs the static cross-reference pass: seed known vectors,
/// then walk flash linearly, folding in every statically-recoverable
/// jump/call/data target whose address is not simple fall-through.
pub fn analyze(
    flash: &[u16],
    loaded_words: u32,
    flash_words: u32,
    dispatch: &[Option<&'static Descriptor>],
    known_vectors: &[(u32, String, String)],
) -> XrefTable {
    let mut table = XrefTable::new();
    for (addr, label, description) in known_vectors {
        table.add(Xref::new(*addr, XrefType::JMP, label.clone(), description.clone()));
    }

    let mut pc: u32 = 0;
    while pc < loaded_words {
        let cmd = flash[pc as usize];
        let descriptor = match dispatch.get(cmd as usize).copied().flatten() {
            Some(d) => d,
            None => {
                pc += 1;
                continue;
            }
        };
        let cmd2 = if descriptor.size == 2 && (pc + 1) < loaded_words { Some(flash[(pc + 1) as usize]) } else { None };
        if let Some((kind, target)) = (descriptor.xref)(cmd, cmd2, pc, flash_words) {
            let fallthrough = pc + descriptor.size as u32;
            if target != fallthrough {
                table.add_source(kind, target, pc);
            }
        }
        pc += descriptor.size as u32;
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relabel_keeps_maps_in_sync() {
        let mut t = XrefTable::new();
        t.add(Xref::new(0x10, XrefType::JMP, "Lbl_00010", ""));
        assert_eq!(t.by_label("Lbl_00010").unwrap().addr, 0x10);
        t.add(Xref::new(0x10, XrefType::CALL, "RESET", "reset vector"));
        assert!(t.by_label("Lbl_00010").is_none());
        assert_eq!(t.by_label("RESET").unwrap().addr, 0x10);
    }

    #[test]
    fn auto_label_priority_is_call_then_jmp_then_data() {
        let mut t = XrefTable::new();
        t.add_source(XrefType::CALL | XrefType::JMP, 0x20, 0x00);
        assert_eq!(t.by_addr(0x20).unwrap().label, "Fct_00020");
    }

    #[test]
    fn sources_are_deduplicated() {
        let mut t = XrefTable::new();
        t.add_source(XrefType::JMP, 0x30, 0x10);
        t.add_source(XrefType::JMP, 0x30, 0x10);
        t.add_source(XrefType::JMP, 0x30, 0x12);
        assert_eq!(t.by_addr(0x30).unwrap().sources.len(), 2);
    }

    #[test]
    fn analyze_finds_self_loop_jmp_to_reset() {
        let dispatch = crate::instructions::build_dispatch(crate::instructions::ALL);
        // LDI r16,5 ; LDI r17,0 ; ADD r16,r17 ; JMP 0 ; NOP
        let flash = [0xE005u16, 0xE010, 0x0F01, 0x940C, 0x0000, 0x0000];
        let known = vec![(0u32, "RESET".to_string(), "reset vector".to_string())];
        let table = analyze(&flash, flash.len() as u32, flash.len() as u32, &dispatch, &known);
        assert_eq!(table.by_label("RESET").unwrap().addr, 0);
        assert!(table.by_addr(0).unwrap().kind.contains(XrefType::JMP));
        assert!(!table.by_addr(0).unwrap().kind.contains(XrefType::CALL));
    }
}
