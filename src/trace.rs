// Optional append-only call/return log with indentation tracking the
// current call depth.

use crate::xref::XrefTable;
use std::fs::File;
use std::io::Write;

pub struct Trace {
    file: File,
    last_src: u32,
    last_dst: u32,
    repeat: u32,
    is_call: bool,
    is_return: bool,
    depth: u32,
    stop_addr: Option<u32>,
}

impl Trace {
    pub fn open(path: &str, stop_addr: Option<u32>) -> std::io::Result<Self> {
        let file = File::create(path)?;
        Ok(Trace { file, last_src: 0, last_dst: 0, repeat: 0, is_call: false, is_return: false, depth: 0, stop_addr })
    }

    pub fn stop_addr(&self) -> Option<u32> {
        self.stop_addr
    }

    /// Records one (src, dst) edge. Adjacent identical edges collapse into
    /// a repeat counter instead of a new line.
    pub fn add(&mut self, src: u32, dst: u32, is_call: bool, is_return: bool, xrefs: &XrefTable) {
        if src == self.last_src && dst == self.last_dst && self.repeat > 0 {
            self.repeat += 1;
            return;
        }
        self.flush_edge(xrefs);
        self.last_src = src;
        self.last_dst = dst;
        self.repeat = 1;
        self.is_call = is_call;
        self.is_return = is_return;
    }

    fn flush_edge(&mut self, xrefs: &XrefTable) {
        if self.repeat == 0 {
            return;
        }
        let indent = "  ".repeat(self.depth.min(20) as usize);
        let _ = writeln!(
            self.file,
            "{:2}  {}{:05x} -> {:05x} x{}",
            self.depth, indent, self.last_src, self.last_dst, self.repeat
        );
        if self.is_return {
            let _ = writeln!(self.file, "   RET\n");
            self.depth = self.depth.saturating_sub(1);
        } else if self.is_call {
            self.depth += 1;
            if let Some(x) = xrefs.by_addr(self.last_dst) {
                let _ = writeln!(self.file, "\n{} | {}", x.label, x.description);
            }
        }
    }

    pub fn close(mut self, xrefs: &XrefTable) {
        self.flush_edge(xrefs);
        let _ = self.file.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_edges_collapse() {
        let mut t = Trace::open("/tmp/avremu_trace_test.trc", None).unwrap();
        let xrefs = XrefTable::new();
        t.add(0, 0x10, false, false, &xrefs);
        t.add(0, 0x10, false, false, &xrefs);
        t.add(0, 0x10, false, false, &xrefs);
        assert_eq!(t.repeat, 3);
        t.close(&xrefs);
    }
}
