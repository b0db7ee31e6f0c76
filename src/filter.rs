// Child-process diagnostic filter. Every diagnostic goes to a sink table;
// each sink is either "write to stdout" or "pipe to subprocess, read reply,
// print reply with an => prefix".

use crate::error::VerboseType;
use std::io::Write;
use std::io::Read;
use std::process::{Child, Command, Stdio};

pub struct Filter {
    command: String,
    mask: VerboseType,
    child: Child,
}

impl Filter {
    pub fn spawn(command: &str, mask: VerboseType) -> std::io::Result<Self> {
        let child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()?;
        Ok(Filter { command: command.to_string(), mask, child })
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn mask(&self) -> VerboseType {
        self.mask
    }

    /// Writes `text` to the child's stdin, reads one reply from its
    /// stdout, and returns it with trailing newlines trimmed. Returns
    /// `None` if the pipe is no longer usable.
    pub fn round_trip(&mut self, text: &str) -> Option<String> {
        let stdin = self.child.stdin.as_mut()?;
        stdin.write_all(text.as_bytes()).ok()?;
        stdin.write_all(b"\n").ok()?;

        let stdout = self.child.stdout.as_mut()?;
        let mut buf = [0u8; 1024];
        let n = stdout.read(&mut buf).ok()?;
        if n == 0 {
            return None;
        }
        let mut reply = String::from_utf8_lossy(&buf[..n]).into_owned();
        while reply.ends_with('\n') {
            reply.pop();
        }
        Some(reply)
    }
}

impl Drop for Filter {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
