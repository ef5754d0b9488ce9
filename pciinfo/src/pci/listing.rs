//! Size lookup through `ls -dlL`, for setups where the size of a `resourceN` entry is only
//! trusted as shown by a directory listing.
//!
//! The entry itself is listed (`-d`), never a directory's contents, and symlinks are
//! followed (`-L`) the same way `fs::metadata` follows them.
//!
//! A long listing line looks like
//! `-rw------- 1 root root 32768 Feb 11 11:40 /sys/bus/pci/devices/0000:03:0d.0/resource0`.
//! Only regular-file lines are accepted; for character/block devices the fifth column is
//! `major,` and there is no size.

use crate::error::{PciInfoError, Result};
use bstr::ByteSlice;
use std::{
    io::Read,
    path::Path,
    process::{Child, Command, Output, Stdio},
    thread,
    time::{Duration, Instant},
};
use tracing::{debug, trace};

const POLL_INTERVAL: Duration = Duration::from_millis(5);

fn is_mode_field(field: &[u8]) -> bool {
    let Some((&kind, perms)) = field.split_first() else {
        return false;
    };
    // 9 permission characters, optionally followed by an ACL/xattr marker
    matches!(kind, b'-' | b'd' | b'l' | b'c' | b'b' | b'p' | b's')
        && (perms.len() == 9 || (perms.len() == 10 && matches!(perms[9], b'.' | b'+' | b'@')))
        && perms[..9]
            .iter()
            .all(|b| matches!(b, b'r' | b'w' | b'x' | b's' | b'S' | b't' | b'T' | b'-'))
}

/// Byte size from one long-listing line, `None` when the line does not follow the grammar.
#[must_use]
pub fn parse_size_line(line: &[u8]) -> Option<u64> {
    let mut fields = line.fields();
    let mode = fields.next()?;
    if !is_mode_field(mode) || mode[0] != b'-' {
        return None;
    }
    // links, owner, group
    let size = fields.nth(3)?;
    if !size.iter().all(u8::is_ascii_digit) {
        return None;
    }
    core::str::from_utf8(size).ok()?.parse().ok()
}

/// Size from complete `ls` output. Anything unparseable counts as zero bytes.
#[must_use]
pub fn parse_listing(output: &[u8]) -> u64 {
    output
        .lines()
        .find_map(parse_size_line)
        .unwrap_or(0)
}

fn kill_child(child: &mut Child) {
    if let Err(err) = child.kill() {
        debug!("Failed to kill listing process: {err}");
    }
    _ = child.wait();
}

/// Run `cmd` to completion, giving up after `timeout`.
pub(crate) fn output_with_timeout(
    mut cmd: Command,
    timeout: Duration,
) -> std::io::Result<Option<Output>> {
    let mut child = cmd.stdin(Stdio::null()).stdout(Stdio::piped()).spawn()?;
    let Some(mut stdout) = child.stdout.take() else {
        kill_child(&mut child);
        return Err(std::io::Error::other("child stdout was not captured"));
    };
    let reader = thread::spawn(move || {
        let mut buf = Vec::new();
        stdout.read_to_end(&mut buf).map(|_| buf)
    });
    let deadline = Instant::now() + timeout;
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if Instant::now() >= deadline {
            kill_child(&mut child);
            _ = reader.join();
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    };
    let stdout = reader
        .join()
        .map_err(|_| std::io::Error::other("listing reader thread panicked"))??;
    Ok(Some(Output {
        status,
        stdout,
        stderr: Vec::new(),
    }))
}

#[tracing::instrument(level = "trace")]
pub(crate) fn listed_size(entry: &Path, timeout: Duration) -> Result<u64> {
    let mut cmd = Command::new("ls");
    cmd.arg("-dlL")
        .arg(entry)
        .env("LC_ALL", "C")
        .stderr(Stdio::null());
    let output = output_with_timeout(cmd, timeout)
        .map_err(|source| PciInfoError::Io {
            path: entry.to_path_buf(),
            source,
        })?
        .ok_or_else(|| PciInfoError::ListingTimeout {
            path: entry.to_path_buf(),
            timeout,
        })?;
    trace!(status = ?output.status, "ls finished");
    Ok(parse_listing(&output.stdout))
}
