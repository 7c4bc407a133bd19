use crate::constants::{BOOT_ARGS_SIZE, CMDLINE_REPLACE, CMDLINE_SEARCH};
use crate::error::{PatchError, Result};
use crate::report::Reporter;
use crate::utils::{SliceExt, trim_end};

/// Literal substitution inside the fixed-width kernel command line.
///
/// Search and replacement may differ in length. The buffer is rewritten as a
/// whole and then cut or zero filled back to [`BOOT_ARGS_SIZE`] bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmdlinePatch {
    search: Vec<u8>,
    replace: Vec<u8>,
}

impl Default for CmdlinePatch {
    fn default() -> Self {
        Self {
            search: CMDLINE_SEARCH.to_vec(),
            replace: CMDLINE_REPLACE.to_vec(),
        }
    }
}

fn replace_all(data: &[u8], search: &[u8], replace: &[u8]) -> (Vec<u8>, usize) {
    let mut out = Vec::with_capacity(data.len());
    let mut count = 0;
    let mut pos = 0;
    while let Some(found) = data.find_bytes(search, pos) {
        out.extend_from_slice(&data[pos..found]);
        out.extend_from_slice(replace);
        pos = found + search.len();
        count += 1;
    }
    out.extend_from_slice(&data[pos..]);
    (out, count)
}

impl CmdlinePatch {
    pub fn new(search: &[u8], replace: &[u8]) -> Result<Self> {
        let reason = if search.is_empty() {
            "search is empty"
        } else if search.contains(&0) || replace.contains(&0) {
            "NUL byte inside the command line text"
        } else {
            return Ok(Self {
                search: search.to_vec(),
                replace: replace.to_vec(),
            });
        };
        Err(PatchError::InvalidCmdlinePatch {
            search: String::from_utf8_lossy(search).into_owned(),
            reason,
        })
    }

    pub fn search(&self) -> &[u8] {
        &self.search
    }

    pub fn replace(&self) -> &[u8] {
        &self.replace
    }

    pub fn apply(
        &self,
        cmdline: &[u8; BOOT_ARGS_SIZE],
        reporter: &mut dyn Reporter,
    ) -> Result<[u8; BOOT_ARGS_SIZE]> {
        let (replaced, count) = replace_all(cmdline, &self.search, &self.replace);
        if count == 0 {
            reporter.pattern_not_found(&self.search);
            reporter.cmdline(trim_end(cmdline), trim_end(cmdline));
            return Ok(*cmdline);
        }

        let text_len = trim_end(&replaced).len();
        if text_len >= BOOT_ARGS_SIZE {
            return Err(PatchError::CmdlineOverflow {
                needed: text_len + 1,
                capacity: BOOT_ARGS_SIZE,
            });
        }

        let mut out = [0_u8; BOOT_ARGS_SIZE];
        let len = replaced.len().min(BOOT_ARGS_SIZE);
        out[..len].copy_from_slice(&replaced[..len]);

        reporter.cmdline(trim_end(cmdline), trim_end(&out));
        Ok(out)
    }
}
