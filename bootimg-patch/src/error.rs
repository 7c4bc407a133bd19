use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PatchError {
    #[error("malformed boot header: {0}")]
    MalformedHeader(String),

    #[error("truncated boot image ({actual} bytes, sections need {expected})")]
    TruncatedImage { expected: usize, actual: usize },

    #[error("invalid patch pair {search:?}: search is {search_len} bytes, replacement is {replace_len}")]
    InvalidPatchPair {
        search: String,
        search_len: usize,
        replace_len: usize,
    },

    #[error("invalid cmdline patch {search:?}: {reason}")]
    InvalidCmdlinePatch { search: String, reason: &'static str },

    #[error("failed to decompress ramdisk: {0}")]
    DecompressionFailure(String),

    #[error("patched cmdline needs {needed} bytes, field holds {capacity}")]
    CmdlineOverflow { needed: usize, capacity: usize },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, PatchError>;
