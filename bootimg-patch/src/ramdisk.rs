use crate::constants::{CPUSET_PATCHES, ENCRYPTION_PATCHES};
use crate::error::{PatchError, Result};
use crate::report::Reporter;
use crate::utils::SliceExt;

/// One search/replace pair for the decompressed ramdisk.
///
/// The ramdisk archive is never unpacked, so a replacement must not move any
/// byte after it. Pairs of unequal length cannot be constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchPair {
    search: Vec<u8>,
    replace: Vec<u8>,
}

impl PatchPair {
    pub fn new(search: &[u8], replace: &[u8]) -> Result<Self> {
        if search.is_empty() || search.len() != replace.len() {
            return Err(PatchError::InvalidPatchPair {
                search: String::from_utf8_lossy(search).into_owned(),
                search_len: search.len(),
                replace_len: replace.len(),
            });
        }
        Ok(Self {
            search: search.to_vec(),
            replace: replace.to_vec(),
        })
    }

    pub fn search(&self) -> &[u8] {
        &self.search
    }

    pub fn replace(&self) -> &[u8] {
        &self.replace
    }

    /// Rewrites every non-overlapping occurrence, scanning left to right.
    /// Returns the number of replacements.
    pub fn apply(&self, data: &mut [u8]) -> usize {
        let mut count = 0;
        let mut pos = 0;
        while let Some(found) = data.find_bytes(&self.search, pos) {
            data[found..found + self.replace.len()].copy_from_slice(&self.replace);
            pos = found + self.search.len();
            count += 1;
        }
        count
    }
}

fn build_pairs(table: &[(&[u8], &[u8])]) -> Result<Vec<PatchPair>> {
    table
        .iter()
        .map(|(search, replace)| PatchPair::new(search, replace))
        .collect()
}

/// cpuset pairs moving every group onto the little cores.
pub fn cpuset_pairs() -> Result<Vec<PatchPair>> {
    build_pairs(CPUSET_PATCHES)
}

/// Pairs blanking the verity and forced encryption fstab options.
pub fn encryption_pairs() -> Result<Vec<PatchPair>> {
    build_pairs(ENCRYPTION_PATCHES)
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PatchSummary {
    pub found: usize,
    pub not_found: usize,
    pub replacements: usize,
}

/// Ordered list of pairs applied to the ramdisk in place.
#[derive(Debug, Default, Clone)]
pub struct RamdiskPatchSet {
    pairs: Vec<PatchPair>,
}

impl RamdiskPatchSet {
    pub fn new(pairs: Vec<PatchPair>) -> Self {
        Self { pairs }
    }

    pub fn pairs(&self) -> &[PatchPair] {
        &self.pairs
    }

    pub fn push(&mut self, pair: PatchPair) -> &mut Self {
        self.pairs.push(pair);
        self
    }

    pub fn extend(&mut self, pairs: impl IntoIterator<Item = PatchPair>) -> &mut Self {
        self.pairs.extend(pairs);
        self
    }

    /// Applies every pair in order. A pair that matches nothing is reported
    /// and skipped.
    pub fn apply(&self, data: &mut [u8], reporter: &mut dyn Reporter) -> PatchSummary {
        let mut summary = PatchSummary::default();
        for pair in &self.pairs {
            let count = pair.apply(data);
            if count > 0 {
                reporter.pattern_replaced(&pair.search, &pair.replace, count);
                summary.found += 1;
                summary.replacements += count;
            } else {
                reporter.pattern_not_found(&pair.search);
                summary.not_found += 1;
            }
        }
        summary
    }
}
