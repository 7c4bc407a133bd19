use crate::cmdline::CmdlinePatch;
use crate::compress::{compress, decompress};
use crate::error::Result;
use crate::image::BootImage;
use crate::ramdisk::{PatchPair, RamdiskPatchSet, cpuset_pairs, encryption_pairs};
use crate::report::Reporter;
use log::{debug, warn};
use memmap2::Mmap;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// What to change in the image.
///
/// Starts out with the builtin cmdline rule and cpuset pairs. Every pair is
/// validated when it is built, so a set of options is always applicable.
#[derive(Debug, Clone)]
pub struct PatchOptions {
    cmdline: CmdlinePatch,
    base_pairs: Vec<PatchPair>,
    extra_pairs: Vec<PatchPair>,
    encryption_pairs: Vec<PatchPair>,
    disable_encryption: bool,
}

impl PatchOptions {
    pub fn new() -> Result<Self> {
        Ok(Self {
            cmdline: CmdlinePatch::default(),
            base_pairs: cpuset_pairs()?,
            extra_pairs: Vec::new(),
            encryption_pairs: encryption_pairs()?,
            disable_encryption: false,
        })
    }

    /// Also blank the dm-verity and forced encryption options in fstab.
    pub fn disable_encryption(&mut self, disable_encryption: bool) -> &mut Self {
        self.disable_encryption = disable_encryption;
        self
    }

    pub fn cmdline_patch(&mut self, cmdline: CmdlinePatch) -> &mut Self {
        self.cmdline = cmdline;
        self
    }

    /// Adds a pair applied after the builtin cpuset pairs.
    pub fn add_ramdisk_pair(&mut self, pair: PatchPair) -> &mut Self {
        self.extra_pairs.push(pair);
        self
    }

    pub fn get_cmdline_patch(&self) -> &CmdlinePatch {
        &self.cmdline
    }

    pub fn is_disable_encryption(&self) -> bool {
        self.disable_encryption
    }

    /// Effective pair list: cpuset pairs, added pairs, then the encryption
    /// pairs when enabled.
    pub fn ramdisk_patches(&self) -> RamdiskPatchSet {
        let mut set = RamdiskPatchSet::new(self.base_pairs.clone());
        set.extend(self.extra_pairs.iter().cloned());
        if self.disable_encryption {
            set.extend(self.encryption_pairs.iter().cloned());
        }
        set
    }
}

/// Runs the whole patch over an in-memory image and returns the new image.
///
/// Only the cmdline and the ramdisk change. Kernel and second stage are copied
/// with their padding, `ramdisk_size` follows the recompressed ramdisk and all
/// load addresses stay as they were.
pub fn patch_image(
    data: &[u8],
    options: &PatchOptions,
    reporter: &mut dyn Reporter,
) -> Result<Vec<u8>> {
    let image = BootImage::parse(data)?;

    let header = image.header();
    debug!(
        "page size {} kernel {} ramdisk {} second {}",
        header.page_size, header.kernel_size, header.ramdisk_size, header.second_size
    );
    if let Some((os_version, patch_level)) = header.get_os_version() {
        debug!("os version {} patch level {}", os_version, patch_level);
    }
    if header.header_version != 0 {
        warn!(
            "header version field is {}, treating the image as version 0",
            header.header_version
        );
    }
    if image.trailing_len() > 0 {
        reporter.trailing_data_dropped(image.trailing_len());
    }

    let cmdline = options.cmdline.apply(&header.cmdline, reporter)?;
    let header = header.with_cmdline(cmdline);
    let image = image.with_header(header);

    let mut ramdisk = decompress(image.ramdisk_payload())?;
    debug!(
        "ramdisk {} bytes compressed, {} bytes raw",
        image.ramdisk_payload().len(),
        ramdisk.len()
    );
    let summary = options.ramdisk_patches().apply(&mut ramdisk, reporter);
    debug!(
        "{} patterns found, {} not found, {} replacements",
        summary.found, summary.not_found, summary.replacements
    );

    let ramdisk = compress(&ramdisk)?;
    let image = image.with_ramdisk(&ramdisk)?;
    debug!("new ramdisk size {}", image.header().ramdisk_size);

    image.to_bytes()
}

/// Patches the image at `input` and writes the result to `output`.
///
/// The result goes to a temporary file next to `output` that is renamed over
/// it once complete, a failed run leaves `output` untouched.
pub fn patch_file(
    input: &Path,
    output: &Path,
    options: &PatchOptions,
    reporter: &mut dyn Reporter,
) -> Result<()> {
    let file = File::open(input)?;
    let mem = unsafe { Mmap::map(&file)? };
    let patched = patch_image(&mem, options, reporter)?;

    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(&patched)?;
    tmp.as_file().sync_all()?;
    tmp.persist(output).map_err(|e| e.error)?;
    debug!("wrote {} bytes to {}", patched.len(), output.display());

    Ok(())
}
