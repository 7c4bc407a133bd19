use log::{info, warn};

/// Receives progress of a patch run.
///
/// The library never prints on its own, everything user visible goes
/// through a reporter. [`LogReporter`] forwards to the `log` facade.
pub trait Reporter {
    fn cmdline(&mut self, original: &[u8], modified: &[u8]);

    fn pattern_replaced(&mut self, search: &[u8], replace: &[u8], count: usize);

    fn pattern_not_found(&mut self, search: &[u8]);

    fn trailing_data_dropped(&mut self, _len: usize) {}
}

pub struct LogReporter;

impl Reporter for LogReporter {
    fn cmdline(&mut self, original: &[u8], modified: &[u8]) {
        info!("Original cmdline: {}", String::from_utf8_lossy(original));
        info!("Modified cmdline: {}", String::from_utf8_lossy(modified));
    }

    fn pattern_replaced(&mut self, search: &[u8], replace: &[u8], count: usize) {
        info!("Found   : {} ({}x)", String::from_utf8_lossy(search), count);
        info!("Replaced: {}", String::from_utf8_lossy(replace));
    }

    fn pattern_not_found(&mut self, search: &[u8]) {
        info!("Not Found: {}", String::from_utf8_lossy(search));
    }

    fn trailing_data_dropped(&mut self, len: usize) {
        warn!("dropping {} bytes after the last section", len);
    }
}
