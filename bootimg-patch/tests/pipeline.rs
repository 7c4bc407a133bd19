use bootimg_patch::compress::{compress, decompress};
use bootimg_patch::header::ImageHeader;
use bootimg_patch::image::{BootImage, header_page, join, pad_region};
use bootimg_patch::report::Reporter;
use bootimg_patch::{PatchError, PatchOptions, align_to, patch_file, patch_image};
use std::fs;

const PAGE_SIZE: u32 = 2048;

const INIT_RC: &[u8] = b"on init\n\
    \x20   write /dev/cpuset/foreground/cpus 0-2,4-5\n\
    \x20   write /dev/cpuset/foreground/boost/cpus 4-5\n\
    \x20   write /dev/cpuset/background/cpus 0\n\
    \x20   write /dev/cpuset/system-background/cpus 0-2\n\
    \x20   write /dev/cpuset/top-app/cpus 0-5\n";

const FSTAB: &[u8] = b"/dev/block/platform/soc.0/f9824900.sdhci/by-name/userdata /data ext4 \
    noatime wait,check,forcefdeorfbe=/dev/block/platform/soc.0/f9824900.sdhci/by-name/metadata\n";

#[derive(Default)]
struct Collect {
    lines: Vec<String>,
    missing: usize,
}

impl Reporter for Collect {
    fn cmdline(&mut self, original: &[u8], modified: &[u8]) {
        self.lines
            .push(format!("{} -> {}", String::from_utf8_lossy(original), String::from_utf8_lossy(modified)));
    }

    fn pattern_replaced(&mut self, search: &[u8], _replace: &[u8], _count: usize) {
        self.lines.push(String::from_utf8_lossy(search).into_owned());
    }

    fn pattern_not_found(&mut self, _search: &[u8]) {
        self.missing += 1;
    }
}

struct Fixture {
    kernel: Vec<u8>,
    second: Vec<u8>,
    data: Vec<u8>,
}

fn fixture(ramdisk_raw: &[u8]) -> Fixture {
    let kernel: Vec<u8> = (0..5000_u32).map(|i| (i % 256) as u8).collect();
    let second = b"second stage loader".to_vec();
    let ramdisk = compress(ramdisk_raw).unwrap();

    let mut header = ImageHeader::new(PAGE_SIZE);
    header.kernel_size = kernel.len() as u32;
    header.kernel_addr = 0x0000_8000;
    header.ramdisk_size = ramdisk.len() as u32;
    header.ramdisk_addr = 0x0200_0000;
    header.second_size = second.len() as u32;
    header.second_addr = 0x00f0_0000;
    header.tags_addr = 0x0000_0100;
    let cmdline = b"console=ttyHSL0,115200,n8 boot_cpus=0-5 androidboot.hardware=bullhead";
    header.cmdline[..cmdline.len()].copy_from_slice(cmdline);

    let page = PAGE_SIZE as usize;
    let data = join(
        &header_page(&header).unwrap(),
        &pad_region(&kernel, page).unwrap(),
        &pad_region(&ramdisk, page).unwrap(),
        &pad_region(&second, page).unwrap(),
    );
    Fixture {
        kernel,
        second,
        data,
    }
}

#[test]
fn patches_cmdline_and_cpusets() {
    let fixture = fixture(INIT_RC);
    let options = PatchOptions::new().unwrap();
    let mut reporter = Collect::default();
    let out = patch_image(&fixture.data, &options, &mut reporter).unwrap();

    let image = BootImage::parse(&out).unwrap();
    let header = image.header();
    let original = ImageHeader::decode(&fixture.data).unwrap();

    let cmdline = &header.cmdline;
    let text_end = cmdline.iter().position(|&b| b == 0).unwrap();
    assert_eq!(
        &cmdline[..text_end],
        b"console=ttyHSL0,115200,n8 boot_cpus=0-3 maxcpus=4 androidboot.hardware=bullhead"
    );

    let ramdisk = decompress(image.ramdisk_payload()).unwrap();
    assert_eq!(ramdisk.len(), INIT_RC.len());
    let text = String::from_utf8(ramdisk).unwrap();
    assert!(text.contains("write /dev/cpuset/foreground/cpus 0-3    \n"));
    assert!(text.contains("write /dev/cpuset/foreground/boost/cpus 0-3\n"));
    assert!(text.contains("write /dev/cpuset/background/cpus 3\n"));
    assert!(text.contains("write /dev/cpuset/system-background/cpus 2-3\n"));
    assert!(text.contains("write /dev/cpuset/top-app/cpus 0-3\n"));

    let expected_ramdisk = compress(text.as_bytes()).unwrap();
    assert_eq!(header.ramdisk_size as usize, expected_ramdisk.len());
    assert_eq!(image.ramdisk_payload(), &expected_ramdisk[..]);

    // untouched fields and sections
    assert_eq!(header.kernel_addr, original.kernel_addr);
    assert_eq!(header.ramdisk_addr, original.ramdisk_addr);
    assert_eq!(header.second_addr, original.second_addr);
    assert_eq!(header.extra_cmdline, original.extra_cmdline);
    assert_eq!(&image.kernel()[..fixture.kernel.len()], &fixture.kernel[..]);
    assert_eq!(&image.second()[..fixture.second.len()], &fixture.second[..]);

    let page = PAGE_SIZE as usize;
    assert_eq!(out.len() % page, 0);
    assert_eq!(
        out.len(),
        page + 3 * page + align_to(expected_ramdisk.len(), page).unwrap() + page
    );

    assert_eq!(reporter.lines.len(), 6);
    assert_eq!(reporter.missing, 0);
}

#[test]
fn output_is_reproducible() {
    let fixture = fixture(INIT_RC);
    let options = PatchOptions::new().unwrap();
    let first = patch_image(&fixture.data, &options, &mut Collect::default()).unwrap();
    let second = patch_image(&fixture.data, &options, &mut Collect::default()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn encryption_pairs_follow_the_flag() {
    let raw = [INIT_RC, FSTAB].concat();
    let fixture = fixture(&raw);

    let mut options = PatchOptions::new().unwrap();
    let out = patch_image(&fixture.data, &options, &mut Collect::default()).unwrap();
    let ramdisk = decompress(BootImage::parse(&out).unwrap().ramdisk_payload()).unwrap();
    assert!(String::from_utf8_lossy(&ramdisk).contains(",forcefdeorfbe="));

    options.disable_encryption(true);
    let mut reporter = Collect::default();
    let out = patch_image(&fixture.data, &options, &mut reporter).unwrap();
    let ramdisk = decompress(BootImage::parse(&out).unwrap().ramdisk_payload()).unwrap();
    let text = String::from_utf8(ramdisk).unwrap();
    assert_eq!(text.len(), raw.len());
    assert!(!text.contains("forcefdeorfbe"));
    assert!(text.contains("noatime wait,check "));
    // ,verify= is absent from this fstab
    assert_eq!(reporter.missing, 1);
}

#[test]
fn rejects_truncated_image() {
    let fixture = fixture(INIT_RC);
    let cut = &fixture.data[..fixture.data.len() - 1];
    let err = patch_image(cut, &PatchOptions::new().unwrap(), &mut Collect::default()).unwrap_err();
    assert!(matches!(err, PatchError::TruncatedImage { .. }));
}

#[test]
fn rejects_uncompressed_ramdisk() {
    let mut header = ImageHeader::new(PAGE_SIZE);
    header.ramdisk_size = INIT_RC.len() as u32;
    let data = join(
        &header_page(&header).unwrap(),
        &[],
        &pad_region(INIT_RC, PAGE_SIZE as usize).unwrap(),
        &[],
    );
    let err = patch_image(&data, &PatchOptions::new().unwrap(), &mut Collect::default()).unwrap_err();
    assert!(matches!(err, PatchError::DecompressionFailure(_)));
}

#[test]
fn patch_file_writes_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("boot.img");
    let output = dir.path().join("boot-patched.img");
    let fixture = fixture(INIT_RC);
    fs::write(&input, &fixture.data).unwrap();

    let options = PatchOptions::new().unwrap();
    patch_file(&input, &output, &options, &mut Collect::default()).unwrap();

    let written = fs::read(&output).unwrap();
    let expected = patch_image(&fixture.data, &options, &mut Collect::default()).unwrap();
    assert_eq!(written, expected);
    assert_eq!(fs::read(&input).unwrap(), fixture.data);
}

#[test]
fn failed_run_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("boot.img");
    let output = dir.path().join("boot-patched.img");
    fs::write(&input, b"definitely not a boot image").unwrap();

    let err = patch_file(&input, &output, &PatchOptions::new().unwrap(), &mut Collect::default())
        .unwrap_err();
    assert!(matches!(err, PatchError::MalformedHeader(_)));
    assert!(!output.exists());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}
