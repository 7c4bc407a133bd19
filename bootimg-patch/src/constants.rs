// See system/core/mkbootimg/bootimg.h
pub const BOOT_MAGIC: &[u8] = b"ANDROID!";
pub const BOOT_MAGIC_SIZE: usize = 8;
pub const BOOT_NAME_SIZE: usize = 16;
pub const BOOT_ARGS_SIZE: usize = 512;
pub const BOOT_ID_SIZE: usize = 32;
pub const BOOT_EXTRA_ARGS_SIZE: usize = 1024;

pub const CMDLINE_SEARCH: &[u8] = b"boot_cpus=0-5";
pub const CMDLINE_REPLACE: &[u8] = b"boot_cpus=0-3 maxcpus=4";

/// cpuset directives in the init scripts that pin groups to the big cores.
/// Both sides of every pair have the same length, the ramdisk archive is
/// patched without being unpacked.
pub const CPUSET_PATCHES: &[(&[u8], &[u8])] = &[
    (
        b"write /dev/cpuset/foreground/cpus 0-2,4-5",
        b"write /dev/cpuset/foreground/cpus 0-3    ",
    ),
    (
        b"write /dev/cpuset/foreground/boost/cpus 4-5",
        b"write /dev/cpuset/foreground/boost/cpus 0-3",
    ),
    (
        b"write /dev/cpuset/background/cpus 0",
        b"write /dev/cpuset/background/cpus 3",
    ),
    (
        b"write /dev/cpuset/system-background/cpus 0-2",
        b"write /dev/cpuset/system-background/cpus 2-3",
    ),
    (
        b"write /dev/cpuset/top-app/cpus 0-5",
        b"write /dev/cpuset/top-app/cpus 0-3",
    ),
];

/// fstab options enabling dm-verity and forced encryption, blanked out.
pub const ENCRYPTION_PATCHES: &[(&[u8], &[u8])] = &[
    (
        b",verify=/dev/block/platform/soc.0/f9824900.sdhci/by-name/metadata",
        b"                                                                 ",
    ),
    (
        b",forcefdeorfbe=/dev/block/platform/soc.0/f9824900.sdhci/by-name/metadata",
        b"                                                                        ",
    ),
];
