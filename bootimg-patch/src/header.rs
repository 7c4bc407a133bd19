use crate::constants::{
    BOOT_ARGS_SIZE, BOOT_EXTRA_ARGS_SIZE, BOOT_ID_SIZE, BOOT_MAGIC, BOOT_MAGIC_SIZE,
    BOOT_NAME_SIZE,
};
use crate::error::{PatchError, Result};
use crate::utils::SliceExt;
use paste::paste;
use std::fmt::{Display, Formatter};

pub struct OsVersion {
    a: u32,
    b: u32,
    c: u32,
}

impl Display for OsVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("{}.{}.{}", self.a, self.b, self.c))
    }
}

pub struct PatchLevel {
    year: u32,
    month: u32,
}

impl Display for PatchLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("{}-{:02}", self.year, self.month))
    }
}

macro_rules! field_type {
    (u32) => {
        u32
    };
    ($sz:expr) => {
        [u8; $sz]
    };
}

macro_rules! decode_field {
    ($data:ident, $offset:expr, u32) => {
        $data.u32_at($offset)
    };
    ($data:ident, $offset:expr, $sz:expr) => {
        $data.array_at::<{ $sz }>($offset)
    };
}

macro_rules! encode_field {
    ($buf:ident, $offset:expr, $value:expr, u32) => {
        $buf[$offset..$offset + 4].copy_from_slice(&$value.to_le_bytes())
    };
    ($buf:ident, $offset:expr, $value:expr, $sz:expr) => {
        $buf[$offset..$offset + $sz].copy_from_slice(&$value)
    };
}

macro_rules! define_boot_header {
    (
        $(#[$outer:meta])*
        $struct_name:ident {
            $($(#[$inner:meta])* $name:ident $t:tt),+ $(,)?
        }
    ) => {
        define_layout! {
            $struct_name,
            initial_offset 0,
            structure { $($name $t),+ },
        }

        paste! {
            $(#[$outer])*
            #[derive(Debug, Clone, PartialEq, Eq)]
            pub struct $struct_name {
                $(
                    $(#[$inner])*
                    pub $name: field_type!($t),
                )+
            }

            impl $struct_name {
                /// Encoded width of the header in bytes.
                pub const SIZE: usize = [<mod_offsets_ $struct_name>]::total_size;

                /// Decodes the header from the start of `data`.
                ///
                /// Only the length is checked, field values are taken as they
                /// are. Bytes past [`Self::SIZE`] are ignored.
                pub fn decode(data: &[u8]) -> Result<Self> {
                    if data.len() < Self::SIZE {
                        return Err(PatchError::MalformedHeader(format!(
                            "need {} bytes, got {}",
                            Self::SIZE,
                            data.len()
                        )));
                    }
                    Ok(Self {
                        $(
                            $name: decode_field!(
                                data,
                                [<mod_offsets_ $struct_name>]::[<offset_ $name>],
                                $t
                            )
                            .ok_or_else(|| PatchError::MalformedHeader(
                                format!("field {} out of range", stringify!($name))
                            ))?,
                        )+
                    })
                }

                /// Encodes the header into exactly [`Self::SIZE`] bytes.
                pub fn encode(&self) -> Vec<u8> {
                    let mut buf = vec![0_u8; Self::SIZE];
                    $(
                        encode_field!(
                            buf,
                            [<mod_offsets_ $struct_name>]::[<offset_ $name>],
                            self.$name,
                            $t
                        );
                    )+
                    buf
                }

                $(
                    #[allow(unused)]
                    pub fn [<with_ $name>](&self, $name: field_type!($t)) -> Self {
                        Self { $name, ..self.clone() }
                    }
                )+
            }
        }
    };
}

define_boot_header! {
    /// Version 0 boot image header.
    ///
    /// | field         | width |
    /// |---------------|-------|
    /// | magic         | 8     |
    /// | kernel_size   | 4     |
    /// | kernel_addr   | 4     |
    /// | ramdisk_size  | 4     |
    /// | ramdisk_addr  | 4     |
    /// | second_size   | 4     |
    /// | second_addr   | 4     |
    /// | tags_addr     | 4     |
    /// | page_size     | 4     |
    /// | header_version| 4     |
    /// | os_version    | 4     |
    /// | name          | 16    |
    /// | cmdline       | 512   |
    /// | id            | 32    |
    /// | extra_cmdline | 1024  |
    ///
    /// All integers are little-endian. String fields are NUL terminated by
    /// convention only, bytes after the terminator are kept as they are.
    ImageHeader {
        magic BOOT_MAGIC_SIZE,
        kernel_size u32,
        kernel_addr u32,
        ramdisk_size u32,
        ramdisk_addr u32,
        second_size u32,
        second_addr u32,
        tags_addr u32,
        page_size u32,
        /// Unused by v0 images, always zero in practice.
        header_version u32,
        os_version u32,
        name BOOT_NAME_SIZE,
        cmdline BOOT_ARGS_SIZE,
        id BOOT_ID_SIZE,
        extra_cmdline BOOT_EXTRA_ARGS_SIZE,
    }
}

impl ImageHeader {
    /// An empty header carrying the boot magic.
    pub fn new(page_size: u32) -> Self {
        let mut magic = [0_u8; BOOT_MAGIC_SIZE];
        magic.copy_from_slice(BOOT_MAGIC);
        Self {
            magic,
            kernel_size: 0,
            kernel_addr: 0,
            ramdisk_size: 0,
            ramdisk_addr: 0,
            second_size: 0,
            second_addr: 0,
            tags_addr: 0,
            page_size,
            header_version: 0,
            os_version: 0,
            name: [0; BOOT_NAME_SIZE],
            cmdline: [0; BOOT_ARGS_SIZE],
            id: [0; BOOT_ID_SIZE],
            extra_cmdline: [0; BOOT_EXTRA_ARGS_SIZE],
        }
    }

    pub fn has_valid_magic(&self) -> bool {
        self.magic[..] == *BOOT_MAGIC
    }

    pub fn get_os_version(&self) -> Option<(OsVersion, PatchLevel)> {
        let version = self.os_version;
        if version == 0 {
            return None;
        }
        let os_ver = version >> 11;
        let patch_level = version & 0x7ff;

        let a = (os_ver >> 14) & 0x7f;
        let b = (os_ver >> 7) & 0x7f;
        let c = os_ver & 0x7f;

        let y = (patch_level >> 4) + 2000;
        let m = patch_level & 0xf;

        Some((OsVersion { a, b, c }, PatchLevel { year: y, month: m }))
    }
}
