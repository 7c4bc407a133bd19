use crate::error::{PatchError, Result};
use crate::header::ImageHeader;
use crate::utils::{WriteExt, align_to};
use log::debug;
use paste::paste;
use std::borrow::Cow;

/// Page aligned regions of a boot image, borrowed from the input buffer.
///
/// Every region except `trailing` has a length that is a multiple of the
/// header page size. `trailing` is whatever follows the second stage.
#[derive(Debug, Clone, Copy)]
pub struct Sections<'a> {
    pub header_page: &'a [u8],
    pub kernel: &'a [u8],
    pub ramdisk: &'a [u8],
    pub second: &'a [u8],
    pub trailing: &'a [u8],
    ramdisk_size: usize,
}

impl<'a> Sections<'a> {
    /// The ramdisk without its page padding.
    pub fn ramdisk_payload(&self) -> &'a [u8] {
        &self.ramdisk[..self.ramdisk_size]
    }
}

/// Page size of `header` as a usize, rejecting values that cannot hold the
/// header page itself.
pub fn page_size(header: &ImageHeader) -> Result<usize> {
    let page_size = header.page_size as usize;
    if page_size == 0 {
        return Err(PatchError::MalformedHeader("page size is zero".into()));
    }
    if page_size < ImageHeader::SIZE {
        return Err(PatchError::MalformedHeader(format!(
            "page size {} is smaller than the {} byte header",
            page_size,
            ImageHeader::SIZE
        )));
    }
    Ok(page_size)
}

fn padded_len(size: u32, page_size: usize) -> Result<usize> {
    align_to(size as usize, page_size)
        .ok_or_else(|| PatchError::MalformedHeader(format!("section size {} overflows", size)))
}

/// Splits `data` into header page, kernel, ramdisk and second stage regions
/// using the sizes recorded in `header`.
pub fn split<'a>(data: &'a [u8], header: &ImageHeader) -> Result<Sections<'a>> {
    let page_size = page_size(header)?;
    let mut off = 0_usize;

    let header_page = &data[..page_size.min(data.len())];
    off += page_size;

    macro_rules! take_regions {
        ($($name:ident),*) => {
            paste! {
                $(
                    let [<$name _size>] = header.[<$name _size>];
                    let len = padded_len([<$name _size>], page_size)?;
                    let end = off.checked_add(len).ok_or_else(|| {
                        PatchError::MalformedHeader(format!("{} region overflows", stringify!($name)))
                    })?;
                    let $name = data.get(off.min(data.len())..end.min(data.len())).unwrap_or_default();
                    debug!("block {} at off {} sz {} padded {}", stringify!($name), off, [<$name _size>], len);
                    off = end;
                )*
            }
        };
    }

    take_regions! { kernel, ramdisk, second }

    if data.len() < off {
        return Err(PatchError::TruncatedImage {
            expected: off,
            actual: data.len(),
        });
    }

    Ok(Sections {
        header_page,
        kernel,
        ramdisk,
        second,
        trailing: &data[off..],
        ramdisk_size: header.ramdisk_size as usize,
    })
}

/// Concatenates already padded regions into an image.
pub fn join(header_page: &[u8], kernel: &[u8], ramdisk: &[u8], second: &[u8]) -> Vec<u8> {
    [header_page, kernel, ramdisk, second].concat()
}

/// Encodes `header` followed by zeros up to one page.
pub fn header_page(header: &ImageHeader) -> Result<Vec<u8>> {
    let page_size = page_size(header)?;
    let mut page = header.encode();
    page.write_zeros(page_size - page.len())?;
    Ok(page)
}

/// Copies `payload` and zero fills it up to the next page boundary.
pub fn pad_region(payload: &[u8], page_size: usize) -> Result<Vec<u8>> {
    let len = align_to(payload.len(), page_size).ok_or_else(|| {
        PatchError::MalformedHeader(format!("cannot align {} bytes to page size {}", payload.len(), page_size))
    })?;
    let mut region = Vec::with_capacity(len);
    region.extend_from_slice(payload);
    region.write_zeros(len - payload.len())?;
    Ok(region)
}

/// A decoded boot image.
///
/// Kernel and second stage are kept as borrowed, padded regions and written
/// back untouched. The ramdisk can be swapped with [`BootImage::with_ramdisk`],
/// which keeps `ramdisk_size` and the padding consistent.
#[derive(Debug, Clone)]
pub struct BootImage<'a> {
    header: ImageHeader,
    kernel: &'a [u8],
    ramdisk: Cow<'a, [u8]>,
    second: &'a [u8],
    trailing_len: usize,
}

impl<'a> BootImage<'a> {
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        let header = ImageHeader::decode(data)?;
        if !header.has_valid_magic() {
            return Err(PatchError::MalformedHeader(format!(
                "invalid boot magic {:02x?}",
                header.magic
            )));
        }
        let sections = split(data, &header)?;
        Ok(Self {
            kernel: sections.kernel,
            ramdisk: Cow::Borrowed(sections.ramdisk),
            second: sections.second,
            trailing_len: sections.trailing.len(),
            header,
        })
    }

    pub fn header(&self) -> &ImageHeader {
        &self.header
    }

    pub fn kernel(&self) -> &[u8] {
        self.kernel
    }

    pub fn second(&self) -> &[u8] {
        self.second
    }

    pub fn ramdisk_payload(&self) -> &[u8] {
        &self.ramdisk[..self.header.ramdisk_size as usize]
    }

    /// Number of bytes after the second stage that are not carried over.
    pub fn trailing_len(&self) -> usize {
        self.trailing_len
    }

    /// Replaces the header. Page size and section sizes always follow the
    /// regions held by the image, use [`BootImage::with_ramdisk`] to change
    /// the ramdisk.
    pub fn with_header(self, header: ImageHeader) -> Self {
        let header = header
            .with_page_size(self.header.page_size)
            .with_kernel_size(self.header.kernel_size)
            .with_ramdisk_size(self.header.ramdisk_size)
            .with_second_size(self.header.second_size);
        Self { header, ..self }
    }

    /// Replaces the ramdisk payload, updating `ramdisk_size` and the padded
    /// region. Load addresses are left as they are.
    pub fn with_ramdisk(self, payload: &[u8]) -> Result<Self> {
        let ramdisk_size = u32::try_from(payload.len()).map_err(|_| {
            PatchError::MalformedHeader(format!("ramdisk of {} bytes does not fit the header", payload.len()))
        })?;
        let page_size = page_size(&self.header)?;
        let ramdisk = pad_region(payload, page_size)?;
        Ok(Self {
            header: self.header.with_ramdisk_size(ramdisk_size),
            ramdisk: Cow::Owned(ramdisk),
            ..self
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let header_page = header_page(&self.header)?;
        Ok(join(&header_page, self.kernel, &self.ramdisk, self.second))
    }
}
