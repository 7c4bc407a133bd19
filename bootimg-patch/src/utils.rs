use num_traits::PrimInt;
use std::cmp::min;
use std::io;
use std::io::Write;

pub trait WriteExt {
    fn write_zeros(&mut self, len: usize) -> io::Result<usize>;
}

impl<T: Write> WriteExt for T {
    fn write_zeros(&mut self, mut len: usize) -> io::Result<usize> {
        let buf = [0_u8; 4096];
        let orig_len = len;
        while len > 0 {
            let l = min(buf.len(), len);
            self.write_all(&buf[..l])?;
            len -= l;
        }
        Ok(orig_len)
    }
}

/// Rounds `num` up to the next multiple of `alignment`.
///
/// Unlike a mask based round-up this accepts any non-zero alignment, page
/// sizes read from a header are not guaranteed to be powers of two.
/// Returns `None` for a zero alignment or on overflow.
pub fn align_to<N: PrimInt>(num: N, alignment: N) -> Option<N> {
    if alignment.is_zero() {
        return None;
    }
    let rem = num % alignment;
    if rem.is_zero() {
        Some(num)
    } else {
        num.checked_add(&(alignment - rem))
    }
}

pub trait SliceExt {
    fn u32_at(&self, offset: usize) -> Option<u32>;
    fn array_at<const N: usize>(&self, offset: usize) -> Option<[u8; N]>;
    fn find_bytes(&self, needle: &[u8], from: usize) -> Option<usize>;
}

impl SliceExt for [u8] {
    fn u32_at(&self, offset: usize) -> Option<u32> {
        self.array_at::<4>(offset).map(u32::from_le_bytes)
    }

    fn array_at<const N: usize>(&self, offset: usize) -> Option<[u8; N]> {
        self.get(offset..offset.checked_add(N)?)
            .and_then(|data| data.try_into().ok())
    }

    fn find_bytes(&self, needle: &[u8], from: usize) -> Option<usize> {
        if needle.is_empty() {
            return None;
        }
        self.get(from..)?
            .windows(needle.len())
            .position(|w| w == needle)
            .map(|pos| pos + from)
    }
}

pub fn trim_end(data: &[u8]) -> &[u8] {
    &data[..data.iter().position(|&b| b == 0).unwrap_or(data.len())]
}
