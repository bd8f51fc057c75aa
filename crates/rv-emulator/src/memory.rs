//! Program image the emulator fetches instructions from.

use alloc::vec::Vec;

use crate::error::{EmulatorError, FetchFault};

/// Default load address for program images.
pub const DEFAULT_CODE_BASE: u64 = 0x1000;

/// Read-only instruction image mapped at a non-zero base address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeImage {
    bytes: Vec<u8>,
    base: u64,
    end: u64,
}

impl CodeImage {
    /// Map `bytes` at `base`.
    ///
    /// Fails if `base` is 0, since a PC of 0 means "return to host", or if
    /// the image would run past the top of the address space.
    pub fn new(bytes: Vec<u8>, base: u64) -> Result<Self, EmulatorError> {
        if base == 0 {
            return Err(EmulatorError::ZeroImageBase);
        }
        let end = u64::try_from(bytes.len())
            .ok()
            .and_then(|len| base.checked_add(len))
            .ok_or(EmulatorError::ImageOutOfRange {
                base,
                len: bytes.len(),
            })?;
        Ok(Self { bytes, base, end })
    }

    /// Map `bytes` at [`DEFAULT_CODE_BASE`].
    pub fn at_default_base(bytes: Vec<u8>) -> Self {
        // a Vec holds at most isize::MAX bytes
        let end = DEFAULT_CODE_BASE + bytes.len() as u64;
        Self {
            bytes,
            base: DEFAULT_CODE_BASE,
            end,
        }
    }

    /// Map instruction words, laid out little-endian, at `base`.
    pub fn from_words(words: &[u32], base: u64) -> Result<Self, EmulatorError> {
        Self::new(rv_encoder::encode_program(words), base)
    }

    /// Fetch the 32-bit little-endian word at `address`.
    pub fn fetch(&self, address: u64) -> Result<u32, FetchFault> {
        if address % 4 != 0 {
            return Err(FetchFault::Unaligned);
        }
        let offset = address
            .checked_sub(self.base)
            .and_then(|offset| usize::try_from(offset).ok())
            .ok_or(FetchFault::OutOfImage)?;
        let bytes = self
            .bytes
            .get(offset..offset.saturating_add(4))
            .ok_or(FetchFault::OutOfImage)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    /// One past the last byte of the image.
    pub fn end(&self) -> u64 {
        self.end
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_zero_base_rejected() {
        assert_eq!(
            CodeImage::new(vec![0; 4], 0),
            Err(EmulatorError::ZeroImageBase)
        );
    }

    #[test]
    fn test_fetch() {
        let image = CodeImage::from_words(&[0xdead_beef, 0x0000_8067], 0x1000).unwrap();
        assert_eq!(image.fetch(0x1000), Ok(0xdead_beef));
        assert_eq!(image.fetch(0x1004), Ok(0x0000_8067));
        assert_eq!(image.end(), 0x1008);
    }

    #[test]
    fn test_fetch_faults() {
        let image = CodeImage::new(vec![0x13, 0, 0, 0, 0x13, 0], 0x1000).unwrap();
        assert_eq!(image.fetch(0x1002), Err(FetchFault::Unaligned));
        assert_eq!(image.fetch(0xffc), Err(FetchFault::OutOfImage));
        // trailing partial word
        assert_eq!(image.fetch(0x1004), Err(FetchFault::OutOfImage));
        assert_eq!(image.fetch(u64::MAX - 3), Err(FetchFault::OutOfImage));
    }

    #[test]
    fn test_image_past_top_of_address_space_rejected() {
        assert_eq!(
            CodeImage::new(vec![0; 8], 0xffff_ffff_ffff_fffc),
            Err(EmulatorError::ImageOutOfRange {
                base: 0xffff_ffff_ffff_fffc,
                len: 8
            })
        );
        // ending exactly at u64::MAX is fine
        let image = CodeImage::new(vec![0; 8], 0xffff_ffff_ffff_fff7).unwrap();
        assert_eq!(image.end(), u64::MAX);
    }
}
