//! PE header parsing.
//!
//! Only the fields the symbol server indexes images by are read: the COFF
//! time stamp and the optional header's `SizeOfImage`.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use sosfetch_shared::{Architecture, Error, Result};

// Machine type constants
pub const IMAGE_FILE_MACHINE_I386: u16 = 0x014c;
pub const IMAGE_FILE_MACHINE_AMD64: u16 = 0x8664;
pub const IMAGE_FILE_MACHINE_ARMNT: u16 = 0x01c4;
pub const IMAGE_FILE_MACHINE_ARM64: u16 = 0xAA64;

const PE32_MAGIC: u16 = 0x10B;
const PE32_PLUS_MAGIC: u16 = 0x20B;

/// Headers are read from the first page of the file.
const HEADER_READ_SIZE: u64 = 4096;

// =============================================================================
// Types
// =============================================================================

/// Symbol server identity of a PE image on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageIdentity {
    pub machine: u16,
    pub time_date_stamp: u32,
    pub size_of_image: u32,
    pub is_pe32_plus: bool,
}

impl ImageIdentity {
    pub fn architecture(&self) -> Architecture {
        match self.machine {
            IMAGE_FILE_MACHINE_I386 => Architecture::X86,
            IMAGE_FILE_MACHINE_AMD64 => Architecture::Amd64,
            IMAGE_FILE_MACHINE_ARMNT => Architecture::Arm,
            IMAGE_FILE_MACHINE_ARM64 => Architecture::Arm64,
            _ => Architecture::Unknown,
        }
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// `len` bytes at `offset`, `None` when out of range. Offsets come from
/// the file, so the end is computed with `checked_add`.
fn field(data: &[u8], offset: usize, len: usize) -> Option<&[u8]> {
    data.get(offset..offset.checked_add(len)?)
}

fn read_u16(data: &[u8], offset: usize) -> Option<u16> {
    let bytes = field(data, offset, 2)?;
    Some(u16::from_le_bytes([bytes[0], bytes[1]]))
}

fn read_u32(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = field(data, offset, 4)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Parse the identity out of the start of a PE file.
pub fn parse_image_identity(data: &[u8]) -> Option<ImageIdentity> {
    if data.len() < 64 || data[0] != b'M' || data[1] != b'Z' {
        return None;
    }

    let e_lfanew = read_u32(data, 0x3C)? as usize;
    if field(data, e_lfanew, 4)? != b"PE\0\0" {
        return None;
    }

    // COFF header follows the 4-byte signature
    let coff = e_lfanew.checked_add(4)?;
    let machine = read_u16(data, coff)?;
    let time_date_stamp = read_u32(data, coff.checked_add(4)?)?;

    let optional_header = coff.checked_add(20)?;
    let is_pe32_plus = match read_u16(data, optional_header)? {
        PE32_MAGIC => false,
        PE32_PLUS_MAGIC => true,
        _ => return None,
    };
    // Same offset for PE32 and PE32+
    let size_of_image = read_u32(data, optional_header.checked_add(56)?)?;

    Some(ImageIdentity {
        machine,
        time_date_stamp,
        size_of_image,
        is_pe32_plus,
    })
}

/// Read the identity of the PE image at `path`.
pub fn read_image_identity(path: &Path) -> Result<ImageIdentity> {
    let mut data = Vec::with_capacity(HEADER_READ_SIZE as usize);
    File::open(path)?
        .take(HEADER_READ_SIZE)
        .read_to_end(&mut data)?;

    parse_image_identity(&data)
        .ok_or_else(|| Error::Other(format!("{} is not a PE image", path.display())))
}
