//! Advertising data structures.
use crate::cursor::WriteCursor;
use crate::types::uuid::Uuid;
use crate::Error;

pub const LE_GENERAL_DISCOVERABLE: u8 = 0b00000010;
pub const BR_EDR_NOT_SUPPORTED: u8 = 0b00000100;

/// Largest legacy advertising payload.
pub const LEGACY_ADV_DATA_MAX: usize = 31;

const AD_TYPE_FLAGS: u8 = 0x01;
const AD_TYPE_COMPLETE_UUIDS128: u8 = 0x07;
const AD_TYPE_SHORTENED_LOCAL_NAME: u8 = 0x08;

#[derive(Debug, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdStructure<'a> {
    /// Device flags and baseband capabilities.
    ///
    /// Must not be used in scan response data.
    Flags(u8),

    /// Complete list of 128-bit service UUIDs.
    ServiceUuids128(&'a [Uuid]),

    /// Sets the shortened device name.
    ShortenedLocalName(&'a [u8]),
}

impl AdStructure<'_> {
    /// Encode a list of structures into `dest`, returning the number of bytes used.
    pub fn encode_slice(data: &[AdStructure<'_>], dest: &mut [u8]) -> Result<usize, Error> {
        let mut w = WriteCursor::new(dest);
        for item in data.iter() {
            item.encode(&mut w)?;
        }
        Ok(w.len())
    }

    pub(crate) fn encode(&self, w: &mut WriteCursor<'_>) -> Result<(), Error> {
        match self {
            AdStructure::Flags(flags) => w.append_tagged(AD_TYPE_FLAGS, &[&[*flags][..]]),
            AdStructure::ServiceUuids128(uuids) => Self::encode_uuids128(w, uuids),
            AdStructure::ShortenedLocalName(name) => w.append_tagged(AD_TYPE_SHORTENED_LOCAL_NAME, &[*name]),
        }
    }

    fn encode_uuids128(w: &mut WriteCursor<'_>, uuids: &[Uuid]) -> Result<(), Error> {
        let len = uuids.len() * 16 + 1;
        if len > u8::MAX as usize || w.available() < len + 1 {
            return Err(Error::InsufficientSpace);
        }
        if uuids.iter().any(|uuid| !matches!(uuid, Uuid::Uuid128(_))) {
            return Err(Error::InvalidValue);
        }
        w.append(&[len as u8, AD_TYPE_COMPLETE_UUIDS128])?;
        for uuid in uuids.iter() {
            w.append(uuid.as_raw())?;
        }
        Ok(())
    }
}
