use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

use base64::engine::general_purpose::{GeneralPurpose, STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine;
use crc::Crc;
use lazy_static::lazy_static;

use super::{TonAddressParseError, TonHash, TON_HASH_BYTES, ZERO_HASH};

mod serde_impl;

const USER_FRIENDLY_BYTES: usize = 36;
const USER_FRIENDLY_CHARS: usize = 48;

lazy_static! {
    pub static ref CRC_16_XMODEM: Crc<u16> = Crc::<u16>::new(&crc::CRC_16_XMODEM);
}

/// Standard internal address: workchain and 256-bit account id.
///
/// Cells store the workchain as a signed byte, so only `-128..=127` can be
/// written with [`crate::cell::CellBuilder::store_address`].
#[derive(PartialEq, Eq, Clone, Hash)]
pub struct TonAddress {
    pub workchain: i32,
    pub hash_part: TonHash,
}

impl TonAddress {
    pub const NULL: TonAddress = TonAddress {
        workchain: 0,
        hash_part: ZERO_HASH,
    };

    pub fn new(workchain: i32, hash_part: &TonHash) -> TonAddress {
        TonAddress {
            workchain,
            hash_part: *hash_part,
        }
    }

    /// Builds an address from raw account id bytes, which must be exactly 32 bytes long.
    pub fn from_bytes(workchain: i32, bytes: &[u8]) -> Result<TonAddress, TonAddressParseError> {
        let hash_part: TonHash = bytes.try_into().map_err(|_| {
            TonAddressParseError::new(
                hex::encode(bytes),
                format!(
                    "Invalid address length: expected {} bytes, got {}",
                    TON_HASH_BYTES,
                    bytes.len()
                ),
            )
        })?;
        Ok(TonAddress::new(workchain, &hash_part))
    }

    pub fn from_hex_str(s: &str) -> Result<TonAddress, TonAddressParseError> {
        let (wc, hash_hex) = s.split_once(':').ok_or_else(|| {
            TonAddressParseError::new(s, "Invalid hex address string: wrong address format")
        })?;

        let workchain = wc.parse::<i32>().map_err(|_| {
            TonAddressParseError::new(s, "Invalid hex address string: parse int error")
        })?;

        let decoded_hash_part = hex::decode(hash_hex).map_err(|_| {
            TonAddressParseError::new(s, "Invalid hex address string: hex decode error")
        })?;

        let hash_part: TonHash = decoded_hash_part.as_slice().try_into().map_err(|_| {
            TonAddressParseError::new(s, "Invalid hex address string: wrong hash length")
        })?;

        Ok(TonAddress::new(workchain, &hash_part))
    }

    pub fn from_base64_url(s: &str) -> Result<TonAddress, TonAddressParseError> {
        Ok(Self::from_base64_url_flags(s)?.0)
    }

    /// Parses the url-safe user-friendly form, returning the flags it was encoded with.
    pub fn from_base64_url_flags(
        s: &str,
    ) -> Result<(TonAddress, AddressFlags), TonAddressParseError> {
        Self::from_user_friendly(s, &URL_SAFE_NO_PAD)
    }

    pub fn from_base64_std(s: &str) -> Result<TonAddress, TonAddressParseError> {
        Ok(Self::from_base64_std_flags(s)?.0)
    }

    /// Parses the standard base64 user-friendly form, returning its flags.
    pub fn from_base64_std_flags(
        s: &str,
    ) -> Result<(TonAddress, AddressFlags), TonAddressParseError> {
        Self::from_user_friendly(s, &STANDARD_NO_PAD)
    }

    // tag:8 workchain:8 hash:256 crc16:16
    fn from_user_friendly(
        s: &str,
        engine: &GeneralPurpose,
    ) -> Result<(TonAddress, AddressFlags), TonAddressParseError> {
        if s.len() != USER_FRIENDLY_CHARS {
            return Err(TonAddressParseError::new(
                s,
                format!("User-friendly address must be {USER_FRIENDLY_CHARS} chars"),
            ));
        }
        let bytes = engine
            .decode(s)
            .map_err(|e| TonAddressParseError::new(s, format!("Base64 decode error: {e}")))?;
        let bytes: [u8; USER_FRIENDLY_BYTES] = bytes
            .try_into()
            .map_err(|_| TonAddressParseError::new(s, "Unexpected decoded length"))?;

        let (body, crc) = bytes.split_at(USER_FRIENDLY_BYTES - 2);
        if CRC_16_XMODEM.checksum(body).to_be_bytes() != crc {
            return Err(TonAddressParseError::new(s, "CRC mismatch"));
        }
        let flags = AddressFlags::from_tag(body[0])
            .ok_or_else(|| TonAddressParseError::new(s, format!("Unknown tag byte {}", body[0])))?;
        let address = TonAddress::from_bytes(body[1] as i8 as i32, &body[2..])?;
        Ok((address, flags))
    }

    pub fn to_hex(&self) -> String {
        format!("{}:{}", self.workchain, hex::encode(self.hash_part))
    }

    /// Url-safe user-friendly form, bounceable and for mainnet.
    pub fn to_base64_url(&self) -> String {
        self.to_base64_url_flags(AddressFlags::default())
    }

    pub fn to_base64_url_flags(&self, flags: AddressFlags) -> String {
        URL_SAFE_NO_PAD.encode(self.user_friendly_bytes(flags))
    }

    pub fn to_base64_std(&self) -> String {
        self.to_base64_std_flags(AddressFlags::default())
    }

    pub fn to_base64_std_flags(&self, flags: AddressFlags) -> String {
        STANDARD_NO_PAD.encode(self.user_friendly_bytes(flags))
    }

    fn user_friendly_bytes(&self, flags: AddressFlags) -> [u8; USER_FRIENDLY_BYTES] {
        let mut bytes = [0u8; USER_FRIENDLY_BYTES];
        bytes[0] = flags.tag();
        bytes[1] = self.workchain as i8 as u8;
        bytes[2..34].copy_from_slice(&self.hash_part);
        let crc = CRC_16_XMODEM.checksum(&bytes[..34]);
        bytes[34..].copy_from_slice(&crc.to_be_bytes());
        bytes
    }
}

/// Flags carried by the tag byte of a user-friendly address.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct AddressFlags {
    pub bounceable: bool,
    pub testnet: bool,
}

impl Default for AddressFlags {
    fn default() -> Self {
        AddressFlags {
            bounceable: true,
            testnet: false,
        }
    }
}

impl AddressFlags {
    const BOUNCEABLE_TAG: u8 = 0x11;
    const NON_BOUNCEABLE_TAG: u8 = 0x51;
    const TESTNET_BIT: u8 = 0x80;

    pub fn new(bounceable: bool, testnet: bool) -> Self {
        AddressFlags {
            bounceable,
            testnet,
        }
    }

    fn tag(&self) -> u8 {
        let tag = if self.bounceable {
            Self::BOUNCEABLE_TAG
        } else {
            Self::NON_BOUNCEABLE_TAG
        };
        if self.testnet {
            tag | Self::TESTNET_BIT
        } else {
            tag
        }
    }

    fn from_tag(tag: u8) -> Option<Self> {
        let testnet = tag & Self::TESTNET_BIT != 0;
        match tag & !Self::TESTNET_BIT {
            Self::BOUNCEABLE_TAG => Some(AddressFlags::new(true, testnet)),
            Self::NON_BOUNCEABLE_TAG => Some(AddressFlags::new(false, testnet)),
            _ => None,
        }
    }
}

impl Display for TonAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_base64_url().as_str())
    }
}

impl Debug for TonAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_hex().as_str())
    }
}

impl FromStr for TonAddress {
    type Err = TonAddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() == USER_FRIENDLY_CHARS {
            if s.contains('-') || s.contains('_') {
                TonAddress::from_base64_url(s)
            } else {
                TonAddress::from_base64_std(s)
            }
        } else {
            TonAddress::from_hex_str(s)
        }
    }
}

impl TryFrom<String> for TonAddress {
    type Error = TonAddressParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str(value.as_str())
    }
}
