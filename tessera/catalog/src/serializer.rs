//! Byte-level encoding of catalog snapshots.
//!
//! Fixed-width integers are little-endian. Strings and nested payloads carry a `u32`
//! length prefix; nested payloads are encoded with postcard.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{CatalogError, CatalogResult};

#[derive(Debug, Default)]
pub struct Serializer {
    buf: BytesMut,
}

impl Serializer {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn write_u8(&mut self, value: u8) {
        self.buf.put_u8(value);
    }

    #[inline]
    pub fn write_u32(&mut self, value: u32) {
        self.buf.put_u32_le(value);
    }

    #[inline]
    pub fn write_u64(&mut self, value: u64) {
        self.buf.put_u64_le(value);
    }

    pub fn write_str(&mut self, value: &str) {
        self.write_u32(value.len() as u32);
        self.buf.put_slice(value.as_bytes());
    }

    pub fn write_value<T: Serialize>(&mut self, value: &T) -> CatalogResult<()> {
        let payload = postcard::to_allocvec(value)
            .map_err(|e| CatalogError::Serialization(e.to_string()))?;
        self.write_u32(payload.len() as u32);
        self.buf.put_slice(&payload);
        Ok(())
    }

    pub fn finish(self) -> Bytes {
        self.buf.freeze()
    }
}

#[derive(Debug)]
pub struct Deserializer {
    buf: Bytes,
}

impl Deserializer {
    pub fn new(buf: impl Into<Bytes>) -> Self {
        Self { buf: buf.into() }
    }

    fn ensure(&self, len: usize) -> CatalogResult<()> {
        if self.buf.remaining() < len {
            return Err(CatalogError::Corrupted(format!(
                "expected {len} more bytes, found {}",
                self.buf.remaining()
            )));
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> CatalogResult<u8> {
        self.ensure(1)?;
        Ok(self.buf.get_u8())
    }

    pub fn read_u32(&mut self) -> CatalogResult<u32> {
        self.ensure(4)?;
        Ok(self.buf.get_u32_le())
    }

    pub fn read_u64(&mut self) -> CatalogResult<u64> {
        self.ensure(8)?;
        Ok(self.buf.get_u64_le())
    }

    pub fn read_string(&mut self) -> CatalogResult<String> {
        let len = self.read_u32()? as usize;
        self.ensure(len)?;
        let bytes = self.buf.split_to(len);
        String::from_utf8(bytes.to_vec()).map_err(|e| CatalogError::Corrupted(e.to_string()))
    }

    pub fn read_value<T: DeserializeOwned>(&mut self) -> CatalogResult<T> {
        let len = self.read_u32()? as usize;
        self.ensure(len)?;
        let payload = self.buf.split_to(len);
        postcard::from_bytes(&payload).map_err(|e| CatalogError::Corrupted(e.to_string()))
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        !self.buf.has_remaining()
    }
}
