// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Bounds-checked cursors over wire buffers
//!
//! [ReadView] is used when decoding request payloads, every read checks the
//! remaining length and fails closed with [ApduError::InvalidLength] on underrun.
//! [WriteView] provides the matching big-endian writers for encoding.

use byteorder::{BigEndian, ByteOrder};

use crate::ApduError;

/// Read cursor over an incoming wire buffer
#[derive(Debug)]
pub struct ReadView<'a> {
    buff: &'a [u8],
    index: usize,
}

impl<'a> ReadView<'a> {
    /// Create a new view over the provided buffer
    pub fn new(buff: &'a [u8]) -> Self {
        Self { buff, index: 0 }
    }

    /// Number of bytes remaining in the view
    pub fn remaining(&self) -> usize {
        self.buff.len() - self.index
    }

    /// Number of bytes consumed from the view
    pub fn consumed(&self) -> usize {
        self.index
    }

    /// Read a fixed length slice, advancing the cursor
    pub fn bytes(&mut self, n: usize) -> Result<&'a [u8], ApduError> {
        if self.remaining() < n {
            return Err(ApduError::InvalidLength);
        }

        let d = &self.buff[self.index..][..n];
        self.index += n;

        Ok(d)
    }

    /// Read a fixed size array
    pub fn array<const N: usize>(&mut self) -> Result<[u8; N], ApduError> {
        let mut d = [0u8; N];
        d.copy_from_slice(self.bytes(N)?);
        Ok(d)
    }

    /// Read a single byte
    pub fn u8(&mut self) -> Result<u8, ApduError> {
        self.bytes(1).map(|b| b[0])
    }

    /// Read a big-endian u32
    pub fn u32_be(&mut self) -> Result<u32, ApduError> {
        self.bytes(4).map(BigEndian::read_u32)
    }

    /// Read a big-endian u64
    pub fn u64_be(&mut self) -> Result<u64, ApduError> {
        self.bytes(8).map(BigEndian::read_u64)
    }

    /// Ensure the view has been fully consumed, returning the consumed length
    pub fn finish(self) -> Result<usize, ApduError> {
        if self.remaining() != 0 {
            return Err(ApduError::InvalidLength);
        }

        Ok(self.index)
    }
}

/// Write cursor over an outgoing wire buffer
#[derive(Debug)]
pub struct WriteView<'a> {
    buff: &'a mut [u8],
    index: usize,
}

impl<'a> WriteView<'a> {
    /// Create a new view over the provided buffer
    pub fn new(buff: &'a mut [u8]) -> Self {
        Self { buff, index: 0 }
    }

    /// Write a slice, advancing the cursor
    pub fn bytes(&mut self, d: &[u8]) -> Result<(), ApduError> {
        if self.buff.len() - self.index < d.len() {
            return Err(ApduError::InvalidLength);
        }

        self.buff[self.index..][..d.len()].copy_from_slice(d);
        self.index += d.len();

        Ok(())
    }

    /// Write a single byte
    pub fn u8(&mut self, v: u8) -> Result<(), ApduError> {
        self.bytes(&[v])
    }

    /// Write a big-endian u32
    pub fn u32_be(&mut self, v: u32) -> Result<(), ApduError> {
        self.bytes(&v.to_be_bytes())
    }

    /// Write a big-endian u64
    pub fn u64_be(&mut self, v: u64) -> Result<(), ApduError> {
        self.bytes(&v.to_be_bytes())
    }

    /// Return the number of bytes written
    pub fn finish(self) -> usize {
        self.index
    }
}
