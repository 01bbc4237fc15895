//! Fixed-width big-endian field access.
//!
//! [`FieldReader`] walks a record payload and fails with a short reason
//! string instead of panicking; the decoder attaches tag and offset.
//! [`FieldWriter`] is the mirror image used for re-encoding.

/// Width of the feed's timestamp field (nanoseconds since midnight).
pub const TIMESTAMP_LEN: usize = 6;

/// Largest value representable in the 6-byte timestamp.
pub const MAX_TIMESTAMP: u64 = (1 << 48) - 1;

/// Field-level result; the error is a human-readable reason.
pub type FieldResult<T> = std::result::Result<T, String>;

/// Sequential reader over one record payload.
pub struct FieldReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> FieldReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes not consumed yet.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    #[inline]
    fn take<const N: usize>(&mut self) -> FieldResult<[u8; N]> {
        let end = self.pos + N;
        let bytes = self.buf.get(self.pos..end).ok_or_else(|| {
            format!(
                "field of {N} bytes at payload offset {} overruns {}-byte payload",
                self.pos,
                self.buf.len()
            )
        })?;
        self.pos = end;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    #[inline]
    pub fn u8(&mut self) -> FieldResult<u8> {
        Ok(self.take::<1>()?[0])
    }

    #[inline]
    pub fn u16(&mut self) -> FieldResult<u16> {
        Ok(u16::from_be_bytes(self.take()?))
    }

    #[inline]
    pub fn u32(&mut self) -> FieldResult<u32> {
        Ok(u32::from_be_bytes(self.take()?))
    }

    #[inline]
    pub fn u64(&mut self) -> FieldResult<u64> {
        Ok(u64::from_be_bytes(self.take()?))
    }

    /// 6-byte big-endian nanoseconds since midnight.
    #[inline]
    pub fn timestamp(&mut self) -> FieldResult<u64> {
        let raw = self.take::<TIMESTAMP_LEN>()?;
        Ok(raw.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64))
    }

    /// Fixed-width alphanumeric field; must be printable ASCII (space padded).
    pub fn alpha<const N: usize>(&mut self) -> FieldResult<[u8; N]> {
        let start = self.pos;
        let raw = self.take::<N>()?;
        if let Some(bad) = raw.iter().position(|b| !(0x20..=0x7e).contains(b)) {
            return Err(format!(
                "non-printable byte 0x{:02x} in alpha field at payload offset {}",
                raw[bad],
                start + bad
            ));
        }
        Ok(raw)
    }

    /// Single-character field restricted to an allowed set.
    pub fn one_of(&mut self, allowed: &[u8], what: &str) -> FieldResult<u8> {
        let byte = self.u8()?;
        if allowed.contains(&byte) {
            Ok(byte)
        } else {
            Err(format!("invalid {what} {:?}", char::from(byte)))
        }
    }

    /// Everything left in the payload.
    pub fn rest(&mut self) -> &'a [u8] {
        let rest = &self.buf[self.pos..];
        self.pos = self.buf.len();
        rest
    }
}

/// Appends big-endian fields to a byte buffer.
pub struct FieldWriter<'a> {
    out: &'a mut Vec<u8>,
}

impl<'a> FieldWriter<'a> {
    pub fn new(out: &'a mut Vec<u8>) -> Self {
        Self { out }
    }

    #[inline]
    pub fn u8(&mut self, v: u8) -> &mut Self {
        self.out.push(v);
        self
    }

    #[inline]
    pub fn u16(&mut self, v: u16) -> &mut Self {
        self.out.extend_from_slice(&v.to_be_bytes());
        self
    }

    #[inline]
    pub fn u32(&mut self, v: u32) -> &mut Self {
        self.out.extend_from_slice(&v.to_be_bytes());
        self
    }

    #[inline]
    pub fn u64(&mut self, v: u64) -> &mut Self {
        self.out.extend_from_slice(&v.to_be_bytes());
        self
    }

    /// Low 48 bits, big-endian.
    #[inline]
    pub fn timestamp(&mut self, v: u64) -> &mut Self {
        self.out.extend_from_slice(&v.to_be_bytes()[8 - TIMESTAMP_LEN..]);
        self
    }

    #[inline]
    pub fn bytes(&mut self, v: &[u8]) -> &mut Self {
        self.out.extend_from_slice(v);
        self
    }
}

/// Space-pad (or truncate) text into a fixed-width alpha field.
pub fn pad_alpha<const N: usize>(text: &str) -> [u8; N] {
    let mut out = [b' '; N];
    for (dst, src) in out.iter_mut().zip(text.bytes()) {
        *dst = src;
    }
    out
}

/// Text of an alpha field with trailing padding removed.
pub fn alpha_str(raw: &[u8]) -> &str {
    std::str::from_utf8(raw).unwrap_or("").trim_end_matches(' ')
}
