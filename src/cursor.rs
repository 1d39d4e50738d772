use byteorder::{BigEndian, ByteOrder};

/// A forward-only reader over an in-memory file.
///
/// Reads past the end of the data return zeros, so callers bound their loops
/// with [`Cursor::position`] instead of checking every read.
#[derive(Debug)]
pub(crate) struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Cursor { data, pos: 0 }
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn len(&self) -> usize {
        self.data.len()
    }

    pub(crate) fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Fill `buf` from the data, zero-filling anything past the end.
    fn read_bytes<'b>(&mut self, buf: &'b mut [u8]) -> &'b [u8] {
        let start = self.pos.min(self.data.len());
        let end = self.pos.saturating_add(buf.len()).min(self.data.len());
        let available = end - start;

        buf[..available].copy_from_slice(&self.data[start..end]);
        for byte in buf[available..].iter_mut() {
            *byte = 0;
        }
        self.pos = self.pos.saturating_add(buf.len());

        buf
    }

    pub(crate) fn read_u8(&mut self) -> u8 {
        let byte = self.data.get(self.pos).copied().unwrap_or(0);
        self.pos = self.pos.saturating_add(1);
        byte
    }

    /// Read a MIDI data byte, dropping the status bit.
    pub(crate) fn read_data(&mut self) -> u8 {
        self.read_u8() & 0x7f
    }

    pub(crate) fn read_u16(&mut self) -> u16 {
        BigEndian::read_u16(self.read_bytes(&mut [0; 2]))
    }

    pub(crate) fn read_u24(&mut self) -> u32 {
        BigEndian::read_u24(self.read_bytes(&mut [0; 3]))
    }

    pub(crate) fn read_u32(&mut self) -> u32 {
        BigEndian::read_u32(self.read_bytes(&mut [0; 4]))
    }

    /// Read a 4-byte chunk signature.
    pub(crate) fn read_tag(&mut self) -> [u8; 4] {
        let mut tag = [0; 4];
        self.read_bytes(&mut tag);
        tag
    }

    /// Read a variable-length quantity: 7 bits per byte, big-endian, with the
    /// high bit set on every byte but the last.
    pub(crate) fn read_vlq(&mut self) -> u32 {
        let mut value: u32 = 0;
        loop {
            let byte = self.read_u8();
            value = (value << 7) | u32::from(byte & 0x7f);
            if byte & 0x80 == 0 || self.remaining() == 0 {
                return value;
            }
        }
    }

    /// Move forward by `n` bytes.
    pub(crate) fn skip(&mut self, n: usize) {
        self.pos = self.pos.saturating_add(n);
    }

    /// Move to an absolute position at or after the current one.
    pub(crate) fn seek_to(&mut self, pos: usize) {
        self.pos = self.pos.max(pos);
    }
}
