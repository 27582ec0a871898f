// Bounded Byte Cursor
// Read-only cursor over an image buffer. Every read is bounds-checked and
// capped at a scan budget, so corrupt input can only end a walk early.

#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
    limit: usize,
}

impl<'a> ByteCursor<'a> {
    /// Cursor starting at `start`, never reading at or past `budget` bytes.
    pub fn new(data: &'a [u8], start: usize, budget: usize) -> Self {
        let limit = data.len().min(budget);
        Self {
            data,
            pos: start.min(limit),
            limit,
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.limit - self.pos
    }

    /// Bytes left in the whole buffer, ignoring the scan budget.
    pub fn remaining_in_buffer(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn peek(&self, len: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(len)?;
        if end > self.limit {
            return None;
        }
        Some(&self.data[self.pos..end])
    }

    pub fn read_bytes(&mut self, len: usize) -> Option<&'a [u8]> {
        let bytes = self.peek(len)?;
        self.pos += len;
        Some(bytes)
    }

    pub fn read_u16_be(&mut self) -> Option<u16> {
        let b = self.read_bytes(2)?;
        Some(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn read_u32_be(&mut self) -> Option<u32> {
        let b = self.read_bytes(4)?;
        Some(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Advance by `len`; refuses (and stays put) when that would leave the budget.
    pub fn skip(&mut self, len: usize) -> bool {
        match self.pos.checked_add(len) {
            Some(end) if end <= self.limit => {
                self.pos = end;
                true
            }
            _ => false,
        }
    }

    /// Consume up to `len` bytes, stopping at the scan budget.
    pub fn take_up_to(&mut self, len: usize) -> &'a [u8] {
        let end = self.pos.saturating_add(len).min(self.limit);
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        bytes
    }

    /// Up to `len` bytes from the current position, limited by the buffer rather
    /// than the scan budget. Used for payloads that straddle the budget edge.
    pub fn payload(&self, len: usize, cap: usize) -> &'a [u8] {
        let end = self.pos.saturating_add(len.min(cap)).min(self.data.len());
        &self.data[self.pos..end]
    }
}

/// Decode bytes one char per byte (Latin-1), so binary data survives substring search.
pub fn latin1_lowercase(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect::<String>().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_are_bounded_by_budget() {
        let data = [0u8, 0, 0, 5, b'a', b'b', b'c', b'd', b'e'];
        let mut cursor = ByteCursor::new(&data, 0, 6);
        assert_eq!(cursor.read_u32_be(), Some(5));
        assert_eq!(cursor.remaining(), 2);
        assert_eq!(cursor.read_bytes(3), None);
        assert_eq!(cursor.position(), 4);
        assert_eq!(cursor.read_bytes(2), Some(&b"ab"[..]));
    }

    #[test]
    fn test_skip_refuses_overflow() {
        let data = [0u8; 8];
        let mut cursor = ByteCursor::new(&data, 2, usize::MAX);
        assert!(!cursor.skip(usize::MAX));
        assert_eq!(cursor.position(), 2);
        assert!(cursor.skip(6));
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn test_start_past_end_is_clamped() {
        let data = [1u8, 2, 3];
        let cursor = ByteCursor::new(&data, 10, 100);
        assert_eq!(cursor.remaining(), 0);
        assert_eq!(cursor.peek(1), None);
    }

    #[test]
    fn test_payload_is_capped() {
        let data = b"0123456789";
        let cursor = ByteCursor::new(data, 2, 4);
        assert_eq!(cursor.payload(100, 3), b"234");
        assert_eq!(cursor.payload(5, 100), b"23456");
    }

    #[test]
    fn test_read_u16_be() {
        let data = [0x01u8, 0x02, 0x03];
        let mut cursor = ByteCursor::new(&data, 1, 100);
        assert_eq!(cursor.read_u16_be(), Some(0x0203));
        assert_eq!(cursor.read_u16_be(), None);
    }

    #[test]
    fn test_take_up_to_stops_at_budget() {
        let data = b"0123456789";
        let mut cursor = ByteCursor::new(data, 2, 6);
        assert_eq!(cursor.take_up_to(100), b"2345");
        assert_eq!(cursor.remaining(), 0);
        assert_eq!(cursor.take_up_to(1), b"");
    }

    #[test]
    fn test_latin1_lowercase_keeps_every_byte() {
        let s = latin1_lowercase(&[b'A', 0x00, 0xB7, b'E']);
        assert_eq!(s.chars().count(), 4);
        assert_eq!(s, "a\u{0}\u{b7}e");
    }
}
