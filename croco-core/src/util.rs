/// Format a byte count as a human-readable size string (e.g., "8 KB", "2 MB").
///
/// Uses exact integer division. Values that aren't clean multiples of KB/MB
/// are shown in bytes.
pub fn format_bytes(bytes: u64) -> String {
    if bytes >= 1024 * 1024 && bytes.is_multiple_of(1024 * 1024) {
        format!("{} MB", bytes / (1024 * 1024))
    } else if bytes >= 1024 && bytes.is_multiple_of(1024) {
        format!("{} KB", bytes / 1024)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Decode a NUL-terminated name field.
///
/// Stops at the first NUL (or the end of `buf`) and decodes the bytes before
/// it as UTF-8, replacing invalid sequences.
pub fn read_nul_terminated(buf: &[u8]) -> String {
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    String::from_utf8_lossy(&buf[..end]).into_owned()
}

/// Copy `text` into a zero-filled field of `width` bytes.
///
/// Returns `None` if the text does not fit.
pub fn nul_padded(text: &str, width: usize) -> Option<Vec<u8>> {
    let bytes = text.as_bytes();
    if bytes.len() > width {
        return None;
    }
    let mut field = vec![0u8; width];
    field[..bytes.len()].copy_from_slice(bytes);
    Some(field)
}

/// Render bytes as an uppercase hex string without separators.
pub fn hex_upper(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02X}", b)).collect()
}

/// Read a big-endian u16 from a byte slice.
pub fn read_u16_be(buf: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([buf[offset], buf[offset + 1]])
}

/// Read a big-endian u32 from a byte slice.
pub fn read_u32_be(buf: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ])
}
