//! Color token grammar
//!
//! Colors are written as `c` followed by a background and a foreground hex
//! digit (`c1F` is bright white on blue). Either nibble may be `?`, which
//! marks it as "keep whatever is there":
//!
//! - `c??` => 288
//! - `c?F` => 256 + 0xF
//! - `cB?` => 272 + 0xB

/// Largest encodable color value (`c??`)
pub const MAX_COLOR: u16 = 288;

const UNKNOWN_BG: u16 = 256;
const UNKNOWN_FG: u16 = 272;

/// Parse a color token, returning `None` if it is not one
pub fn parse_color(token: &str) -> Option<u16> {
    let bytes = token.trim().as_bytes();
    if bytes.len() != 3 || !matches!(bytes[0], b'c' | b'C') {
        return None;
    }

    match (bytes[1], bytes[2]) {
        (b'?', b'?') => Some(MAX_COLOR),
        (b'?', fg) => hex_digit(fg).map(|fg| UNKNOWN_BG + fg),
        (bg, b'?') => hex_digit(bg).map(|bg| UNKNOWN_FG + bg),
        (bg, fg) => Some((hex_digit(bg)? << 4) | hex_digit(fg)?),
    }
}

/// Render a color value as its three-character token
pub fn print_color(color: u16) -> String {
    match color {
        MAX_COLOR => "c??".into(),
        UNKNOWN_FG..=287 => format!("c{:X}?", color - UNKNOWN_FG),
        UNKNOWN_BG..=271 => format!("c?{:X}", color - UNKNOWN_BG),
        _ => format!("c{:X}{:X}", (color >> 4) & 0xF, color & 0xF),
    }
}

fn hex_digit(byte: u8) -> Option<u16> {
    (byte as char).to_digit(16).map(|d| d as u16)
}
