use crate::errors::PaletteError;

/// The closed set of colors the placement service accepts, mapped to the
/// color indices its API expects. Anything outside this table is either a
/// non-palette target pixel or a decoding bug upstream.
pub const PALETTE: [(&str, u8); 16] = [
    ("#FF4500", 2),
    ("#FFA800", 3),
    ("#FFD635", 4),
    ("#00A368", 6),
    ("#7EED56", 8),
    ("#2450A4", 12),
    ("#3690EA", 13),
    ("#51E9F4", 14),
    ("#811E9F", 18),
    ("#B44AC0", 19),
    ("#FF99AA", 23),
    ("#9C6926", 25),
    ("#000000", 27),
    ("#898D90", 29),
    ("#D4D7D9", 30),
    ("#FFFFFF", 31),
];

pub fn color_index(hex: &str) -> Result<u8, PaletteError> {
    PALETTE
        .iter()
        .find(|(candidate, _)| *candidate == hex)
        .map(|(_, index)| *index)
        .ok_or_else(|| PaletteError::UnknownColor(hex.to_string()))
}

pub fn rgb_to_hex(r: u8, g: u8, b: u8) -> String {
    format!("#{:02X}{:02X}{:02X}", r, g, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_palette_entry_round_trips() {
        for (hex, expected_index) in PALETTE {
            let without_hash = &hex[1..];
            let r = u8::from_str_radix(&without_hash[0..2], 16).unwrap();
            let g = u8::from_str_radix(&without_hash[2..4], 16).unwrap();
            let b = u8::from_str_radix(&without_hash[4..6], 16).unwrap();

            let canonical = rgb_to_hex(r, g, b);
            assert_eq!(canonical, hex);
            assert_eq!(color_index(&canonical), Ok(expected_index));
        }
    }

    #[test]
    fn non_palette_color_is_rejected() {
        let hex = rgb_to_hex(1, 2, 3);
        assert_eq!(
            color_index(&hex),
            Err(PaletteError::UnknownColor("#010203".to_string()))
        );
    }

    #[test]
    fn lowercase_hex_is_not_coerced() {
        assert!(color_index("#ff4500").is_err());
    }

    #[test]
    fn hex_formatting_pads_small_channels() {
        assert_eq!(rgb_to_hex(0, 10, 255), "#000AFF");
    }
}
