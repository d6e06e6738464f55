//! Cell reference helpers for A1-style coordinates.

use crate::common::{Error, Result};

/// Convert a 1-based column number to letters (1 -> "A", 26 -> "Z",
/// 27 -> "AA").
pub fn column_to_letters(col: u32) -> String {
    let mut letters = String::new();
    let mut col = col;

    while col > 0 {
        col -= 1;
        let letter = ((col % 26) as u8 + b'A') as char;
        letters.insert(0, letter);
        col /= 26;
    }

    letters
}

/// Format a 1-based (column, row) pair as an A1-style reference.
pub fn coords_to_reference(col: u32, row: u32) -> String {
    format!("{}{}", column_to_letters(col), row)
}

/// Convert an A1-style reference to 1-based (column, row) numbers.
pub fn reference_to_coords(reference: &str) -> Result<(u32, u32)> {
    let bytes = reference.as_bytes();
    let mut col_end = 0;

    for (i, &byte) in bytes.iter().enumerate() {
        if byte.is_ascii_digit() {
            col_end = i;
            break;
        }
    }

    if col_end == 0 {
        return Err(Error::Xml(format!("invalid cell reference: {reference}")));
    }

    let mut col = 0u32;
    for &byte in &bytes[..col_end] {
        if !byte.is_ascii_alphabetic() {
            return Err(Error::Xml(format!("invalid cell reference: {reference}")));
        }
        col = col * 26 + (byte.to_ascii_uppercase() - b'A' + 1) as u32;
    }

    let row = reference[col_end..]
        .parse::<u32>()
        .map_err(|_| Error::Xml(format!("invalid cell reference: {reference}")))?;

    Ok((col, row))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_letters() {
        assert_eq!(column_to_letters(1), "A");
        assert_eq!(column_to_letters(26), "Z");
        assert_eq!(column_to_letters(27), "AA");
        assert_eq!(column_to_letters(702), "ZZ");
        assert_eq!(column_to_letters(703), "AAA");
    }

    #[test]
    fn test_reference_round_trip() {
        for (col, row) in [(1, 1), (26, 5), (27, 100), (703, 1048576)] {
            let text = coords_to_reference(col, row);
            assert_eq!(reference_to_coords(&text).unwrap(), (col, row));
        }
    }

    #[test]
    fn test_invalid_reference() {
        assert!(reference_to_coords("123").is_err());
        assert!(reference_to_coords("A1B").is_err());
    }
}
