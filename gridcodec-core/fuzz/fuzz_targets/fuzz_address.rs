#![no_main]

//! Fuzz target for the cell address grammar.
//!
//! Any input must parse or fail without panicking, and whatever parses must
//! format back to an address that parses to the same position.

use arbitrary::Arbitrary;
use gridcodec_core::utils::{
    column_to_letters, format_address, format_range, letters_to_column, parse_address, parse_address_bytes,
    parse_f64_bytes, parse_range, parse_u32_bytes, MAX_COLUMN, MAX_ROW,
};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct AddressInput {
    raw_bytes: Vec<u8>,
    text: String,
    row: u32,
    column: u32,
}

fn check_text(text: &str) {
    if let Ok((row, col)) = parse_address(text) {
        assert!(row < MAX_ROW && col < MAX_COLUMN, "{:?} parsed out of bounds", text);
        let formatted = format_address(row, col);
        assert_eq!(parse_address(&formatted).ok(), Some((row, col)), "{:?} -> {:?}", text, formatted);
    }
    if let Ok(range) = parse_range(text) {
        assert!(range.first_row <= range.last_row && range.first_col <= range.last_col);
        assert_eq!(parse_range(&format_range(&range)).ok(), Some(range));
    }
    if let Ok(col) = letters_to_column(text) {
        assert_eq!(column_to_letters(col), text.to_ascii_uppercase());
    }
}

fn check_bytes(bytes: &[u8]) {
    let _ = parse_address_bytes(bytes);
    let _ = parse_u32_bytes(bytes);
    let _ = parse_f64_bytes(bytes);
}

fn check_position(row: u32, column: u32) {
    let (row, column) = (row % MAX_ROW, column % MAX_COLUMN);
    let text = format_address(row, column);
    assert_eq!(parse_address(&text).ok(), Some((row, column)), "{}", text);
    assert_eq!(letters_to_column(&column_to_letters(column)).ok(), Some(column));
}

fuzz_target!(|input: AddressInput| {
    check_text(&input.text);
    check_bytes(&input.raw_bytes);
    check_position(input.row, input.column);
});
