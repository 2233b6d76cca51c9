use gridcodec_core::{CellValue, Workbook};
use tempfile::NamedTempFile;

#[test]
fn test_boolean_roundtrip() {
    let mut wb = Workbook::new();
    let ws = wb.create_sheet(Some("Test".to_string())).unwrap();
    ws.set_cell_value(0, 0, CellValue::Boolean(false));
    ws.set_cell_value(0, 1, CellValue::Boolean(true));

    let temp_file = NamedTempFile::new().unwrap();
    let temp_path = temp_file.path().to_str().unwrap();
    wb.save(temp_path).unwrap();

    let loaded_wb = Workbook::load(temp_path).unwrap();
    let loaded_ws = loaded_wb.get_sheet_by_name("Test").unwrap();

    assert_eq!(loaded_ws.get_cell_value(0, 0), Some(&CellValue::Boolean(false)), "Boolean false should roundtrip");
    assert_eq!(loaded_ws.get_cell_value(0, 1), Some(&CellValue::Boolean(true)), "Boolean true should roundtrip");
}

#[test]
fn test_boolean_roundtrip_multiple_sheets() {
    // false is the value most easily confused with an empty cell
    let mut wb = Workbook::new();
    wb.create_sheet(Some("A".to_string())).unwrap();
    let sheet_c = wb.create_sheet(Some("C".to_string())).unwrap();
    sheet_c.set_cell_value(1, 1, CellValue::Boolean(false));

    let temp_file = NamedTempFile::new().unwrap();
    let temp_path = temp_file.path().to_str().unwrap();
    wb.save(temp_path).unwrap();

    let loaded_wb = Workbook::load(temp_path).unwrap();
    assert_eq!(loaded_wb.sheet_names(), vec!["A", "C"]);

    let val = loaded_wb.get_sheet_by_name("C").unwrap().get_cell_value(1, 1);
    assert_eq!(val, Some(&CellValue::Boolean(false)), "Boolean false in sheet C should roundtrip");
}
