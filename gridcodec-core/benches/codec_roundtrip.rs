use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gridcodec_core::{
    BorderLine, BorderSide, CellStyle, CellValue, DataFormat, Font, NegativeStyle, NumberArgs, SolidColor, Workbook,
};

fn build(rows: u32) -> Workbook {
    let mut wb = Workbook::new();
    let ws = wb.create_sheet(Some("Data".to_string())).unwrap();
    let header = Arc::new(CellStyle::new().with_font(Font::new().with_bold(true)).with_background(SolidColor::rgb(0xDD, 0xEB, 0xF7)));
    let amount = DataFormat::Number(NumberArgs::new(2, true).with_negative(NegativeStyle::RedBrackets));

    for (col, title) in ["ID", "Name", "Amount", "Active"].iter().enumerate() {
        ws.set_cell_value(0, col as u32, CellValue::from(*title));
        ws.set_cell_style_arc(0, col as u32, header.clone());
        ws.set_cell_border(0, col as u32, BorderSide::Bottom, Some(BorderLine::medium()));
    }
    for row in 1..=rows {
        ws.set_cell_value(row, 0, CellValue::Number(row as f64));
        ws.set_cell_value(row, 1, CellValue::from(format!("Name_{}", row % 500).as_str()));
        ws.set_cell_value(row, 2, CellValue::Number(row as f64 * 1.25 - 100.0));
        ws.set_cell_format(row, 2, amount.clone());
        ws.set_cell_value(row, 3, CellValue::Boolean(row % 2 == 0));
    }
    wb
}

fn benchmark_save(c: &mut Criterion) {
    let mut group = c.benchmark_group("save");
    group.sample_size(10);

    for size in [1000u32, 10_000].iter() {
        let wb = build(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(wb.save_to_bytes().unwrap()));
        });
    }

    group.finish();
}

fn benchmark_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("load");
    group.sample_size(10);

    for size in [1000u32, 10_000].iter() {
        let bytes = build(*size).save_to_bytes().unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(Workbook::load_from_bytes(&bytes).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_save, benchmark_load);
criterion_main!(benches);
