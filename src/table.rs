//! Table Rendering Module
//!
//! Renders flattened rows as a column-aligned terminal table: cells separated
//! by `|`, a dashed rule under the header row, numeric columns right-aligned.
use crate::columns::ColumnRegistry;
use crate::flatten::Row;
use prettytable::format::{Alignment, FormatBuilder, LinePosition, LineSeparator, TableFormat};
use prettytable::{Cell, Row as TableRow, Table};

fn presto_format() -> TableFormat {
    FormatBuilder::new()
        .column_separator('|')
        .separators(&[LinePosition::Title], LineSeparator::new('-', '+', '+', '+'))
        .padding(1, 1)
        .build()
}

pub fn render_table(registry: &ColumnRegistry<'_>, rows: &[Row]) -> String {
    let mut table = Table::new();
    table.set_format(presto_format());
    table.set_titles(TableRow::new(
        registry.headers().iter().map(|header| Cell::new(header)).collect(),
    ));
    for row in rows {
        let cells = row
            .iter()
            .enumerate()
            .map(|(column, value)| {
                let align = if registry.is_numeric(column) {
                    Alignment::RIGHT
                } else {
                    Alignment::LEFT
                };
                Cell::new_align(value, align)
            })
            .collect();
        table.add_row(TableRow::new(cells));
    }
    table.to_string()
}
