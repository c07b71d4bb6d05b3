//! Column Classifier: horizontal position -> logical field.
//!
//! Amount bands are tested first because they are narrow and usually sit
//! inside or next to a wide description band. When a center falls in more
//! than one amount band the nearest band center wins; exact ties go to the
//! band declared first.

use tally_core::{ColumnRange, ColumnSchema, Field, PositionedToken};

/// Field of the column holding `token`'s horizontal center.
pub fn classify(token: &PositionedToken, schema: &ColumnSchema) -> Option<Field> {
    classify_x(token.center_x(), schema)
}

pub fn classify_x(x: f64, schema: &ColumnSchema) -> Option<Field> {
    nearest(schema.amount_columns(), x, schema.tolerance)
        .or_else(|| nearest(schema.other_columns(), x, schema.tolerance))
}

fn nearest<'a>(columns: impl Iterator<Item = &'a ColumnRange>, x: f64, tolerance: f64) -> Option<Field> {
    let mut best: Option<(&ColumnRange, f64)> = None;
    for c in columns.filter(|c| c.contains(x, tolerance)) {
        let d = (c.center() - x).abs();
        if best.is_none_or(|(_, bd)| d < bd) {
            best = Some((c, d));
        }
    }
    best.map(|(c, _)| c.field)
}
