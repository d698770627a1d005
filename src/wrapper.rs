use std::fmt;

use crate::docx::{grid_span, is_wml, wml_children};

/// What a wrapper table's sole cell was found to hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WrapperContent {
    Table,
    Image,
}

impl fmt::Display for WrapperContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WrapperContent::Table => f.write_str("table"),
            WrapperContent::Image => f.write_str("image"),
        }
    }
}

/// The only cell of a 1x1 table, or `None` for any other shape. A cell
/// spanning several grid columns counts once per column.
pub(crate) fn sole_cell<'a>(table: roxmltree::Node<'a, 'a>) -> Option<roxmltree::Node<'a, 'a>> {
    let rows = wml_children(table, "tr");
    let [row] = rows.as_slice() else {
        return None;
    };
    let cells = wml_children(*row, "tc");
    let [cell] = cells.as_slice() else {
        return None;
    };
    (grid_span(*cell) == 1).then_some(*cell)
}

/// Decide whether `table` is a single-row, single-cell wrapper around a
/// nested table or an image. Any node that is not a `w:tbl`, or any
/// unexpected shape, is simply not a wrapper.
///
/// Nested tables take precedence over DrawingML images, which take
/// precedence over legacy VML pictures.
pub fn classify(table: roxmltree::Node) -> Option<WrapperContent> {
    if !is_wml(table, "tbl") {
        return None;
    }
    let cell = sole_cell(table)?;
    let contains = |name: &str| cell.descendants().skip(1).any(|n| is_wml(n, name));

    if contains("tbl") {
        Some(WrapperContent::Table)
    } else if contains("drawing") || contains("pict") {
        Some(WrapperContent::Image)
    } else {
        None
    }
}
