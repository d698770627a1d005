mod package;

pub use package::Package;

use crate::error::Error;

pub(crate) const WML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

pub(crate) fn is_wml(node: roxmltree::Node, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name && node.tag_name().namespace() == Some(WML_NS)
}

pub(crate) fn wml<'a>(node: roxmltree::Node<'a, 'a>, name: &str) -> Option<roxmltree::Node<'a, 'a>> {
    node.children().find(|n| is_wml(*n, name))
}

pub(crate) fn wml_attr<'a>(node: roxmltree::Node<'a, 'a>, child: &str) -> Option<&'a str> {
    wml(node, child).and_then(|n| n.attribute((WML_NS, "val")))
}

/// Direct `name` children of `parent`. Content controls are not looked
/// through: a row or cell inside `w:sdt` is not part of the table grid.
pub(crate) fn wml_children<'a>(
    parent: roxmltree::Node<'a, 'a>,
    name: &str,
) -> Vec<roxmltree::Node<'a, 'a>> {
    parent.children().filter(|n| is_wml(*n, name)).collect()
}

/// Number of grid columns a `w:tc` occupies.
pub(crate) fn grid_span(cell: roxmltree::Node) -> usize {
    wml(cell, "tcPr")
        .and_then(|pr| wml_attr(pr, "gridSpan"))
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|&span| span > 0)
        .unwrap_or(1)
}

/// Tables that sit directly in `w:body`, in document order.
pub(crate) fn body_tables<'a>(
    doc: &'a roxmltree::Document,
) -> Result<Vec<roxmltree::Node<'a, 'a>>, Error> {
    let body = wml(doc.root_element(), "body")
        .ok_or_else(|| Error::InvalidDocx("missing w:body".into()))?;
    Ok(wml_children(body, "tbl"))
}
