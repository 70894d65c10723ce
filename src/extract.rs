//! HTML table extraction
//!
//! A deliberately small scanner for the tide page markup. It understands
//! just enough HTML to locate the striped table and walk its rows; nested
//! tables are not supported.

use crate::errors::TidePublisherError;

/// Marker class of the table carrying the tide predictions.
pub const TABLE_SELECTOR: &str = "table.table-striped";

/// Extract `(label, value)` cell pairs from the striped table.
///
/// Rows come back in document order, one pair per `<tr>`, taking the first
/// `<th>` as the label and the first `<td>` as the value. A page without a
/// striped table is an error, as is a row missing either cell.
pub fn striped_table_rows(html: &str) -> Result<Vec<(String, String)>, TidePublisherError> {
    let table = striped_table(html)
        .ok_or_else(|| TidePublisherError::TableNotFound(TABLE_SELECTOR.to_string()))?;
    let scope = body_scope(table);

    let mut rows = Vec::new();
    let mut at = 0;
    while let Some((start, end)) = next_tag_block(scope, "tr", at) {
        rows.push(row_cells(&scope[start..end])?);
        at = end;
    }
    Ok(rows)
}

/// First `<table>` whose opening tag carries the `table-striped` class.
fn striped_table(html: &str) -> Option<&str> {
    let mut at = 0;
    while let Some((start, end)) = next_tag_block(html, "table", at) {
        if opening_tag(html, start)
            .to_ascii_lowercase()
            .contains("table-striped")
        {
            return Some(&html[start..end]);
        }
        at = end;
    }
    None
}

/// Narrow a table to the part holding data rows.
///
/// Prefers the `<tbody>` content when the markup has one; otherwise skips
/// past a `<thead>` block so header rows are not mistaken for data.
fn body_scope(table: &str) -> &str {
    if let Some((start, end)) = next_tag_block(table, "tbody", 0) {
        return inner_html(&table[start..end]);
    }
    if let Some((_, end)) = next_tag_block(table, "thead", 0) {
        return &table[end..];
    }
    table
}

fn row_cells(row: &str) -> Result<(String, String), TidePublisherError> {
    let label = next_tag_block(row, "th", 0).map(|(start, end)| cell_text(&row[start..end]));
    let value = next_tag_block(row, "td", 0).map(|(start, end)| cell_text(&row[start..end]));
    match (label, value) {
        (Some(label), Some(value)) => Ok((label, value)),
        _ => Err(TidePublisherError::MalformedRow(normalize_ws(row))),
    }
}

/// Byte range of the next `<name ...>...</name>` block at or after `from`.
///
/// Tag names match case-insensitively. Returns `None` when no further
/// complete block exists.
fn next_tag_block(s: &str, name: &str, from: usize) -> Option<(usize, usize)> {
    let lower = s.to_ascii_lowercase();
    let open_pat = format!("<{}", name);
    let close_pat = format!("</{}", name);

    let mut at = from;
    loop {
        let start = at + lower[at..].find(&open_pat)?;
        // `<th` must not match `<thead`; require the opener to end here.
        match lower[start + open_pat.len()..].chars().next() {
            Some(c) if c == '>' || c == '/' || c.is_ascii_whitespace() => {
                let close_at = start + lower[start..].find(&close_pat)?;
                let end = close_at + lower[close_at..].find('>')? + 1;
                return Some((start, end));
            }
            _ => at = start + open_pat.len(),
        }
    }
}

/// Opening tag starting at `start`, through its closing `>`.
fn opening_tag(s: &str, start: usize) -> &str {
    match s[start..].find('>') {
        Some(i) => &s[start..start + i + 1],
        None => &s[start..],
    }
}

/// Content of a tag block, between the opener and the final closing tag.
fn inner_html(block: &str) -> &str {
    let start = block.find('>').map(|i| i + 1).unwrap_or(0);
    let end = block.rfind("</").unwrap_or(block.len());
    if start <= end {
        &block[start..end]
    } else {
        ""
    }
}

fn cell_text(block: &str) -> String {
    normalize_ws(&decode_entities(&strip_tags(inner_html(block))))
}

fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for c in s.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ").replace("&amp;", "&")
}

/// Collapse runs of whitespace to single spaces and trim both ends.
fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = true;
    for c in s.chars() {
        if c.is_whitespace() {
            if !prev_space {
                out.push(' ');
            }
            prev_space = true;
        } else {
            out.push(c);
            prev_space = false;
        }
    }
    if out.ends_with(' ') {
        out.truncate(out.len() - 1);
    }
    out
}
