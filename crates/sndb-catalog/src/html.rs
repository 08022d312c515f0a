//! Minimal HTML table extraction for catalog pages.
//!
//! Rows and cells are split at their opening tags, so pages that omit
//! `</tr>` or `</td>` still separate correctly.

use std::sync::LazyLock;

use regex::Regex;

static TABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<table[^>]*>(.*?)</table>").expect("table regex is valid"));
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag regex is valid"));
static ROW_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<tr[\s>]").expect("row regex is valid"));
static CELL_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<t[dh][\s>]").expect("cell regex is valid"));

/// One table: rows of cell texts.
pub type Table = Vec<Vec<String>>;

/// All tables in `page`, in document order, with cell markup removed.
pub fn tables(page: &str) -> Vec<Table> {
    TABLE
        .captures_iter(page)
        .map(|table| rows(&table[1]))
        .collect()
}

fn rows(table: &str) -> Table {
    split_before(table, &ROW_START)
        .into_iter()
        .map(|row| {
            split_before(row, &CELL_START)
                .into_iter()
                .map(cell_text)
                .collect::<Vec<_>>()
        })
        .filter(|cells| !cells.is_empty())
        .collect()
}

/// Split `text` before each match of `start`. Text before the first match
/// is dropped. `<thead>` and `<tbody>` never match a cell or row start.
fn split_before<'a>(text: &'a str, start: &Regex) -> Vec<&'a str> {
    let starts: Vec<usize> = start.find_iter(text).map(|m| m.start()).collect();
    starts
        .iter()
        .enumerate()
        .map(|(n, &at)| {
            let end = starts.get(n + 1).copied().unwrap_or(text.len());
            &text[at..end]
        })
        .collect()
}

/// Strip tags, decode common entities, and collapse whitespace.
pub fn cell_text(cell: &str) -> String {
    let stripped = TAG.replace_all(cell, " ");
    let decoded = stripped
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn extracts_cells_in_order() {
        let page = "<html><table><tr><th>Name</th><th>Host</th></tr>\
            <tr><td><a href=\"x\">SN 2020abc</a></td><td>M87&nbsp;</td></tr></table>\
            <TABLE><TR><TD>1<TD>2</TABLE></html>";
        let tables = tables(page);
        assert_eq!(tables.len(), 2);
        assert_eq!(
            tables[0],
            vec![
                vec!["Name".to_string(), "Host".to_string()],
                vec!["SN 2020abc".to_string(), "M87".to_string()],
            ]
        );
        assert_eq!(tables[1], vec![vec!["1".to_string(), "2".to_string()]]);
    }

    #[test]
    fn thead_and_tbody_wrappers_add_no_cells() {
        let page = "<table><thead><tr><th>SN</th><th class=\"h\">Host</th></tr></thead>\
            <tbody><tr><td>SN 2020abc</td><td>M87</td></tr></tbody></table>";
        let tables = tables(page);
        assert_eq!(
            tables[0],
            vec![
                vec!["SN".to_string(), "Host".to_string()],
                vec!["SN 2020abc".to_string(), "M87".to_string()],
            ]
        );
    }

    #[test]
    fn cell_text_decodes_entities() {
        assert_eq!(cell_text(" <b>A&amp;B</b>\n  C "), "A&B C");
    }
}
