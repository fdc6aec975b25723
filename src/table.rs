//! Parser for the column-aligned tables printed by `kubectl`.
//!
//! The tables carry no delimiters. Column boundaries are taken from the header:
//! every header token starts a column that ends where the next one starts, the
//! first column starts at the beginning of the line and the last one runs to
//! its end. A data line whose text crosses a column start is rejected.

use std::sync::LazyLock;

use regex::Regex;

static HEADER_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S+").expect("header token pattern is valid"));

/// Errors raised while reading a column-aligned table.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// The input had no non-blank line to use as a header.
    #[error("table has no header line")]
    MissingHeader,

    /// The header has fewer columns than the reader needs.
    #[error("table header has {found} columns, expected at least {expected}")]
    TooFewColumns { expected: usize, found: usize },

    /// A value on data line `line` (1-based) runs across the start of `column`.
    #[error("line {line} does not line up with column {column}")]
    Misaligned { line: usize, column: String },
}

/// Column start offsets, counted in characters, inferred from a header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    starts: Vec<usize>,
}

impl ColumnLayout {
    /// Infer the layout from `header`.
    pub fn from_header(header: &str) -> Self {
        let mut starts: Vec<usize> = HEADER_TOKEN
            .find_iter(header)
            .map(|token| header[..token.start()].chars().count())
            .collect();
        if let Some(first) = starts.first_mut() {
            *first = 0;
        }
        Self { starts }
    }

    /// Index of the first column whose start falls inside a value of `line`.
    pub fn misaligned_column(&self, line: &str) -> Option<usize> {
        let chars: Vec<char> = line.chars().collect();
        self.starts
            .iter()
            .enumerate()
            .skip(1)
            .find_map(|(column, &start)| {
                let before = chars.get(start.checked_sub(1)?)?;
                let at = chars.get(start)?;
                (!before.is_whitespace() && !at.is_whitespace()).then_some(column)
            })
    }

    /// Slice `line` into one trimmed field per column.
    ///
    /// The result always has one entry per header column; columns the line
    /// does not reach are empty strings.
    pub fn split<'a>(&self, line: &'a str) -> Vec<&'a str> {
        self.starts
            .iter()
            .enumerate()
            .map(|(i, &start)| {
                let end = self.starts.get(i + 1).copied();
                char_slice(line, start, end).trim()
            })
            .collect()
    }
}

/// A parsed table: header names and rows of fixed arity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Index of the header column named `name`, compared case-insensitively.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.header
            .iter()
            .position(|column| column.eq_ignore_ascii_case(name))
    }
}

/// Parse `text` into a [`Table`].
///
/// Blank lines are skipped. The first remaining line is the header. Fails with
/// [`TableError::Misaligned`] as soon as a data line does not fit the header.
pub fn parse_table(text: &str) -> Result<Table, TableError> {
    let mut lines = text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty());
    let (_, header_line) = lines.next().ok_or(TableError::MissingHeader)?;

    let layout = ColumnLayout::from_header(header_line);
    let header: Vec<String> = layout
        .split(header_line)
        .into_iter()
        .map(String::from)
        .collect();
    let rows = lines
        .map(|(index, line)| match layout.misaligned_column(line) {
            Some(column) => Err(TableError::Misaligned {
                line: index + 1,
                column: header[column].clone(),
            }),
            None => Ok(layout.split(line).into_iter().map(String::from).collect()),
        })
        .collect::<Result<_, _>>()?;

    Ok(Table { header, rows })
}

/// Byte offset of the `chars`-th character of `s`, or `s.len()` past the end.
fn offset_bytes(s: &str, chars: usize) -> usize {
    s.char_indices()
        .nth(chars)
        .map(|(byte, _)| byte)
        .unwrap_or(s.len())
}

/// Slice `s` between character offsets; an open `end` runs to the end of `s`.
fn char_slice(s: &str, start: usize, end: Option<usize>) -> &str {
    let from = offset_bytes(s, start);
    let to = match end {
        Some(end) => offset_bytes(s, end),
        None => s.len(),
    };
    if from >= to { "" } else { &s[from..to] }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slices_columns_from_header_widths() {
        let header = "NAME       SHORTNAMES   GROUP      ";
        let layout = ColumnLayout::from_header(header);

        let line = format!("{:<11}{:<13}{:<11}", "pods", "po", "");
        assert_eq!(line.len(), header.len());
        assert_eq!(layout.split(&line), vec!["pods", "po", ""]);

        let line = format!("{:<11}{:<13}{:<11}", "deployments", "deploy", "apps");
        assert_eq!(layout.split(&line), vec!["deployments", "deploy", "apps"]);
    }

    #[test]
    fn last_column_runs_to_end_of_line() {
        let layout = ColumnLayout::from_header("NAME   KIND");
        assert_eq!(
            layout.split("hpa    HorizontalPodAutoscaler"),
            vec!["hpa", "HorizontalPodAutoscaler"]
        );
    }

    #[test]
    fn short_lines_yield_empty_fields() {
        let layout = ColumnLayout::from_header("NAME   SHORTNAMES   KIND");
        assert_eq!(layout.split("pods"), vec!["pods", "", ""]);
        assert_eq!(layout.split(""), vec!["", "", ""]);
    }

    #[test]
    fn offsets_count_characters() {
        let layout = ColumnLayout::from_header("NAME   KIND");
        assert_eq!(layout.split("größe  Thing"), vec!["größe", "Thing"]);
    }

    #[test]
    fn indented_header_keeps_offsets() {
        let layout = ColumnLayout::from_header("  NAME  KIND");
        assert_eq!(layout.split("  pods  Pod"), vec!["pods", "Pod"]);
    }

    #[test]
    fn first_column_starts_at_line_start() {
        let layout = ColumnLayout::from_header("  NAME  KIND");
        assert_eq!(layout.split("pods    Pod"), vec!["pods", "Pod"]);
    }

    #[test]
    fn value_crossing_a_column_start_is_misaligned() {
        let layout = ColumnLayout::from_header("NAME   SHORTNAMES   KIND");
        assert_eq!(layout.misaligned_column("pods   po           Pod"), None);
        assert_eq!(layout.misaligned_column("services   svc     Service"), Some(1));
        assert_eq!(layout.misaligned_column("pods   po   x        Pod"), None);
        assert_eq!(layout.misaligned_column("pods   po           PodLongerKind"), None);
    }

    #[test]
    fn misaligned_row_fails_the_whole_table() {
        let text = "\
NAME   SHORTNAMES   APIVERSION   NAMESPACED   KIND
customresourcedefinitions   crd,crds   apiextensions.k8s.io/v1   false   CustomResourceDefinition
";
        assert_eq!(
            parse_table(text),
            Err(TableError::Misaligned {
                line: 2,
                column: "SHORTNAMES".to_string()
            })
        );
    }

    #[test]
    fn misaligned_line_number_counts_blank_lines() {
        let text = "NAME   KIND\n\npods   Pod\nservices Service\n";
        assert_eq!(
            parse_table(text),
            Err(TableError::Misaligned {
                line: 4,
                column: "KIND".to_string()
            })
        );
    }

    #[test]
    fn parses_kubectl_output() {
        let text = "\
NAME          SHORTNAMES   APIVERSION   NAMESPACED   KIND
bindings                   v1           true         Binding
pods          po           v1           true         Pod
deployments   deploy       apps/v1      true         Deployment
";
        let table = parse_table(text).unwrap();
        assert_eq!(
            table.header,
            vec!["NAME", "SHORTNAMES", "APIVERSION", "NAMESPACED", "KIND"]
        );
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[0], vec!["bindings", "", "v1", "true", "Binding"]);
        assert_eq!(
            table.rows[2],
            vec!["deployments", "deploy", "apps/v1", "true", "Deployment"]
        );
        assert_eq!(table.column("apiversion"), Some(2));
        assert_eq!(table.column("APIGROUP"), None);
    }

    #[test]
    fn header_only_has_no_rows() {
        let table = parse_table("NAME   KIND\n").unwrap();
        assert_eq!(table.header, vec!["NAME", "KIND"]);
        assert!(table.rows.is_empty());
    }

    #[test]
    fn missing_header_is_an_error() {
        assert_eq!(parse_table(""), Err(TableError::MissingHeader));
        assert_eq!(parse_table("\n  \n"), Err(TableError::MissingHeader));
    }
}
