//! Notebook documents.
//!
//! A notebook is a JSON object holding an ordered `cells` array. Only cell `source` fields
//! are ever rewritten; every other field is kept as parsed, in its original key order, so a
//! saved notebook differs from the loaded one only where a source changed. Numbers keep the
//! exact text they were written with.

use crate::constants::{CODE_CELL_TYPE, NOTEBOOK_INDENT};
use crate::{PrepError, PrepResult};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

const CELLS_KEY: &str = "cells";
const CELL_TYPE_KEY: &str = "cell_type";
const SOURCE_KEY: &str = "source";

/// Whether a cell holds executable code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Code,
    Other,
}

/// A parsed notebook document.
#[derive(Debug, Clone, PartialEq)]
pub struct Notebook {
    root: Map<String, Value>,
    trailing_newline: bool,
}

impl Notebook {
    /// Parses a notebook from JSON text.
    ///
    /// # Errors
    ///
    /// - `PrepError::NotebookParse` if the text is not JSON.
    /// - `PrepError::MalformedNotebook` if the root is not an object, `cells` is not an array,
    ///   or a cell is not an object.
    pub fn parse(json: &str) -> PrepResult<Self> {
        let value: Value = serde_json::from_str(json).map_err(PrepError::NotebookParse)?;
        let Value::Object(root) = value else {
            return Err(PrepError::MalformedNotebook(
                "top-level value is not an object".into(),
            ));
        };

        match root.get(CELLS_KEY) {
            None => {}
            Some(Value::Array(cells)) => {
                if let Some(index) = cells.iter().position(|cell| !cell.is_object()) {
                    return Err(PrepError::MalformedNotebook(format!(
                        "cell {} is not an object",
                        index
                    )));
                }
            }
            Some(_) => {
                return Err(PrepError::MalformedNotebook(
                    "'cells' is not an array".into(),
                ))
            }
        }

        Ok(Self {
            root,
            trailing_newline: json.ends_with('\n'),
        })
    }

    /// Reads and parses the notebook at `path`. The file is closed before this returns.
    pub fn load(path: &Path) -> PrepResult<Self> {
        let contents = fs::read_to_string(path).map_err(|source| PrepError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents)
    }

    /// Serialises with one-space indentation and non-ASCII text written verbatim.
    pub fn to_json_string(&self) -> PrepResult<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(NOTEBOOK_INDENT);
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.root
            .serialize(&mut serializer)
            .map_err(PrepError::NotebookSerialise)?;
        if self.trailing_newline {
            buf.push(b'\n');
        }
        String::from_utf8(buf)
            .map_err(|e| PrepError::InvalidInput(format!("serialised notebook is not UTF-8: {}", e)))
    }

    /// Writes the whole notebook to `path`, replacing its contents.
    pub fn save(&self, path: &Path) -> PrepResult<()> {
        let json = self.to_json_string()?;
        fs::write(path, json).map_err(|source| PrepError::FileWrite {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn cell_count(&self) -> usize {
        self.root
            .get(CELLS_KEY)
            .and_then(Value::as_array)
            .map_or(0, Vec::len)
    }

    /// Mutable views of the cells, in document order.
    pub fn cells_mut(&mut self) -> impl Iterator<Item = Cell<'_>> {
        self.root
            .get_mut(CELLS_KEY)
            .and_then(Value::as_array_mut)
            .into_iter()
            .flatten()
            .filter_map(Value::as_object_mut)
            .map(|fields| Cell { fields })
    }

    /// The joined source text of every code cell, in document order.
    pub fn code_sources(&mut self) -> PrepResult<Vec<String>> {
        self.cells_mut()
            .filter(|cell| cell.kind() == CellKind::Code)
            .map(|cell| cell.source_text())
            .collect()
    }
}

/// A mutable view of one notebook cell.
#[derive(Debug)]
pub struct Cell<'a> {
    fields: &'a mut Map<String, Value>,
}

impl Cell<'_> {
    pub fn kind(&self) -> CellKind {
        match self.fields.get(CELL_TYPE_KEY).and_then(Value::as_str) {
            Some(CODE_CELL_TYPE) => CellKind::Code,
            _ => CellKind::Other,
        }
    }

    /// The cell source as one string. A missing `source` reads as empty.
    ///
    /// # Errors
    ///
    /// Returns `PrepError::MalformedNotebook` if `source` is neither a string nor a list of
    /// strings.
    pub fn source_text(&self) -> PrepResult<String> {
        match self.fields.get(SOURCE_KEY) {
            None => Ok(String::new()),
            Some(Value::String(text)) => Ok(text.clone()),
            Some(Value::Array(lines)) => lines
                .iter()
                .map(|line| {
                    line.as_str().ok_or_else(|| {
                        PrepError::MalformedNotebook("cell source line is not a string".into())
                    })
                })
                .collect(),
            Some(_) => Err(PrepError::MalformedNotebook(
                "cell source is neither a string nor a list of lines".into(),
            )),
        }
    }

    /// Replaces the source with `text` split into lines. The field keeps its position.
    pub fn set_source(&mut self, text: &str) {
        let lines = split_source_lines(text)
            .into_iter()
            .map(Value::String)
            .collect();
        self.fields.insert(SOURCE_KEY.to_owned(), Value::Array(lines));
    }
}

/// Splits cell text into lines that keep their terminators (`\n`, `\r\n` or `\r`).
///
/// A final line without a terminator gets `\n` appended. Empty text yields no lines.
pub fn split_source_lines(text: &str) -> Vec<String> {
    let bytes = text.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                lines.push(text[start..=i].to_owned());
                start = i + 1;
            }
            b'\r' => {
                let end = if bytes.get(i + 1) == Some(&b'\n') {
                    i + 1
                } else {
                    i
                };
                lines.push(text[start..=end].to_owned());
                start = end + 1;
                i = end;
            }
            _ => {}
        }
        i += 1;
    }

    if start < text.len() {
        lines.push(format!("{}\n", &text[start..]));
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const NOTEBOOK: &str = r##"{
 "cells": [
  {
   "cell_type": "markdown",
   "metadata": {},
   "source": [
    "# Feature distributions — résumé\n",
    "Data lives in `../Data/`"
   ]
  },
  {
   "cell_type": "code",
   "execution_count": 3,
   "id": "a1b2",
   "metadata": {
    "tags": []
   },
   "outputs": [],
   "source": "import pandas as pd\ndf = pd.read_csv('../Data/features.csv')"
  }
 ],
 "metadata": {
  "kernelspec": {
   "display_name": "Python 3",
   "language": "python",
   "name": "python3"
  }
 },
 "nbformat": 4,
 "nbformat_minor": 5
}
"##;

    #[test]
    fn test_parse_and_serialise_is_byte_identical() {
        let notebook = Notebook::parse(NOTEBOOK).unwrap();
        assert_eq!(notebook.cell_count(), 2);
        assert_eq!(notebook.to_json_string().unwrap(), NOTEBOOK);
    }

    #[test]
    fn test_numbers_keep_their_original_text() {
        let text = r#"{
 "cells": [
  {
   "cell_type": "code",
   "execution_count": 12,
   "metadata": {
    "learning_rate": 1e-05,
    "threshold": 2.50E+3,
    "seed": 18446744073709551617,
    "offset": -0.0
   },
   "outputs": [],
   "source": "df = pd.read_csv('../Data/ecg.csv')"
  }
 ],
 "nbformat": 4
}"#;
        let mut notebook = Notebook::parse(text).unwrap();
        assert_eq!(notebook.to_json_string().unwrap(), text);

        for mut cell in notebook.cells_mut() {
            cell.set_source("df = pd.read_csv('./ecg.csv')");
        }
        let json = notebook.to_json_string().unwrap();
        assert!(json.contains("\"learning_rate\": 1e-05,"));
        assert!(json.contains("\"threshold\": 2.50E+3,"));
        assert!(json.contains("\"seed\": 18446744073709551617,"));
        assert!(json.contains("\"offset\": -0.0\n"));
        assert!(json.contains("\"execution_count\": 12,"));
    }

    #[test]
    fn test_no_trailing_newline_is_preserved() {
        let text = NOTEBOOK.trim_end();
        let notebook = Notebook::parse(text).unwrap();
        assert_eq!(notebook.to_json_string().unwrap(), text);
    }

    #[test]
    fn test_cell_kinds_and_sources() {
        let mut notebook = Notebook::parse(NOTEBOOK).unwrap();
        let kinds: Vec<_> = notebook.cells_mut().map(|c| c.kind()).collect();
        assert_eq!(kinds, vec![CellKind::Other, CellKind::Code]);

        let sources = notebook.code_sources().unwrap();
        assert_eq!(
            sources,
            vec!["import pandas as pd\ndf = pd.read_csv('../Data/features.csv')".to_string()]
        );
    }

    #[test]
    fn test_set_source_keeps_field_order() {
        let mut notebook = Notebook::parse(NOTEBOOK).unwrap();
        for mut cell in notebook.cells_mut() {
            if cell.kind() == CellKind::Code {
                cell.set_source("x = 1\ny = 2");
            }
        }
        let json = notebook.to_json_string().unwrap();
        assert!(json.contains(
            "   \"outputs\": [],\n   \"source\": [\n    \"x = 1\\n\",\n    \"y = 2\\n\"\n   ]\n"
        ));
        let outputs_at = json.find("\"outputs\"").unwrap();
        let source_at = json.find("\"source\": [\n    \"x = 1").unwrap();
        assert!(outputs_at < source_at);
    }

    #[test]
    fn test_missing_cells_means_no_cells() {
        let mut notebook = Notebook::parse(r#"{"nbformat": 4}"#).unwrap();
        assert_eq!(notebook.cell_count(), 0);
        assert!(notebook.code_sources().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_documents() {
        assert!(matches!(
            Notebook::parse("not json"),
            Err(PrepError::NotebookParse(_))
        ));
        assert!(matches!(
            Notebook::parse("[1, 2]"),
            Err(PrepError::MalformedNotebook(_))
        ));
        assert!(matches!(
            Notebook::parse(r#"{"cells": {}}"#),
            Err(PrepError::MalformedNotebook(_))
        ));
        assert!(matches!(
            Notebook::parse(r#"{"cells": ["print(1)"]}"#),
            Err(PrepError::MalformedNotebook(_))
        ));
    }

    #[test]
    fn test_bad_source_type_is_malformed() {
        let mut notebook =
            Notebook::parse(r#"{"cells": [{"cell_type": "code", "source": 42}]}"#).unwrap();
        assert!(matches!(
            notebook.code_sources(),
            Err(PrepError::MalformedNotebook(_))
        ));

        let mut notebook =
            Notebook::parse(r#"{"cells": [{"cell_type": "code", "source": ["a", 1]}]}"#)
                .unwrap();
        assert!(notebook.code_sources().is_err());
    }

    #[test]
    fn test_missing_source_reads_as_empty() {
        let mut notebook = Notebook::parse(r#"{"cells": [{"cell_type": "code"}]}"#).unwrap();
        assert_eq!(notebook.code_sources().unwrap(), vec![String::new()]);
    }

    #[test]
    fn test_split_source_lines() {
        assert_eq!(split_source_lines("a\nb"), vec!["a\n", "b\n"]);
        assert_eq!(split_source_lines("a\nb\n"), vec!["a\n", "b\n"]);
        assert_eq!(split_source_lines("a\r\nb\r\n"), vec!["a\r\n", "b\r\n"]);
        assert_eq!(split_source_lines("a\rb"), vec!["a\r", "b\n"]);
        assert_eq!(split_source_lines("\n\n"), vec!["\n", "\n"]);
        assert!(split_source_lines("").is_empty());
    }

    #[test]
    fn test_load_and_save() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("analysis.ipynb");
        fs::write(&path, NOTEBOOK).unwrap();

        let notebook = Notebook::load(&path).unwrap();
        let copy = temp.path().join("copy.ipynb");
        notebook.save(&copy).unwrap();
        assert_eq!(fs::read_to_string(&copy).unwrap(), NOTEBOOK);
    }

    #[test]
    fn test_load_missing_file() {
        let temp = TempDir::new().unwrap();
        let result = Notebook::load(&temp.path().join("missing.ipynb"));
        assert!(matches!(result, Err(PrepError::FileRead { .. })));
    }
}
