//! A row is an unordered column-name → cell mapping, live for one pipeline invocation
//! for one primary item instance (§3).

use semabi_codec::Cell;
use std::collections::HashMap;

pub type Row = HashMap<String, Cell>;

pub fn get_cell<'a>(row: &'a Row, name: &str) -> Option<&'a Cell> {
    row.get(name)
}
