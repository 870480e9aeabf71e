use crate::convert::{may_need_conversion, ConversionOracle};

/// Column -> new value for one row, in configured column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangedSet {
    entries: Vec<(String, String)>,
}

impl ChangedSet {
    pub fn insert(&mut self, column: String, value: String) {
        match self.entries.iter_mut().find(|(existing, _)| *existing == column) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == column)
            .map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(column, value)| (column.as_str(), value.as_str()))
    }
}

#[derive(Debug, Default)]
pub struct RowTransform {
    pub changed: ChangedSet,
    pub conversion_errors: usize,
}

/// Runs every (column, stored value) pair through the oracle.
///
/// NULL, empty, ASCII-only and Han-free values never reach the oracle. An
/// oracle error drops only that column.
pub fn transform_row<'a>(
    oracle: &dyn ConversionOracle,
    variant: &str,
    cells: impl IntoIterator<Item = (&'a str, Option<&'a str>)>,
    label: &str,
) -> RowTransform {
    let mut result = RowTransform::default();

    for (column, value) in cells {
        let Some(text) = value.filter(|text| !text.is_empty()) else {
            continue;
        };
        if !may_need_conversion(text) {
            continue;
        }

        match oracle.convert(variant, text) {
            Ok(conversion) if conversion.changed && conversion.text != text => {
                result.changed.insert(column.to_string(), conversion.text);
            }
            Ok(_) => {}
            Err(error) => {
                log::warn!("[{}] convert err on column {}: {}", label, column, error);
                result.conversion_errors += 1;
            }
        }
    }

    result
}
