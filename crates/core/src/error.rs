use thiserror::Error;

/// A raw profile that violates the table invariants. Reported once, at the
/// load boundary; derived-data passes assume valid tables.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProfileError {
    #[error("{table}.{column} has {actual} rows, expected {expected}")]
    ColumnLength {
        table: &'static str,
        column: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("{table}.{column}[{row}] = {index} is out of bounds (len {len})")]
    IndexOutOfBounds {
        table: &'static str,
        column: &'static str,
        row: usize,
        index: usize,
        len: usize,
    },
    #[error("stack {stack} has prefix {prefix}, which is not an earlier stack")]
    StackPrefixNotEarlier { stack: usize, prefix: usize },
    #[error("sample {sample} at {time}ms precedes the previous sample at {previous}ms")]
    SampleTimeDecreasing {
        sample: usize,
        previous: f64,
        time: f64,
    },
    #[error("{table}[{row}] has a non-finite time")]
    NonFiniteTime { table: &'static str, row: usize },
    #[error("samples.weight[{row}] = {weight} is not a finite, non-negative weight")]
    NonFiniteWeight { row: usize, weight: f64 },
    #[error("marker {marker} ends at {end}ms before it starts at {start}ms")]
    MarkerEndBeforeStart { marker: usize, start: f64, end: f64 },
    #[error("thread index {0} is out of range")]
    NoSuchThread(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_row() {
        let err = ProfileError::StackPrefixNotEarlier {
            stack: 3,
            prefix: 7,
        };
        assert_eq!(
            err.to_string(),
            "stack 3 has prefix 7, which is not an earlier stack"
        );

        let err = ProfileError::IndexOutOfBounds {
            table: "frameTable",
            column: "func",
            row: 2,
            index: 9,
            len: 4,
        };
        assert_eq!(
            err.to_string(),
            "frameTable.func[2] = 9 is out of bounds (len 4)"
        );
    }
}
