use crate::{error::BatchError, records::record::Record};

/// Maximum number of items a single bulk-write call accepts on the stores we
/// target.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 25;

/// One bulk-write request worth of records, borrowed from the page it came
/// from. Never empty and never larger than the size it was split with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WriteBatch<'a> {
    index: usize,
    records: &'a [Record],
}

impl<'a> WriteBatch<'a> {
    /// Position of this batch within its page, starting at 0.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn records(&self) -> &'a [Record] {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Splits `records` into consecutive batches of at most `max_size` items.
///
/// Concatenating the returned batches yields `records` in the original order.
/// An empty input yields no batches.
pub fn split(records: &[Record], max_size: usize) -> Result<Vec<WriteBatch<'_>>, BatchError> {
    if max_size == 0 {
        return Err(BatchError::InvalidBatchSize(max_size));
    }

    Ok(records
        .chunks(max_size)
        .enumerate()
        .map(|(index, records)| WriteBatch { index, records })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(n: usize) -> Vec<Record> {
        (0..n).map(|i| Record::new().with("id", i)).collect()
    }

    #[test]
    fn sizes_follow_ceil_division() {
        for (len, max) in [(0, 1), (1, 1), (7, 3), (9, 3), (120, 25), (80, 25), (25, 25), (3, 100)] {
            let input = records(len);
            let batches = split(&input, max).unwrap();

            assert_eq!(batches.len(), len.div_ceil(max), "len={len} max={max}");
            for (i, batch) in batches.iter().enumerate() {
                assert_eq!(batch.index(), i);
                assert!(!batch.is_empty());
                if i + 1 < batches.len() {
                    assert_eq!(batch.len(), max);
                }
            }
            if let Some(last) = batches.last() {
                let expected = if len % max == 0 { max } else { len % max };
                assert_eq!(last.len(), expected);
            }

            let rebuilt: Vec<Record> = batches
                .iter()
                .flat_map(|b| b.records().iter().cloned())
                .collect();
            assert_eq!(rebuilt, input);
        }
    }

    #[test]
    fn page_of_120_gives_five_batches() {
        let input = records(120);
        let sizes: Vec<usize> = split(&input, DEFAULT_MAX_BATCH_SIZE)
            .unwrap()
            .iter()
            .map(WriteBatch::len)
            .collect();
        assert_eq!(sizes, vec![25, 25, 25, 25, 20]);
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let input = records(3);
        assert_eq!(split(&input, 0), Err(BatchError::InvalidBatchSize(0)));
    }

    #[test]
    fn empty_input_yields_no_batches() {
        assert!(split(&[], 25).unwrap().is_empty());
    }
}
