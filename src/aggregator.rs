//! Result aggregation: restore batch order from unordered completions

use crate::error::{Error, Result};
use crate::types::{Outcome, ResultSet};

/// Assemble indexed outcomes into a [`ResultSet`] of length `len`
///
/// Outcomes may arrive in any order. Each index in `0..len` must appear exactly once.
///
/// # Errors
///
/// Returns [`Error::Aggregation`] if an index is out of range, appears twice, or is
/// missing. Any of these means the dispatcher lost track of a query.
pub fn assemble<I>(len: usize, outcomes: I) -> Result<ResultSet>
where
    I: IntoIterator<Item = (usize, Outcome)>,
{
    let mut slots: Vec<Option<Outcome>> = Vec::with_capacity(len);
    slots.resize_with(len, || None);

    for (index, outcome) in outcomes {
        let slot = slots.get_mut(index).ok_or_else(|| {
            Error::Aggregation(format!(
                "outcome index {index} is out of range for a batch of {len}"
            ))
        })?;
        if slot.replace(outcome).is_some() {
            return Err(Error::Aggregation(format!(
                "received more than one outcome for index {index}"
            )));
        }
    }

    let ordered = slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| {
            slot.ok_or_else(|| Error::Aggregation(format!("no outcome for index {index}")))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ResultSet::from_ordered(ordered))
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureReason;
    use serde_json::json;

    #[test]
    fn restores_index_order() {
        let outcomes = vec![
            (2, Outcome::Success(json!("c"))),
            (0, Outcome::Success(json!("a"))),
            (1, Outcome::Failure(FailureReason::Timeout)),
        ];

        let set = assemble(3, outcomes).unwrap();
        assert_eq!(
            set.into_vec(),
            vec![
                Outcome::Success(json!("a")),
                Outcome::Failure(FailureReason::Timeout),
                Outcome::Success(json!("c")),
            ]
        );
    }

    #[test]
    fn empty_input_gives_empty_set() {
        let set = assemble(0, Vec::new()).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn missing_index_is_an_error() {
        let err = assemble(2, vec![(0, Outcome::Success(json!(null)))]).unwrap_err();
        assert!(matches!(err, Error::Aggregation(ref m) if m.contains("index 1")));
    }

    #[test]
    fn duplicate_index_is_an_error() {
        let err = assemble(
            2,
            vec![
                (0, Outcome::Success(json!(1))),
                (0, Outcome::Success(json!(2))),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, Error::Aggregation(ref m) if m.contains("more than one")));
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let err = assemble(1, vec![(5, Outcome::Success(json!(1)))]).unwrap_err();
        assert!(matches!(err, Error::Aggregation(ref m) if m.contains("out of range")));
    }

    #[test]
    fn large_reversed_input_keeps_positions() {
        let n = 1000;
        let outcomes = (0..n).rev().map(|i| (i, Outcome::Success(json!(i))));

        let set = assemble(n, outcomes).unwrap();
        assert_eq!(set.len(), n);
        for (i, outcome) in set.iter().enumerate() {
            assert_eq!(outcome.payload(), Some(&json!(i)));
        }
    }
}
