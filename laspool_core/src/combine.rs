//! Reduction strategies turning the ordered per-tile results into one
//! aggregate.
//!
//! Strategies are chosen at configuration time, so there is no unknown-name
//! failure class at run time. Every strategy accepts an empty input and
//! produces its neutral output.

use anyhow::Result;

/// A reduction applied to the ordered collection of per-tile results.
///
/// The input vector has one element per tile, in tile order; order-sensitive
/// strategies must preserve it.
pub trait Combine<R>: Send + Sync {
	/// The aggregate handed back to the caller.
	type Output;

	fn combine(&self, results: Vec<R>) -> Result<Self::Output>;
}

/// Concatenates per-tile results in tile order (the default strategy).
#[derive(Debug, Default, Clone, Copy)]
pub struct Concat;

impl<R: Send> Combine<R> for Concat {
	type Output = Vec<R>;

	fn combine(&self, results: Vec<R>) -> Result<Vec<R>> {
		Ok(results)
	}
}

/// Flattens row-like per-tile results into one table, tile order preserved.
///
/// Use this when the task returns a batch of rows per tile and the caller
/// wants a single flat collection instead of one batch per tile.
#[derive(Debug, Default, Clone, Copy)]
pub struct Flatten;

impl<T: Send> Combine<Vec<T>> for Flatten {
	type Output = Vec<T>;

	fn combine(&self, results: Vec<Vec<T>>) -> Result<Vec<T>> {
		Ok(results.into_iter().flatten().collect())
	}
}

/// Applies a caller-nominated reduction closure.
///
/// ```
/// use laspool_core::{Combine, CombineWith};
///
/// let sum = CombineWith(|values: Vec<u64>| Ok(values.iter().sum::<u64>()));
/// assert_eq!(sum.combine(vec![1, 2, 3]).unwrap(), 6);
/// ```
pub struct CombineWith<F>(pub F);

impl<R, A, F> Combine<R> for CombineWith<F>
where
	F: Fn(Vec<R>) -> Result<A> + Send + Sync,
{
	type Output = A;

	fn combine(&self, results: Vec<R>) -> Result<A> {
		(self.0)(results)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use anyhow::bail;

	#[test]
	fn test_concat_preserves_order() {
		let combined = Concat.combine(vec![3, 1, 2]).unwrap();
		assert_eq!(combined, vec![3, 1, 2]);
	}

	#[test]
	fn test_concat_neutral_element_is_empty() {
		let combined: Vec<u32> = Concat.combine(Vec::new()).unwrap();
		assert!(combined.is_empty());
	}

	#[test]
	fn test_flatten_concatenates_rows_in_tile_order() {
		let combined = Flatten.combine(vec![vec![1, 2], vec![], vec![3]]).unwrap();
		assert_eq!(combined, vec![1, 2, 3]);
	}

	#[test]
	fn test_flatten_neutral_element_is_empty() {
		let combined: Vec<u8> = Flatten.combine(Vec::new()).unwrap();
		assert!(combined.is_empty());
	}

	#[test]
	fn test_combine_with_custom_reduction() {
		let maximum = CombineWith(|values: Vec<i32>| Ok(values.into_iter().max()));
		assert_eq!(maximum.combine(vec![4, 9, 2]).unwrap(), Some(9));
		assert_eq!(maximum.combine(Vec::new()).unwrap(), None);
	}

	#[test]
	fn test_combine_with_propagates_errors() {
		let strict = CombineWith(|values: Vec<i32>| {
			if values.is_empty() {
				bail!("nothing to combine");
			}
			Ok(values)
		});
		assert!(strict.combine(Vec::new()).is_err());
	}
}
