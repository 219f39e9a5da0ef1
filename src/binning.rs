use std::error::Error;
use std::fmt::Display;

#[derive(Debug, Clone, PartialEq)]
pub enum BinningError {
    TooFewBoundaries { name: String, len: usize },
    NonFinite { name: String, index: usize },
    NonIncreasing { name: String, index: usize },
}

impl Display for BinningError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinningError::TooFewBoundaries { name, len } => write!(
                f,
                "Bin set '{name}' needs at least two boundaries, found {len}"
            ),
            BinningError::NonFinite { name, index } => {
                write!(f, "Bin set '{name}' has a non-finite boundary at {index}")
            }
            BinningError::NonIncreasing { name, index } => write!(
                f,
                "Bin set '{name}' is not strictly increasing at boundary {index}"
            ),
        }
    }
}

impl Error for BinningError {}

/// Ordered boundaries defining half-open bins `[b_i, b_i+1)`.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct BinSet {
    name: String,
    edges: Vec<f64>,
}

impl BinSet {
    pub fn new(name: &str, edges: Vec<f64>) -> Result<Self, BinningError> {
        if edges.len() < 2 {
            return Err(BinningError::TooFewBoundaries {
                name: name.to_owned(),
                len: edges.len(),
            });
        }

        if let Some(index) = edges.iter().position(|edge| !edge.is_finite()) {
            return Err(BinningError::NonFinite {
                name: name.to_owned(),
                index,
            });
        }

        if let Some(index) = edges.windows(2).position(|pair| pair[1] <= pair[0]) {
            return Err(BinningError::NonIncreasing {
                name: name.to_owned(),
                index: index + 1,
            });
        }

        Ok(Self {
            name: name.to_owned(),
            edges,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    pub fn n_bins(&self) -> usize {
        self.edges.len() - 1
    }

    pub fn lower(&self, index: usize) -> f64 {
        self.edges[index]
    }

    pub fn upper(&self, index: usize) -> f64 {
        self.edges[index + 1]
    }

    /// Index of the bin containing `value`, lower edge inclusive and upper edge
    /// exclusive. Values below the first edge, at or above the last edge, and
    /// NaN have no bin.
    pub fn bin_index(&self, value: f64) -> Option<usize> {
        // number of edges <= value; a value sitting on an edge opens that bin
        let above = self.edges.partition_point(|&edge| edge <= value);
        if above == 0 || above == self.edges.len() {
            None
        } else {
            Some(above - 1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt_bins() -> BinSet {
        BinSet::new("pt", vec![1.0, 2.0, 3.0, 4.0, 8.0]).unwrap()
    }

    // straight scan over the edges; the binary search must agree with it
    fn linear_index(value: f64, edges: &[f64]) -> Option<usize> {
        (0..edges.len() - 1).find(|&i| value >= edges[i] && value < edges[i + 1])
    }

    #[test]
    fn test_bin_index_interior_values() {
        let bins = pt_bins();
        assert_eq!(bins.bin_index(1.5), Some(0));
        assert_eq!(bins.bin_index(3.99), Some(2));
        assert_eq!(bins.bin_index(7.999), Some(3));
    }

    #[test]
    fn test_boundary_value_opens_upper_bin() {
        let bins = pt_bins();
        assert_eq!(bins.bin_index(1.0), Some(0));
        assert_eq!(bins.bin_index(2.0), Some(1));
        assert_eq!(bins.bin_index(4.0), Some(3));
    }

    #[test]
    fn test_out_of_range_values_have_no_bin() {
        let bins = pt_bins();
        assert_eq!(bins.bin_index(0.999), None);
        assert_eq!(bins.bin_index(8.0), None);
        assert_eq!(bins.bin_index(100.0), None);
        assert_eq!(bins.bin_index(f64::NAN), None);
        assert_eq!(bins.bin_index(f64::NEG_INFINITY), None);
    }

    #[test]
    fn test_matches_linear_scan() {
        let edges = vec![0.0, 5.0, 10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 100.0];
        let bins = BinSet::new("mult", edges.clone()).unwrap();
        let mut value = -3.0;
        while value < 105.0 {
            assert_eq!(bins.bin_index(value), linear_index(value, &edges), "{value}");
            value += 0.25;
        }
        for &edge in &edges {
            assert_eq!(bins.bin_index(edge), linear_index(edge, &edges));
        }
    }

    #[test]
    fn test_partition_of_range() {
        let bins = pt_bins();
        let mut counts = vec![0usize; bins.n_bins()];
        let steps = 7000;
        for i in 0..steps {
            let value = 1.0 + 7.0 * i as f64 / steps as f64;
            let index = bins.bin_index(value).unwrap();
            assert!(value >= bins.lower(index) && value < bins.upper(index));
            counts[index] += 1;
        }
        assert_eq!(counts.iter().sum::<usize>(), steps);
    }

    #[test]
    fn test_invalid_boundaries() {
        assert!(matches!(
            BinSet::new("x", vec![1.0]),
            Err(BinningError::TooFewBoundaries { len: 1, .. })
        ));
        assert!(matches!(
            BinSet::new("x", vec![1.0, 2.0, 2.0]),
            Err(BinningError::NonIncreasing { index: 2, .. })
        ));
        assert!(matches!(
            BinSet::new("x", vec![3.0, 1.0]),
            Err(BinningError::NonIncreasing { index: 1, .. })
        ));
        assert!(matches!(
            BinSet::new("x", vec![0.0, f64::INFINITY]),
            Err(BinningError::NonFinite { index: 1, .. })
        ));
    }
}
