use super::histogram2d::Histogram2D;

impl Histogram2D {
    /// Index span of the bins touched by `[start, end]` on each axis. Limits
    /// outside the axis fall back to the first or last bin.
    fn index_window(
        &self,
        start_x: f64,
        end_x: f64,
        start_y: f64,
        end_y: f64,
    ) -> ((usize, usize), (usize, usize)) {
        let start_x_index = self.get_bin_index_x(start_x).unwrap_or(0);
        let end_x_index = self
            .get_bin_index_x(end_x)
            .unwrap_or(self.bins.x.saturating_sub(1));
        let start_y_index = self.get_bin_index_y(start_y).unwrap_or(0);
        let end_y_index = self
            .get_bin_index_y(end_y)
            .unwrap_or(self.bins.y.saturating_sub(1));
        (
            (start_x_index, end_x_index),
            (start_y_index, end_y_index),
        )
    }

    /// Sum of bin contents for every bin containing or lying between the given
    /// limits (both ends inclusive).
    pub fn integral_between(&self, start_x: f64, end_x: f64, start_y: f64, end_y: f64) -> f64 {
        let ((x_lo, x_hi), (y_lo, y_hi)) = self.index_window(start_x, end_x, start_y, end_y);
        self.sorted_bins()
            .into_iter()
            .filter(|&((x, y), _)| x >= x_lo && x <= x_hi && y >= y_lo && y <= y_hi)
            .map(|(_, count)| count)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integral_between_is_inclusive() {
        let mut hist = Histogram2D::new("h", (10, 10), ((0.0, 10.0), (0.0, 10.0)));
        hist.fill(1.5, 1.5);
        hist.fill(2.5, 2.5);
        hist.fill(8.5, 8.5);
        // 2.0 sits in bin 2, so the bin holding 2.5 is included
        assert_eq!(hist.integral_between(1.2, 2.0, 1.2, 2.0), 2.0);
        assert_eq!(hist.integral_between(-50.0, 50.0, -50.0, 50.0), 3.0);
        assert_eq!(hist.integral_between(3.0, 7.9, 0.0, 10.0), 0.0);
    }
}
