use super::histogram2d::Histogram2D;

impl Histogram2D {
    /// Bin-by-bin `self / denominator`, zero wherever the denominator is empty.
    /// The result is scaled so its integral equals the number of bins, which
    /// puts the mean bin value at 1. Both histograms must share a binning.
    pub fn normalized_ratio(&self, denominator: &Histogram2D, name: &str, title: &str) -> Self {
        let mut ratio = self.empty_like(name, title);

        for ((x_index, y_index), numerator) in self.sorted_bins() {
            let divisor = denominator.bin_content(x_index, y_index);
            if divisor > 0.0 {
                ratio.set_bin_content(x_index, y_index, numerator / divisor);
            }
        }

        let integral = ratio.integral();
        if integral > 0.0 {
            ratio.scale(ratio.n_bins() as f64 / integral);
        }
        ratio.entries = self.entries;

        ratio
    }
}
