use super::histogram1d::Histogram;

impl Histogram {
    pub fn fill(&mut self, value: f64) {
        if value >= self.range.0 && value < self.range.1 {
            let index = ((value - self.range.0) / self.bin_width) as usize;
            if index < self.bins.len() {
                self.bins[index] += 1;
            } else {
                self.overflow += 1;
            }
        } else if value >= self.range.1 {
            self.overflow += 1;
        } else {
            // NaN lands here too
            self.underflow += 1;
        }
    }

    /// Adds the counts of a histogram with identical binning.
    pub fn merge(&mut self, other: &Histogram) {
        for (bin, count) in self.bins.iter_mut().zip(&other.bins) {
            *bin += count;
        }
        self.overflow += other.overflow;
        self.underflow += other.underflow;
    }
}
