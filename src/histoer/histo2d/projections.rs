use super::histogram2d::Histogram2D;

impl Histogram2D {
    pub fn y_projection(&self, x_min: f64, x_max: f64) -> Vec<f64> {
        // Extract the y-projection data
        let mut y_bins = vec![0.0; self.bins.y];

        for ((x_index, y_index), count) in self.sorted_bins() {
            let x_center = self.bin_center_x(x_index);
            if x_center >= x_min && x_center < x_max && y_index < y_bins.len() {
                y_bins[y_index] += count;
            }
        }

        y_bins
    }

    pub fn x_projection(&self, y_min: f64, y_max: f64) -> Vec<f64> {
        // Extract the x-projection data
        let mut x_bins = vec![0.0; self.bins.x];

        for ((x_index, y_index), count) in self.sorted_bins() {
            let y_center = self.bin_center_y(y_index);
            if y_center >= y_min && y_center < y_max && x_index < x_bins.len() {
                x_bins[x_index] += count;
            }
        }

        x_bins
    }
}
