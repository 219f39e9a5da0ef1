#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Histogram {
    pub name: String,
    pub title: String,
    pub bins: Vec<u64>,
    pub range: (f64, f64),
    pub overflow: u64,
    pub underflow: u64,
    pub bin_width: f64,
}

impl Histogram {
    // Create a new Histogram with specified min, max, and number of bins
    pub fn new(name: &str, title: &str, number_of_bins: usize, range: (f64, f64)) -> Self {
        Histogram {
            name: name.to_owned(),
            title: title.to_owned(),
            bins: vec![0; number_of_bins],
            range,
            overflow: 0,
            underflow: 0,
            bin_width: (range.1 - range.0) / number_of_bins as f64,
        }
    }

    // In-range fills only
    pub fn integral(&self) -> u64 {
        self.bins.iter().sum()
    }

    pub fn entries(&self) -> u64 {
        self.integral() + self.overflow + self.underflow
    }
}
