use fnv::FnvHashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct Histogram2D {
    pub name: String,
    pub title: String,
    pub bins: Bins,
    pub range: Range,
    pub overflow: u64,
    pub underflow: u64,
    pub entries: u64,
}

impl Histogram2D {
    // Create a new 2D Histogram with specified ranges and number of bins for each axis
    pub fn new(name: &str, bins: (usize, usize), range: ((f64, f64), (f64, f64))) -> Self {
        Self {
            name: name.to_owned(),
            title: String::new(),
            bins: Bins {
                x: bins.0,
                x_width: (range.0.1 - range.0.0) / bins.0 as f64,
                y: bins.1,
                y_width: (range.1.1 - range.1.0) / bins.1 as f64,
                counts: FnvHashMap::default(),
            },
            range: Range {
                x: Value {
                    min: range.0.0,
                    max: range.0.1,
                },
                y: Value {
                    min: range.1.0,
                    max: range.1.1,
                },
            },
            overflow: 0,
            underflow: 0,
            entries: 0,
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_owned();
        self
    }

    /// Empty histogram with the same binning.
    pub fn empty_like(&self, name: &str, title: &str) -> Self {
        Self::new(
            name,
            (self.bins.x, self.bins.y),
            (
                (self.range.x.min, self.range.x.max),
                (self.range.y.min, self.range.y.max),
            ),
        )
        .with_title(title)
    }

    pub fn fill(&mut self, x_value: f64, y_value: f64) {
        self.entries += 1;
        if x_value < self.range.x.min || y_value < self.range.y.min {
            self.underflow += 1;
        } else if x_value >= self.range.x.max || y_value >= self.range.y.max {
            self.overflow += 1;
        } else if let (Some(x_index), Some(y_index)) =
            (self.get_bin_index_x(x_value), self.get_bin_index_y(y_value))
        {
            *self.bins.counts.entry((x_index, y_index)).or_insert(0.0) += 1.0;
        } else {
            // NaN
            self.underflow += 1;
        }
    }

    pub fn n_bins(&self) -> usize {
        self.bins.x * self.bins.y
    }

    pub fn bin_content(&self, x_index: usize, y_index: usize) -> f64 {
        self.bins
            .counts
            .get(&(x_index, y_index))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn set_bin_content(&mut self, x_index: usize, y_index: usize, value: f64) {
        if value == 0.0 {
            self.bins.counts.remove(&(x_index, y_index));
        } else {
            self.bins.counts.insert((x_index, y_index), value);
        }
    }

    // Sum of the in-range bin contents, added in bin order so the result does
    // not depend on how the bins were inserted
    pub fn integral(&self) -> f64 {
        self.sorted_bins().iter().map(|(_, count)| count).sum()
    }

    pub fn sorted_bins(&self) -> Vec<((usize, usize), f64)> {
        let mut bins: Vec<((usize, usize), f64)> =
            self.bins.counts.iter().map(|(&bin, &count)| (bin, count)).collect();
        bins.sort_unstable_by_key(|(bin, _)| *bin);
        bins
    }

    pub fn scale(&mut self, factor: f64) {
        for count in self.bins.counts.values_mut() {
            *count *= factor;
        }
    }

    /// Adds the contents of a histogram with identical binning.
    pub fn add(&mut self, other: &Histogram2D) {
        for (&bin, &count) in &other.bins.counts {
            *self.bins.counts.entry(bin).or_insert(0.0) += count;
        }
        self.overflow += other.overflow;
        self.underflow += other.underflow;
        self.entries += other.entries;
    }

    // get the bin index for a given x value, with the upper edge folded into the last bin
    pub fn get_bin_index_x(&self, x: f64) -> Option<usize> {
        if !(x >= self.range.x.min && x <= self.range.x.max) {
            return None;
        }

        let bin_index: usize = ((x - self.range.x.min) / self.bins.x_width).floor() as usize;

        Some(bin_index.min(self.bins.x - 1))
    }

    // get the bin index for a given y value, with the upper edge folded into the last bin
    pub fn get_bin_index_y(&self, y: f64) -> Option<usize> {
        if !(y >= self.range.y.min && y <= self.range.y.max) {
            return None;
        }

        let bin_index: usize = ((y - self.range.y.min) / self.bins.y_width).floor() as usize;

        Some(bin_index.min(self.bins.y - 1))
    }

    pub fn bin_center_x(&self, x_index: usize) -> f64 {
        self.range.x.min + (x_index as f64 + 0.5) * self.bins.x_width
    }

    pub fn bin_center_y(&self, y_index: usize) -> f64 {
        self.range.y.min + (y_index as f64 + 0.5) * self.bins.y_width
    }

    /// Dense row-major contents, `contents[x][y]`.
    pub fn dense_contents(&self) -> Vec<Vec<f64>> {
        let mut contents = vec![vec![0.0; self.bins.y]; self.bins.x];
        for (&(x_index, y_index), &count) in &self.bins.counts {
            contents[x_index][y_index] = count;
        }
        contents
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bins {
    pub x: usize,
    pub x_width: f64,
    pub y: usize,
    pub y_width: f64,
    pub counts: FnvHashMap<(usize, usize), f64>, // uses a hash map to store the histogram data (zero overhead for empty bins)
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Value {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Range {
    pub x: Value,
    pub y: Value,
}
