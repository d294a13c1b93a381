//! Occupancy and probe-length statistics for both table layouts.
//!
//! For a [`ChainedTable`](crate::ChainedTable) the histogram bins count
//! buckets by chain length; for a [`ProbeTable`](crate::ProbeTable) they
//! count entries by displacement from their home slot. Values at or past the
//! last bin are folded into it.

use alloc::vec;
use alloc::vec::Vec;

/// Number of histogram bins, the last of which collects the tail.
pub const HISTOGRAM_BINS: usize = 17;

/// Utilization statistics for a table.
#[derive(Debug, Clone, PartialEq)]
pub struct DebugStats {
    /// Number of entries stored.
    pub populated: usize,
    /// Number of buckets or slots.
    pub capacity: usize,
    /// Buckets holding at least one entry, or occupied slots.
    pub occupied_slots: usize,
    /// `populated / capacity`.
    pub load_factor: f64,
    /// Longest chain, or largest displacement from a home slot.
    pub longest_probe: usize,
    /// Mean chain length over non-empty buckets, or mean displacement.
    pub mean_probe: f64,
    /// Bytes held by the table's arrays.
    pub total_bytes: usize,
}

impl DebugStats {
    /// Pretty-print the debug statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Hash Table Debug Statistics ===");
        println!(
            "Population: {}/{} ({:.2}% load factor)",
            self.populated,
            self.capacity,
            self.load_factor * 100.0
        );
        println!(
            "Occupied: {}/{} ({:.2}%)",
            self.occupied_slots,
            self.capacity,
            if self.capacity == 0 {
                0.0
            } else {
                self.occupied_slots as f64 / self.capacity as f64 * 100.0
            }
        );
        println!(
            "Probe length: longest {}, mean {:.3}",
            self.longest_probe, self.mean_probe
        );
        println!("Total Allocated: {} bytes", self.total_bytes);
    }
}

/// Histogram of chain lengths or probe distances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeHistogram {
    bins: Vec<usize>,
}

impl Default for ProbeHistogram {
    fn default() -> Self {
        Self {
            bins: vec![0; HISTOGRAM_BINS],
        }
    }
}

impl ProbeHistogram {
    pub(crate) fn record(&mut self, length: usize) {
        let bin = length.min(HISTOGRAM_BINS - 1);
        self.bins[bin] += 1;
    }

    /// Counts per bin; index `HISTOGRAM_BINS - 1` includes everything longer.
    pub fn bins(&self) -> &[usize] {
        &self.bins
    }

    /// Sum of all bins.
    pub fn total(&self) -> usize {
        self.bins.iter().sum()
    }

    /// Prints one row per bin to stdout, each with a bar scaled to the
    /// fullest bin.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        let peak = self.bins.iter().copied().max().unwrap_or(0);
        if peak == 0 {
            println!("probe histogram: empty");
            return;
        }

        println!("probe histogram ({} samples):", self.total());
        for (i, &count) in self.bins.iter().enumerate() {
            let more = if i == HISTOGRAM_BINS - 1 { "+" } else { " " };
            println!("{i:>2}{more} | {} ({count})", bar(count, peak));
        }
    }
}

#[cfg(any(test, feature = "std"))]
/// Widest bar, in character cells.
const BAR_CELLS: usize = 60;

#[cfg(any(test, feature = "std"))]
/// Glyphs for a cell filled to `n` eighths.
const EIGHTHS: [char; 9] = [' ', '▏', '▎', '▍', '▌', '▋', '▊', '▉', '█'];

#[cfg(any(test, feature = "std"))]
/// Renders `count` as a bar of eighth-cell resolution, where `peak` fills
/// [`BAR_CELLS`] cells. Any non-zero count gets at least one eighth.
fn bar(count: usize, peak: usize) -> alloc::string::String {
    let eighths = (count as u128 * (BAR_CELLS * 8) as u128).div_ceil(peak.max(1) as u128) as usize;
    let mut out: alloc::string::String = core::iter::repeat_n(EIGHTHS[8], eighths / 8).collect();
    if eighths % 8 != 0 {
        out.push(EIGHTHS[eighths % 8]);
    }
    out
}
