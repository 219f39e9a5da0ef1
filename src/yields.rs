use std::collections::BTreeMap;

use super::accumulator::{CorrelationResults, JetCategory};
use super::config::Window;
use super::histoer::Histogram2D;
use super::histoer::store::CorrelationKey;

/// Sum of the bins whose ranges contain or lie between the window limits.
pub fn box_yield(hist: &Histogram2D, window: &Window) -> f64 {
    hist.integral_between(
        -window.max_abs_delta_eta,
        window.max_abs_delta_eta,
        window.delta_phi_min,
        window.delta_phi_max,
    )
}

/// Mean bin content inside the window, zero for a window with no bins.
pub fn box_mean(hist: &Histogram2D, window: &Window) -> f64 {
    let x_bins = bins_spanned(
        hist.get_bin_index_x(-window.max_abs_delta_eta),
        hist.get_bin_index_x(window.max_abs_delta_eta),
        hist.bins.x,
    );
    let y_bins = bins_spanned(
        hist.get_bin_index_y(window.delta_phi_min),
        hist.get_bin_index_y(window.delta_phi_max),
        hist.bins.y,
    );
    let n_bins = x_bins * y_bins;
    if n_bins == 0 {
        return 0.0;
    }
    box_yield(hist, window) / n_bins as f64
}

fn bins_spanned(low: Option<usize>, high: Option<usize>, n_bins: usize) -> usize {
    let low = low.unwrap_or(0);
    let high = high.unwrap_or(n_bins.saturating_sub(1));
    if n_bins == 0 || high < low {
        0
    } else {
        high - low + 1
    }
}

pub fn near_side_yield(hist: &Histogram2D, results: &CorrelationResults) -> f64 {
    box_yield(hist, &results.config.near_side)
}

pub fn away_side_yield(hist: &Histogram2D, results: &CorrelationResults) -> f64 {
    box_yield(hist, &results.config.away_side)
}

/// Share of the near-side yield carried by each jet category for one
/// (trigger, associate, multiplicity) cell, in percent.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct ContributionFractions {
    pub trigger_bin: usize,
    pub associate_bin: usize,
    pub multiplicity_bin: usize,
    pub total_yield: f64,
    pub single: f64,
    pub dijet: f64,
    pub multijet: f64,
}

/// Contribution fractions from the jet-category ratio histograms, for every
/// cell whose summed near-side yield is positive.
pub fn contribution_fractions(results: &CorrelationResults) -> Vec<ContributionFractions> {
    let mut cells: Vec<CorrelationKey> = results
        .ratios
        .iter()
        .filter(|(key, _)| key.jet_category.is_some())
        .map(|(key, _)| key.inclusive())
        .collect();
    cells.dedup();

    cells
        .into_iter()
        .filter_map(|cell| {
            let [single, dijet, multijet] = JetCategory::ALL.map(|category| {
                results
                    .ratio(&cell.with_category(category))
                    .map_or(0.0, |hist| near_side_yield(hist, results))
            });
            let total_yield = single + dijet + multijet;
            if total_yield <= 0.0 {
                return None;
            }
            Some(ContributionFractions {
                trigger_bin: cell.trigger_bin,
                associate_bin: cell.associate_bin,
                multiplicity_bin: cell.multiplicity_bin,
                total_yield,
                single: 100.0 * single / total_yield,
                dijet: 100.0 * dijet / total_yield,
                multijet: 100.0 * multijet / total_yield,
            })
        })
        .collect()
}

/// Jet-category ratio of one (trigger, associate) cell summed over every
/// multiplicity bin, with its near-side yield and away-side pedestal.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct MergedQuantification {
    pub jet_category: JetCategory,
    pub trigger_bin: usize,
    pub associate_bin: usize,
    pub multiplicity_bins: usize,
    pub near_side_yield: f64,
    /// Mean ratio inside the away-side window.
    pub background: f64,
    /// Percent of the cell's near-side yield summed over categories.
    pub fraction: f64,
}

/// Sums the jet-category ratio histograms over multiplicity bins and
/// quantifies each merged histogram, ordered by (trigger, associate, category).
pub fn multiplicity_integrated(results: &CorrelationResults) -> Vec<MergedQuantification> {
    let mut merged: BTreeMap<(usize, usize, JetCategory), (Histogram2D, usize)> = BTreeMap::new();
    for (key, ratio) in &results.ratios {
        let Some(category) = key.jet_category else {
            continue;
        };
        merged
            .entry((key.trigger_bin, key.associate_bin, category))
            .and_modify(|(hist, count)| {
                hist.add(ratio);
                *count += 1;
            })
            .or_insert_with(|| {
                let name = format!(
                    "hRatio_{}_trig{}_assoc{}_merged",
                    category.name(),
                    key.trigger_bin,
                    key.associate_bin
                );
                let mut hist = ratio.empty_like(&name, &ratio.title);
                hist.add(ratio);
                (hist, 1)
            });
    }

    let mut totals: BTreeMap<(usize, usize), f64> = BTreeMap::new();
    let mut quantified: Vec<MergedQuantification> = merged
        .iter()
        .map(|(&(trigger_bin, associate_bin, jet_category), (hist, count))| {
            let near_side_yield = near_side_yield(hist, results);
            *totals.entry((trigger_bin, associate_bin)).or_insert(0.0) += near_side_yield;
            MergedQuantification {
                jet_category,
                trigger_bin,
                associate_bin,
                multiplicity_bins: *count,
                near_side_yield,
                background: box_mean(hist, &results.config.away_side),
                fraction: 0.0,
            }
        })
        .collect();

    for quantification in &mut quantified {
        let total = totals
            .get(&(quantification.trigger_bin, quantification.associate_bin))
            .copied()
            .unwrap_or(0.0);
        if total > 0.0 {
            quantification.fraction = 100.0 * quantification.near_side_yield / total;
        }
    }
    quantified
}
