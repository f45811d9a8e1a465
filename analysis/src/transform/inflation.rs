//! CPI-based inflation ratios.
//!
//! Monthly CPI observations are averaged per calendar year, then every yearly
//! average is divided by the base year's average.

use chrono::Datelike;
use std::collections::BTreeMap;

use crate::cpi::CpiObservation;
use crate::error::{InflationError, InflationResult};
use crate::models::InflationRatio;

/// Average the monthly observations per calendar year.
pub fn yearly_averages(observations: &[CpiObservation]) -> BTreeMap<i32, f64> {
    let mut sums: BTreeMap<i32, (f64, usize)> = BTreeMap::new();
    for obs in observations {
        let entry = sums.entry(obs.date.year()).or_insert((0.0, 0));
        entry.0 += obs.value;
        entry.1 += 1;
    }

    sums.into_iter()
        .map(|(year, (sum, count))| (year, sum / count as f64))
        .collect()
}

/// Year -> ratio to the base year.
#[derive(Debug, Clone)]
pub struct InflationTable {
    base_year: i32,
    averages: BTreeMap<i32, f64>,
    ratios: BTreeMap<i32, f64>,
}

impl InflationTable {
    /// Build the ratio table from monthly observations.
    ///
    /// Fails when the base year has no observation.
    pub fn from_observations(
        observations: &[CpiObservation],
        base_year: i32,
    ) -> InflationResult<Self> {
        Self::from_averages(yearly_averages(observations), base_year)
    }

    /// Build the ratio table from precomputed yearly averages.
    pub fn from_averages(averages: BTreeMap<i32, f64>, base_year: i32) -> InflationResult<Self> {
        if averages.is_empty() {
            return Err(InflationError::EmptySeries);
        }

        let base = *averages
            .get(&base_year)
            .ok_or(InflationError::MissingBaseYear(base_year))?;
        if !(base > 0.0) {
            return Err(InflationError::NonPositiveBase(base_year));
        }

        let ratios = averages
            .iter()
            .map(|(&year, &avg)| (year, avg / base))
            .collect();

        Ok(Self {
            base_year,
            averages,
            ratios,
        })
    }

    pub fn base_year(&self) -> i32 {
        self.base_year
    }

    /// First and last covered years.
    pub fn coverage(&self) -> (i32, i32) {
        let first = self.ratios.keys().next().copied().unwrap_or(self.base_year);
        let last = self.ratios.keys().next_back().copied().unwrap_or(self.base_year);
        (first, last)
    }

    /// Ratio for a year; years outside the series are an error.
    pub fn ratio(&self, year: i32) -> InflationResult<f64> {
        self.ratios.get(&year).copied().ok_or_else(|| {
            let (first, last) = self.coverage();
            InflationError::YearNotCovered { year, first, last }
        })
    }

    /// Rows for display, in year order.
    pub fn records(&self) -> Vec<InflationRatio> {
        self.ratios
            .iter()
            .map(|(&year, &ratio)| InflationRatio {
                year,
                average: self.averages[&year],
                ratio,
            })
            .collect()
    }
}
