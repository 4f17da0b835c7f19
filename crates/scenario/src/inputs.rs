//! Input data readers
//!
//! Line-oriented readers for the farm list, sett connections, slaughter
//! schedule, observed SNP distance distribution, per-year sampling rates
//! and the farm-to-farm movement frequencies.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use btbfit_foundation::IntegerHistogram;
use indexmap::IndexMap;
use tracing::{debug, error, info};

use crate::date::Day;
use crate::error::{Error, Result};
use crate::herd::Farm;
use crate::types::{FarmId, SettId};

fn read_lines(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(text.lines().map(str::to_string).collect())
}

fn malformed(path: &Path, line: &str) -> Error {
    Error::MalformedLine {
        file: path.display().to_string(),
        line: line.to_string(),
    }
}

/// One farm id per line.
pub fn read_farm_ids(path: &Path) -> Result<Vec<FarmId>> {
    info!(file = %path.display(), "reading farm definitions");
    Ok(read_lines(path)?
        .into_iter()
        .map(|line| FarmId(line.trim().to_string()))
        .filter(|id| !id.0.is_empty())
        .collect())
}

/// `settId:farm1,farm2,...` per line.
pub fn read_setts(path: &Path) -> Result<Vec<(SettId, Vec<FarmId>)>> {
    info!(file = %path.display(), "reading reservoir definitions");
    let mut setts = Vec::new();
    for line in read_lines(path)? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (sett_id, farm_list) = line.split_once(':').ok_or_else(|| malformed(path, line))?;
        let farms = farm_list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(FarmId::from)
            .collect();
        setts.push((SettId(sett_id.trim().to_string()), farms));
    }
    Ok(setts)
}

/// `date:farm1,farm2,...` per line; dates are day counts.
pub fn read_slaughterhouse_moves(path: &Path) -> Result<Vec<(Day, Vec<FarmId>)>> {
    info!(file = %path.display(), "reading slaughterhouse moves");
    let mut moves = Vec::new();
    for line in read_lines(path)? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (date, farm_list) = line.split_once(':').ok_or_else(|| malformed(path, line))?;
        let date: Day = date.trim().parse().map_err(|_| malformed(path, line))?;
        let farms = farm_list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(FarmId::from)
            .collect();
        moves.push((date, farms));
    }
    Ok(moves)
}

/// `x:frequency` per line.
pub fn read_observed_distribution(path: &Path) -> Result<IntegerHistogram> {
    info!(file = %path.display(), "reading observed pairwise snp distance distribution");
    let mut hist = IntegerHistogram::new();
    for line in read_lines(path)? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (bin, frequency) = line.split_once(':').ok_or_else(|| malformed(path, line))?;
        let bin = bin.trim().parse().map_err(|_| malformed(path, line))?;
        let frequency = frequency.trim().parse().map_err(|_| malformed(path, line))?;
        hist.set_count(bin, frequency);
    }
    Ok(hist)
}

/// CSV with `#` comments; column 0 is the year, column 3 the sampling rate.
pub fn read_sampling_rates(path: &Path) -> Result<BTreeMap<i32, f64>> {
    debug!(file = %path.display(), "reading sampling rates");
    let mut rates = BTreeMap::new();
    for line in read_lines(path)? {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let columns: Vec<&str> = line.split(',').map(str::trim).collect();
        if columns.len() < 4 {
            return Err(malformed(path, line));
        }
        let year = columns[0].parse().map_err(|_| malformed(path, line))?;
        let rate = columns[3].parse().map_err(|_| malformed(path, line))?;
        rates.insert(year, rate);
    }
    Ok(rates)
}

/// `farmA-farmB count1,count2,...` per line.
///
/// Self-moves are ignored and lines naming unknown farms are logged and
/// skipped. Each count feeds the departure farm's off-movement histogram.
/// Returns the (departure, destination) pairs in file order.
pub fn read_movement_frequencies(
    path: &Path,
    farms: &mut IndexMap<FarmId, Farm>,
) -> Result<Vec<(FarmId, FarmId)>> {
    info!(file = %path.display(), "reading movement frequencies");
    let mut pairs = Vec::new();
    let mut self_moves = 0usize;
    for line in read_lines(path)? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (route, counts) = line.split_once(' ').ok_or_else(|| malformed(path, line))?;
        let (from, to) = route.split_once('-').ok_or_else(|| malformed(path, line))?;
        let from = FarmId::from(from.trim());
        let to = FarmId::from(to.trim());

        if !farms.contains_key(&from) || !farms.contains_key(&to) {
            error!(%from, %to, "ignoring movement between unknown farms");
            continue;
        }
        if from == to {
            self_moves += 1;
            continue;
        }

        for count in counts.split(',') {
            let count = count.trim();
            if count.is_empty() {
                continue;
            }
            let moved: i64 = count.parse().map_err(|_| malformed(path, line))?;
            if let Some(farm) = farms.get_mut(&from) {
                farm.off_movements.increment(moved);
            }
        }
        pairs.push((from, to));
    }
    debug!(
        movements = pairs.len(),
        self_moves, "movement frequencies loaded"
    );
    Ok(pairs)
}
