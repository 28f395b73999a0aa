use crate::error::ChainError;
use crate::models::OptionChain;
use serde::{Deserialize, Serialize};

pub use crate::config::DEFAULT_WINDOW_SIZE;

/// ATM strike, underlying price and every listed strike (ascending, unique)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtmLocation {
    pub atm_strike: f64,
    pub underlying_price: f64,
    pub strikes: Vec<f64>,
}

/// Put/call ratio over the whole chain. Undefined when there is no call OI.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum PutCallRatio {
    Computed(f64),
    Undefined,
}

impl PutCallRatio {
    pub fn from_totals(put_total: f64, call_total: f64) -> Self {
        if call_total == 0.0 {
            PutCallRatio::Undefined
        } else {
            PutCallRatio::Computed(put_total / call_total)
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            PutCallRatio::Computed(v) => Some(*v),
            PutCallRatio::Undefined => None,
        }
    }
}

/// One row of the display table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrikeRow {
    pub strike_price: f64,
    pub call_oi: f64,
    pub put_oi: f64,
    pub call_chg_oi: f64,
    pub put_chg_oi: f64,
    pub is_reference: bool,
}

/// Strikes around the reference strike, ascending
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrikeWindow {
    pub reference_strike: f64,
    pub rows: Vec<StrikeRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub call_total: f64,
    pub put_total: f64,
    pub ratio: PutCallRatio,
    pub window: StrikeWindow,
}

/// Find the ATM strike: closest to the underlying, lower strike on ties.
pub fn locate_atm(chain: &OptionChain) -> Result<AtmLocation, ChainError> {
    let underlying_price = match chain.records.underlying_value {
        Some(v) if v.is_finite() => v,
        Some(v) => {
            return Err(ChainError::EmptyChain(format!("underlying value is not finite: {}", v)));
        }
        None => return Err(ChainError::EmptyChain("no underlying value".to_string())),
    };

    let strikes = sorted_strikes(chain);
    let atm_strike = nearest_strike(&strikes, underlying_price)
        .ok_or_else(|| ChainError::EmptyChain("no strike records".to_string()))?;

    Ok(AtmLocation {
        atm_strike,
        underlying_price,
        strikes,
    })
}

/// Whole-chain OI totals plus a window of `window_size` strikes each side of
/// `reference_strike`. An unlisted reference falls back to the nearest strike;
/// a non-finite one (NaN, inf) falls back to the ATM strike.
pub fn aggregate(chain: &OptionChain, reference_strike: f64, window_size: usize) -> AggregateResult {
    let (call_total, put_total) = chain
        .records
        .data
        .iter()
        .fold((0.0, 0.0), |(calls, puts), opt| (calls + opt.call_oi(), puts + opt.put_oi()));

    let rows = strike_rows(chain);
    let strikes: Vec<f64> = rows.iter().map(|r| r.strike_price).collect();
    let target = if reference_strike.is_finite() {
        reference_strike
    } else {
        chain.records.underlying_value.unwrap_or(f64::NAN)
    };
    let reference = nearest_strike(&strikes, target).unwrap_or(reference_strike);

    let window = match strikes.iter().position(|&s| s == reference) {
        Some(idx) => {
            let start = idx.saturating_sub(window_size);
            let end = idx.saturating_add(window_size).min(rows.len() - 1);
            rows[start..=end]
                .iter()
                .map(|row| StrikeRow {
                    is_reference: row.strike_price == reference,
                    ..row.clone()
                })
                .collect()
        }
        None => Vec::new(),
    };

    AggregateResult {
        call_total,
        put_total,
        ratio: PutCallRatio::from_totals(put_total, call_total),
        window: StrikeWindow {
            reference_strike: reference,
            rows: window,
        },
    }
}

/// Closest strike to `price` in an ascending slice; the first (lower) wins ties.
/// A non-finite price has no nearest strike.
pub fn nearest_strike(strikes: &[f64], price: f64) -> Option<f64> {
    if !price.is_finite() {
        return None;
    }

    let mut best: Option<(f64, f64)> = None;

    for &strike in strikes {
        let distance = (strike - price).abs();
        match best {
            Some((_, min_distance)) if distance >= min_distance => {}
            _ => best = Some((strike, distance)),
        }
    }

    best.map(|(strike, _)| strike)
}

fn sorted_strikes(chain: &OptionChain) -> Vec<f64> {
    let mut strikes: Vec<f64> = chain
        .records
        .data
        .iter()
        .map(|opt| opt.strike_price)
        .filter(|s| s.is_finite())
        .collect();
    strikes.sort_by(f64::total_cmp);
    strikes.dedup();
    strikes
}

/// One row per unique strike; records sharing a strike (other expiries) are summed,
/// change in OI included.
fn strike_rows(chain: &OptionChain) -> Vec<StrikeRow> {
    let mut data: Vec<_> = chain
        .records
        .data
        .iter()
        .filter(|opt| opt.strike_price.is_finite())
        .collect();
    data.sort_by(|a, b| a.strike_price.total_cmp(&b.strike_price));

    let mut rows: Vec<StrikeRow> = Vec::with_capacity(data.len());
    for opt in data {
        match rows.last_mut() {
            Some(last) if last.strike_price == opt.strike_price => {
                last.call_oi += opt.call_oi();
                last.put_oi += opt.put_oi();
                last.call_chg_oi += opt.call_chg_oi();
                last.put_chg_oi += opt.put_chg_oi();
            }
            _ => rows.push(StrikeRow {
                strike_price: opt.strike_price,
                call_oi: opt.call_oi(),
                put_oi: opt.put_oi(),
                call_chg_oi: opt.call_chg_oi(),
                put_chg_oi: opt.put_chg_oi(),
                is_reference: false,
            }),
        }
    }
    rows
}
