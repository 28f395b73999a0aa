use serde::{Deserialize, Serialize};

/// Main response structure from the NSE option-chain-indices API.
///
/// NSE answers soft blocks with `{}`, so `records` defaults to empty and the
/// strike locator reports it as an empty chain instead of a parse failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptionChain {
    #[serde(default)]
    pub records: Records,
}

/// Records section: underlying value and every listed strike (all expiries)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Records {
    #[serde(default)]
    pub timestamp: Option<String>,

    #[serde(rename = "underlyingValue", default)]
    pub underlying_value: Option<f64>,

    #[serde(default)]
    pub data: Vec<OptionData>,

    #[serde(rename = "expiryDates", default)]
    pub expiry_dates: Vec<String>,
}

/// Option data for each strike price
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionData {
    #[serde(rename = "strikePrice")]
    pub strike_price: f64,

    #[serde(rename = "expiryDate", alias = "expiryDates", default)]
    pub expiry_date: Option<String>,

    #[serde(rename = "CE", default)]
    pub call: Option<OptionDetail>,

    #[serde(rename = "PE", default)]
    pub put: Option<OptionDetail>,
}

/// Detailed option information (CE or PE)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptionDetail {
    #[serde(rename = "openInterest", default)]
    pub open_interest: Option<f64>,

    #[serde(rename = "changeinOpenInterest", default)]
    pub change_in_oi: Option<f64>,
}

impl OptionData {
    pub fn call_oi(&self) -> f64 {
        side_oi(self.call.as_ref())
    }

    pub fn put_oi(&self) -> f64 {
        side_oi(self.put.as_ref())
    }

    pub fn call_chg_oi(&self) -> f64 {
        self.call.as_ref().and_then(|d| d.change_in_oi).unwrap_or(0.0)
    }

    pub fn put_chg_oi(&self) -> f64 {
        self.put.as_ref().and_then(|d| d.change_in_oi).unwrap_or(0.0)
    }
}

fn side_oi(detail: Option<&OptionDetail>) -> f64 {
    detail.and_then(|d| d.open_interest).unwrap_or(0.0)
}

impl OptionChain {
    /// Keep only the strikes listed for `expiry` (matched case-insensitively).
    pub fn retain_expiry(&mut self, expiry: &str) {
        self.records.data.retain(|opt| {
            opt.expiry_date
                .as_deref()
                .is_some_and(|e| e.eq_ignore_ascii_case(expiry))
        });
    }
}
