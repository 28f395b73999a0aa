use nse_option_chain::{
    aggregate, build_snapshot, locate_atm, ChainError, CycleRequest, OptionChain, OptionData,
    OptionDetail, PutCallRatio, Records,
};

const FIXTURE: &str = include_str!("fixtures/nifty_option_chain.json");

fn detail(oi: f64) -> OptionDetail {
    OptionDetail {
        open_interest: Some(oi),
        ..Default::default()
    }
}

fn strike(price: f64, ce: Option<f64>, pe: Option<f64>) -> OptionData {
    OptionData {
        strike_price: price,
        expiry_date: None,
        call: ce.map(detail),
        put: pe.map(detail),
    }
}

fn chain(underlying: f64, data: Vec<OptionData>) -> OptionChain {
    OptionChain {
        records: Records {
            timestamp: None,
            underlying_value: Some(underlying),
            data,
            expiry_dates: vec![],
        },
    }
}

/// Strikes `from..=to` every `step`, each with the given OI on both sides
fn ladder(underlying: f64, from: i64, to: i64, step: i64) -> OptionChain {
    let data = (from..=to)
        .step_by(step as usize)
        .map(|s| strike(s as f64, Some(100.0), Some(50.0)))
        .collect();
    chain(underlying, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atm_nearest_strike() {
        // 24953: |24953-24900| = 53, |24953-25000| = 47
        let doc = chain(
            24_953.0,
            vec![
                strike(24_800.0, None, None),
                strike(24_900.0, None, None),
                strike(25_000.0, None, None),
                strike(25_100.0, None, None),
            ],
        );

        let loc = locate_atm(&doc).unwrap();
        assert_eq!(loc.atm_strike, 25_000.0);
        assert_eq!(loc.underlying_price, 24_953.0);
        assert_eq!(loc.strikes, vec![24_800.0, 24_900.0, 25_000.0, 25_100.0]);
    }

    #[test]
    fn test_atm_tie_resolves_to_lower_strike() {
        let doc = chain(
            25_000.0,
            vec![strike(25_050.0, None, None), strike(24_950.0, None, None)],
        );
        assert_eq!(locate_atm(&doc).unwrap().atm_strike, 24_950.0);
    }

    #[test]
    fn test_put_only_strike_contributes_zero_calls() {
        let doc = chain(
            100.0,
            vec![
                strike(90.0, None, Some(700.0)),
                strike(100.0, Some(300.0), Some(200.0)),
            ],
        );

        let result = aggregate(&doc, 100.0, 10);
        assert_eq!(result.call_total, 300.0);
        assert_eq!(result.put_total, 900.0);
        assert_eq!(result.ratio, PutCallRatio::Computed(3.0));

        let put_only = &result.window.rows[0];
        assert_eq!(put_only.strike_price, 90.0);
        assert_eq!(put_only.call_oi, 0.0);
        assert_eq!(put_only.put_oi, 700.0);
    }

    #[test]
    fn test_window_at_low_edge_is_not_padded() {
        // 3 strikes below the reference, 15 above
        let doc = ladder(100.0, 70, 250, 10);
        let result = aggregate(&doc, 100.0, 10);

        let strikes: Vec<f64> = result.window.rows.iter().map(|r| r.strike_price).collect();
        assert_eq!(strikes.len(), 3 + 1 + 10);
        assert_eq!(strikes.first(), Some(&70.0));
        assert_eq!(strikes.last(), Some(&200.0));
        assert!(strikes.windows(2).all(|w| w[0] < w[1]));

        let reference: Vec<_> = result.window.rows.iter().filter(|r| r.is_reference).collect();
        assert_eq!(reference.len(), 1);
        assert_eq!(reference[0].strike_price, 100.0);
    }

    #[test]
    fn test_window_at_high_edge() {
        let doc = ladder(240.0, 70, 250, 10);
        let result = aggregate(&doc, 240.0, 10);
        // 10 below, reference, 1 above
        assert_eq!(result.window.rows.len(), 12);
        assert_eq!(result.window.rows.last().unwrap().strike_price, 250.0);
    }

    #[test]
    fn test_ratio_undefined_without_calls() {
        let doc = chain(
            100.0,
            vec![strike(100.0, None, Some(10.0)), strike(110.0, Some(0.0), Some(5.0))],
        );
        let result = aggregate(&doc, 100.0, 10);
        assert_eq!(result.call_total, 0.0);
        assert_eq!(result.ratio, PutCallRatio::Undefined);
        assert_eq!(result.ratio.value(), None);
    }

    #[test]
    fn test_missing_open_interest_counts_as_zero() {
        let mut data = strike(100.0, Some(0.0), Some(10.0));
        data.call = Some(OptionDetail::default());
        let doc = chain(100.0, vec![data, strike(110.0, Some(20.0), None)]);

        let result = aggregate(&doc, 100.0, 10);
        assert_eq!(result.call_total, 20.0);
        assert_eq!(result.ratio, PutCallRatio::Computed(0.5));
    }

    #[test]
    fn test_empty_documents() {
        assert!(matches!(
            locate_atm(&chain(100.0, vec![])),
            Err(ChainError::EmptyChain(_))
        ));
        assert!(matches!(
            locate_atm(&OptionChain::default()),
            Err(ChainError::EmptyChain(_))
        ));
    }

    #[test]
    fn test_fixture_end_to_end() {
        let doc: OptionChain = serde_json::from_str(FIXTURE).unwrap();

        let loc = locate_atm(&doc).unwrap();
        assert_eq!(loc.atm_strike, 25_000.0);
        assert_eq!(loc.strikes.len(), 5);

        // Totals span every expiry in the document
        let result = aggregate(&doc, loc.atm_strike, 10);
        assert_eq!(result.call_total, 28_000.0);
        assert_eq!(result.put_total, 32_200.0);
        assert_eq!(result.window.rows.len(), 5);

        let atm_row = result.window.rows.iter().find(|r| r.is_reference).unwrap();
        assert_eq!(atm_row.call_oi, 11_400.0);
        assert_eq!(atm_row.put_oi, 8_000.0);
        // the 31-Oct record carries no change in OI
        assert_eq!(atm_row.call_chg_oi, 2_210.0);
        assert_eq!(atm_row.put_chg_oi, 640.0);
    }

    #[test]
    fn test_snapshot_with_expiry_filter() {
        let doc: OptionChain = serde_json::from_str(FIXTURE).unwrap();
        let request = CycleRequest {
            expiry: Some("24-oct-2024".to_string()),
            window_size: 1,
            ..CycleRequest::new("NIFTY")
        };

        let snapshot = build_snapshot(doc, &request).unwrap();
        assert_eq!(snapshot.atm_strike, 25_000.0);
        assert_eq!(snapshot.timestamp.as_deref(), Some("16-Oct-2024 15:30:00"));
        assert_eq!(snapshot.analysis.call_total, 27_100.0);
        assert_eq!(snapshot.analysis.put_total, 31_800.0);

        let strikes: Vec<f64> = snapshot.analysis.window.rows.iter().map(|r| r.strike_price).collect();
        assert_eq!(strikes, vec![24_900.0, 25_000.0, 25_100.0]);
        assert_eq!(snapshot.expiry_dates, vec!["24-Oct-2024", "31-Oct-2024"]);
    }

    #[test]
    fn test_snapshot_ignores_non_finite_strike() {
        let doc: OptionChain = serde_json::from_str(FIXTURE).unwrap();
        let request = CycleRequest {
            reference_strike: Some(f64::NAN),
            window_size: 1,
            ..CycleRequest::new("NIFTY")
        };

        let snapshot = build_snapshot(doc, &request).unwrap();
        assert_eq!(snapshot.analysis.window.reference_strike, 25_000.0);
        assert_eq!(snapshot.analysis.window.rows.len(), 3);
    }

    #[test]
    fn test_snapshot_unknown_expiry_is_empty_chain() {
        let doc: OptionChain = serde_json::from_str(FIXTURE).unwrap();
        let request = CycleRequest {
            expiry: Some("01-Jan-2030".to_string()),
            ..CycleRequest::new("NIFTY")
        };
        assert!(matches!(
            build_snapshot(doc, &request),
            Err(ChainError::EmptyChain(_))
        ));
    }

    #[test]
    fn test_snapshot_honours_selected_strike() {
        let doc: OptionChain = serde_json::from_str(FIXTURE).unwrap();
        let request = CycleRequest {
            reference_strike: Some(24_800.0),
            window_size: 1,
            ..CycleRequest::new("NIFTY")
        };

        let snapshot = build_snapshot(doc, &request).unwrap();
        assert_eq!(snapshot.atm_strike, 25_000.0);
        assert_eq!(snapshot.analysis.window.reference_strike, 24_800.0);
        assert_eq!(snapshot.analysis.window.rows.len(), 3);
    }
}
