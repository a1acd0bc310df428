use campaign_lens::data::{round2, safe_ratio};
use campaign_lens::dataset::Datasets;
use campaign_lens::filter::{self, FilterConfig};
use campaign_lens::frame::Frame;
use campaign_lens::pipeline::Dashboard;
use proptest::prelude::*;

fn datasets(revenues: &[u32], payouts: &[u32], orders: &[u32], platforms: &[bool]) -> Datasets {
    let ids: Vec<String> = (1..=revenues.len()).map(|i| i.to_string()).collect();
    let influencers = ids
        .iter()
        .zip(platforms)
        .map(|(id, insta)| {
            vec![
                id.clone(),
                format!("Influencer {id}"),
                if *insta { "Instagram" } else { "YouTube" }.to_string(),
            ]
        })
        .collect::<Vec<_>>();
    let tracking = ids
        .iter()
        .zip(revenues.iter().zip(orders))
        .map(|(id, (revenue, orders))| {
            vec![id.clone(), "Launch".to_string(), revenue.to_string(), orders.to_string()]
        })
        .collect::<Vec<_>>();
    let payout_rows = ids
        .iter()
        .zip(payouts)
        .map(|(id, payout)| vec![id.clone(), payout.to_string()])
        .collect::<Vec<_>>();
    Datasets {
        influencers: Frame::from_strings(
            &["id".to_string(), "name".to_string(), "platform".to_string()],
            &influencers,
        ),
        posts: Frame::from_strings(&["influencer_id".to_string()], &[]),
        tracking: Frame::from_strings(
            &[
                "influencer_id".to_string(),
                "campaign".to_string(),
                "revenue".to_string(),
                "orders".to_string(),
            ],
            &tracking,
        ),
        payouts: Frame::from_strings(
            &["influencer_id".to_string(), "total_payout".to_string()],
            &payout_rows,
        ),
    }
}

fn is_two_decimal(value: f64) -> bool {
    ((value * 100.0).round() - value * 100.0).abs() < 1e-6
}

proptest! {
    #[test]
    fn ratios_are_finite_and_rounded(numerator in -1e7f64..1e7, denominator in -10_000i32..10_000) {
        let denominator = f64::from(denominator);
        let ratio = round2(safe_ratio(numerator, denominator));
        prop_assert!(ratio.is_finite());
        prop_assert!(is_two_decimal(ratio));
        prop_assert_eq!(round2(safe_ratio(numerator, 0.0)), 0.0);
    }

    #[test]
    fn metrics_follow_their_ratio_formulas(
        rows in prop::collection::vec((0u32..50_000, 0u32..5_000, 0u32..20, any::<bool>()), 1..12)
    ) {
        let revenues: Vec<u32> = rows.iter().map(|r| r.0).collect();
        let payouts: Vec<u32> = rows.iter().map(|r| r.1).collect();
        let orders: Vec<u32> = rows.iter().map(|r| r.2).collect();
        let platforms: Vec<bool> = rows.iter().map(|r| r.3).collect();
        let dashboard = Dashboard::new(&datasets(&revenues, &payouts, &orders, &platforms)).unwrap();
        let report = dashboard.compute_all();

        let roas = report.roas.computed().unwrap();
        prop_assert_eq!(roas.len(), rows.len());
        for row in roas {
            prop_assert!(row.roas.is_finite() && row.roas >= 0.0);
            prop_assert!(is_two_decimal(row.roas));
            if row.total_payout == 0.0 {
                prop_assert_eq!(row.roas, 0.0);
            } else {
                prop_assert_eq!(row.roas, round2(row.total_revenue / row.total_payout));
            }
        }
        for row in report.roi.computed().unwrap() {
            prop_assert!(is_two_decimal(row.roi_pct));
            if row.total_payout == 0.0 {
                prop_assert_eq!(row.roi_pct, 0.0);
            } else {
                let expected = round2((row.revenue - row.total_payout) / row.total_payout * 100.0);
                prop_assert_eq!(row.roi_pct, expected);
            }
        }
        for row in report.incremental_roas.computed().unwrap() {
            if row.orders == 0.0 {
                prop_assert_eq!(row.iroas, 0.0);
            } else {
                prop_assert_eq!(row.iroas, round2(row.revenue / row.orders));
            }
        }

        let highlights = report.highlights.computed().unwrap();
        prop_assert!(highlights.top.windows(2).all(|w| w[0].roas >= w[1].roas));
        prop_assert!(highlights.poor.iter().all(|r| r.roas < 1.0));
        prop_assert!(highlights.top.iter().all(|r| roas.contains(r)));
        prop_assert!(highlights.poor.iter().all(|r| roas.contains(r)));
    }

    #[test]
    fn filtering_with_everything_is_idempotent(
        rows in prop::collection::vec((0u32..1_000, 0u32..1_000, any::<bool>()), 1..10)
    ) {
        let revenues: Vec<u32> = rows.iter().map(|r| r.0).collect();
        let payouts: Vec<u32> = rows.iter().map(|r| r.1).collect();
        let orders = vec![3; rows.len()];
        let platforms: Vec<bool> = rows.iter().map(|r| r.2).collect();
        let dashboard = Dashboard::new(&datasets(&revenues, &payouts, &orders, &platforms)).unwrap();
        let selection = dashboard.selection(&FilterConfig::default());

        let once = filter::apply(dashboard.datasets(), &selection);
        prop_assert_eq!(once.influencers.len(), rows.len());
        prop_assert_eq!(once.tracking.len(), rows.len());
        let twice = filter::filter_influencers(&once.influencers, &selection);
        prop_assert_eq!(&twice, &once.influencers);
    }
}
