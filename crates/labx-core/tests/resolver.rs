use std::collections::HashSet;

use labx_core::{ResultRef, resolve};
use labx_map::{ComponentMap, ComponentMapEntry};
use labx_model::{ExportPolicy, ExternalRequest, LabResult, RequestedItem, Sample, Test};
use proptest::prelude::*;

fn request(items: &[(&str, &str)]) -> ExternalRequest {
    ExternalRequest {
        id: 1,
        customer_id: "C".to_string(),
        transaction_id: "TX-1".to_string(),
        items: items
            .iter()
            .map(|(analysis, component)| RequestedItem::new(*analysis, *component))
            .collect(),
        ..ExternalRequest::default()
    }
}

fn ph_map() -> ComponentMap {
    [
        ComponentMapEntry::new("PH", "PH", "PH_TEST", "PH", 1),
        ComponentMapEntry::new("PH", "PH", "PH_CONFIRM", "PH", 2),
    ]
    .into_iter()
    .collect()
}

/// Exported (test number, result text) pairs.
fn exported(export: &labx_core::ResolvedExport<'_>) -> Vec<(u64, String)> {
    export
        .selections()
        .map(|(test, selection)| (test.number, selection.result.text.clone()))
        .collect()
}

#[test]
fn confirmation_tier_overrides_primary() {
    let sample = Sample::new(1)
        .with_test(Test::new(10, "PH_TEST").with_result(LabResult::new("PH", "7.1")))
        .with_test(Test::new(11, "PH_CONFIRM").with_result(LabResult::new("PH", "9.4").out_of_range()));
    let req = request(&[("PH", "PH")]);

    let export = resolve(&sample, Some(&req), &ph_map(), ExportPolicy::FtpReq);

    assert_eq!(exported(&export), vec![(11, "9.4".to_string())]);
    assert!(!export.contains(ResultRef { test: 0, result: 0 }));
    assert_eq!(export.tests()[0].selections[0].item, RequestedItem::new("PH", "PH"));
}

#[test]
fn primary_result_consumed_by_override_is_not_reused() {
    let sample = Sample::new(1)
        .with_test(Test::new(10, "PH_TEST").with_result(LabResult::new("PH", "7.1")))
        .with_test(Test::new(11, "PH_CONFIRM").with_result(LabResult::new("PH", "7.3")));
    // The second request for PH finds the primary result already processed.
    let req = request(&[("PH", "PH"), ("PH", "PH")]);

    let export = resolve(&sample, Some(&req), &ph_map(), ExportPolicy::FtpReq);

    assert_eq!(exported(&export), vec![(11, "7.3".to_string())]);
}

#[test]
fn out_of_range_result_takes_precedence() {
    let sample = Sample::new(1)
        .with_test(Test::new(20, "PH_TEST").with_result(LabResult::new("PH", "7.0")))
        .with_test(Test::new(21, "PH_TEST").with_result(LabResult::new("PH", "3.2").out_of_range()))
        .with_test(Test::new(22, "PH_TEST").with_result(LabResult::new("PH", "7.2")));
    let map: ComponentMap = [ComponentMapEntry::new("PH", "PH", "PH_TEST", "PH", 1)]
        .into_iter()
        .collect();
    let req = request(&[("PH", "PH")]);

    let export = resolve(&sample, Some(&req), &map, ExportPolicy::FtpReq);

    assert_eq!(exported(&export), vec![(21, "3.2".to_string())]);
}

#[test]
fn in_range_fallback_uses_latest_test() {
    let sample = Sample::new(1)
        .with_test(Test::new(20, "PH_TEST").with_result(LabResult::new("PH", "7.0")))
        .with_test(Test::new(22, "PH_TEST").with_result(LabResult::new("PH", "7.2")));
    let map: ComponentMap = [ComponentMapEntry::new("PH", "PH", "PH_TEST", "PH", 1)]
        .into_iter()
        .collect();
    let req = request(&[("PH", "PH"), ("PH", "PH")]);

    let export = resolve(&sample, Some(&req), &map, ExportPolicy::FtpReq);

    assert_eq!(
        exported(&export),
        vec![(22, "7.2".to_string()), (20, "7.0".to_string())]
    );
}

#[test]
fn intermediate_tiers_are_consumed_without_export() {
    let sample = Sample::new(1)
        .with_test(Test::new(1, "TOC_A").with_result(LabResult::new("TOC", "10")))
        .with_test(Test::new(2, "TOC_B").with_result(LabResult::new("TOC", "11")))
        .with_test(Test::new(3, "TOC_C").with_result(LabResult::new("TOC", "12")));
    let map: ComponentMap = [
        ComponentMapEntry::new("TOC", "TOC", "TOC_A", "TOC", 1),
        ComponentMapEntry::new("TOC", "TOC", "TOC_B", "TOC", 2),
        ComponentMapEntry::new("TOC", "TOC", "TOC_C", "TOC", 3),
    ]
    .into_iter()
    .collect();
    let req = request(&[("TOC", "TOC"), ("TOC", "TOC")]);

    let export = resolve(&sample, Some(&req), &map, ExportPolicy::FtpReq);

    // First item: TOC_C overrides, TOC_A and TOC_B are consumed. Second item finds nothing.
    assert_eq!(exported(&export), vec![(3, "12".to_string())]);
}

#[test]
fn unmapped_item_exports_nothing() {
    let sample = Sample::new(1)
        .with_test(Test::new(10, "PH_TEST").with_result(LabResult::new("PH", "7.1")));
    let req = request(&[("LEAD", "PB")]);

    let export = resolve(&sample, Some(&req), &ph_map(), ExportPolicy::FtpReq);

    assert!(export.is_empty());
}

#[test]
fn ftp_policies_need_a_request() {
    let sample = Sample::new(1)
        .with_test(Test::new(10, "PH_TEST").with_result(LabResult::new("PH", "7.1")));
    let degenerate = ExternalRequest {
        id: 2,
        customer_id: "C".to_string(),
        ..ExternalRequest::default()
    };

    for policy in [ExportPolicy::FtpReq, ExportPolicy::FtpAll, ExportPolicy::FtpComps] {
        assert!(resolve(&sample, None, &ph_map(), policy).is_empty());
        assert!(resolve(&sample, Some(&degenerate), &ph_map(), policy).is_empty());
    }
    assert_eq!(
        resolve(&sample, None, &ph_map(), ExportPolicy::All).result_count(),
        1
    );
    assert_eq!(
        resolve(&sample, None, &ph_map(), ExportPolicy::AllComps).result_count(),
        1
    );
}

#[test]
fn all_exports_every_result_with_synthesized_items() {
    let sample = Sample::new(1)
        .with_test(
            Test::new(10, "PH_TEST")
                .with_result(LabResult::new("PH", "7.1"))
                .with_result(LabResult::new("TEMP", "21")),
        )
        .with_test(Test::new(11, "PH_TEST").with_result(LabResult::new("PH", "7.2")));

    let export = resolve(&sample, None, &ph_map(), ExportPolicy::All);

    assert_eq!(export.result_count(), 3);
    assert_eq!(export.tests().len(), 2);
    let items: Vec<&RequestedItem> = export
        .selections()
        .map(|(_, selection)| &selection.item)
        .collect();
    assert_eq!(items[0], &RequestedItem::new("PH", "PH"));
    assert_eq!(items[1], &RequestedItem::new("PH_TEST", "TEMP"));
}

#[test]
fn allcomps_uses_latest_test_per_component() {
    let sample = Sample::new(1)
        .with_test(Test::new(10, "PH_TEST").with_result(LabResult::new("PH", "7.1")))
        .with_test(Test::new(12, "PH_TEST").with_result(LabResult::new("PH", "7.4")))
        .with_test(Test::new(11, "PH_CONFIRM").with_result(LabResult::new("PH", "7.3")))
        .with_test(Test::new(13, "OTHER").with_result(LabResult::new("X", "1")));
    let req = request(&[("PH", "PH")]);

    let export = resolve(&sample, Some(&req), &ph_map(), ExportPolicy::FtpComps);

    assert_eq!(
        exported(&export),
        vec![(12, "7.4".to_string()), (11, "7.3".to_string())]
    );
}

#[test]
fn resolution_is_fresh_per_call() {
    let sample = Sample::new(1)
        .with_test(Test::new(10, "PH_TEST").with_result(LabResult::new("PH", "7.1")));
    let req = request(&[("PH", "PH")]);
    let map = ph_map();

    let first = resolve(&sample, Some(&req), &map, ExportPolicy::FtpReq);
    let second = resolve(&sample, Some(&req), &map, ExportPolicy::FtpReq);

    assert_eq!(first, second);
    assert_eq!(first.result_count(), 1);
}

fn arb_sample() -> impl Strategy<Value = Sample> {
    let analysis = prop_oneof![Just("PH_TEST"), Just("PH_CONFIRM"), Just("TOC_TEST")];
    let result = (prop_oneof![Just("PH"), Just("TOC")], any::<bool>());
    prop::collection::vec((analysis, prop::collection::vec(result, 0..3)), 0..6).prop_map(
        |tests| {
            let mut sample = Sample::new(1);
            for (idx, (analysis, results)) in tests.into_iter().enumerate() {
                let mut test = Test::new(100 - idx as u64, analysis);
                for (name, oos) in results {
                    let mut result = LabResult::new(name, "1");
                    result.out_of_range = oos;
                    test.results.push(result);
                }
                sample.tests.push(test);
            }
            sample
        },
    )
}

fn arb_items() -> impl Strategy<Value = Vec<(&'static str, &'static str)>> {
    prop::collection::vec(
        prop_oneof![Just(("PH", "PH")), Just(("TOC", "TOC")), Just(("ph", "ph"))],
        0..6,
    )
}

proptest! {
    #[test]
    fn no_result_is_exported_twice(sample in arb_sample(), items in arb_items()) {
        let mut map = ph_map();
        map.push(ComponentMapEntry::new("TOC", "TOC", "TOC_TEST", "TOC", 1));
        map.push(ComponentMapEntry::new("TOC", "TOC", "PH_CONFIRM", "TOC", 2));
        let req = request(&items);

        for policy in [ExportPolicy::FtpReq, ExportPolicy::FtpAll, ExportPolicy::FtpComps] {
            let export = resolve(&sample, Some(&req), &map, policy);
            let mut seen = HashSet::new();
            for (_, selection) in export.selections() {
                prop_assert!(seen.insert(selection.at));
            }
        }
    }
}
