//! Result text in the customer's vocabulary.

use labx_map::{ComponentMap, ComponentMapEntry};
use labx_model::{LabResult, RequestedItem, Test};

/// Exportable text for one selected result.
///
/// The value map of the entry answering `item` wins; otherwise the first entry
/// mapping to the result's analysis and component is used. Without a matching
/// value the raw text passes through trimmed.
pub fn translate_result(
    item: &RequestedItem,
    test: &Test,
    result: &LabResult,
    component_map: &ComponentMap,
) -> String {
    let raw = result.text.trim();
    let entry = component_map
        .iter()
        .find(|entry| {
            entry.matches_item(item) && entry.matches_result(&test.analysis, &result.name)
        })
        .or_else(|| component_map.for_result(&test.analysis, &result.name));
    match entry.and_then(|entry| entry.translate(raw)) {
        Some(mapped) => mapped.to_string(),
        None => raw.to_string(),
    }
}

/// Requested item for a result exported without a request.
///
/// Uses the customer aliases of the component map entry for the result, or the
/// internal names when the customer has none.
pub fn synthesize_item(
    test: &Test,
    result: &LabResult,
    component_map: &ComponentMap,
) -> RequestedItem {
    component_map
        .for_result(&test.analysis, &result.name)
        .map_or_else(
            || RequestedItem::new(test.analysis.clone(), result.name.clone()),
            ComponentMapEntry::as_item,
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map() -> ComponentMap {
        [
            ComponentMapEntry::new("APPEARANCE", "COLOUR", "VISUAL", "COLOUR", 1)
                .with_value("CLR", "Clear")
                .with_value("turbid", "Cloudy"),
            ComponentMapEntry::new("LOOK", "COLOUR", "VISUAL", "COLOUR", 1)
                .with_value("CLR", "Transparent"),
        ]
        .into_iter()
        .collect()
    }

    fn visual(text: &str) -> (Test, LabResult) {
        let result = LabResult::new("COLOUR", text);
        (Test::new(1, "VISUAL").with_result(result.clone()), result)
    }

    #[test]
    fn value_map_substitutes_literal() {
        let (test, result) = visual(" TURBID ");
        let item = RequestedItem::new("APPEARANCE", "COLOUR");
        assert_eq!(translate_result(&item, &test, &result, &map()), "Cloudy");
    }

    #[test]
    fn requested_alias_picks_its_own_value_map() {
        let (test, result) = visual("CLR");
        let item = RequestedItem::new("look", "colour");
        assert_eq!(translate_result(&item, &test, &result, &map()), "Transparent");
    }

    #[test]
    fn unmapped_text_passes_through_trimmed() {
        let (test, result) = visual("  amber ");
        let item = RequestedItem::new("APPEARANCE", "COLOUR");
        assert_eq!(translate_result(&item, &test, &result, &map()), "amber");
        assert_eq!(
            translate_result(&item, &test, &result, &ComponentMap::default()),
            "amber"
        );
    }

    #[test]
    fn synthesized_item_uses_customer_aliases() {
        let (test, result) = visual("CLR");
        assert_eq!(
            synthesize_item(&test, &result, &map()),
            RequestedItem::new("APPEARANCE", "COLOUR")
        );
        assert_eq!(
            synthesize_item(&test, &result, &ComponentMap::default()),
            RequestedItem::new("VISUAL", "COLOUR")
        );
    }
}
