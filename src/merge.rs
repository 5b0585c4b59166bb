//! Area-list structural merge, honoring `insertBeforeId` (spec §4.D).

use crate::error::AssemblerError;
use crate::model::Item;

/// `mergeItemLists(target, source, owningPage)`: appends each item in `source` to `target`
/// in order, splicing in place of `insertBeforeId` when present.
///
/// Mirrors the `Vec`-splicing idiom the teacher uses for array-valued keyword validators
/// (e.g. `additional_properties.rs`'s iteration over a `Map`'s values): a plain linear scan
/// for the insertion point, since area lists are small and this runs once per merge.
pub fn merge_item_lists(
    target: &mut Vec<Item>,
    source: Vec<Item>,
    owning_page: &str,
) -> Result<(), AssemblerError> {
    for item in source {
        match &item.insert_before_id {
            Some(marker) => {
                let position = target.iter().position(|existing| {
                    existing.id.as_deref() == Some(marker.as_str())
                });
                match position {
                    Some(index) => target.insert(index, item),
                    None => {
                        return Err(AssemblerError::MissingInsertBefore {
                            page: owning_page.to_string(),
                            value: marker.clone(),
                        })
                    }
                }
            }
            None => target.push(item),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(id: &str) -> Item {
        serde_json::from_value(json!({"widget": "w", "id": id})).unwrap()
    }

    fn item_before(id: &str, before: &str) -> Item {
        serde_json::from_value(json!({"widget": "w", "id": id, "insertBeforeId": before})).unwrap()
    }

    #[test]
    fn appends_in_order_with_no_insert_before_id() {
        let mut target = vec![item("id1")];
        merge_item_lists(&mut target, vec![item("id2")], "home").unwrap();
        let ids: Vec<_> = target.iter().map(|i| i.id.clone().unwrap()).collect();
        assert_eq!(ids, vec!["id1", "id2"]);
    }

    #[test]
    fn inserts_before_matching_id() {
        let mut target = vec![item("id1"), item("id2")];
        merge_item_lists(&mut target, vec![item_before("idX", "id2")], "home").unwrap();
        let ids: Vec<_> = target.iter().map(|i| i.id.clone().unwrap()).collect();
        assert_eq!(ids, vec!["id1", "idX", "id2"]);
    }

    #[test]
    fn fails_when_insert_before_id_is_absent() {
        let mut target = vec![item("id1")];
        let err = merge_item_lists(&mut target, vec![item_before("idX", "idZ")], "home")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error loading page \"home\": No id found that matches insertBeforeId value \"idZ\""
        );
    }
}
