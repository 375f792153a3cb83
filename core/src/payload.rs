use crate::models::IngredientsPayload;
use crate::picker::PickerRow;

/// Split the picker's selections into known ingredient ids and names of new
/// ingredients, in row order. Rows with nothing selected are skipped.
#[must_use]
pub fn build_payload(rows: &[PickerRow]) -> IngredientsPayload {
    let mut payload = IngredientsPayload::default();
    for ingredient in rows.iter().filter_map(|r| r.selected.as_ref()) {
        match ingredient.id {
            Some(id) => payload.ingredients_in_db.push(id),
            None => payload.ingredients_not_in_db.push(ingredient.name.clone()),
        }
    }
    payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Ingredient;
    use crate::picker::RowId;

    fn rows(selections: Vec<Option<Ingredient>>) -> Vec<PickerRow> {
        selections
            .into_iter()
            .enumerate()
            .map(|(i, selected)| PickerRow {
                id: RowId::from_raw(i as u64 + 1),
                selected,
            })
            .collect()
    }

    #[test]
    fn test_empty_rows() {
        assert!(build_payload(&[]).is_empty());
        assert!(build_payload(&rows(vec![None, None])).is_empty());
    }

    #[test]
    fn test_splits_existing_and_new() {
        let payload = build_payload(&rows(vec![
            Some(Ingredient::existing(1, "Tomato")),
            Some(Ingredient::new_entry("newingredient")),
        ]));
        assert_eq!(payload.ingredients_in_db, vec![1]);
        assert_eq!(payload.ingredients_not_in_db, vec!["newingredient"]);
    }

    #[test]
    fn test_count_matches_selected_rows() {
        let selections = vec![
            Some(Ingredient::existing(3, "Tomato paste")),
            None,
            Some(Ingredient::new_entry("yam flour")),
            Some(Ingredient::existing(1, "Tomato")),
            None,
            Some(Ingredient::new_entry("ogbono")),
        ];
        let selected = selections.iter().filter(|s| s.is_some()).count();
        let payload = build_payload(&rows(selections));
        assert_eq!(payload.len(), selected);
        assert_eq!(payload.ingredients_in_db, vec![3, 1]);
        assert_eq!(payload.ingredients_not_in_db, vec!["yam flour", "ogbono"]);
    }

    #[test]
    fn test_serializes_with_api_field_names() {
        let payload = build_payload(&rows(vec![
            Some(Ingredient::existing(1, "Tomato")),
            Some(Ingredient::new_entry("yam")),
        ]));
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "ingredientsInDB": [1], "ingredientsNotInDB": ["yam"] })
        );
    }
}
