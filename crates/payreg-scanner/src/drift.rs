//! Drift between two payload-shape sets.

use payreg_core::{DriftReport, FxHashMap, FxHashSet, PayloadShape};

/// Compares the previous run's shapes with the current run's.
///
/// Shapes are keyed by `(method, path, function)`; when a set holds the same
/// key twice, the later shape wins. Only a signature difference on a key
/// present in both sets counts as `changed`.
///
/// `added` and `removed` hold one `METHOD path` entry per key. When several
/// handlers share a method and path, their entries use the
/// `METHOD path → function` form instead.
///
/// # Examples
///
/// ```
/// use payreg_core::{PayloadShape, RouteParameter};
/// use payreg_scanner::compute_drift;
///
/// let shape = |annotation: &str| PayloadShape {
///     method: "POST".to_owned(),
///     path: "/notes".to_owned(),
///     function: "create_note".to_owned(),
///     parameters: vec![RouteParameter::new("payload", annotation)],
///     ..PayloadShape::default()
/// };
///
/// let drift = compute_drift(&[shape("Note")], &[shape("NoteIn")]);
/// assert_eq!(drift.changed, vec!["POST /notes → create_note"]);
/// assert!(drift.added.is_empty() && drift.removed.is_empty());
/// ```
#[must_use]
pub fn compute_drift(previous: &[PayloadShape], current: &[PayloadShape]) -> DriftReport {
    let previous = index(previous);
    let current = index(current);
    let shared = shared_route_labels(&previous, &current);

    let added = labels(
        current.values().copied().filter(|s| !previous.contains_key(&s.identity_key())),
        &shared,
    );
    let removed = labels(
        previous.values().copied().filter(|s| !current.contains_key(&s.identity_key())),
        &shared,
    );

    let mut changed: Vec<String> = current
        .iter()
        .filter_map(|(key, shape)| {
            let before = previous.get(key)?;
            (before.normalized_signature() != shape.normalized_signature())
                .then(|| shape.handler_label())
        })
        .collect();
    changed.sort();

    DriftReport {
        added,
        removed,
        changed,
    }
}

fn index(shapes: &[PayloadShape]) -> FxHashMap<String, &PayloadShape> {
    shapes.iter().map(|s| (s.identity_key(), s)).collect()
}

/// Route labels carried by more than one handler across both sets.
fn shared_route_labels(
    previous: &FxHashMap<String, &PayloadShape>,
    current: &FxHashMap<String, &PayloadShape>,
) -> FxHashSet<String> {
    let mut handlers: FxHashMap<String, FxHashSet<&str>> = FxHashMap::default();
    for shape in previous.values().chain(current.values()) {
        handlers
            .entry(shape.route_label())
            .or_default()
            .insert(shape.function.as_str());
    }
    handlers
        .into_iter()
        .filter(|(_, functions)| functions.len() > 1)
        .map(|(label, _)| label)
        .collect()
}

/// One sorted label per shape; shared route labels name the handler.
fn labels<'a>(
    shapes: impl Iterator<Item = &'a PayloadShape>,
    shared: &FxHashSet<String>,
) -> Vec<String> {
    let mut labels: Vec<String> = shapes
        .map(|shape| {
            let label = shape.route_label();
            if shared.contains(&label) {
                shape.handler_label()
            } else {
                label
            }
        })
        .collect();
    labels.sort();
    labels
}

#[cfg(test)]
mod tests {
    use super::*;
    use payreg_core::RouteParameter;

    fn shape(method: &str, path: &str, function: &str, params: &[(&str, &str)]) -> PayloadShape {
        PayloadShape {
            method: method.to_owned(),
            path: path.to_owned(),
            function: function.to_owned(),
            parameters: params
                .iter()
                .map(|(n, a)| RouteParameter::new(*n, *a))
                .collect(),
            ..PayloadShape::default()
        }
    }

    #[test]
    fn test_identical_sets_have_no_drift() {
        let shapes = vec![shape("GET", "/a", "a", &[("q", "str")])];
        assert!(compute_drift(&shapes, &shapes).is_empty());
    }

    #[test]
    fn test_added_removed_changed_are_disjoint() {
        let previous = vec![
            shape("GET", "/keep", "keep", &[("q", "str")]),
            shape("POST", "/gone", "gone", &[]),
            shape("PUT", "/edit", "edit", &[("body", "Item")]),
        ];
        let current = vec![
            shape("GET", "/keep", "keep", &[("q", "str")]),
            shape("PUT", "/edit", "edit", &[("body", "ItemV2")]),
            shape("DELETE", "/new", "new", &[]),
        ];
        let drift = compute_drift(&previous, &current);
        assert_eq!(drift.added, vec!["DELETE /new"]);
        assert_eq!(drift.removed, vec!["POST /gone"]);
        assert_eq!(drift.changed, vec!["PUT /edit → edit"]);
    }

    #[test]
    fn test_parameter_order_is_not_a_change() {
        let previous = vec![shape("GET", "/a", "a", &[("x", "int"), ("y", "str")])];
        let current = vec![shape("GET", "/a", "a", &[("y", "str"), ("x", "int")])];
        assert!(compute_drift(&previous, &current).is_empty());
    }

    #[test]
    fn test_handler_rename_names_both_handlers() {
        let previous = vec![shape("GET", "/a", "old_name", &[])];
        let current = vec![shape("GET", "/a", "new_name", &[])];
        let drift = compute_drift(&previous, &current);
        assert_eq!(drift.added, vec!["GET /a → new_name"]);
        assert_eq!(drift.removed, vec!["GET /a → old_name"]);
        assert!(drift.changed.is_empty());
    }

    #[test]
    fn test_handlers_sharing_a_route_are_distinct_entries() {
        let current = vec![
            shape("POST", "/b", "two", &[]),
            shape("POST", "/b", "one", &[]),
            shape("GET", "/a", "a", &[]),
        ];
        let drift = compute_drift(&[], &current);
        assert_eq!(drift.added, vec!["GET /a", "POST /b → one", "POST /b → two"]);
    }

    #[test]
    fn test_added_count_matches_new_handlers() {
        let current = vec![
            shape("GET", "/items", "list_items", &[]),
            shape("GET", "/items", "list_items_v2", &[]),
        ];
        let drift = compute_drift(&[], &current);
        assert_eq!(drift.added.len(), 2);
        assert!(drift.removed.is_empty());
    }

    #[test]
    fn test_duplicate_identity_later_entry_wins() {
        let previous = vec![shape("GET", "/a", "a", &[("q", "int")])];
        let current = vec![
            shape("GET", "/a", "a", &[("q", "str")]),
            shape("GET", "/a", "a", &[("q", "int")]),
        ];
        assert!(compute_drift(&previous, &current).is_empty());
    }

    #[test]
    fn test_model_fallback_in_signature() {
        let mut before = shape("POST", "/n", "n", &[("body", "")]);
        before.parameters[0].model = Some("Note".to_owned());
        let after = shape("POST", "/n", "n", &[("body", "")]);
        let drift = compute_drift(&[before], &[after]);
        assert_eq!(drift.changed, vec!["POST /n → n"]);
    }
}
