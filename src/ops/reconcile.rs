use tracing::debug;

use crate::model::event::ChangeEvent;
use crate::model::schema::{CanonicalSchema, FieldPath, FieldPolicy};
use crate::model::value::{PrefMap, PrefValue};

/// A persisted value dropped because its shape no longer matched the schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Discarded {
    pub path: FieldPath,
    pub value: PrefValue,
}

/// Result of reconciling a persisted tree against a schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    /// The reconciled tree. Always an object.
    pub tree: PrefValue,
    /// Structural changes, depth-first in schema declaration order.
    pub events: Vec<ChangeEvent>,
    /// Stale values removed from the persisted tree, one per `FormatMigrated` event.
    pub discarded: Vec<Discarded>,
}

impl Reconciliation {
    /// True when the tree differs structurally from what was persisted,
    /// i.e. when it should be written back.
    pub fn changed(&self) -> bool {
        !self.events.is_empty()
    }
}

/// Reconcile a persisted preference tree against the canonical schema.
///
/// An absent tree is a first run: the schema defaults are returned with no
/// events. Otherwise every schema field is checked in declaration order and
/// fields the schema does not know are carried through. The persisted tree
/// is consumed; values that need no change are moved into the result as-is.
///
/// Never fails. A value whose shape cannot be used is discarded, reported as
/// `FormatMigrated`, and returned in [`Reconciliation::discarded`].
pub fn reconcile(persisted: Option<PrefValue>, schema: &CanonicalSchema) -> Reconciliation {
    let mut walk = Walk {
        schema,
        events: Vec::new(),
        discarded: Vec::new(),
    };
    let root = FieldPath::root();

    let tree = match persisted {
        None => schema.default_tree(),
        Some(PrefValue::Object(map)) => PrefValue::Object(walk.object(map, schema.defaults(), &root)),
        Some(other) => {
            walk.migrate(&root, other);
            schema.default_tree()
        }
    };

    Reconciliation {
        tree,
        events: walk.events,
        discarded: walk.discarded,
    }
}

struct Walk<'a> {
    schema: &'a CanonicalSchema,
    events: Vec<ChangeEvent>,
    discarded: Vec<Discarded>,
}

impl Walk<'_> {
    fn object(&mut self, mut persisted: PrefMap, defaults: &PrefMap, parent: &FieldPath) -> PrefMap {
        let schema = self.schema;
        for (key, default) in defaults {
            let path = parent.child(key);
            match schema.policy_for(&path) {
                FieldPolicy::UserOwned => {}
                FieldPolicy::PreserveIfDiverged { baseline } => {
                    let current = self.take_usable(&mut persisted, key, default, &path);
                    let value = match current {
                        Some(existing) if existing != *baseline => existing,
                        Some(existing) if existing == *default => existing,
                        _ => self.install(path, default),
                    };
                    persisted.insert(key.clone(), value);
                }
                FieldPolicy::Generic => {
                    let current = self.take_usable(&mut persisted, key, default, &path);
                    let value = match (default, current) {
                        (PrefValue::Object(sub), Some(PrefValue::Object(existing))) => {
                            PrefValue::Object(self.object(existing, sub, &path))
                        }
                        (PrefValue::Object(_), None) => default.clone(),
                        (_, Some(existing)) => existing,
                        (_, None) => self.install(path, default),
                    };
                    persisted.insert(key.clone(), value);
                }
            }
        }
        persisted
    }

    /// Move the value at `key` out of `map`, leaving a placeholder in its
    /// slot so a later insert keeps the key's position. Values whose shape
    /// does not match `default` are discarded and come back as `None`.
    fn take_usable(
        &mut self,
        map: &mut PrefMap,
        key: &str,
        default: &PrefValue,
        path: &FieldPath,
    ) -> Option<PrefValue> {
        match map.get_mut(key).map(std::mem::take) {
            Some(value) if !value.is_compatible_with(default) => {
                self.migrate(path, value);
                None
            }
            other => other,
        }
    }

    fn migrate(&mut self, path: &FieldPath, value: PrefValue) {
        debug!(path = %path, found = %value.kind(), "discarding stale format");
        self.events.push(ChangeEvent::FormatMigrated {
            path: path.clone(),
            found: value.kind(),
        });
        self.discarded.push(Discarded {
            path: path.clone(),
            value,
        });
    }

    fn install(&mut self, path: FieldPath, default: &PrefValue) -> PrefValue {
        debug!(path = %path, "installing default");
        self.events.push(ChangeEvent::FieldAdded {
            path,
            value: default.clone(),
        });
        default.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::value::ValueKind;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn tree(v: serde_json::Value) -> PrefValue {
        v.into()
    }

    fn schema(v: serde_json::Value) -> CanonicalSchema {
        match PrefValue::from(v) {
            PrefValue::Object(map) => CanonicalSchema::new(map),
            _ => panic!("schema literal must be an object"),
        }
    }

    fn added(path: &str, value: serde_json::Value) -> ChangeEvent {
        ChangeEvent::FieldAdded {
            path: FieldPath::from(path),
            value: value.into(),
        }
    }

    fn migrated(path: &str, found: ValueKind) -> ChangeEvent {
        ChangeEvent::FormatMigrated {
            path: FieldPath::from(path),
            found,
        }
    }

    #[test]
    fn fresh_install_returns_defaults_without_events() {
        let s = schema(json!({"theme": "system", "tasks": []}));
        let result = reconcile(None, &s);
        assert_eq!(result.tree, tree(json!({"theme": "system", "tasks": []})));
        assert!(result.events.is_empty());
        assert!(!result.changed());
    }

    #[test]
    fn additive_nested_field() {
        let s = schema(json!({"settings": {"appBadge": false}}));
        let result = reconcile(Some(tree(json!({"settings": {}}))), &s);
        assert_eq!(result.tree, tree(json!({"settings": {"appBadge": false}})));
        assert_eq!(result.events, vec![added("settings.appBadge", json!(false))]);
        assert!(result.changed());
    }

    #[test]
    fn legacy_array_settings_are_migrated() {
        let s = schema(json!({"settings": {"enableGlow": true, "appBadge": false}}));
        let persisted = tree(json!({"settings": [{"enableGlow": false}]}));
        let result = reconcile(Some(persisted), &s);
        assert_eq!(
            result.tree,
            tree(json!({"settings": {"enableGlow": true, "appBadge": false}}))
        );
        assert_eq!(result.events, vec![migrated("settings", ValueKind::Array)]);
        assert_eq!(
            result.discarded,
            vec![Discarded {
                path: FieldPath::from("settings"),
                value: tree(json!([{"enableGlow": false}])),
            }]
        );
    }

    #[test]
    fn present_values_are_kept() {
        let s = schema(json!({"theme": "system", "darkmode": "auto", "tasks": []}));
        let persisted = tree(json!({"theme": "Blue", "darkmode": "dark", "tasks": [{"id": 1}]}));
        let result = reconcile(Some(persisted.clone()), &s);
        assert_eq!(result.tree, persisted);
        assert!(result.events.is_empty());
    }

    #[test]
    fn null_scalar_is_present() {
        let s = schema(json!({"name": "anon"}));
        let result = reconcile(Some(tree(json!({"name": null}))), &s);
        assert_eq!(result.tree, tree(json!({"name": null})));
        assert!(result.events.is_empty());
    }

    #[test]
    fn scalar_with_container_shape_is_migrated_then_added() {
        let s = schema(json!({"voiceVolume": 0.6}));
        let result = reconcile(Some(tree(json!({"voiceVolume": {"level": 3}}))), &s);
        assert_eq!(result.tree, tree(json!({"voiceVolume": 0.6})));
        assert_eq!(
            result.events,
            vec![
                migrated("voiceVolume", ValueKind::Object),
                added("voiceVolume", json!(0.6)),
            ]
        );
    }

    #[test]
    fn unknown_fields_survive_in_place() {
        let s = schema(json!({"theme": "system", "settings": {"appBadge": false}}));
        let persisted = tree(json!({
            "future": {"x": 1},
            "theme": "dark",
            "settings": {"experimental": true}
        }));
        let result = reconcile(Some(persisted), &s);
        assert_eq!(
            result.tree,
            tree(json!({
                "future": {"x": 1},
                "theme": "dark",
                "settings": {"experimental": true, "appBadge": false}
            }))
        );
        let keys: Vec<&String> = result.tree.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["future", "theme", "settings"]);
    }

    #[test]
    fn migrated_field_keeps_its_position() {
        let s = schema(json!({"a": 1, "settings": {"x": true}, "b": 2}));
        let persisted = tree(json!({"settings": "old", "a": 5, "b": 6}));
        let result = reconcile(Some(persisted), &s);
        let keys: Vec<&String> = result.tree.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["settings", "a", "b"]);
    }

    #[test]
    fn user_owned_field_is_never_touched() {
        let s = schema(json!({"categories": [{"name": "Home"}], "theme": "system"}))
            .with_policy("categories", FieldPolicy::UserOwned);

        let odd = tree(json!({"categories": "not even a list", "theme": "dark"}));
        let result = reconcile(Some(odd.clone()), &s);
        assert_eq!(result.tree, odd);
        assert!(result.events.is_empty());

        let missing = tree(json!({"theme": "dark"}));
        let result = reconcile(Some(missing.clone()), &s);
        assert_eq!(result.tree, missing);
        assert!(result.tree.lookup("categories").is_none());
        assert!(result.events.is_empty());
    }

    fn palette_schema() -> CanonicalSchema {
        schema(json!({"colorList": ["#A", "#B", "#C"]})).with_policy(
            "colorList",
            FieldPolicy::PreserveIfDiverged {
                baseline: tree(json!(["#A", "#B"])),
            },
        )
    }

    #[test]
    fn factory_palette_is_upgraded() {
        let result = reconcile(Some(tree(json!({"colorList": ["#A", "#B"]}))), &palette_schema());
        assert_eq!(result.tree, tree(json!({"colorList": ["#A", "#B", "#C"]})));
        assert_eq!(result.events, vec![added("colorList", json!(["#A", "#B", "#C"]))]);
    }

    #[test]
    fn customized_palette_is_preserved() {
        for custom in [json!(["#A", "#Z"]), json!(["#A"]), json!(["#A", "#B", "#Q"])] {
            let persisted = tree(json!({ "colorList": custom.clone() }));
            let result = reconcile(Some(persisted.clone()), &palette_schema());
            assert_eq!(result.tree, persisted);
            assert!(result.events.is_empty());
        }
    }

    #[test]
    fn missing_palette_gets_current_default() {
        let result = reconcile(Some(tree(json!({}))), &palette_schema());
        assert_eq!(result.tree, tree(json!({"colorList": ["#A", "#B", "#C"]})));
        assert_eq!(result.events, vec![added("colorList", json!(["#A", "#B", "#C"]))]);
    }

    #[test]
    fn current_palette_is_stable() {
        let persisted = tree(json!({"colorList": ["#A", "#B", "#C"]}));
        let result = reconcile(Some(persisted.clone()), &palette_schema());
        assert_eq!(result.tree, persisted);
        assert!(result.events.is_empty());
    }

    #[test]
    fn palette_with_wrong_shape_is_migrated() {
        let result = reconcile(Some(tree(json!({"colorList": "#A,#B"}))), &palette_schema());
        assert_eq!(result.tree, tree(json!({"colorList": ["#A", "#B", "#C"]})));
        assert_eq!(
            result.events,
            vec![
                migrated("colorList", ValueKind::String),
                added("colorList", json!(["#A", "#B", "#C"])),
            ]
        );
    }

    #[test]
    fn non_object_root_is_migrated() {
        let s = schema(json!({"theme": "system"}));
        let result = reconcile(Some(tree(json!(["theme", "dark"]))), &s);
        assert_eq!(result.tree, tree(json!({"theme": "system"})));
        assert_eq!(result.events, vec![migrated("$", ValueKind::Array)]);
        assert!(result.discarded[0].path.is_root());
    }

    #[test]
    fn missing_sub_object_is_installed_silently() {
        let s = schema(json!({"theme": "system", "settings": {"appBadge": false}}));
        let result = reconcile(Some(tree(json!({"theme": "dark"}))), &s);
        assert_eq!(
            result.tree,
            tree(json!({"theme": "dark", "settings": {"appBadge": false}}))
        );
        assert!(result.events.is_empty());
    }

    #[test]
    fn events_are_depth_first_in_declaration_order() {
        let s = schema(json!({
            "a": 1,
            "nested": {"x": 1, "deeper": {"y": 2}, "z": 3},
            "b": 2
        }));
        let persisted = tree(json!({"nested": {"deeper": {}}}));
        let result = reconcile(Some(persisted), &s);
        let paths: Vec<String> = result.events.iter().map(|e| e.path().to_string()).collect();
        assert_eq!(paths, vec!["a", "nested.x", "nested.deeper.y", "nested.z", "b"]);
    }

    #[test]
    fn nested_policy_by_dotted_path() {
        let s = schema(json!({"settings": {"voice": "default", "volume": 1}}))
            .with_policy("settings.voice", FieldPolicy::UserOwned);
        let result = reconcile(Some(tree(json!({"settings": {}}))), &s);
        assert_eq!(result.tree, tree(json!({"settings": {"volume": 1}})));
        assert_eq!(result.events, vec![added("settings.volume", json!(1))]);
    }

    #[test]
    fn reconciling_output_again_is_a_no_op() {
        let s = schema(json!({"theme": "system", "settings": {"appBadge": false, "voice": "x"}}));
        let first = reconcile(Some(tree(json!({"settings": [1, 2], "extra": true}))), &s);
        assert!(first.changed());
        let second = reconcile(Some(first.tree.clone()), &s);
        assert_eq!(second.tree, first.tree);
        assert!(second.events.is_empty());
        assert!(second.discarded.is_empty());
    }
}
