//! The task manager's factory user object.
//!
//! This is the canonical schema the CLI reconciles against. Changing a
//! default here is a schema change: existing stores pick it up on the next
//! `prefmend reconcile`.

use serde_json::json;

use super::schema::{CanonicalSchema, FieldPolicy};
use super::value::{PrefMap, PrefValue};

/// Field holding user-authored task categories.
pub const CATEGORIES_FIELD: &str = "categories";

/// Field holding the color palette offered in the task color picker.
pub const COLOR_LIST_FIELD: &str = "colorList";

/// Palette shipped with the first release. A stored palette equal to this
/// has never been customized and may be upgraded to [`COLOR_LIST`].
pub const FACTORY_COLOR_LIST: &[&str] = &[
    "#FF3131", "#FF914D", "#FFBD59", "#FFDE59", "#7ED957", "#00BF63", "#0CC0DF", "#5271FF",
    "#8C52FF", "#CB6CE6", "#FF66C4", "#A6A6A6",
];

/// Current default palette: the factory palette plus colors added since.
pub const COLOR_LIST: &[&str] = &[
    "#FF3131", "#FF914D", "#FFBD59", "#FFDE59", "#7ED957", "#00BF63", "#0CC0DF", "#5271FF",
    "#8C52FF", "#CB6CE6", "#FF66C4", "#A6A6A6", "#3D3D3D", "#B5651D",
];

pub fn palette(colors: &[&str]) -> PrefValue {
    PrefValue::Array(colors.iter().map(|c| PrefValue::from(*c)).collect())
}

fn default_categories() -> serde_json::Value {
    json!([
        {"id": "fcb4e2ec-6bc4-4d1e-9d8c-0f9a1e51b0a1", "name": "Home", "emoji": "1f3e0", "color": "#1A8FFF"},
        {"id": "ad2f3c3e-8b4e-4a5b-a6d1-2c3e3b9a1f02", "name": "Work", "emoji": "1f3e2", "color": "#FF8C1A"},
        {"id": "7d4a1c62-3b61-4f0e-93c5-5ab2c8e1d603", "name": "Personal", "emoji": "1f464", "color": "#E843FE"},
        {"id": "0f8d2a7b-6e14-4c2d-b1b6-9e4f5d7c8a04", "name": "Health/Fitness", "emoji": "1f4aa", "color": "#34C759"},
        {"id": "b9e6c3d5-1a27-4f89-8d0e-6c7b5a4e3f05", "name": "Education", "emoji": "1f4da", "color": "#7346FF"}
    ])
}

fn default_user() -> PrefMap {
    let tree: PrefValue = json!({
        "name": null,
        "profilePicture": null,
        "emojisStyle": "apple",
        "tasks": [],
        "categories": default_categories(),
        "colorList": COLOR_LIST,
        "settings": {
            "enableCategories": true,
            "doneToBottom": false,
            "enableGlow": true,
            "simpleEmojiPicker": false,
            "enableReadAloud": true,
            "appBadge": false,
            "voice": "Google UK English Male::en-GB",
            "voiceVolume": 0.6
        },
        "theme": "system",
        "darkmode": "auto"
    })
    .into();

    match tree {
        PrefValue::Object(map) => map,
        _ => unreachable!("default user literal is an object"),
    }
}

/// The canonical user schema with its field exceptions.
pub fn user_schema() -> CanonicalSchema {
    CanonicalSchema::new(default_user())
        .with_policy(CATEGORIES_FIELD, FieldPolicy::UserOwned)
        .with_policy(
            COLOR_LIST_FIELD,
            FieldPolicy::PreserveIfDiverged {
                baseline: palette(FACTORY_COLOR_LIST),
            },
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::schema::FieldPath;

    #[test]
    fn schema_declares_expected_fields() {
        let schema = user_schema();
        let keys: Vec<&str> = schema.defaults().keys().map(|k| k.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "name",
                "profilePicture",
                "emojisStyle",
                "tasks",
                "categories",
                "colorList",
                "settings",
                "theme",
                "darkmode",
            ]
        );
        let tree = schema.default_tree();
        assert_eq!(tree.lookup("settings.appBadge"), Some(&PrefValue::Bool(false)));
        assert_eq!(tree.lookup("theme").and_then(|v| v.as_str()), Some("system"));
    }

    #[test]
    fn current_palette_extends_factory_palette() {
        assert!(COLOR_LIST.len() > FACTORY_COLOR_LIST.len());
        assert_eq!(&COLOR_LIST[..FACTORY_COLOR_LIST.len()], FACTORY_COLOR_LIST);
        let schema = user_schema();
        assert_eq!(schema.defaults()[COLOR_LIST_FIELD], palette(COLOR_LIST));
    }

    #[test]
    fn exception_policies() {
        let schema = user_schema();
        assert_eq!(
            schema.policy_for(&FieldPath::from(CATEGORIES_FIELD)),
            &FieldPolicy::UserOwned
        );
        assert_eq!(
            schema.policy_for(&FieldPath::from(COLOR_LIST_FIELD)),
            &FieldPolicy::PreserveIfDiverged {
                baseline: palette(FACTORY_COLOR_LIST)
            }
        );
    }
}
