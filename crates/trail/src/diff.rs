//! Before/after property map comparison.

use std::collections::BTreeSet;

use rmaudit_core::{PropertyMap, PropertyValue, QName};

/// One property's value before and after an event.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyChange {
    pub name: QName,
    pub before: Option<PropertyValue>,
    pub after: Option<PropertyValue>,
}

/// Remove every ignored property from `map`.
pub fn strip_ignored(map: &mut PropertyMap, ignored: &BTreeSet<QName>) {
    if !ignored.is_empty() {
        map.retain(|name, _| !ignored.contains(name));
    }
}

/// The persisted delta: properties removed, added or changed.
///
/// Properties with equal values on both sides are left out of both maps.
pub fn changes_only(before: &PropertyMap, after: &PropertyMap) -> (PropertyMap, PropertyMap) {
    let mut before_delta = PropertyMap::new();
    let mut after_delta = PropertyMap::new();

    for (name, old) in before {
        match after.get(name) {
            Some(new) if new == old => {}
            Some(new) => {
                before_delta.insert(name.clone(), old.clone());
                after_delta.insert(name.clone(), new.clone());
            }
            None => {
                before_delta.insert(name.clone(), old.clone());
            }
        }
    }
    for (name, new) in after {
        if !before.contains_key(name) {
            after_delta.insert(name.clone(), new.clone());
        }
    }
    (before_delta, after_delta)
}

/// Per-property pairs over the union of both maps.
///
/// Every key of `before` comes first, then keys seen only in `after`. Equal
/// values are kept.
pub fn changed_properties(before: &PropertyMap, after: &PropertyMap) -> Vec<PropertyChange> {
    let mut changes: Vec<PropertyChange> = before
        .iter()
        .map(|(name, old)| PropertyChange {
            name: name.clone(),
            before: Some(old.clone()),
            after: after.get(name).cloned(),
        })
        .collect();
    changes.extend(
        after
            .iter()
            .filter(|(name, _)| !before.contains_key(*name))
            .map(|(name, new)| PropertyChange {
                name: name.clone(),
                before: None,
                after: Some(new.clone()),
            }),
    );
    changes
}
