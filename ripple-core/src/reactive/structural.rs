//! Structural helpers.
//!
//! Installed accessors only see writes to keys that already exist. Adding a
//! key, removing one, or writing a sequence index goes through [`set`] and
//! [`del`] instead, which notify the container's structural Dep.

use crate::config;
use crate::error::{ObserveError, Result};
use crate::value::{Container, Key, Value};

use super::dep::{NotifyMeta, TriggerKind};
use super::observer::{observe_with, ObserveOptions};
use super::property::install_reactive_property;

/// Largest index a sequence accepts. Lengths stay below 2^32.
const MAX_INDEX: usize = u32::MAX as usize - 1;

/// The index `key` addresses, and the same index as a splice start.
fn sequence_index(key: &Key) -> Option<(usize, isize)> {
    let index = key.as_index().filter(|&index| index <= MAX_INDEX)?;
    let start = isize::try_from(index).ok()?;
    Some((index, start))
}

/// Set `key` on `target`, making it reactive if `target` is observed.
///
/// Returns the written value. On error nothing was written.
pub fn set(target: &Value, key: impl Into<Key>, value: impl Into<Value>) -> Result<Value> {
    let key = key.into();
    let value = value.into();

    let Some(container) = target.as_container() else {
        return Err(ObserveError::InvalidTargetKind {
            op: "set",
            kind: target.kind(),
        }
        .reported());
    };
    if container.is_readonly() {
        return Err(ObserveError::ReadonlyViolation { key }.reported());
    }
    let observer = container.observer();

    match container {
        Container::Array(array) => {
            let Some((index, start)) = sequence_index(&key) else {
                return Err(ObserveError::InvalidKey { key }.reported());
            };
            if array.try_set_len(array.len().max(index)).is_err() {
                return Err(ObserveError::InvalidKey { key }.reported());
            }
            array.splice(start, Some(1), [value.clone()]);

            // Mock observers leave native methods in place, so nothing
            // observed the new element yet.
            if let Some(observer) = &observer {
                if !observer.is_shallow() && observer.is_mock() {
                    observe_with(&value, ObserveOptions::mock());
                }
            }
            Ok(value)
        }
        Container::Object(object) => {
            let name = key.to_name();
            if object.has_own(&name) {
                object.set(&name, value.clone());
                return Ok(value);
            }
            if !object.is_extensible() {
                return Err(ObserveError::NotExtensible { key }.reported());
            }
            let Some(observer) = observer else {
                object.set(&name, value.clone());
                return Ok(value);
            };
            if observer.vm_count() > 0 {
                return Err(ObserveError::UnsupportedRootMutation { key }.reported());
            }

            if install_reactive_property(&object, &name, Some(value.clone()), None, observer.options())
                .is_none()
            {
                return Err(ObserveError::NotExtensible { key }.reported());
            }
            observer
                .dep()
                .notify(NotifyMeta::new(TriggerKind::Add).with_key(key));
            Ok(value)
        }
    }
}

/// Delete `key` from `target`, notifying if `target` is observed.
///
/// Deleting a key that is not there, or an index past the end of a
/// sequence, is a silent no-op.
pub fn del(target: &Value, key: impl Into<Key>) -> Result<()> {
    let key = key.into();

    let Some(container) = target.as_container() else {
        return Err(ObserveError::InvalidTargetKind {
            op: "delete",
            kind: target.kind(),
        }
        .reported());
    };
    let observer = container.observer();
    if observer.as_ref().is_some_and(|o| o.vm_count() > 0) {
        return Err(ObserveError::UnsupportedRootMutation { key }.reported());
    }
    if container.is_readonly() {
        return Err(ObserveError::ReadonlyViolation { key }.reported());
    }

    match container {
        Container::Array(array) => {
            let start = key
                .as_index()
                .filter(|&index| index < array.len())
                .and_then(|index| isize::try_from(index).ok());
            match start {
                Some(start) => {
                    array.splice(start, Some(1), []);
                }
                None => {
                    if config::is_verbose() {
                        tracing::debug!(%key, "sequence has no element at key; nothing to delete");
                    }
                }
            }
        }
        Container::Object(object) => {
            let name = key.to_name();
            if !object.has_own(&name) {
                if config::is_verbose() {
                    tracing::debug!(%key, "no such key; nothing to delete");
                }
                return Ok(());
            }
            if !object.remove(&name) {
                if config::is_verbose() {
                    tracing::debug!(%key, "non-configurable property not deleted");
                }
                return Ok(());
            }
            if let Some(observer) = observer {
                observer
                    .dep()
                    .notify(NotifyMeta::new(TriggerKind::Delete).with_key(key));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::{bind_root_state, observe, Watcher};
    use crate::value::{Array, Object};
    use serde_json::json;

    fn watch_structure(value: &Value) -> Watcher {
        let container = value.as_container().unwrap();
        Watcher::new(move || {
            if let Some(observer) = container.observer() {
                observer.dep().depend();
            }
            Value::Null
        })
    }

    #[test]
    fn set_adds_reactive_key_and_notifies_once() {
        let value = Value::from(json!({ "a": 1 }));
        observe(&value);
        let structure = watch_structure(&value);

        assert_eq!(set(&value, "newKey", 5), Ok(Value::from(5)));
        assert_eq!(structure.update_count(), 1);

        let obj = value.as_object().unwrap().clone();
        let reader = Watcher::new(move || obj.get("newKey").unwrap_or_default());
        assert_eq!(reader.value(), Value::from(5));

        value.as_object().unwrap().set("newKey", 6);
        assert_eq!(reader.update_count(), 1);
        assert_eq!(structure.update_count(), 1);
    }

    #[test]
    fn set_existing_key_goes_through_accessor() {
        let value = Value::from(json!({ "a": 1 }));
        observe(&value);
        let structure = watch_structure(&value);
        let obj = value.as_object().unwrap().clone();
        let reader = Watcher::new(move || obj.get("a").unwrap_or_default());

        set(&value, "a", 2).unwrap();
        assert_eq!(reader.update_count(), 1);
        assert_eq!(structure.update_count(), 0);
    }

    #[test]
    fn set_on_unobserved_target_is_plain_assignment() {
        let obj = Object::new();
        let value = Value::from(obj.clone());
        set(&value, "a", 1).unwrap();
        assert!(matches!(obj.descriptor("a"), Some(crate::value::Property::Data { .. })));
    }

    #[test]
    fn set_rejects_primitives_and_readonly() {
        assert_eq!(
            set(&Value::from(3), "a", 1),
            Err(ObserveError::InvalidTargetKind { op: "set", kind: "number" })
        );
        assert!(matches!(
            set(&Value::Null, "a", 1),
            Err(ObserveError::InvalidTargetKind { kind: "null", .. })
        ));

        let obj = Object::new();
        obj.mark_readonly();
        assert_eq!(
            set(&Value::from(obj.clone()), "a", 1),
            Err(ObserveError::ReadonlyViolation { key: Key::from("a") })
        );
        assert!(!obj.has_own("a"));
    }

    #[test]
    fn set_refuses_new_keys_on_root_state() {
        let value = Value::from(json!({ "a": 1 }));
        bind_root_state(&value);
        assert_eq!(
            set(&value, "b", 2),
            Err(ObserveError::UnsupportedRootMutation { key: Key::from("b") })
        );
        assert!(!value.as_object().unwrap().has_own("b"));

        // Existing keys are still writable
        assert_eq!(set(&value, "a", 3), Ok(Value::from(3)));
    }

    #[test]
    fn set_index_routes_through_splice() {
        let value = Value::from(json!([1, 2, 3]));
        observe(&value);
        let structure = watch_structure(&value);

        set(&value, 0, 9).unwrap();
        let array = value.as_array().unwrap();
        assert_eq!(array.get(0), Some(Value::from(9)));
        assert_eq!(array.len(), 3);
        assert_eq!(structure.update_count(), 1);
    }

    #[test]
    fn set_index_past_the_end_extends() {
        let array: Array = [1].into_iter().collect();
        let value = Value::from(array.clone());
        set(&value, 3, 4).unwrap();
        assert_eq!(array.len(), 4);
        assert_eq!(array.get(1), Some(Value::Null));
        assert_eq!(array.get(3), Some(Value::from(4)));
    }

    #[test]
    fn set_index_on_mock_array_observes_value() {
        let value = Value::from(json!([1]));
        crate::reactive::observe_with(&value, ObserveOptions::mock());
        let item = Value::from(json!({ "x": 1 }));
        set(&value, 0, item.clone()).unwrap();
        assert!(item.as_object().unwrap().observer().unwrap().is_mock());
    }

    #[test]
    fn set_index_beyond_sequence_bound_is_rejected() {
        let value = Value::from(json!([1]));
        observe(&value);
        let structure = watch_structure(&value);

        assert_eq!(
            set(&value, usize::MAX, 5),
            Err(ObserveError::InvalidKey { key: Key::Index(usize::MAX) })
        );
        assert!(matches!(
            set(&value, Key::Index(MAX_INDEX + 1), 5),
            Err(ObserveError::InvalidKey { .. })
        ));
        assert_eq!(value.as_array().unwrap().to_vec(), vec![Value::from(1)]);
        assert_eq!(structure.update_count(), 0);
    }

    #[test]
    fn set_new_key_on_sealed_object_writes_nothing() {
        let value = Value::from(json!({ "a": 1 }));
        observe(&value);
        let structure = watch_structure(&value);
        let obj = value.as_object().unwrap();
        obj.prevent_extensions();

        assert_eq!(
            set(&value, "b", 2),
            Err(ObserveError::NotExtensible { key: Key::from("b") })
        );
        assert!(!obj.has_own("b"));
        assert_eq!(structure.update_count(), 0);

        // Existing keys can still be written
        assert_eq!(set(&value, "a", 3), Ok(Value::from(3)));
    }

    #[test]
    fn set_on_shallow_observer_adds_shallow_key() {
        let value = Value::from(json!({}));
        crate::reactive::observe_with(&value, ObserveOptions::shallow());
        let child = Value::from(json!({ "x": 1 }));

        set(&value, "child", child.clone()).unwrap();
        assert!(child.as_object().unwrap().observer().is_none());

        let obj = value.as_object().unwrap().clone();
        let reader = Watcher::new(move || obj.get("child").unwrap_or_default());
        value.as_object().unwrap().set("child", 2);
        assert_eq!(reader.update_count(), 1);
    }

    #[test]
    fn set_named_key_on_sequence_is_rejected() {
        let value = Value::from(json!([1]));
        assert_eq!(
            set(&value, "len", 2),
            Err(ObserveError::InvalidKey { key: Key::from("len") })
        );
    }

    #[test]
    fn del_removes_key_and_notifies_once() {
        let value = Value::from(json!({ "a": 1, "b": 2 }));
        observe(&value);
        let structure = watch_structure(&value);

        del(&value, "a").unwrap();
        assert!(!value.as_object().unwrap().has_own("a"));
        assert_eq!(structure.update_count(), 1);

        del(&value, "missing").unwrap();
        assert_eq!(structure.update_count(), 1);
    }

    #[test]
    fn del_index_routes_through_splice() {
        let value = Value::from(json!([1, 2, 3]));
        observe(&value);
        let structure = watch_structure(&value);

        del(&value, 1).unwrap();
        let array = value.as_array().unwrap();
        assert_eq!(array.to_vec(), vec![Value::from(1), Value::from(3)]);
        assert_eq!(structure.update_count(), 1);
    }

    #[test]
    fn del_past_the_end_leaves_sequence_alone() {
        let value = Value::from(json!([1, 2, 3]));
        observe(&value);
        let structure = watch_structure(&value);
        let all = vec![Value::from(1), Value::from(2), Value::from(3)];

        del(&value, usize::MAX).unwrap();
        assert_eq!(value.as_array().unwrap().to_vec(), all);

        del(&value, "18446744073709551615").unwrap();
        assert_eq!(value.as_array().unwrap().to_vec(), all);

        del(&value, 3).unwrap();
        assert_eq!(value.as_array().unwrap().to_vec(), all);
        assert_eq!(structure.update_count(), 0);
    }

    #[test]
    fn del_refuses_root_state_and_readonly() {
        let root = Value::from(json!({ "a": 1 }));
        bind_root_state(&root);
        assert!(matches!(del(&root, "a"), Err(ObserveError::UnsupportedRootMutation { .. })));
        assert!(root.as_object().unwrap().has_own("a"));

        let obj: Object = [("a", 1)].into_iter().collect();
        obj.mark_readonly();
        assert!(matches!(
            del(&Value::from(obj.clone()), "a"),
            Err(ObserveError::ReadonlyViolation { .. })
        ));
        assert!(obj.has_own("a"));

        assert!(matches!(
            del(&Value::from(true), "a"),
            Err(ObserveError::InvalidTargetKind { op: "delete", .. })
        ));
    }

    #[test]
    fn del_on_unobserved_target_just_deletes() {
        let obj: Object = [("a", 1)].into_iter().collect();
        del(&Value::from(obj.clone()), "a").unwrap();
        assert!(obj.is_empty());
    }
}
