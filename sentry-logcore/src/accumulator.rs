use std::sync::Arc;

use sentry_core::protocol::{Context, Value};

use crate::field::{ErrorValue, Field, FieldSet, FieldValue};
use crate::scope::Scope;

/// Everything a logger context has collected from its fields so far.
///
/// Snapshots are never modified; [`extend`](Self::extend) builds a new one
/// so sibling contexts derived from the same parent cannot observe each
/// other.
#[derive(Clone, Debug, Default)]
pub(crate) struct Accumulated {
    pub fields: FieldSet<Value>,
    pub tags: FieldSet<String>,
    pub contexts: FieldSet<Context>,
    /// Oldest first.
    pub errors: Arc<Vec<ErrorValue>>,
    pub scope: Option<Arc<Scope>>,
}

impl Accumulated {
    /// Folds `fields` into a new snapshot.
    ///
    /// Returns `None` when there is nothing to fold, in which case the
    /// current snapshot should be used as is. Logger names are only kept
    /// when `name_key` is set.
    pub fn extend(&self, fields: &[Field], name_key: Option<&str>) -> Option<Accumulated> {
        if fields.is_empty() {
            return None;
        }

        let mut values = Vec::with_capacity(fields.len());
        let mut tags = Vec::new();
        let mut contexts = Vec::new();
        let mut errors = Vec::new();
        let mut scope = self.scope.clone();

        for field in fields {
            match &field.value {
                FieldValue::Value(value) => values.push((field.key.clone(), value.clone())),
                FieldValue::Error(err) => {
                    values.push((field.key.clone(), Value::String(err.to_string())));
                    errors.push(err.clone());
                }
                FieldValue::Errors(errs) => {
                    let messages = errs.iter().map(|err| Value::String(err.to_string())).collect();
                    values.push((field.key.clone(), Value::Array(messages)));
                    errors.extend(errs.iter().cloned());
                }
                FieldValue::Scope(local) => scope = Some(local.clone()),
                FieldValue::Tag(value) => tags.push((field.key.clone(), value.clone())),
                FieldValue::Context(context) => contexts.push((field.key.clone(), context.clone())),
                FieldValue::LoggerName(name) => {
                    if let Some(key) = name_key {
                        values.push((key.to_owned(), Value::String(name.clone())));
                    }
                }
                FieldValue::Skip => {}
            }
        }

        let errors = if errors.is_empty() {
            self.errors.clone()
        } else {
            Arc::new(self.errors.iter().cloned().chain(errors).collect())
        };

        Some(Accumulated {
            fields: self.fields.extend(values),
            tags: self.tags.extend(tags),
            contexts: self.contexts.extend(contexts),
            errors,
            scope,
        })
    }
}
