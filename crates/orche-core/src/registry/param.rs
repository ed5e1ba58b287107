//! Parameter bindings per (class, method).

use std::collections::HashMap;

use crate::binding::{ParamBinding, ParamKind};

/// Ordered parameter bindings, keyed by class and method name.
///
/// Bindings are kept sorted by positional index. Registering the same index
/// twice replaces the earlier binding.
#[derive(Debug, Clone, Default)]
pub struct ParameterRegistry {
    classes: HashMap<String, HashMap<String, Vec<ParamBinding>>>,
}

impl ParameterRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites the binding at `index`.
    pub fn register(
        &mut self,
        class_name: &str,
        method_name: &str,
        name: Option<String>,
        index: usize,
        kind: ParamKind,
    ) {
        self.register_binding(class_name, method_name, ParamBinding::new(kind, name, index));
    }

    /// Inserts or overwrites a complete binding, validator included.
    pub fn register_binding(&mut self, class_name: &str, method_name: &str, binding: ParamBinding) {
        let index = binding.index;
        let bindings = self
            .classes
            .entry(class_name.to_string())
            .or_default()
            .entry(method_name.to_string())
            .or_default();
        match bindings.binary_search_by_key(&index, |b| b.index) {
            Ok(pos) => {
                tracing::debug!(
                    class = class_name,
                    method = method_name,
                    index,
                    "parameter binding overwritten"
                );
                bindings[pos] = binding;
            }
            Err(pos) => bindings.insert(pos, binding),
        }
    }

    /// Returns the bindings for a method sorted by index, or `None` if the
    /// method declared none.
    pub fn lookup(&self, class_name: &str, method_name: &str) -> Option<&[ParamBinding]> {
        self.classes
            .get(class_name)
            .and_then(|methods| methods.get(method_name))
            .filter(|bindings| !bindings.is_empty())
            .map(Vec::as_slice)
    }

    /// Returns the number of (class, method) pairs with bindings.
    pub fn len(&self) -> usize {
        self.classes.values().map(HashMap::len).sum()
    }

    /// Returns true if nothing was registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_lookup_absent() {
        let registry = ParameterRegistry::new();
        assert!(registry.lookup("Computers", "read").is_none());
    }

    #[test]
    fn test_out_of_order_registration_is_sorted() {
        let mut registry = ParameterRegistry::new();
        registry.register("Computers", "read", Some("uuid".into()), 2, ParamKind::PathParam);
        registry.register("Computers", "read", None, 0, ParamKind::RawRequest);

        let bindings = registry.lookup("Computers", "read").unwrap();
        let indices: Vec<_> = bindings.iter().map(|b| b.index).collect();
        assert_eq!(indices, vec![0, 2]);
    }

    #[test]
    fn test_same_index_overwrites() {
        let mut registry = ParameterRegistry::new();
        registry.register("Computers", "read", Some("a".into()), 0, ParamKind::QueryParam);
        registry.register("Computers", "read", Some("b".into()), 0, ParamKind::HeaderParam);

        let bindings = registry.lookup("Computers", "read").unwrap();
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].kind, ParamKind::HeaderParam);
        assert_eq!(bindings[0].name.as_deref(), Some("b"));
    }

    #[test]
    fn test_methods_are_isolated() {
        let mut registry = ParameterRegistry::new();
        registry.register("Computers", "read", None, 0, ParamKind::RawRequest);
        registry.register("Computers", "list", None, 0, ParamKind::RawResponse);
        registry.register("Students", "read", None, 0, ParamKind::NextHandle);

        assert_eq!(registry.len(), 3);
        assert_eq!(
            registry.lookup("Students", "read").unwrap()[0].kind,
            ParamKind::NextHandle
        );
    }

    proptest! {
        #[test]
        fn prop_bindings_sorted_unique_last_wins(
            regs in proptest::collection::vec((0usize..8, 0u8..3), 1..32)
        ) {
            let kinds = [ParamKind::PathParam, ParamKind::QueryParam, ParamKind::HeaderParam];
            let mut registry = ParameterRegistry::new();
            let mut expected = std::collections::BTreeMap::new();
            for (index, kind) in &regs {
                let kind = kinds[usize::from(*kind)];
                registry.register("C", "m", None, *index, kind);
                expected.insert(*index, kind);
            }

            let bindings = registry.lookup("C", "m").unwrap();
            let got: Vec<_> = bindings.iter().map(|b| (b.index, b.kind)).collect();
            let want: Vec<_> = expected.into_iter().collect();
            prop_assert_eq!(got, want);
        }
    }
}
