//! Property-based tests for type mangling.
//!
//! The mangle is the de-duplication key of predicate synthesis, so it must
//! be injective over structural shapes, stable across reconstruction, and
//! blind to the names of the aliases a shape is reached through.

use lljs::ir::{Field, MethodType, RecordType, Type, TypeDefs};
use lljs::typetest::mangle;
use proptest::prelude::*;

fn m(ty: &Type) -> String {
    mangle(ty, &TypeDefs::new()).unwrap()
}

fn arb_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,6}".prop_map(|s| s.to_string())
}

fn arb_leaf() -> impl Strategy<Value = Type> {
    prop_oneof![
        Just(Type::Void),
        Just(Type::Null),
        Just(Type::Bool),
        Just(Type::Int(0)),
        (1u32..64).prop_map(Type::Int),
    ]
}

fn arb_type() -> impl Strategy<Value = Type> {
    arb_type_over(arb_leaf())
}

fn arb_type_over(leaf: impl Strategy<Value = Type> + 'static) -> impl Strategy<Value = Type> {
    leaf.prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            inner.clone().prop_map(Type::array),
            inner.clone().prop_map(Type::reference),
            prop::collection::vec(inner.clone(), 0..4).prop_map(Type::Union),
            (prop::collection::vec((inner.clone(), arb_name()), 0..4), any::<bool>()).prop_map(
                |(fields, is_open)| {
                    Type::Record(RecordType {
                        fields: fields.into_iter().map(|(ty, name)| Field { ty, name }).collect(),
                        is_open,
                    })
                }
            ),
            (prop::collection::vec(inner.clone(), 0..3), prop::collection::vec(inner, 0..2))
                .prop_map(|(params, returns)| Type::Method(MethodType { params, returns })),
        ]
    })
}

proptest! {
    /// Property: structurally distinct types never share a mangle
    #[test]
    fn mangle_is_injective(a in arb_type(), b in arb_type()) {
        prop_assert_eq!(a == b, m(&a) == m(&b), "a = {:?}, b = {:?}", a, b);
    }

    /// Property: a type rebuilt from its parts mangles the same
    #[test]
    fn mangle_is_stable_under_reconstruction(ty in arb_type()) {
        let json = serde_json::to_string(&ty).unwrap();
        let rebuilt: Type = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(m(&ty), m(&rebuilt));
    }

    /// Property: mangles are usable as identifier suffixes
    #[test]
    fn mangle_is_identifier_safe(ty in arb_type()) {
        let text = m(&ty);
        prop_assert!(!text.is_empty());
        prop_assert!(text.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'), "bad mangle {}", text);
    }

    /// Property: renaming a single record field changes the mangle
    #[test]
    fn field_names_are_significant(ty in arb_type(), a in arb_name(), b in arb_name()) {
        prop_assume!(a != b);
        let left = Type::record([(ty.clone(), a)]);
        let right = Type::record([(ty, b)]);
        prop_assert_ne!(m(&left), m(&right));
    }

    /// Property: a non-cyclic alias mangles as its definition
    #[test]
    fn alias_mangles_as_definition(def in arb_type(), name in "[A-Z][a-z]{0,6}") {
        let mut defs = TypeDefs::new();
        defs.insert(&name, def.clone());
        let alias = Type::array(Type::Recursive(name.clone()));
        prop_assert_eq!(mangle(&alias, &defs).unwrap(), m(&Type::array(def)));
    }

    /// Property: consistently renaming mutually recursive aliases keeps every mangle
    #[test]
    fn alias_renaming_keeps_mangle(
        a in arb_type_over(alias_leaf("A", "B")),
        b in arb_type_over(alias_leaf("A", "B")),
        query in arb_type_over(alias_leaf("A", "B")),
    ) {
        let mut original = TypeDefs::new();
        original.insert("A", Type::record([(a.clone(), "a")]));
        original.insert("B", Type::record([(b.clone(), "b")]));
        let mut renamed = TypeDefs::new();
        renamed.insert("Left", Type::record([(rename(&a), "a")]));
        renamed.insert("Right", Type::record([(rename(&b), "b")]));
        prop_assert_eq!(mangle(&query, &original).unwrap(), mangle(&rename(&query), &renamed).unwrap());
    }
}

/// Leaves plus references to the aliases `x` and `y`.
fn alias_leaf(x: &'static str, y: &'static str) -> impl Strategy<Value = Type> {
    prop_oneof![
        3 => arb_leaf(),
        1 => Just(Type::Recursive(x.into())),
        1 => Just(Type::Recursive(y.into())),
    ]
}

/// `A` becomes `Left` and `B` becomes `Right` everywhere in `ty`.
fn rename(ty: &Type) -> Type {
    match ty {
        Type::Recursive(name) => Type::Recursive(if name == "A" { "Left" } else { "Right" }.into()),
        Type::Array(elem) => Type::array(rename(elem)),
        Type::Reference(elem) => Type::reference(rename(elem)),
        Type::Union(elems) => Type::Union(elems.iter().map(rename).collect()),
        Type::Record(rt) => Type::Record(RecordType {
            fields: rt.fields.iter().map(|f| Field { ty: rename(&f.ty), name: f.name.clone() }).collect(),
            is_open: rt.is_open,
        }),
        Type::Method(mt) => Type::Method(MethodType {
            params: mt.params.iter().map(rename).collect(),
            returns: mt.returns.iter().map(rename).collect(),
        }),
        other => other.clone(),
    }
}

#[test]
fn self_reference_is_independent_of_alias_name() {
    let list = |name: &str| {
        let mut defs = TypeDefs::new();
        defs.insert(name, Type::record([(Type::Union(vec![Type::Null, Type::Recursive(name.into())]), "next")]));
        mangle(&Type::Recursive(name.into()), &defs).unwrap()
    };
    assert_eq!(list("List"), list("Chain"));
}

#[test]
fn open_and_closed_records_differ() {
    let closed = Type::record([(Type::Bool, "b")]);
    let open = Type::open_record([(Type::Bool, "b")]);
    assert_ne!(m(&closed), m(&open));
}
