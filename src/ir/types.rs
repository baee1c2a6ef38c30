use serde::{Deserialize, Serialize};

/// Structural IR type. Nominal types have already been resolved by the front
/// end; only `Recursive` still refers to a definition by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Void,
    Null,
    Bool,
    /// Integer of the given bit width. Width 0 is unbounded.
    Int(u32),
    Array(Box<Type>),
    Record(RecordType),
    /// Element order defines the tag of each branch.
    Union(Vec<Type>),
    Reference(Box<Type>),
    /// Back-edge to the type alias of the given name.
    Recursive(String),
    Method(MethodType),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordType {
    pub fields: Vec<Field>,
    #[serde(default)]
    pub is_open: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    pub ty: Type,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MethodType {
    pub params: Vec<Type>,
    #[serde(default)]
    pub returns: Vec<Type>,
}

impl Type {
    pub fn array(elem: Type) -> Type {
        Type::Array(Box::new(elem))
    }

    pub fn reference(elem: Type) -> Type {
        Type::Reference(Box::new(elem))
    }

    pub fn record<S: Into<String>>(fields: impl IntoIterator<Item = (Type, S)>) -> Type {
        Type::Record(RecordType {
            fields: fields.into_iter().map(|(ty, name)| Field { ty, name: name.into() }).collect(),
            is_open: false,
        })
    }

    pub fn open_record<S: Into<String>>(fields: impl IntoIterator<Item = (Type, S)>) -> Type {
        Type::Record(RecordType {
            fields: fields.into_iter().map(|(ty, name)| Field { ty, name: name.into() }).collect(),
            is_open: true,
        })
    }

    /// Values of copy types are duplicated on assignment; the target
    /// language already does this for its own primitives.
    pub fn is_copy(&self) -> bool {
        matches!(self, Type::Null | Type::Bool | Type::Int(_))
    }

}

/// Widths in `1..32` are kept in range by masking; wider and unbounded
/// integers are represented exactly by the target's numbers.
pub fn masked_width(width: u32) -> Option<u32> {
    if width > 0 && width < 32 { Some(width) } else { None }
}

/// All-ones mask for the given width.
pub fn width_mask(width: u32) -> u64 {
    if width >= 64 { u64::MAX } else { (1u64 << width) - 1 }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Void => write!(f, "void"),
            Type::Null => write!(f, "null"),
            Type::Bool => write!(f, "bool"),
            Type::Int(0) => write!(f, "int"),
            Type::Int(width) => write!(f, "int:{width}"),
            Type::Array(elem) => write!(f, "{elem}[]"),
            Type::Reference(elem) => write!(f, "&{elem}"),
            Type::Record(rt) => {
                write!(f, "{{")?;
                for (i, field) in rt.fields.iter().enumerate() {
                    if i > 0 { write!(f, ",")?; }
                    write!(f, "{} {}", field.ty, field.name)?;
                }
                if rt.is_open {
                    if !rt.fields.is_empty() { write!(f, ",")?; }
                    write!(f, "...")?;
                }
                write!(f, "}}")
            }
            Type::Union(elems) => {
                write!(f, "(")?;
                for (i, e) in elems.iter().enumerate() {
                    if i > 0 { write!(f, "|")?; }
                    write!(f, "{e}")?;
                }
                write!(f, ")")
            }
            Type::Recursive(name) => write!(f, "{name}"),
            Type::Method(mt) => {
                write!(f, "method(")?;
                for (i, p) in mt.params.iter().enumerate() {
                    if i > 0 { write!(f, ",")?; }
                    write!(f, "{p}")?;
                }
                write!(f, ")->(")?;
                for (i, r) in mt.returns.iter().enumerate() {
                    if i > 0 { write!(f, ",")?; }
                    write!(f, "{r}")?;
                }
                write!(f, ")")
            }
        }
    }
}
