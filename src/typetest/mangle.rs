use crate::diagnostics::CompileError;
use crate::ir::{ResolveType, Type};
use crate::span::Span;

/// A `Recursive` placeholder whose name has no definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedType {
    pub name: String,
}

impl UnresolvedType {
    /// Report against the IR node that asked for the mangle.
    pub fn at(self, span: Span) -> CompileError {
        CompileError::unsupported(format!("type test of unresolved recursive type '{}'", self.name), span)
    }
}

/// Canonical identifier-safe encoding of a type's structural shape.
///
/// Every production starts with its own letter and every variable-length
/// part is either count-prefixed or length-prefixed. `Recursive` names are
/// looked up in `defs` and replaced by their definition, so alias names
/// never reach the output: a definition that refers back to itself opens a
/// binder `X` and the back-edge becomes `R<k>_`, where `k` counts the
/// binders between the reference and its target. Binders nothing refers to
/// are dropped.
pub fn mangle(ty: &Type, defs: &dyn ResolveType) -> Result<String, UnresolvedType> {
    let mut mangler = Mangler { defs, open: Vec::new(), used: Vec::new(), pieces: Vec::new() };
    mangler.build(ty)?;
    Ok(mangler.finish())
}

/// Name of the predicate testing membership of `ty`.
pub fn predicate_name(ty: &Type, defs: &dyn ResolveType) -> Result<String, UnresolvedType> {
    Ok(format!("is${}", mangle(ty, defs)?))
}

enum Piece {
    Text(String),
    Open(usize),
    Close(usize),
    Ref(usize),
}

struct Mangler<'a> {
    defs: &'a dyn ResolveType,
    /// Definitions being expanded, innermost last, with their binder ids.
    open: Vec<(&'a str, usize)>,
    used: Vec<bool>,
    pieces: Vec<Piece>,
}

impl<'a> Mangler<'a> {
    fn text(&mut self, s: &str) {
        match self.pieces.last_mut() {
            Some(Piece::Text(t)) => t.push_str(s),
            _ => self.pieces.push(Piece::Text(s.to_string())),
        }
    }

    fn count(&mut self, n: usize) {
        self.text(&n.to_string());
    }

    fn name(&mut self, name: &str) {
        self.count(name.len());
        self.text(name);
    }

    fn build(&mut self, ty: &'a Type) -> Result<(), UnresolvedType> {
        match ty {
            Type::Void => self.text("V"),
            Type::Null => self.text("N"),
            Type::Bool => self.text("B"),
            Type::Int(0) => self.text("I"),
            Type::Int(width) => {
                self.text("i");
                self.count(*width as usize);
                self.text("_");
            }
            Type::Array(elem) => {
                self.text("a");
                self.build(elem)?;
            }
            Type::Reference(elem) => {
                self.text("p");
                self.build(elem)?;
            }
            Type::Record(rt) => {
                self.text(if rt.is_open { "o" } else { "r" });
                self.count(rt.fields.len());
                for field in &rt.fields {
                    self.build(&field.ty)?;
                    self.name(&field.name);
                }
            }
            Type::Union(elems) => {
                self.text("u");
                self.count(elems.len());
                for elem in elems {
                    self.build(elem)?;
                }
            }
            Type::Recursive(name) => {
                if let Some(&(_, id)) = self.open.iter().rev().find(|(open, _)| *open == name.as_str()) {
                    self.used[id] = true;
                    self.pieces.push(Piece::Ref(id));
                    return Ok(());
                }
                let def = self.defs.resolve(name).ok_or_else(|| UnresolvedType { name: name.clone() })?;
                let id = self.used.len();
                self.used.push(false);
                self.open.push((name.as_str(), id));
                self.pieces.push(Piece::Open(id));
                self.build(def)?;
                self.pieces.push(Piece::Close(id));
                self.open.pop();
            }
            Type::Method(mt) => {
                self.text("m");
                self.count(mt.params.len());
                for param in &mt.params {
                    self.build(param)?;
                }
                self.count(mt.returns.len());
                for ret in &mt.returns {
                    self.build(ret)?;
                }
            }
        }
        Ok(())
    }

    fn finish(self) -> String {
        let mut out = String::new();
        let mut binders: Vec<usize> = Vec::new();
        for piece in self.pieces {
            match piece {
                Piece::Text(t) => out.push_str(&t),
                Piece::Open(id) if self.used[id] => {
                    binders.push(id);
                    out.push('X');
                }
                Piece::Close(id) if self.used[id] => {
                    binders.pop();
                }
                Piece::Open(_) | Piece::Close(_) => {}
                Piece::Ref(id) => {
                    let depth = binders.iter().rev().position(|b| *b == id).unwrap_or(0);
                    out.push('R');
                    out.push_str(&depth.to_string());
                    out.push('_');
                }
            }
        }
        out
    }
}
