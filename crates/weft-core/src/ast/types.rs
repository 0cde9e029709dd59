//! Type descriptors.
//!
//! Wrapper order is structural: `*[]T` is `Pointer(Slice(T))` while `[]*T`
//! is `Slice(Pointer(T))`, so the two render differently.

use std::fmt;

/// A type as written in source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDesc {
    /// A base name, optionally package-qualified (`pkg.Name`), with at most
    /// one generic argument (`List[int]`).
    Named {
        name: String,
        arg: Option<Box<TypeDesc>>,
    },
    /// `chan T`, or `<-chan T` when `recv_only` is set.
    Chan { recv_only: bool, elem: Box<TypeDesc> },
    /// `[]T`
    Slice(Box<TypeDesc>),
    /// `*T`
    Pointer(Box<TypeDesc>),
    /// `func(A, B) (C, D)`
    Func {
        params: Vec<TypeDesc>,
        results: Vec<TypeDesc>,
    },
}

impl TypeDesc {
    /// A plain named type without a generic argument.
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named {
            name: name.into(),
            arg: None,
        }
    }

    pub fn chan(elem: TypeDesc) -> Self {
        Self::Chan {
            recv_only: false,
            elem: Box::new(elem),
        }
    }

    pub fn slice(elem: TypeDesc) -> Self {
        Self::Slice(Box::new(elem))
    }

    pub fn pointer(elem: TypeDesc) -> Self {
        Self::Pointer(Box::new(elem))
    }

    /// Returns `true` for channel types, including receive-only ones.
    pub fn is_chan(&self) -> bool {
        matches!(self, Self::Chan { .. })
    }

    /// The element type of a channel.
    pub fn chan_elem(&self) -> Option<&TypeDesc> {
        match self {
            Self::Chan { elem, .. } => Some(elem),
            _ => None,
        }
    }

    /// The base name of a named type without wrappers or generic arguments.
    pub fn base_name(&self) -> Option<&str> {
        match self {
            Self::Named { name, arg: None } => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named { name, arg: None } => write!(f, "{name}"),
            Self::Named {
                name,
                arg: Some(arg),
            } => write!(f, "{name}[{arg}]"),
            Self::Chan {
                recv_only: true,
                elem,
            } => write!(f, "<-chan {elem}"),
            Self::Chan {
                recv_only: false,
                elem,
            } => write!(f, "chan {elem}"),
            Self::Slice(elem) => write!(f, "[]{elem}"),
            Self::Pointer(elem) => write!(f, "*{elem}"),
            Self::Func { params, results } => {
                write!(f, "func(")?;
                write_list(f, params)?;
                write!(f, ")")?;
                match results.as_slice() {
                    [] => Ok(()),
                    [single] => write!(f, " {single}"),
                    many => {
                        write!(f, " (")?;
                        write_list(f, many)?;
                        write!(f, ")")
                    }
                }
            }
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, types: &[TypeDesc]) -> fmt::Result {
    for (i, ty) in types.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{ty}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapper_order_is_preserved() {
        let int = TypeDesc::named("int");
        let ptr_slice = TypeDesc::pointer(TypeDesc::slice(int.clone()));
        let slice_ptr = TypeDesc::slice(TypeDesc::pointer(int));

        assert_eq!(ptr_slice.to_string(), "*[]int");
        assert_eq!(slice_ptr.to_string(), "[]*int");
        assert_ne!(ptr_slice, slice_ptr);
    }

    #[test]
    fn test_channel_display() {
        let recv = TypeDesc::Chan {
            recv_only: true,
            elem: Box::new(TypeDesc::named("string")),
        };
        assert_eq!(recv.to_string(), "<-chan string");
        assert_eq!(TypeDesc::chan(TypeDesc::named("int")).to_string(), "chan int");
        assert_eq!(recv.chan_elem(), Some(&TypeDesc::named("string")));
    }

    #[test]
    fn test_func_and_generic_display() {
        let func = TypeDesc::Func {
            params: vec![TypeDesc::named("int"), TypeDesc::named("string")],
            results: vec![TypeDesc::named("bool")],
        };
        assert_eq!(func.to_string(), "func(int, string) bool");

        let multi = TypeDesc::Func {
            params: vec![],
            results: vec![TypeDesc::named("int"), TypeDesc::named("error")],
        };
        assert_eq!(multi.to_string(), "func() (int, error)");

        let generic = TypeDesc::Named {
            name: "List".to_string(),
            arg: Some(Box::new(TypeDesc::named("Point"))),
        };
        assert_eq!(generic.to_string(), "List[Point]");
        assert_eq!(generic.base_name(), None);
    }
}
