//! Resource binding decorators: address space, group and slot.

use weft_core::ast::{Decorator, GpuBinding, Literal, Primary};

use super::ShaderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressSpace {
    Uniform,
    Storage { read_write: bool },
    Workgroup,
    Private,
}

impl AddressSpace {
    /// The `var<...>` qualifier.
    pub fn wgsl(&self) -> &'static str {
        match self {
            AddressSpace::Uniform => "uniform",
            AddressSpace::Storage { read_write: false } => "storage, read",
            AddressSpace::Storage { read_write: true } => "storage, read_write",
            AddressSpace::Workgroup => "workgroup",
            AddressSpace::Private => "private",
        }
    }

    /// Resource spaces are bound through a group and slot.
    pub fn is_resource(&self) -> bool {
        matches!(self, AddressSpace::Uniform | AddressSpace::Storage { .. })
    }
}

/// The resolved decorators of a binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingInfo {
    pub space: AddressSpace,
    /// `(group, slot)` for resource bindings.
    pub slot: Option<(u32, u32)>,
}

/// Resolve the decorators of `binding`.
///
/// # Errors
///
/// - [`ShaderError::MissingAddressSpace`] without an address-space decorator.
/// - [`ShaderError::UnsupportedDecorator`] for unknown decorators, bad
///   arguments, or `@group`/`@binding` on a non-resource space.
/// - [`ShaderError::UnsupportedConstruct`] for a resource binding without
///   both `@group` and `@binding`.
pub fn resolve(binding: &GpuBinding) -> Result<BindingInfo, ShaderError> {
    let mut space = None;
    let mut group = None;
    let mut slot = None;

    for decorator in &binding.decorators {
        match decorator.name.inner().as_str() {
            "uniform" => space = Some(AddressSpace::Uniform),
            "storage" => {
                let read_write = match decorator.args.as_slice() {
                    [] => false,
                    [arg] => match arg.as_ident().map(|a| a.as_str()) {
                        Some("read") => false,
                        Some("read_write") => true,
                        _ => return Err(unsupported(decorator)),
                    },
                    _ => return Err(unsupported(decorator)),
                };
                space = Some(AddressSpace::Storage { read_write });
            }
            "workgroup" => space = Some(AddressSpace::Workgroup),
            "private" => space = Some(AddressSpace::Private),
            "group" => group = Some(integer_arg(decorator)?),
            "binding" => slot = Some(integer_arg(decorator)?),
            _ => return Err(unsupported(decorator)),
        }
    }

    let Some(space) = space else {
        return Err(ShaderError::MissingAddressSpace {
            name: binding.name.inner().clone(),
            span: binding.name.span(),
        });
    };

    let slot = match (space.is_resource(), group, slot) {
        (true, Some(group), Some(slot)) => Some((group, slot)),
        (true, _, _) => {
            return Err(ShaderError::UnsupportedConstruct {
                construct: format!(
                    "{} binding `{}` without `@group` and `@binding`",
                    space.wgsl(),
                    binding.name.inner()
                ),
                span: binding.span,
            });
        }
        (false, None, None) => None,
        (false, _, _) => {
            let misplaced = binding
                .decorators
                .iter()
                .find(|d| matches!(d.name.inner().as_str(), "group" | "binding"));
            return Err(match misplaced {
                Some(decorator) => unsupported(decorator),
                None => ShaderError::UnsupportedConstruct {
                    construct: "binding slot".to_string(),
                    span: binding.span,
                },
            });
        }
    };

    Ok(BindingInfo { space, slot })
}

fn unsupported(decorator: &Decorator) -> ShaderError {
    ShaderError::UnsupportedDecorator {
        name: decorator.name.inner().clone(),
        target: "binding",
        span: decorator.span,
    }
}

fn integer_arg(decorator: &Decorator) -> Result<u32, ShaderError> {
    match decorator.args.as_slice() {
        [arg] => match arg.as_primary() {
            Some(Primary::Literal(Literal::Int(text))) => {
                text.parse().map_err(|_| unsupported(decorator))
            }
            _ => Err(unsupported(decorator)),
        },
        _ => Err(unsupported(decorator)),
    }
}
