use std::fmt::Display;

use inkwell::{
    context::Context,
    types::{AnyType, AnyTypeEnum, BasicType, BasicTypeEnum},
    AddressSpace,
};

use crate::errors::errors::ErrorImpl;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    None,
    I32,
    F32,
    Char,
    Bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateType {
    Scalar,
    Array(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndirectionType {
    Value,
    Pointer,
}

/// The shape of a source-level value.
///
/// Constructors uphold two invariants: arrays hold at least one element, and
/// `PrimitiveType::None` only appears as a bare scalar (a void return type).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Type {
    kind: PrimitiveType,
    aggregate: AggregateType,
    indirection: IndirectionType,
}

impl Type {
    pub fn scalar(kind: PrimitiveType) -> Self {
        Type {
            kind,
            aggregate: AggregateType::Scalar,
            indirection: IndirectionType::Value,
        }
    }

    pub fn void() -> Self {
        Type::scalar(PrimitiveType::None)
    }

    pub fn array(kind: PrimitiveType, size: u32) -> Result<Self, ErrorImpl> {
        Type::new(kind, AggregateType::Array(size), IndirectionType::Value)
    }

    pub fn pointer(kind: PrimitiveType) -> Result<Self, ErrorImpl> {
        Type::new(kind, AggregateType::Scalar, IndirectionType::Pointer)
    }

    pub fn new(
        kind: PrimitiveType,
        aggregate: AggregateType,
        indirection: IndirectionType,
    ) -> Result<Self, ErrorImpl> {
        let type_ = Type {
            kind,
            aggregate,
            indirection,
        };

        if kind == PrimitiveType::None
            && (aggregate != AggregateType::Scalar || indirection != IndirectionType::Value)
        {
            return Err(type_.invalid("void is only valid as a return type"));
        }
        if aggregate == AggregateType::Array(0) {
            return Err(type_.invalid("arrays hold at least one element"));
        }

        Ok(type_)
    }

    /// The type of a pointer to a value of this type.
    pub fn pointer_to(&self) -> Result<Self, ErrorImpl> {
        if self.is_pointer() {
            return Err(self.invalid("only one level of indirection is supported"));
        }
        Type::new(self.kind, self.aggregate, IndirectionType::Pointer)
    }

    /// The type reached by loading through a pointer of this type.
    pub fn pointee(&self) -> Result<Self, ErrorImpl> {
        if !self.is_pointer() {
            return Err(ErrorImpl::NotAPointer {
                type_: self.to_string(),
            });
        }
        Ok(Type {
            indirection: IndirectionType::Value,
            ..*self
        })
    }

    /// The type of one element of an array of this type.
    pub fn element(&self) -> Result<Self, ErrorImpl> {
        match (self.aggregate, self.indirection) {
            (AggregateType::Array(_), IndirectionType::Value) => Ok(Type::scalar(self.kind)),
            _ => Err(ErrorImpl::NotAnArray {
                type_: self.to_string(),
            }),
        }
    }

    pub fn kind(&self) -> PrimitiveType {
        self.kind
    }

    pub fn aggregate(&self) -> AggregateType {
        self.aggregate
    }

    pub fn indirection(&self) -> IndirectionType {
        self.indirection
    }

    pub fn array_size(&self) -> Option<u32> {
        match self.aggregate {
            AggregateType::Array(size) => Some(size),
            AggregateType::Scalar => None,
        }
    }

    pub fn is_void(&self) -> bool {
        self.kind == PrimitiveType::None
    }

    pub fn is_pointer(&self) -> bool {
        self.indirection == IndirectionType::Pointer
    }

    /// Scalar value of an integer-like kind (`I32`, `Char` or `Bool`).
    pub fn is_integer(&self) -> bool {
        self.is_plain_scalar()
            && matches!(
                self.kind,
                PrimitiveType::I32 | PrimitiveType::Char | PrimitiveType::Bool
            )
    }

    pub fn is_float(&self) -> bool {
        self.is_plain_scalar() && self.kind == PrimitiveType::F32
    }

    fn is_plain_scalar(&self) -> bool {
        self.aggregate == AggregateType::Scalar && self.indirection == IndirectionType::Value
    }

    /// Maps this type onto its LLVM shape. Total over every constructible type.
    pub fn llvm_type<'ctx>(&self, context: &'ctx Context) -> AnyTypeEnum<'ctx> {
        match self.basic_type(context) {
            Ok(basic) => basic.as_any_type_enum(),
            Err(_) => context.void_type().as_any_type_enum(),
        }
    }

    /// Maps this type onto an LLVM type that can be stored, loaded and passed.
    ///
    /// Fails only for void.
    pub fn basic_type<'ctx>(&self, context: &'ctx Context) -> Result<BasicTypeEnum<'ctx>, ErrorImpl> {
        let primitive: BasicTypeEnum<'ctx> = match self.kind {
            PrimitiveType::I32 => context.i32_type().into(),
            PrimitiveType::F32 => context.f32_type().into(),
            PrimitiveType::Char => context.i8_type().into(),
            PrimitiveType::Bool => context.bool_type().into(),
            PrimitiveType::None => {
                return Err(self.invalid("void has no storable representation"));
            }
        };

        let aggregate = match self.aggregate {
            AggregateType::Scalar => primitive,
            AggregateType::Array(size) => primitive.array_type(size).into(),
        };

        Ok(match self.indirection {
            IndirectionType::Value => aggregate,
            IndirectionType::Pointer => aggregate.ptr_type(AddressSpace::default()).into(),
        })
    }

    /// Recovers the source type of an LLVM shape produced by [`Type::llvm_type`].
    pub fn from_backend_type(type_: AnyTypeEnum<'_>) -> Result<Self, ErrorImpl> {
        match type_ {
            AnyTypeEnum::VoidType(_) => Ok(Type::void()),
            AnyTypeEnum::PointerType(pointer) => {
                let pointee = Type::from_backend_type(pointer.get_element_type())?;
                if pointee.is_void() || pointee.is_pointer() {
                    return Err(unknown(type_));
                }
                pointee.pointer_to()
            }
            AnyTypeEnum::ArrayType(array) => {
                let element = Type::from_backend_type(array.get_element_type().as_any_type_enum())?;
                if element.aggregate != AggregateType::Scalar || element.is_pointer() {
                    return Err(unknown(type_));
                }
                Type::array(element.kind, array.len()).map_err(|_| unknown(type_))
            }
            _ => primitive_from_backend(type_)
                .map(Type::scalar)
                .ok_or_else(|| unknown(type_)),
        }
    }

    fn invalid(&self, reason: &str) -> ErrorImpl {
        ErrorImpl::InvalidType {
            type_: self.to_string(),
            reason: reason.to_string(),
        }
    }
}

fn primitive_from_backend(type_: AnyTypeEnum<'_>) -> Option<PrimitiveType> {
    match type_ {
        AnyTypeEnum::IntType(int) => match int.get_bit_width() {
            1 => Some(PrimitiveType::Bool),
            8 => Some(PrimitiveType::Char),
            32 => Some(PrimitiveType::I32),
            _ => None,
        },
        AnyTypeEnum::FloatType(float) if float == float.get_context().f32_type() => {
            Some(PrimitiveType::F32)
        }
        _ => None,
    }
}

fn unknown(type_: AnyTypeEnum<'_>) -> ErrorImpl {
    ErrorImpl::UnknownBackendType {
        type_: type_.print_to_string().to_string(),
    }
}

impl Display for PrimitiveType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PrimitiveType::None => "void",
            PrimitiveType::I32 => "i32",
            PrimitiveType::F32 => "f32",
            PrimitiveType::Char => "char",
            PrimitiveType::Bool => "bool",
        };
        write!(f, "{}", name)
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)?;
        if let AggregateType::Array(size) = self.aggregate {
            write!(f, "[{}]", size)?;
        }
        if self.is_pointer() {
            write!(f, "*")?;
        }
        Ok(())
    }
}
