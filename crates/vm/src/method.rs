//! Compiled artifacts: methods, scripts and contracts.

use crate::instruction::Instruction;
use crate::value::Type;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    pub is_public: bool,
    pub is_payable: bool,
    pub args_length: usize,
    pub locals_length: usize,
    pub return_length: usize,
    /// Flattened type of each of the `locals_length` local slots, used to
    /// zero-initialize locals a call didn't supply arguments for.
    pub local_types: Vec<Type>,
    pub instrs: Vec<Instruction>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PackagingError {
    #[error("a script or contract must declare at least one method")]
    EmptyMethodList,
    #[error("method 0 of a script must be public")]
    EntryMethodNotPublic,
    #[error("only method 0 of a script may be public")]
    NonEntryMethodPublic(usize),
}

fn check_entry_point(methods: &[Method]) -> Result<(), PackagingError> {
    if methods.is_empty() {
        return Err(PackagingError::EmptyMethodList);
    }
    if !methods[0].is_public {
        return Err(PackagingError::EntryMethodNotPublic);
    }
    if let Some(idx) = methods[1..].iter().position(|m| m.is_public) {
        return Err(PackagingError::NonEntryMethodPublic(idx + 1));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatelessScript {
    pub methods: Vec<Method>,
}

impl StatelessScript {
    pub fn new(methods: Vec<Method>) -> Result<Self, PackagingError> {
        check_entry_point(&methods)?;
        Ok(Self { methods })
    }

    pub fn entry_method(&self) -> &Method {
        &self.methods[0]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatefulScript {
    pub methods: Vec<Method>,
}

impl StatefulScript {
    pub fn new(methods: Vec<Method>) -> Result<Self, PackagingError> {
        check_entry_point(&methods)?;
        Ok(Self { methods })
    }

    pub fn entry_method(&self) -> &Method {
        &self.methods[0]
    }
}

/// A deployed contract's code and field layout. Fields are the contract's
/// persisted state slots, addressed by flattened index from `LoadField`
/// and `StoreField`.
#[derive(Debug, Clone, PartialEq)]
pub struct StatefulContract {
    pub field_length: usize,
    pub methods: Vec<Method>,
}

impl StatefulContract {
    pub fn new(field_length: usize, methods: Vec<Method>) -> Result<Self, PackagingError> {
        if methods.is_empty() {
            return Err(PackagingError::EmptyMethodList);
        }
        Ok(Self {
            field_length,
            methods,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method(is_public: bool) -> Method {
        Method {
            is_public,
            is_payable: false,
            args_length: 0,
            locals_length: 0,
            return_length: 0,
            local_types: vec![],
            instrs: vec![Instruction::Return],
        }
    }

    #[test]
    fn empty_method_list_fails_packaging() {
        assert_eq!(
            StatefulScript::new(vec![]).unwrap_err(),
            PackagingError::EmptyMethodList
        );
    }

    #[test]
    fn non_public_entry_method_fails_packaging() {
        assert_eq!(
            StatefulScript::new(vec![method(false)]).unwrap_err(),
            PackagingError::EntryMethodNotPublic
        );
    }

    #[test]
    fn public_non_entry_method_fails_packaging() {
        assert_eq!(
            StatefulScript::new(vec![method(true), method(true)]).unwrap_err(),
            PackagingError::NonEntryMethodPublic(1)
        );
    }

    #[test]
    fn single_public_entry_method_packages() {
        assert!(StatefulScript::new(vec![method(true), method(false)]).is_ok());
    }
}
