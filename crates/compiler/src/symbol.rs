//! Symbol table construction: field and local variable layout, function and
//! event registration. Built once per contract/script before type checking.

use crate::error::CompileError;
use alephium_lang::ast::{ContractDef, FuncDef, Param, ScriptDef, TypeName};
use alephium_vm::value::{ContractId, Type};
use std::collections::HashMap;

/// Where a variable's flattened slots live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarOrigin {
    Local,
    Field,
}

/// A declared variable (field, local or parameter), already resolved to a
/// [`Type`] and a base offset into its flattened slot space.
#[derive(Debug, Clone, PartialEq)]
pub struct VarSlot {
    pub origin: VarOrigin,
    pub offset: usize,
    pub ty: Type,
    pub mutable: bool,
    /// The source-level contract type name, kept alongside the hashed
    /// `Type::Contract(id)` so an external call on this variable can look
    /// its callee's interface up by name (see [`ContractInterface`]).
    pub contract_type_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncSig {
    pub index: usize,
    pub is_public: bool,
    pub is_payable: bool,
    pub params: Vec<Type>,
    pub returns: Vec<Type>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventSig {
    pub event_id: Vec<u8>,
    pub field_types: Vec<Type>,
}

/// Everything known about a contract's shape before a single statement is
/// type-checked: its flattened field layout, its function table and its
/// event table. Contract type names referenced from source (`ContractConv`
/// targets, `Contract(name)` field/param types) resolve to a [`ContractId`]
/// by hashing the name — a simplification documented alongside the rest of
/// the contract-id derivation scheme.
pub struct ContractSymbols {
    pub field_slots: Vec<VarSlot>,
    pub field_length: usize,
    pub funcs: HashMap<String, FuncSig>,
    pub events: HashMap<String, EventSig>,
}

pub fn contract_id_for_name(name: &str) -> ContractId {
    ContractId::from_bytes(alephium_cryptography::blake2b_256(name.as_bytes()))
}

/// The source-level type name a `Contract(name)` annotation carries, if any.
pub fn contract_type_name(ty: &TypeName) -> Option<String> {
    match ty {
        TypeName::Contract(name) => Some(name.clone()),
        _ => None,
    }
}

/// A contract's callable surface as seen from another contract's source:
/// its public method signatures, keyed by name, in declaration order.
///
/// The AST has no interface/import node of its own (see DESIGN.md), so a
/// multi-contract compilation threads this table in explicitly: build one
/// per contract with [`contract_interface`] before compiling anything that
/// calls into it.
#[derive(Debug, Clone, Default)]
pub struct ContractInterface {
    pub funcs: HashMap<String, FuncSig>,
}

pub fn contract_interface(contract: &ContractDef) -> Result<ContractInterface, CompileError> {
    Ok(ContractInterface {
        funcs: build_contract_symbols(contract)?.funcs,
    })
}

/// The compile-time environment for a single contract or script: the
/// interfaces of every other contract it may call into.
#[derive(Debug, Clone, Default)]
pub struct CompilerEnv {
    pub interfaces: HashMap<String, ContractInterface>,
}

pub fn resolve_type(ty: &TypeName) -> Type {
    match ty {
        TypeName::Bool => Type::Bool,
        TypeName::U256 => Type::U256,
        TypeName::I256 => Type::I256,
        TypeName::ByteVec => Type::ByteVec,
        TypeName::Address => Type::Address,
        TypeName::Contract(name) => Type::Contract(contract_id_for_name(name)),
        TypeName::Array(base, len) => Type::FixedSizeArray(Box::new(resolve_type(base)), *len),
    }
}

fn params_as_types(params: &[Param]) -> Vec<Type> {
    params.iter().map(|p| resolve_type(&p.ty)).collect()
}

fn func_sig(index: usize, func: &FuncDef) -> FuncSig {
    FuncSig {
        index,
        is_public: func.is_public,
        is_payable: func.is_payable,
        params: params_as_types(&func.params),
        returns: func.return_types.iter().map(resolve_type).collect(),
    }
}

pub fn build_contract_symbols(contract: &ContractDef) -> Result<ContractSymbols, CompileError> {
    let mut field_slots = Vec::with_capacity(contract.fields.len());
    let mut offset = 0usize;
    let mut seen_fields = std::collections::HashSet::new();
    for field in &contract.fields {
        if !seen_fields.insert(field.name.clone()) {
            return Err(CompileError::DuplicateField(field.name.clone()));
        }
        let ty = resolve_type(&field.ty);
        field_slots.push(VarSlot {
            origin: VarOrigin::Field,
            offset,
            ty: ty.clone(),
            mutable: field.mutable,
            contract_type_name: contract_type_name(&field.ty),
        });
        offset += ty.flattened_len();
    }

    let mut funcs = HashMap::new();
    for (index, func) in contract.funcs.iter().enumerate() {
        if funcs.insert(func.name.clone(), func_sig(index, func)).is_some() {
            return Err(CompileError::DuplicateFunction(func.name.clone()));
        }
    }

    let mut events = HashMap::new();
    for event in &contract.events {
        let field_types = params_as_types(&event.fields);
        let event_id = alephium_cryptography::blake2b_256(event.name.as_bytes()).to_vec();
        if events
            .insert(event.name.clone(), EventSig { event_id, field_types })
            .is_some()
        {
            return Err(CompileError::DuplicateEvent(event.name.clone()));
        }
    }

    Ok(ContractSymbols {
        field_slots,
        field_length: offset,
        funcs,
        events,
    })
}

/// Scripts have no fields or events, only an ordered function table.
pub fn build_script_funcs(script: &ScriptDef) -> Result<HashMap<String, FuncSig>, CompileError> {
    let mut funcs = HashMap::new();
    for (index, func) in script.funcs.iter().enumerate() {
        if funcs.insert(func.name.clone(), func_sig(index, func)).is_some() {
            return Err(CompileError::DuplicateFunction(func.name.clone()));
        }
    }
    Ok(funcs)
}

/// A function-local scope: parameters plus `let`-declared locals, each
/// assigned flattened slots contiguous with the parameter slots. Shadows
/// field names of the same identifier (locals take priority over fields).
#[derive(Default)]
pub struct LocalScope {
    pub vars: HashMap<String, VarSlot>,
    pub next_offset: usize,
}

impl LocalScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare_param(&mut self, name: &str, ty: Type, contract_type_name: Option<String>) {
        let len = ty.flattened_len();
        self.vars.insert(
            name.to_string(),
            VarSlot {
                origin: VarOrigin::Local,
                offset: self.next_offset,
                ty,
                mutable: true,
                contract_type_name,
            },
        );
        self.next_offset += len;
    }

    pub fn declare_local(&mut self, name: &str, ty: Type, mutable: bool) {
        let len = ty.flattened_len();
        self.vars.insert(
            name.to_string(),
            VarSlot {
                origin: VarOrigin::Local,
                offset: self.next_offset,
                ty,
                mutable,
                contract_type_name: None,
            },
        );
        self.next_offset += len;
    }

    pub fn lookup<'a>(&'a self, name: &str, fields: &'a [VarSlot], field_names: &HashMap<String, usize>) -> Option<&'a VarSlot> {
        if let Some(slot) = self.vars.get(name) {
            return Some(slot);
        }
        field_names.get(name).map(|&i| &fields[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alephium_lang::ast::{ContractDef, EventDef, FieldDef, FuncDef};

    fn empty_contract() -> ContractDef {
        ContractDef {
            name: "Foo".into(),
            fields: vec![],
            events: vec![],
            funcs: vec![],
        }
    }

    #[test]
    fn contract_id_for_name_is_deterministic() {
        assert_eq!(contract_id_for_name("Counter"), contract_id_for_name("Counter"));
        assert_ne!(contract_id_for_name("Counter"), contract_id_for_name("Other"));
    }

    #[test]
    fn field_offsets_account_for_array_flattening() {
        let mut contract = empty_contract();
        contract.fields = vec![
            FieldDef { name: "a".into(), ty: TypeName::U256, mutable: true },
            FieldDef {
                name: "b".into(),
                ty: TypeName::Array(Box::new(TypeName::U256), 3),
                mutable: true,
            },
            FieldDef { name: "c".into(), ty: TypeName::Bool, mutable: false },
        ];
        let symbols = build_contract_symbols(&contract).unwrap();
        assert_eq!(symbols.field_slots[0].offset, 0);
        assert_eq!(symbols.field_slots[1].offset, 1);
        assert_eq!(symbols.field_slots[2].offset, 4);
        assert_eq!(symbols.field_length, 5);
    }

    #[test]
    fn duplicate_field_names_fail() {
        let mut contract = empty_contract();
        contract.fields = vec![
            FieldDef { name: "a".into(), ty: TypeName::U256, mutable: true },
            FieldDef { name: "a".into(), ty: TypeName::Bool, mutable: true },
        ];
        assert_eq!(
            build_contract_symbols(&contract).unwrap_err(),
            CompileError::DuplicateField("a".into())
        );
    }

    #[test]
    fn duplicate_function_names_fail() {
        let mut contract = empty_contract();
        let func = FuncDef {
            name: "f".into(),
            is_public: true,
            is_payable: false,
            params: vec![],
            return_types: vec![],
            body: vec![],
        };
        contract.funcs = vec![func.clone(), func];
        assert_eq!(
            build_contract_symbols(&contract).unwrap_err(),
            CompileError::DuplicateFunction("f".into())
        );
    }

    #[test]
    fn duplicate_event_names_fail() {
        let mut contract = empty_contract();
        let event = EventDef { name: "Changed".into(), fields: vec![] };
        contract.events = vec![event.clone(), event];
        assert_eq!(
            build_contract_symbols(&contract).unwrap_err(),
            CompileError::DuplicateEvent("Changed".into())
        );
    }
}
