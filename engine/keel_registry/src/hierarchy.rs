//! Whole-hierarchy views computed from a resolved inheritance chain.
//!
//! Both functions take the chain base-to-derived, as returned by
//! [`TypeRegistry::hierarchy`](crate::TypeRegistry::hierarchy).

use std::sync::Arc;

use keel_ir::{CodecError, FieldDescriptor, TypeClass, TypeDescriptor};

/// Concatenate each level's own fields, base first.
///
/// A field redeclared with the same type keeps its original position and
/// takes the later declaration (which may relax or tighten `optional`).
/// Redeclaring it with a different type is an error.
pub fn merge_fields(hierarchy: &[Arc<TypeDescriptor>]) -> Result<Vec<FieldDescriptor>, CodecError> {
    let mut merged: Vec<FieldDescriptor> = Vec::new();
    let Some(leaf) = hierarchy.last() else {
        return Ok(merged);
    };

    for level in hierarchy {
        for field in level.own_fields() {
            match merged.iter().position(|f| f.name == field.name) {
                Some(pos) if merged[pos].ty != field.ty => {
                    return Err(CodecError::DuplicateFieldName {
                        type_name: leaf.name().clone(),
                        field: field.name.clone(),
                        first: merged[pos].ty.to_string(),
                        second: field.ty.to_string(),
                    });
                }
                Some(pos) => merged[pos] = field.clone(),
                None => merged.push(field.clone()),
            }
        }
    }

    Ok(merged)
}

/// Leaf-first slice of the hierarchy ending at its single key type.
pub fn key_chain_of(
    hierarchy: &[Arc<TypeDescriptor>],
) -> Result<Vec<Arc<TypeDescriptor>>, CodecError> {
    let Some(leaf) = hierarchy.last() else {
        return Ok(Vec::new());
    };

    let leaf_first: Vec<Arc<TypeDescriptor>> = hierarchy.iter().rev().cloned().collect();
    let keys: Vec<usize> = leaf_first
        .iter()
        .enumerate()
        .filter(|(_, desc)| desc.class() == TypeClass::Key)
        .map(|(i, _)| i)
        .collect();

    match keys.as_slice() {
        [] => Err(CodecError::MissingKeyAncestor {
            type_name: leaf.name().clone(),
        }),
        [pos] => Ok(leaf_first[..=*pos].to_vec()),
        _ => Err(CodecError::AmbiguousKeyAncestor {
            type_name: leaf.name().clone(),
            candidates: keys
                .iter()
                .map(|&i| leaf_first[i].name().to_string())
                .collect(),
        }),
    }
}
