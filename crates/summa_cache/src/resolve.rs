//! Translation between live program handles and stable identifiers.

use std::collections::HashMap;

use crate::id::{FieldId, TypeId, UnitId};
use crate::model::ProgramModel;

/// Maps identifiers to handles of the currently loaded program and back.
///
/// Resolution is best-effort: `None` means the element does not exist (or has
/// no stable name) in this snapshot. Callers decide what to drop; a single
/// failure never aborts a whole load or save. Implementations must be pure
/// for a fixed snapshot.
pub trait ResolutionStrategy<P: ProgramModel>: Send + Sync {
    /// Finds the unit named by `id`.
    fn resolve_unit(&self, id: &UnitId) -> Option<P::Unit>;

    /// Finds the type named by `id`.
    fn resolve_type(&self, id: &TypeId) -> Option<P::Type>;

    /// Finds the field named by `id`.
    fn resolve_field(&self, id: &FieldId) -> Option<P::Field>;

    /// Returns the stable identifier of `unit`.
    fn unit_id(&self, unit: &P::Unit) -> Option<UnitId>;

    /// Returns the stable identifier of `ty`.
    fn type_id(&self, ty: &P::Type) -> Option<TypeId>;

    /// Returns the stable identifier of `field`.
    fn field_id(&self, field: &P::Field) -> Option<FieldId>;
}

/// A bidirectional name table over the declared elements of one snapshot.
///
/// The driver registers every unit, type and field of the loaded program
/// once; the table then serves both directions of resolution.
pub struct NameTable<P: ProgramModel> {
    units: HashMap<UnitId, P::Unit>,
    unit_ids: HashMap<P::Unit, UnitId>,
    types: HashMap<TypeId, P::Type>,
    type_ids: HashMap<P::Type, TypeId>,
    fields: HashMap<FieldId, P::Field>,
    field_ids: HashMap<P::Field, FieldId>,
}

impl<P: ProgramModel> NameTable<P> {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self {
            units: HashMap::new(),
            unit_ids: HashMap::new(),
            types: HashMap::new(),
            type_ids: HashMap::new(),
            fields: HashMap::new(),
            field_ids: HashMap::new(),
        }
    }

    /// Registers a unit under `id`, replacing any previous binding of either side.
    pub fn register_unit(&mut self, id: UnitId, unit: P::Unit) {
        if let Some(old) = self.units.insert(id.clone(), unit.clone()) {
            self.unit_ids.remove(&old);
        }
        self.unit_ids.insert(unit, id);
    }

    /// Registers a type under `id`.
    pub fn register_type(&mut self, id: TypeId, ty: P::Type) {
        if let Some(old) = self.types.insert(id.clone(), ty.clone()) {
            self.type_ids.remove(&old);
        }
        self.type_ids.insert(ty, id);
    }

    /// Registers a field under `id`.
    pub fn register_field(&mut self, id: FieldId, field: P::Field) {
        if let Some(old) = self.fields.insert(id.clone(), field.clone()) {
            self.field_ids.remove(&old);
        }
        self.field_ids.insert(field, id);
    }

    /// Number of registered units.
    pub fn unit_count(&self) -> usize {
        self.units.len()
    }
}

impl<P: ProgramModel> Default for NameTable<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: ProgramModel> ResolutionStrategy<P> for NameTable<P> {
    fn resolve_unit(&self, id: &UnitId) -> Option<P::Unit> {
        self.units.get(id).cloned()
    }

    fn resolve_type(&self, id: &TypeId) -> Option<P::Type> {
        self.types.get(id).cloned()
    }

    fn resolve_field(&self, id: &FieldId) -> Option<P::Field> {
        self.fields.get(id).cloned()
    }

    fn unit_id(&self, unit: &P::Unit) -> Option<UnitId> {
        self.unit_ids.get(unit).cloned()
    }

    fn type_id(&self, ty: &P::Type) -> Option<TypeId> {
        self.type_ids.get(ty).cloned()
    }

    fn field_id(&self, field: &P::Field) -> Option<FieldId> {
        self.field_ids.get(field).cloned()
    }
}
