use oso::PolarClass;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{Role, VehicleClass};

/// The authenticated actor behind a request, as asserted by the external
/// identity provider. Passed explicitly into every engine operation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Principal {
    pub id: Uuid,
    pub role: Role,
    pub is_verified: bool,
    pub vehicle_type: Option<VehicleClass>,
}

impl Principal {
    pub fn user(id: Uuid) -> Self {
        Self {
            id,
            role: Role::User,
            is_verified: true,
            vehicle_type: None,
        }
    }

    pub fn driver(id: Uuid, is_verified: bool, vehicle_type: VehicleClass) -> Self {
        Self {
            id,
            role: Role::Driver,
            is_verified,
            vehicle_type: Some(vehicle_type),
        }
    }

    pub fn operator(id: Uuid) -> Self {
        Self {
            id,
            role: Role::Operator,
            is_verified: true,
            vehicle_type: None,
        }
    }

    fn has_role(&self, role: String) -> bool {
        self.role.as_str() == role
    }

    fn id_equals(&self, id: Uuid) -> bool {
        self.id == id
    }

    fn id_equals_nullable_id(&self, optional_id: Option<Uuid>) -> bool {
        if let Some(id) = optional_id {
            if self.id == id {
                return true;
            }
        }

        false
    }

    fn vehicle_matches(&self, vehicle_type: String) -> bool {
        match self.vehicle_type {
            Some(own) => own.as_str() == vehicle_type,
            None => false,
        }
    }
}

impl PolarClass for Principal {
    fn get_polar_class_builder() -> oso::ClassBuilder<Principal> {
        oso::Class::builder()
            .name("Principal")
            .add_attribute_getter("id", |recv: &Principal| recv.id)
            .add_attribute_getter("is_verified", |recv: &Principal| recv.is_verified)
            .add_method("has_role", Principal::has_role)
            .add_method("id_equals", Principal::id_equals)
            .add_method("id_equals_nullable_id", Principal::id_equals_nullable_id)
            .add_method("vehicle_matches", Principal::vehicle_matches)
    }

    fn get_polar_class() -> oso::Class {
        let builder = Principal::get_polar_class_builder();
        builder.build()
    }
}

/// Resource standing in for the service itself, used for collection-level
/// actions that have no entity yet (trip creation, payment creation,
/// profile sync).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Platform {
    id: Uuid,
}

impl Platform {
    pub fn default() -> Self {
        Self { id: Uuid::nil() }
    }
}

impl PolarClass for Platform {
    fn get_polar_class_builder() -> oso::ClassBuilder<Platform> {
        oso::Class::builder()
            .name("Platform")
            .add_attribute_getter("id", |recv: &Platform| recv.id)
            .add_class_method("default", Platform::default)
    }

    fn get_polar_class() -> oso::Class {
        let builder = Platform::get_polar_class_builder();
        builder.build()
    }
}
