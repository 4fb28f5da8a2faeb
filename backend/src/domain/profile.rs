//! User profiles and the actors derived from verified tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role attached to an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Requests rides and rates or reports drivers.
    Passenger,
    /// Accepts and carries out rides; the only role with a vehicle.
    Driver,
    /// Support staff; may cancel rides, suspend accounts, and review
    /// complaints.
    Admin,
}

impl Role {
    /// Stable lowercase identifier used in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Passenger => "passenger",
            Self::Driver => "driver",
            Self::Admin => "admin",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = ProfileValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "passenger" => Ok(Self::Passenger),
            "driver" => Ok(Self::Driver),
            "admin" => Ok(Self::Admin),
            other => Err(ProfileValidationError::UnknownRole {
                role: other.to_owned(),
            }),
        }
    }
}

/// Whether the account may use the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    /// Account in good standing.
    Active,
    /// Temporarily blocked by an administrator; mutating calls are refused
    /// until reinstated.
    Suspended,
    /// Permanently blocked; mutating calls are refused.
    Banned,
}

impl AccountStatus {
    /// Stable lowercase identifier used in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Suspended => "suspended",
            Self::Banned => "banned",
        }
    }
}

impl std::str::FromStr for AccountStatus {
    type Err = ProfileValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "suspended" => Ok(Self::Suspended),
            "banned" => Ok(Self::Banned),
            other => Err(ProfileValidationError::UnknownAccountStatus {
                status: other.to_owned(),
            }),
        }
    }
}

/// Validation errors for profile data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProfileValidationError {
    /// Display name must be non-blank.
    #[error("display name must not be blank")]
    BlankDisplayName,
    /// Stored role string did not match any known role.
    #[error("unknown role: {role}")]
    UnknownRole {
        /// The rejected role string.
        role: String,
    },
    /// Stored account status did not match any known status.
    #[error("unknown account status: {status}")]
    UnknownAccountStatus {
        /// The rejected status string.
        status: String,
    },
    /// Every vehicle descriptor field must be non-blank.
    #[error("vehicle {field} must not be blank")]
    BlankVehicleField {
        /// The offending descriptor field.
        field: &'static str,
    },
    /// Vehicle descriptors belong to driver accounts only.
    #[error("only driver accounts carry a vehicle")]
    VehicleWithoutDriverRole,
}

/// The authenticated principal acting on a request.
///
/// Derived from a verified bearer token by the inbound adapter; domain
/// services never see raw tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    /// Subject identifier from the verified token.
    pub id: Uuid,
    /// Role claimed by the identity provider.
    pub role: Role,
}

impl Actor {
    /// Whether this actor carries the administrator role.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Descriptors for a driver's vehicle, shown to passengers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    make: String,
    model: String,
    plate: String,
}

impl Vehicle {
    /// Create a vehicle descriptor with non-blank fields.
    ///
    /// # Errors
    /// Returns [`ProfileValidationError::BlankVehicleField`] naming the
    /// first blank field.
    pub fn new(
        make: impl Into<String>,
        model: impl Into<String>,
        plate: impl Into<String>,
    ) -> Result<Self, ProfileValidationError> {
        let make = make.into();
        let model = model.into();
        let plate = plate.into();
        for (field, value) in [("make", &make), ("model", &model), ("plate", &plate)] {
            if value.trim().is_empty() {
                return Err(ProfileValidationError::BlankVehicleField { field });
            }
        }
        Ok(Self { make, model, plate })
    }

    /// Manufacturer, e.g. "Toyota".
    pub fn make(&self) -> &str {
        self.make.as_str()
    }

    /// Model name, e.g. "Prius".
    pub fn model(&self) -> &str {
        self.model.as_str()
    }

    /// Licence plate shown so the passenger can find the car.
    pub fn plate(&self) -> &str {
        self.plate.as_str()
    }
}

/// A user profile: the denormalized shadow of the external auth identity.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    id: Uuid,
    display_name: String,
    phone: Option<String>,
    role: Role,
    account_status: AccountStatus,
    vehicle: Option<Vehicle>,
    created_at: DateTime<Utc>,
}

impl Profile {
    /// Rebuild a profile from persistence. The vehicle, if any, is attached
    /// separately via [`Profile::with_vehicle`].
    ///
    /// # Errors
    /// Returns [`ProfileValidationError::BlankDisplayName`] when the stored
    /// display name is blank.
    pub fn restore(
        id: Uuid,
        display_name: impl Into<String>,
        phone: Option<String>,
        role: Role,
        account_status: AccountStatus,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ProfileValidationError> {
        let display_name = display_name.into();
        if display_name.trim().is_empty() {
            return Err(ProfileValidationError::BlankDisplayName);
        }
        Ok(Self {
            id,
            display_name,
            phone,
            role,
            account_status,
            vehicle: None,
            created_at,
        })
    }

    /// Profile identity; matches the token subject for the same user.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Name shown to other ride participants.
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Contact phone number, when the user provided one.
    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    /// Role recorded for the account.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Whether the account may use the service.
    pub fn account_status(&self) -> AccountStatus {
        self.account_status
    }

    /// The driver's vehicle descriptors, when recorded.
    pub fn vehicle(&self) -> Option<&Vehicle> {
        self.vehicle.as_ref()
    }

    /// Account creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Whether the account is blocked from mutating calls.
    pub fn is_blocked(&self) -> bool {
        self.account_status != AccountStatus::Active
    }

    /// Apply profile edits, keeping identity and role untouched.
    ///
    /// # Errors
    /// Returns [`ProfileValidationError::BlankDisplayName`] for blank names.
    pub fn update(
        mut self,
        display_name: impl Into<String>,
        phone: Option<String>,
    ) -> Result<Self, ProfileValidationError> {
        let display_name = display_name.into();
        if display_name.trim().is_empty() {
            return Err(ProfileValidationError::BlankDisplayName);
        }
        self.display_name = display_name;
        self.phone = phone;
        Ok(self)
    }

    /// Attach or clear the vehicle descriptors.
    ///
    /// # Errors
    /// Returns [`ProfileValidationError::VehicleWithoutDriverRole`] when the
    /// account is not a driver.
    pub fn with_vehicle(
        mut self,
        vehicle: Option<Vehicle>,
    ) -> Result<Self, ProfileValidationError> {
        if vehicle.is_some() && self.role != Role::Driver {
            return Err(ProfileValidationError::VehicleWithoutDriverRole);
        }
        self.vehicle = vehicle;
        Ok(self)
    }

    /// Set the account status; used by administrators.
    pub fn with_account_status(mut self, status: AccountStatus) -> Self {
        self.account_status = status;
        self
    }
}
