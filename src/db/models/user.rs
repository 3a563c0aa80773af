use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Account roles. EMPLOYEE, HR, ADMIN and SUPERADMIN form an escalating
/// privilege hierarchy; VENDOR sits outside of it and only ever matches
/// itself (vendors are external parties, not staff).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Employee,
    Hr,
    Admin,
    Superadmin,
    Vendor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Employee => "EMPLOYEE",
            Role::Hr => "HR",
            Role::Admin => "ADMIN",
            Role::Superadmin => "SUPERADMIN",
            Role::Vendor => "VENDOR",
        }
    }

    /// Privilege rank within the staff hierarchy. VENDOR ranks at zero so it
    /// never satisfies a hierarchy check.
    pub fn rank(&self) -> u8 {
        match self {
            Role::Vendor => 0,
            Role::Employee => 1,
            Role::Hr => 2,
            Role::Admin => 3,
            Role::Superadmin => 4,
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EMPLOYEE" => Ok(Role::Employee),
            "HR" => Ok(Role::Hr),
            "ADMIN" => Ok(Role::Admin),
            "SUPERADMIN" => Ok(Role::Superadmin),
            "VENDOR" => Ok(Role::Vendor),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: String,
    pub role: Role,
    pub department: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl User {
    /// True when the user holds `required` or a higher staff role.
    /// VENDOR accounts only ever satisfy a VENDOR requirement.
    pub fn has_role(&self, required: Role) -> bool {
        match required {
            Role::Vendor => self.role == Role::Vendor,
            _ => self.role.rank() >= required.rank(),
        }
    }
}

/// Fields required to insert a new user row.
pub struct CreateUser {
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: Role,
    pub department: Option<String>,
}
