#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Role {
    Admin,
    Hr,
}

impl Role {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ADMIN" => Some(Role::Admin),
            "HR" => Some(Role::Hr),
            _ => None,
        }
    }
}
