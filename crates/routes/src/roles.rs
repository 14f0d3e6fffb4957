use serde::{Deserialize, Serialize};

/// Account role as stored by the backend.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "admin")]
    Admin,
    #[serde(rename = "publicador")]
    Publisher,
    #[serde(rename = "usuario")]
    Tourist,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    BrowseRoutes,
    /// Create a route, or edit/delete one the principal owns.
    AuthorRoute,
    /// Edit or delete any route regardless of owner.
    ModerateRoutes,
}

impl Role {
    pub fn permits(self, action: Action) -> bool {
        match (self, action) {
            (Role::Admin, _) => true,
            (Role::Publisher, Action::BrowseRoutes | Action::AuthorRoute) => true,
            (Role::Tourist, Action::BrowseRoutes) => true,
            _ => false,
        }
    }
}

/// Authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{role:?} may not {action:?}")]
pub struct Forbidden {
    pub role: Role,
    pub action: Action,
}

impl Principal {
    pub fn authorize(&self, action: Action) -> Result<(), Forbidden> {
        if self.role.permits(action) {
            Ok(())
        } else {
            Err(Forbidden {
                role: self.role,
                action,
            })
        }
    }

    /// Edit/delete check for an existing route owned by `owner`.
    pub fn authorize_owned(&self, owner: Option<&str>) -> Result<(), Forbidden> {
        if self.role.permits(Action::ModerateRoutes) {
            return Ok(());
        }
        self.authorize(Action::AuthorRoute)?;
        if owner == Some(self.user_id.as_str()) {
            Ok(())
        } else {
            Err(Forbidden {
                role: self.role,
                action: Action::ModerateRoutes,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Action, Principal, Role};

    fn who(role: Role) -> Principal {
        Principal {
            user_id: "u1".to_string(),
            role,
        }
    }

    #[test]
    fn permission_table() {
        use Action::*;
        let table = [
            (Role::Admin, [true, true, true]),
            (Role::Publisher, [true, true, false]),
            (Role::Tourist, [true, false, false]),
        ];
        for (role, expected) in table {
            let got = [BrowseRoutes, AuthorRoute, ModerateRoutes].map(|a| role.permits(a));
            assert_eq!(got, expected, "{role:?}");
        }
    }

    #[test]
    fn ownership_checks() {
        assert!(who(Role::Publisher).authorize_owned(Some("u1")).is_ok());
        assert!(who(Role::Publisher).authorize_owned(Some("u2")).is_err());
        assert!(who(Role::Publisher).authorize_owned(None).is_err());
        assert!(who(Role::Admin).authorize_owned(Some("u2")).is_ok());
        assert!(who(Role::Tourist).authorize_owned(Some("u1")).is_err());
    }

    #[test]
    fn wire_names() {
        let r: Role = serde_json::from_str("\"publicador\"").unwrap();
        assert_eq!(r, Role::Publisher);
        assert_eq!(serde_json::to_string(&Role::Tourist).unwrap(), "\"usuario\"");
        assert!(serde_json::from_str::<Role>("\"editor\"").is_err());
    }
}
