//! Well-known role constants and edge normalization.
//!
//! Roles are stored (and carried in JWT claims) with the `ROLE_` prefix and
//! exposed through the external API without it. Normalize at the edge, never
//! in the middle.

/// Stored form of the regular-user role.
pub const ROLE_USER: &str = "ROLE_USER";
/// Stored form of the administrator role.
pub const ROLE_ADMIN: &str = "ROLE_ADMIN";

/// Strip the storage prefix for external presentation (`ROLE_USER` -> `USER`).
pub fn display_role(role: &str) -> &str {
    role.strip_prefix("ROLE_").unwrap_or(role)
}

/// Add the storage prefix to an external role name (`USER` -> `ROLE_USER`).
///
/// Already-prefixed input is returned unchanged.
pub fn storage_role(role: &str) -> String {
    if role.starts_with("ROLE_") {
        role.to_string()
    } else {
        format!("ROLE_{role}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_strips_prefix() {
        assert_eq!(display_role("ROLE_ADMIN"), "ADMIN");
        assert_eq!(display_role("ROLE_USER"), "USER");
    }

    #[test]
    fn test_display_passes_through_unprefixed() {
        assert_eq!(display_role("GUEST"), "GUEST");
    }

    #[test]
    fn test_storage_round_trip() {
        assert_eq!(storage_role("USER"), "ROLE_USER");
        assert_eq!(storage_role("ROLE_USER"), "ROLE_USER");
        assert_eq!(display_role(&storage_role("ADMIN")), "ADMIN");
    }
}
