use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Primary role of an account.
///
/// The set is closed: adding a role means extending every exhaustive match
/// below, including the default hierarchy.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Viewer,
    DataEntry,
    Admin,
    SystemAdmin,
    SuperAdmin,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Viewer,
        Role::DataEntry,
        Role::Admin,
        Role::SystemAdmin,
        Role::SuperAdmin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Viewer => "viewer",
            Role::DataEntry => "data_entry",
            Role::Admin => "admin",
            Role::SystemAdmin => "system_admin",
            Role::SuperAdmin => "super_admin",
        }
    }

    const fn index(self) -> usize {
        match self {
            Role::Viewer => 0,
            Role::DataEntry => 1,
            Role::Admin => 2,
            Role::SystemAdmin => 3,
            Role::SuperAdmin => 4,
        }
    }

    const fn bit(self) -> u8 {
        1 << self.index()
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// Compact set of roles (one bit per role).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct RoleSet(u8);

impl RoleSet {
    pub const EMPTY: RoleSet = RoleSet(0);

    pub fn universe() -> Self {
        Role::ALL.into_iter().fold(Self::EMPTY, |set, r| set.with(r))
    }

    pub fn with(self, role: Role) -> Self {
        Self(self.0 | role.bit())
    }

    pub fn union(self, other: RoleSet) -> Self {
        Self(self.0 | other.0)
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0 & role.bit() != 0
    }

    pub fn iter(self) -> impl Iterator<Item = Role> {
        Role::ALL.into_iter().filter(move |r| self.contains(*r))
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HierarchyError {
    #[error("role hierarchy contains a cycle through '{0}'")]
    Cycle(Role),

    #[error("no single role dominates every other role")]
    NoRoot,
}

/// Static role hierarchy collapsed into explicit grant sets.
///
/// Built once from `(senior, junior)` edges; decisions are a single bit test
/// and never walk the graph at request time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleHierarchy {
    grants: [RoleSet; Role::ALL.len()],
    root: Role,
}

impl RoleHierarchy {
    /// Default chain: `super_admin > system_admin > admin > data_entry > viewer`.
    pub fn standard() -> Self {
        Self {
            grants: [
                RoleSet::EMPTY.with(Role::Viewer),
                RoleSet::EMPTY.with(Role::Viewer).with(Role::DataEntry),
                RoleSet::EMPTY
                    .with(Role::Viewer)
                    .with(Role::DataEntry)
                    .with(Role::Admin),
                RoleSet::EMPTY
                    .with(Role::Viewer)
                    .with(Role::DataEntry)
                    .with(Role::Admin)
                    .with(Role::SystemAdmin),
                RoleSet::universe(),
            ],
            root: Role::SuperAdmin,
        }
    }

    /// Build a hierarchy from `(senior, junior)` edges.
    ///
    /// Grant sets are the reflexive-transitive closure of the edges. Exactly
    /// one role must end up granting the whole universe.
    pub fn from_edges(edges: &[(Role, Role)]) -> Result<Self, HierarchyError> {
        let mut grants: [RoleSet; Role::ALL.len()] =
            Role::ALL.map(|r| RoleSet::EMPTY.with(r));

        // Fixpoint over a 5-node graph; bounded by the number of roles.
        for _ in 0..Role::ALL.len() {
            let mut changed = false;
            for &(senior, junior) in edges {
                let merged = grants[senior.index()].union(grants[junior.index()]);
                if merged != grants[senior.index()] {
                    grants[senior.index()] = merged;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        for &(senior, junior) in edges {
            if senior == junior || grants[junior.index()].contains(senior) {
                return Err(HierarchyError::Cycle(senior));
            }
        }

        let universe = RoleSet::universe();
        let mut roots = Role::ALL
            .into_iter()
            .filter(|r| grants[r.index()] == universe);
        let root = roots.next().ok_or(HierarchyError::NoRoot)?;
        if roots.next().is_some() {
            return Err(HierarchyError::NoRoot);
        }

        Ok(Self { grants, root })
    }

    /// The role whose grant set is the whole universe.
    pub fn root(&self) -> Role {
        self.root
    }

    pub fn is_root(&self, role: Role) -> bool {
        role == self.root
    }

    pub fn grants(&self, actor: Role, required: Role) -> bool {
        self.grants[actor.index()].contains(required)
    }

    pub fn is_at_least(&self, actor: Role, minimum: Role) -> bool {
        self.grants(actor, minimum)
    }

    /// String form used at untyped boundaries. Unknown roles grant nothing.
    pub fn grants_str(&self, actor: &str, required: &str) -> bool {
        match (actor.parse::<Role>(), required.parse::<Role>()) {
            (Ok(actor), Ok(required)) => self.grants(actor, required),
            _ => false,
        }
    }

    pub fn grant_set(&self, role: Role) -> Vec<Role> {
        self.grants[role.index()].iter().collect()
    }
}

impl Default for RoleHierarchy {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain_edges() -> Vec<(Role, Role)> {
        vec![
            (Role::SuperAdmin, Role::SystemAdmin),
            (Role::SystemAdmin, Role::Admin),
            (Role::Admin, Role::DataEntry),
            (Role::DataEntry, Role::Viewer),
        ]
    }

    #[test]
    fn root_grants_every_role() {
        let h = RoleHierarchy::standard();
        for role in Role::ALL {
            assert!(h.grants(h.root(), role), "root should grant {role}");
        }
    }

    #[test]
    fn grants_is_reflexive() {
        let h = RoleHierarchy::standard();
        for role in Role::ALL {
            assert!(h.grants(role, role));
        }
    }

    #[test]
    fn viewer_does_not_grant_admin() {
        let h = RoleHierarchy::standard();
        assert!(!h.grants(Role::Viewer, Role::Admin));
        assert!(h.is_at_least(Role::Admin, Role::DataEntry));
        assert!(!h.is_at_least(Role::DataEntry, Role::Admin));
    }

    #[test]
    fn edges_collapse_to_standard() {
        let built = RoleHierarchy::from_edges(&chain_edges()).unwrap();
        assert_eq!(built, RoleHierarchy::standard());
    }

    #[test]
    fn edge_order_does_not_matter() {
        let mut edges = chain_edges();
        edges.reverse();
        let built = RoleHierarchy::from_edges(&edges).unwrap();
        assert_eq!(built, RoleHierarchy::standard());
    }

    #[test]
    fn cycle_is_rejected() {
        let mut edges = chain_edges();
        edges.push((Role::Viewer, Role::Admin));
        assert!(matches!(
            RoleHierarchy::from_edges(&edges),
            Err(HierarchyError::Cycle(_))
        ));
    }

    #[test]
    fn missing_root_is_rejected() {
        // Two disconnected branches: nobody dominates everything.
        let edges = vec![
            (Role::SuperAdmin, Role::SystemAdmin),
            (Role::Admin, Role::DataEntry),
            (Role::DataEntry, Role::Viewer),
        ];
        assert_eq!(
            RoleHierarchy::from_edges(&edges),
            Err(HierarchyError::NoRoot)
        );
    }

    #[test]
    fn diamond_hierarchy_resolves() {
        let edges = vec![
            (Role::SuperAdmin, Role::SystemAdmin),
            (Role::SuperAdmin, Role::Admin),
            (Role::SystemAdmin, Role::Viewer),
            (Role::Admin, Role::DataEntry),
            (Role::DataEntry, Role::Viewer),
        ];
        let h = RoleHierarchy::from_edges(&edges).unwrap();
        assert_eq!(h.root(), Role::SuperAdmin);
        assert!(!h.grants(Role::SystemAdmin, Role::Admin));
        assert!(!h.grants(Role::Admin, Role::SystemAdmin));
        assert!(h.grants(Role::SystemAdmin, Role::Viewer));
    }

    #[test]
    fn unknown_role_strings_fail_closed() {
        let h = RoleHierarchy::standard();
        assert!(!h.grants_str("root", "viewer"));
        assert!(!h.grants_str("super_admin", "wizard"));
        assert!(h.grants_str("super_admin", "viewer"));
    }

    #[test]
    fn role_wire_names_round_trip_through_serde() {
        let json = serde_json::to_string(&Role::DataEntry).unwrap();
        assert_eq!(json, "\"data_entry\"");
        assert!(serde_json::from_str::<Role>("\"owner\"").is_err());
    }

    #[test]
    fn grant_set_lists_juniors() {
        let h = RoleHierarchy::standard();
        assert_eq!(h.grant_set(Role::DataEntry), vec![Role::Viewer, Role::DataEntry]);
    }
}
