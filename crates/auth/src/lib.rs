//! `tollgate-auth`: authentication and authorization core.
//!
//! Decides whether a request may proceed: credentials, session tokens, role
//! hierarchy, subscription gating and the per-request pipeline. Decoupled
//! from HTTP; persistence is consumed through [`UserStore`].

pub mod account;
pub mod claims;
pub mod config;
pub mod credentials;
pub mod error;
pub mod features;
pub mod lifecycle;
pub mod pipeline;
pub mod principal;
pub mod roles;
pub mod service;
pub mod store;
pub mod subscription;
pub mod token;

pub use account::{Account, AccountPatch, AccountView, PasswordHash};
pub use claims::{Claims, validate_claims};
pub use config::{AuthConfig, ConfigError};
pub use credentials::{CredentialStore, validate_password};
pub use error::{AuthError, DenyReason, ErrorCode, InternalError, Rejection};
pub use features::Feature;
pub use lifecycle::{AccountLifecycle, LifecycleSettings, RegisterRequest, Session};
pub use pipeline::{AuthRequest, AuthorizationDecision, AuthorizationPipeline, Requirement, Stage};
pub use principal::Principal;
pub use roles::{HierarchyError, Role, RoleHierarchy};
pub use service::{AuthCore, SetupError};
pub use store::{InMemoryUserStore, StoreError, UserStore};
pub use subscription::{SubscriptionPolicy, SubscriptionTier};
pub use token::{IssuedToken, TokenError, TokenService};
