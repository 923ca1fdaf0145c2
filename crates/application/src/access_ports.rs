mod acl;
mod attributes;
mod policies;
mod roles;

pub use acl::{AclEntryRecord, AclRepository};
pub use attributes::AttributeRepository;
pub use policies::PolicyRepository;
pub use roles::{RoleAssignmentRecord, RoleRepository};
