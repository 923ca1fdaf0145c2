//! Access-decision service and its repository ports.

#![forbid(unsafe_code)]

mod access_decision_service;
mod access_ports;

pub use access_decision_service::{
    AccessDecisionConfig, AccessDecisionService, AccessRequest, UnscopedAclMatching,
};
pub use access_ports::{
    AclEntryRecord, AclRepository, AttributeRepository, PolicyRepository, RoleAssignmentRecord,
    RoleRepository,
};
