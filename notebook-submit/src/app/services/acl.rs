// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use crate::app::types::{AclEntry, Grants, JobPermissions, PermissionLevel, Principal};

const OWNER_LEVEL: &str = "IS_OWNER";

/// Principal holding the job's direct (non-inherited) owner grant.
pub fn current_owner(permissions: &JobPermissions) -> Option<Principal> {
    permissions
        .access_control_list
        .iter()
        .filter(|entry| {
            entry
                .all_permissions
                .iter()
                .any(|grant| grant.permission_level == OWNER_LEVEL && !grant.inherited)
        })
        .find_map(|entry| entry.principal())
}

/// Owner first, then view, run and manage grants in configured order.
pub fn build_job_acl(owner: Principal, grants: &Grants) -> Vec<AclEntry> {
    let buckets = [
        (&grants.view, PermissionLevel::CanView),
        (&grants.run, PermissionLevel::CanManageRun),
        (&grants.manage, PermissionLevel::CanManage),
    ];

    std::iter::once(AclEntry::new(owner, PermissionLevel::IsOwner))
        .chain(buckets.into_iter().flat_map(|(principals, level)| {
            principals
                .iter()
                .cloned()
                .map(move |principal| AclEntry::new(principal, level))
        }))
        .collect()
}
