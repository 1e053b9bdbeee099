//! Docker permission gate
//!
//! Two ordered checks guard every Docker-backed command: the user must be a
//! member of the docker group, and the daemon must answer a no-op query from
//! this session. They fail for different reasons (missing privilege vs. a
//! session that predates the group change) and carry different guidance.

use nix::unistd::{Gid, Group, User};
use std::process::{Command, Stdio};
use tracing::debug;

use crate::error::{Error, Result};

/// Derived per invocation, never cached: membership can change mid-session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionState {
    pub in_docker_group: bool,
    pub daemon_reachable: bool,
}

/// Access to the facts the gate decides on
pub trait DockerAccess {
    /// Names of the groups the invoking user belongs to
    fn user_groups(&self) -> Result<Vec<String>>;

    /// Whether a no-op daemon query succeeds
    fn daemon_reachable(&self) -> bool;
}

/// Queries the user database and the real `docker` client
#[derive(Debug, Clone)]
pub struct SystemDocker {
    docker_binary: String,
}

impl SystemDocker {
    pub fn new(docker_binary: impl Into<String>) -> Self {
        Self {
            docker_binary: docker_binary.into(),
        }
    }
}

impl DockerAccess for SystemDocker {
    fn user_groups(&self) -> Result<Vec<String>> {
        let uid = nix::unistd::getuid();
        let user = User::from_uid(uid)
            .map_err(|e| Error::PermissionCheck(e.to_string()))?
            .ok_or_else(|| Error::PermissionCheck(format!("no passwd entry for uid {}", uid)))?;

        let gids = group_ids(&user)?;
        let mut names = Vec::with_capacity(gids.len());
        for gid in gids {
            match Group::from_gid(gid) {
                Ok(Some(group)) => names.push(group.name),
                Ok(None) => debug!("gid {} has no group entry", gid),
                Err(e) => return Err(Error::PermissionCheck(e.to_string())),
            }
        }
        Ok(names)
    }

    fn daemon_reachable(&self) -> bool {
        Command::new(&self.docker_binary)
            .arg("ps")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }
}

/// Groups from the user database, so a freshly added membership counts even
/// before the session picks it up
#[cfg(not(target_vendor = "apple"))]
fn group_ids(user: &User) -> Result<Vec<Gid>> {
    let name = std::ffi::CString::new(user.name.as_str())
        .map_err(|e| Error::PermissionCheck(e.to_string()))?;
    nix::unistd::getgrouplist(&name, user.gid).map_err(|e| Error::PermissionCheck(e.to_string()))
}

#[cfg(target_vendor = "apple")]
fn group_ids(user: &User) -> Result<Vec<Gid>> {
    let mut gids = nix::unistd::getgroups().map_err(|e| Error::PermissionCheck(e.to_string()))?;
    if !gids.contains(&user.gid) {
        gids.push(user.gid);
    }
    Ok(gids)
}

/// Ordered, independently fatal Docker access checks
pub struct PermissionGate<A> {
    access: A,
    group: String,
}

impl<A: DockerAccess> PermissionGate<A> {
    pub fn new(access: A, group: impl Into<String>) -> Self {
        Self {
            access,
            group: group.into(),
        }
    }

    /// Run both checks; the daemon is only queried once membership passed
    pub fn check(&self) -> Result<PermissionState> {
        let groups = self.access.user_groups()?;
        let in_docker_group = groups.iter().any(|g| *g == self.group);
        debug!(group = %self.group, in_docker_group, "group membership checked");
        if !in_docker_group {
            return Err(Error::DockerGroupMissing {
                group: self.group.clone(),
            });
        }

        let daemon_reachable = self.access.daemon_reachable();
        debug!(daemon_reachable, "docker daemon probed");
        if !daemon_reachable {
            return Err(Error::DockerDaemonUnreachable {
                group: self.group.clone(),
            });
        }

        Ok(PermissionState {
            in_docker_group,
            daemon_reachable,
        })
    }
}
