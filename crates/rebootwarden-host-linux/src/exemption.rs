//! Exemption lookup against system group membership
//!
//! A host is exempt when its name appears in the member list of the
//! configured group, as resolved through NSS (local files, LDAP, SSSD).
//! Directory-joined machines are often listed by their computer account
//! name (`WS-01$`), so that form matches too.

use async_trait::async_trait;
use nix::unistd::Group;
use rebootwarden_host_api::{ExemptionOracle, HostError, HostResult};
use tracing::debug;

/// Looks the host up in a system group
#[derive(Debug, Clone, Copy, Default)]
pub struct GroupExemption;

#[async_trait]
impl ExemptionOracle for GroupExemption {
    async fn is_exempt(&self, host: &str, group: &str) -> HostResult<bool> {
        let group_name = group.to_string();
        // getgrnam_r may block on a network directory
        let lookup = tokio::task::spawn_blocking(move || Group::from_name(&group_name))
            .await
            .map_err(|e| HostError::Internal(format!("group lookup task failed: {}", e)))?;

        let members = match lookup {
            Ok(Some(group)) => group.mem,
            Ok(None) => {
                debug!(group = %group, "Exemption group does not exist");
                return Ok(false);
            }
            Err(errno) => {
                return Err(HostError::Unavailable(format!(
                    "group lookup for '{}' failed: {}",
                    group, errno
                )));
            }
        };

        Ok(member_matches(&members, host))
    }
}

/// Case-insensitive match of `host` or its computer-account form `HOST$`.
pub fn member_matches(members: &[String], host: &str) -> bool {
    let short = short_hostname(host);
    members.iter().any(|member| {
        let member = member.trim();
        let member = member.strip_suffix('$').unwrap_or(member);
        member.eq_ignore_ascii_case(short) || member.eq_ignore_ascii_case(host)
    })
}

/// Hostname of this machine, without any domain suffix
pub fn local_hostname() -> HostResult<String> {
    let name = nix::unistd::gethostname()
        .map_err(|e| HostError::Unavailable(format!("gethostname failed: {}", e)))?;
    let name = name
        .into_string()
        .map_err(|_| HostError::Parse("hostname is not valid UTF-8".into()))?;
    Ok(short_hostname(&name).to_string())
}

fn short_hostname(name: &str) -> &str {
    name.split('.').next().unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn members(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn matches_plain_and_account_names() {
        assert!(member_matches(&members(&["lab-02", "ws-01"]), "ws-01"));
        assert!(member_matches(&members(&["WS-01$"]), "ws-01"));
        assert!(member_matches(&members(&["ws-01"]), "WS-01.corp.example"));
    }

    #[test]
    fn no_partial_matches() {
        assert!(!member_matches(&members(&["ws-011", "ws-0"]), "ws-01"));
        assert!(!member_matches(&[], "ws-01"));
    }

    #[test]
    fn short_hostname_strips_domain() {
        assert_eq!(short_hostname("ws-01.corp.example"), "ws-01");
        assert_eq!(short_hostname("ws-01"), "ws-01");
    }

    #[test]
    fn local_hostname_is_not_empty() {
        let name = local_hostname().unwrap();
        assert!(!name.is_empty());
        assert!(!name.contains('.'));
    }

    #[tokio::test]
    async fn missing_group_is_not_exempt() {
        let exempt = GroupExemption
            .is_exempt("ws-01", "rebootwarden-no-such-group")
            .await
            .unwrap();
        assert!(!exempt);
    }
}
