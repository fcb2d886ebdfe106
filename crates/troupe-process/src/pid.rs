use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Address used by engines that don't have a remote configured.
pub const LOCAL_ADDRESS: &str = "local";

/// A location-transparent process identifier.
///
/// The `address` names the engine a process lives on and the `name` names the process inside of
/// that engine. Two pids refer to the same process only if both parts match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Pid {
    address: String,
    name: String,
}

impl Pid {
    pub fn new<A: Into<String>, N: Into<String>>(address: A, name: N) -> Self {
        Self {
            address: address.into(),
            name: name.into(),
        }
    }

    /// Pid of a process living on an engine without a remote.
    pub fn local<N: Into<String>>(name: N) -> Self {
        Self::new(LOCAL_ADDRESS, name)
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Display for Pid {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.address, self.name)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{Pid, LOCAL_ADDRESS};

    #[test]
    fn equality_covers_address_and_name() {
        let a = Pid::new("127.0.0.1:4000", "worker/1");
        assert_eq!(a, Pid::new("127.0.0.1:4000", "worker/1"));
        assert_ne!(a, Pid::new("127.0.0.1:4001", "worker/1"));
        assert_ne!(a, Pid::new("127.0.0.1:4000", "worker/2"));
        assert_eq!(Pid::local("x").address(), LOCAL_ADDRESS);
    }

    #[test]
    fn hashes_by_value() {
        let mut set = HashSet::new();
        set.insert(Pid::local("a"));
        set.insert(Pid::local("a"));
        set.insert(Pid::local("b"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn display_and_serde() {
        let pid = Pid::new("node-1", "counter/abc");
        assert_eq!(pid.to_string(), "node-1/counter/abc");

        let json = serde_json::to_string(&pid).unwrap();
        assert_eq!(json, r#"{"address":"node-1","name":"counter/abc"}"#);
        let back: Pid = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pid);
    }
}
