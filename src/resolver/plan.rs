use crate::callsign::Callsign;
use std::fmt;

/// The connect method used for one hop, reported in every transport error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectMethod {
    /// TCP connection and console login to the local node
    Login,
    /// `C <port> <CALL-SSID>`
    DirectPort,
    /// `C <ALIAS>`
    NetromAlias,
    /// Target looked up on the live hop first
    Discovery,
    /// `C <CALL>` with nothing known
    BestEffort,
}

impl ConnectMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::DirectPort => "direct port",
            Self::NetromAlias => "netrom alias",
            Self::Discovery => "discovery",
            Self::BestEffort => "best effort",
        }
    }
}

impl fmt::Display for ConnectMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How to reach one hop from the node currently connected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectPlan {
    /// Connect on a known radio port, bypassing indirect routing
    DirectPort {
        port: u8,
        target: Callsign,
        /// Tried with the remaining budget if the direct attempt times out
        fallback_alias: Option<String>,
    },

    /// Connect through the node's routing by alias
    NetromAlias { alias: String, target: Callsign },

    /// Ask the connected hop's tables for the target before connecting
    DiscoveryFallback { target: Callsign },

    /// Nothing known; try the raw callsign and expect it to fail
    BestEffort { target: Callsign },
}

impl ConnectPlan {
    pub fn target(&self) -> &Callsign {
        match self {
            Self::DirectPort { target, .. }
            | Self::NetromAlias { target, .. }
            | Self::DiscoveryFallback { target }
            | Self::BestEffort { target } => target,
        }
    }

    pub fn method(&self) -> ConnectMethod {
        match self {
            Self::DirectPort { .. } => ConnectMethod::DirectPort,
            Self::NetromAlias { .. } => ConnectMethod::NetromAlias,
            Self::DiscoveryFallback { .. } => ConnectMethod::Discovery,
            Self::BestEffort { .. } => ConnectMethod::BestEffort,
        }
    }

    /// The console command for this plan
    ///
    /// Discovery has no fixed command; it is built from the live hop's tables.
    pub fn command(&self) -> Option<String> {
        match self {
            Self::DirectPort { port, target, .. } => Some(format!("C {} {}", port, target)),
            Self::NetromAlias { alias, .. } => Some(format!("C {}", alias)),
            Self::DiscoveryFallback { .. } => None,
            Self::BestEffort { target } => Some(format!("C {}", target)),
        }
    }
}

impl fmt::Display for ConnectPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.command() {
            Some(command) => write!(f, "{} ({})", self.method(), command),
            None => write!(f, "{} ({})", self.method(), self.target()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands() {
        let target: Callsign = "KS1R-15".parse().unwrap();
        let direct = ConnectPlan::DirectPort {
            port: 2,
            target: target.clone(),
            fallback_alias: None,
        };
        assert_eq!(direct.command().as_deref(), Some("C 2 KS1R-15"));
        assert_eq!(direct.method(), ConnectMethod::DirectPort);

        let alias = ConnectPlan::NetromAlias {
            alias: "SHOP".to_string(),
            target: target.clone(),
        };
        assert_eq!(alias.command().as_deref(), Some("C SHOP"));

        let discovery = ConnectPlan::DiscoveryFallback { target };
        assert_eq!(discovery.command(), None);
        assert_eq!(discovery.to_string(), "discovery (KS1R-15)");
    }
}
