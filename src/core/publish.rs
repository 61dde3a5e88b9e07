//! Publish gate: decides whether a run uploads, and where.
//!
//! All release-vs-dry-run branching happens here. The matrix driver only
//! sees an `Option<PublishTarget>`.

use serde::Serialize;

use crate::core::errors::PublishError;
use crate::util::config::PublishConfig;

/// Where the environment holds the upload login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CredentialsChannel {
    pub login_env: String,
    pub password_env: String,
}

/// Resolved login for an upload.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl CredentialsChannel {
    /// Read the login from the environment.
    pub fn resolve(&self) -> Result<Credentials, PublishError> {
        let read = |var: &str| {
            std::env::var(var)
                .ok()
                .filter(|v| !v.is_empty())
                .ok_or_else(|| PublishError::MissingCredentials {
                    var: var.to_string(),
                })
        };
        Ok(Credentials {
            login: read(&self.login_env)?,
            password: read(&self.password_env)?,
        })
    }
}

/// A concrete remote to upload packages to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishTarget {
    /// `https://<host>/<account>/<repository>`
    pub endpoint: String,

    /// Local name of the remote
    pub remote: String,

    pub username: String,
    pub channel: String,
    pub credentials: CredentialsChannel,
}

impl PublishTarget {
    /// Package reference, e.g. `tsl-hopscotch-map/2.3.0@tessil/stable`.
    pub fn reference(&self, name: &str, version: &str) -> String {
        format!("{}/{}@{}/{}", name, version, self.username, self.channel)
    }
}

/// Decide where to publish given whether the release trigger fired.
pub fn decide(trigger_present: bool, config: &PublishConfig) -> Option<PublishTarget> {
    if !trigger_present {
        return None;
    }

    let endpoint = format!(
        "https://{}/{}/{}",
        config.host.trim_matches('/'),
        config.username,
        config.repository
    );

    Some(PublishTarget {
        endpoint,
        remote: config.remote.clone(),
        username: config.username.clone(),
        channel: config.channel.clone(),
        credentials: CredentialsChannel {
            login_env: config.login_env.clone(),
            password_env: config.password_env.clone(),
        },
    })
}

/// The publish gate bound to its configuration.
#[derive(Debug, Clone)]
pub struct PublishGate {
    config: PublishConfig,
}

impl PublishGate {
    pub fn new(config: PublishConfig) -> Self {
        PublishGate { config }
    }

    /// Whether the release trigger variable is set to a non-empty value.
    pub fn trigger_present(&self) -> bool {
        std::env::var_os(&self.config.trigger_env).is_some_and(|v| !v.is_empty())
    }

    /// Decide from an explicit trigger signal.
    pub fn decide(&self, trigger_present: bool) -> Option<PublishTarget> {
        decide(trigger_present, &self.config)
    }

    /// Decide from the environment.
    pub fn decide_from_env(&self) -> Option<PublishTarget> {
        let trigger = self.trigger_present();
        tracing::debug!(
            "release trigger `{}` {}",
            self.config.trigger_env,
            if trigger { "present" } else { "absent" }
        );
        self.decide(trigger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_trigger_means_build_only() {
        assert_eq!(decide(false, &PublishConfig::default()), None);
    }

    #[test]
    fn test_trigger_builds_endpoint() {
        let config = PublishConfig {
            username: "tessil".to_string(),
            channel: "stable".to_string(),
            ..PublishConfig::default()
        };

        let target = decide(true, &config).unwrap();
        assert_eq!(target.endpoint, "https://api.bintray.com/conan/tessil/tsl");
        assert_eq!(target.channel, "stable");
        assert_eq!(
            target.reference("tsl-hopscotch-map", "2.3.0"),
            "tsl-hopscotch-map/2.3.0@tessil/stable"
        );
    }

    #[test]
    fn test_host_slashes_are_normalized() {
        let config = PublishConfig {
            host: "/artifacts.example.com/conan/".to_string(),
            username: "acme".to_string(),
            repository: "libs".to_string(),
            ..PublishConfig::default()
        };
        let target = decide(true, &config).unwrap();
        assert_eq!(target.endpoint, "https://artifacts.example.com/conan/acme/libs");
    }

    #[test]
    fn test_gate_reads_configured_variable() {
        let config = PublishConfig {
            trigger_env: "TSL_RELEASE_TEST_TRIGGER_UNSET_1F3A".to_string(),
            ..PublishConfig::default()
        };
        let gate = PublishGate::new(config);
        assert!(!gate.trigger_present());
        assert_eq!(gate.decide_from_env(), None);
    }

    #[test]
    fn test_empty_trigger_is_absent() {
        let var = "TSL_RELEASE_TEST_TRIGGER_EMPTY_4D7E";
        std::env::set_var(var, "");
        let gate = PublishGate::new(PublishConfig {
            trigger_env: var.to_string(),
            ..PublishConfig::default()
        });

        assert!(!gate.trigger_present());
        assert_eq!(gate.decide_from_env(), None);
    }

    #[test]
    fn test_set_trigger_is_present() {
        let var = "TSL_RELEASE_TEST_TRIGGER_SET_8C21";
        std::env::set_var(var, "v2.0.0");
        let gate = PublishGate::new(PublishConfig {
            trigger_env: var.to_string(),
            ..PublishConfig::default()
        });

        assert!(gate.trigger_present());
        let target = gate.decide_from_env().unwrap();
        assert_eq!(target.endpoint, "https://api.bintray.com/conan/tessil/tsl");
    }

    #[test]
    fn test_missing_credentials() {
        let channel = CredentialsChannel {
            login_env: "TSL_RELEASE_TEST_LOGIN_UNSET_9B2C".to_string(),
            password_env: "TSL_RELEASE_TEST_PASSWORD_UNSET_9B2C".to_string(),
        };
        let err = channel.resolve().unwrap_err();
        assert!(matches!(
            err,
            PublishError::MissingCredentials { ref var } if var == "TSL_RELEASE_TEST_LOGIN_UNSET_9B2C"
        ));
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials {
            login: "tessil".to_string(),
            password: "hunter2".to_string(),
        };
        assert!(!format!("{:?}", creds).contains("hunter2"));
    }
}
