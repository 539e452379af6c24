// paragres/src/replace/endpoint.rs
use tracing::debug;

use crate::settings::ConnectionParameters;

/// One side of the copy: a Postgres database plus how to reach it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatabaseEndpoint {
    pub name: Option<String>,
    /// `--user=`, `--host=`, `--port=` in that order. Never carries a password.
    pub args: Vec<String>,
    pub password: Option<String>,
}

fn truthy(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl DatabaseEndpoint {
    pub fn named(name: Option<String>) -> Self {
        Self {
            name: name.filter(|n| !n.is_empty()),
            ..Self::default()
        }
    }

    /// Applies resolved settings. A name that is already set is never replaced.
    pub fn initialize(&mut self, settings: &ConnectionParameters, label: &str) {
        debug!("Initializing database settings for {}", label);

        if self.name().is_none() {
            if let Some(name) = truthy(&settings.name) {
                self.name = Some(name.to_string());
            }
        }

        self.password = settings.password.clone();

        let ordered = [
            ("user", &settings.user),
            ("host", &settings.host),
            ("port", &settings.port),
        ];
        self.args = ordered
            .into_iter()
            .filter_map(|(key, value)| {
                truthy(value).map(|v| {
                    debug!("Adding parameter {}", key);
                    format!("--{}={}", key, v)
                })
            })
            .collect();
    }

    /// The database name, treating empty as unset.
    pub fn name(&self) -> Option<&str> {
        truthy(&self.name)
    }

    pub fn password(&self) -> Option<&str> {
        truthy(&self.password)
    }

    /// Value of the `--user=` argument, if one was configured.
    pub fn user(&self) -> Option<&str> {
        self.args.iter().find_map(|arg| arg.strip_prefix("--user="))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> ConnectionParameters {
        ConnectionParameters {
            name: Some("dbname".into()),
            user: Some("username".into()),
            password: Some("password".into()),
            host: Some("host".into()),
            port: Some("port".into()),
        }
    }

    #[test]
    fn test_initialize_from_settings() {
        let mut endpoint = DatabaseEndpoint::default();
        endpoint.initialize(&settings(), "source");

        assert_eq!(endpoint.name(), Some("dbname"));
        assert_eq!(endpoint.args, vec!["--user=username", "--host=host", "--port=port"]);
        assert_eq!(endpoint.password(), Some("password"));
        assert_eq!(endpoint.user(), Some("username"));
    }

    #[test]
    fn test_explicit_name_is_kept() {
        let mut endpoint = DatabaseEndpoint::named(Some("bestdb".into()));
        endpoint.initialize(&settings(), "source");
        assert_eq!(endpoint.name(), Some("bestdb"));

        let mut other = settings();
        other.name = Some("otherdb".into());
        endpoint.initialize(&other, "source");
        assert_eq!(endpoint.name(), Some("bestdb"));
    }

    #[test]
    fn test_empty_explicit_name_is_replaced_by_settings() {
        let mut endpoint = DatabaseEndpoint::named(Some(String::new()));
        endpoint.initialize(&settings(), "destination");
        assert_eq!(endpoint.name(), Some("dbname"));
    }

    #[test]
    fn test_no_name_in_settings() {
        let mut params = settings();
        params.name = None;

        let mut endpoint = DatabaseEndpoint::default();
        endpoint.initialize(&params, "source");

        assert_eq!(endpoint.name(), None);
    }

    #[test]
    fn test_missing_and_empty_values_are_skipped() {
        let mut params = settings();
        params.host = None;
        let mut endpoint = DatabaseEndpoint::default();
        endpoint.initialize(&params, "source");
        assert_eq!(endpoint.args, vec!["--user=username", "--port=port"]);

        params.host = Some(String::new());
        endpoint.initialize(&params, "source");
        assert_eq!(endpoint.args, vec!["--user=username", "--port=port"]);
    }

    #[test]
    fn test_password_always_overwritten_and_never_an_arg() {
        let mut endpoint = DatabaseEndpoint::default();
        endpoint.initialize(&settings(), "source");

        let mut params = settings();
        params.password = Some(String::new());
        endpoint.initialize(&params, "source");

        assert_eq!(endpoint.password, Some(String::new()));
        assert_eq!(endpoint.password(), None);
        assert!(endpoint.args.iter().all(|a| !a.contains("password")));
    }
}
