//! Injection configuration

use once_cell::sync::Lazy;

use crate::codegen::Type;
use crate::consts;
use crate::error::{Error, Result};

static DEFAULT_CONFIG: Lazy<Config> = Lazy::new(Config::default);

/// Settings shared by the injectors and the reference interpreter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Internal name of the argument bundle class (relocatable when the runtime is shaded)
    pub args_class: String,
    /// Log the full listing of every inserted region at trace level
    pub trace_listing: bool,
    /// Highest max stack an injection may leave a method with
    pub max_stack_limit: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            args_class: consts::ARGS_CLASS.to_string(),
            trace_listing: false,
            max_stack_limit: u16::MAX,
        }
    }
}

impl Config {
    /// Process-wide default configuration
    pub fn global() -> &'static Config {
        &DEFAULT_CONFIG
    }

    /// Defaults overridden by `ARGSPLICE_ARGS_CLASS`, `ARGSPLICE_TRACE_LISTING` and
    /// `ARGSPLICE_MAX_STACK`
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();
        if let Ok(class) = std::env::var("ARGSPLICE_ARGS_CLASS") {
            if class.is_empty() || class.contains('.') || class.contains(';') {
                return Err(Error::config_error(format!(
                    "ARGSPLICE_ARGS_CLASS must be an internal class name, got {:?}",
                    class
                )));
            }
            config.args_class = class;
        }
        if let Ok(flag) = std::env::var("ARGSPLICE_TRACE_LISTING") {
            config.trace_listing = matches!(flag.as_str(), "1" | "true" | "yes");
        }
        if let Ok(limit) = std::env::var("ARGSPLICE_MAX_STACK") {
            config.max_stack_limit = limit.parse().map_err(|_| {
                Error::config_error(format!("ARGSPLICE_MAX_STACK must be a number up to {}, got {:?}", u16::MAX, limit))
            })?;
        }
        Ok(config)
    }

    pub fn with_args_class(mut self, args_class: &str) -> Self {
        self.args_class = args_class.to_string();
        self
    }

    pub fn with_trace_listing(mut self, trace_listing: bool) -> Self {
        self.trace_listing = trace_listing;
        self
    }

    pub fn with_max_stack_limit(mut self, limit: u16) -> Self {
        self.max_stack_limit = limit;
        self
    }

    pub fn args_type(&self) -> Type {
        Type::object(self.args_class.clone())
    }

    /// `(I)LArgs;`
    pub fn factory_desc(&self) -> String {
        format!("(I)L{};", self.args_class)
    }

    /// `(Ljava/lang/String;)LArgs;`
    pub fn set_desc_desc(&self) -> String {
        format!("(L{};)L{};", consts::STRING_CLASS, self.args_class)
    }

    /// `(Ljava/lang/Object;)LArgs;`
    pub fn push_desc(&self) -> String {
        format!("(L{};)L{};", consts::OBJECT_CLASS, self.args_class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptors_follow_args_class() {
        let config = Config::default().with_args_class("shaded/Args");
        assert_eq!(config.factory_desc(), "(I)Lshaded/Args;");
        assert_eq!(config.push_desc(), "(Ljava/lang/Object;)Lshaded/Args;");
        assert_eq!(config.set_desc_desc(), "(Ljava/lang/String;)Lshaded/Args;");
        assert_eq!(config.args_type(), Type::object("shaded/Args"));
    }

    #[test]
    fn test_global_is_default() {
        assert_eq!(Config::global(), &Config::default());
    }

    #[test]
    fn test_from_env() {
        std::env::set_var("ARGSPLICE_ARGS_CLASS", "shaded/Args");
        std::env::set_var("ARGSPLICE_TRACE_LISTING", "true");
        std::env::set_var("ARGSPLICE_MAX_STACK", "300");
        let config = Config::from_env().unwrap();
        assert_eq!(config.args_class, "shaded/Args");
        assert!(config.trace_listing);
        assert_eq!(config.max_stack_limit, 300);

        std::env::set_var("ARGSPLICE_MAX_STACK", "70000");
        let err = Config::from_env().unwrap_err();
        assert!(err.is_configuration());

        std::env::set_var("ARGSPLICE_MAX_STACK", "300");
        std::env::set_var("ARGSPLICE_ARGS_CLASS", "shaded.Args");
        assert!(Config::from_env().is_err());

        for key in ["ARGSPLICE_ARGS_CLASS", "ARGSPLICE_TRACE_LISTING", "ARGSPLICE_MAX_STACK"] {
            std::env::remove_var(key);
        }
    }
}
