use crate::error::{Error, Result};

/// Queue construction parameters.
#[derive(Debug, Clone)]
pub struct Config {
    /// Number of worker threads. `None` resolves to the number of logical
    /// CPUs on the host at construction time.
    pub num_threads: Option<usize>,

    /// Prefix for worker and scheduler thread names.
    pub thread_name_prefix: String,

    /// Stack size for spawned threads, in bytes.
    pub stack_size: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_threads: None,
            thread_name_prefix: "conveyor-worker".to_string(),
            stack_size: Some(2 * 1024 * 1024),
        }
    }
}

impl Config {
    /// Start building a configuration.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Check the configuration for unusable values.
    pub fn validate(&self) -> Result<()> {
        if let Some(n) = self.num_threads {
            if n == 0 {
                return Err(Error::config("num_threads must be > 0"));
            }
            if n > 1024 {
                return Err(Error::config("num_threads too large (max 1024)"));
            }
        }

        if self.thread_name_prefix.is_empty() {
            return Err(Error::config("thread_name_prefix must not be empty"));
        }

        Ok(())
    }

    /// Resolve the effective worker count, never below 1.
    pub fn worker_threads(&self) -> usize {
        self.num_threads.unwrap_or_else(|| num_cpus::get().max(1))
    }
}

/// Builder for [`Config`].
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a builder holding the default configuration.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Set the number of worker threads.
    pub fn num_threads(mut self, n: usize) -> Self {
        self.config.num_threads = Some(n);
        self
    }

    /// Set the thread name prefix.
    pub fn thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.config.thread_name_prefix = prefix.into();
        self
    }

    /// Set the stack size for spawned threads.
    pub fn stack_size(mut self, size: usize) -> Self {
        self.config.stack_size = Some(size);
        self
    }

    /// Validate and produce the configuration.
    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}
