use std::rc::Rc;

use crate::host::Host;

pub const DEFAULT_HOST_BINDING: &str = "sh_raw";

/// Nested function calls allowed before a run is aborted.
pub const DEFAULT_MAX_DEPTH: usize = 1000;

/// Syntactic nesting (lists, `if`, `set`, calls, ...) allowed before a run is
/// aborted. Counted across function bodies, so it bounds the native recursion.
pub const DEFAULT_MAX_NESTING: usize = 5000;

/// Stack size the default limits fit in. Run the interpreter on a thread with
/// at least this much stack.
pub const STACK_SIZE: usize = 256 * 1024 * 1024;

/// Interpreter settings. The default configuration is sandboxed: no host
/// binding is seeded into the environment.
#[derive(Clone)]
pub struct Config {
    pub host: Option<Rc<dyn Host>>,
    /// Name the host escape is bound to
    pub host_binding: String,
    pub max_depth: usize,
    pub max_nesting: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: None,
            host_binding: DEFAULT_HOST_BINDING.to_owned(),
            max_depth: DEFAULT_MAX_DEPTH,
            max_nesting: DEFAULT_MAX_NESTING,
        }
    }
}

impl Config {
    pub fn with_host(host: Rc<dyn Host>) -> Self {
        Config {
            host: Some(host),
            ..Config::default()
        }
    }

    pub fn host_binding(mut self, name: impl Into<String>) -> Self {
        self.host_binding = name.into();
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn max_nesting(mut self, nesting: usize) -> Self {
        self.max_nesting = nesting;
        self
    }
}
