//! Name → handler mapping for the network-decoder stack, plus the
//! `register_default` bootstrap and the `as`/`wrap` stacking constructors.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use format::{Format, FormatError, Result};

const MAX_TYPE_NAME_LEN: usize = 20;

/// Builds the next layer over `lower`. A plain closure is enough here
/// because every handler registered by `register_default` takes no
/// construction options. A decoder that does need typed options (WAV, Ogg,
/// Ogg/Opus) is constructed directly by its own crate instead of through
/// this registry.
pub type Constructor = Arc<dyn Fn(Box<dyn Format>) -> Result<Box<dyn Format>> + Send + Sync>;

#[derive(Default)]
pub struct Registry {
    handlers: RwLock<HashMap<String, Constructor>>,
}

impl Registry {
    pub fn new() -> Self {
        Registry {
            handlers: RwLock::new(HashMap::new()),
        }
    }

    pub fn register(&self, type_name: &str, constructor: Constructor) -> Result<()> {
        if type_name.len() > MAX_TYPE_NAME_LEN {
            return Err(FormatError::TypeNameTooLong(type_name.to_string()));
        }
        let mut handlers = self.handlers.write().expect("registry lock poisoned");
        if handlers.contains_key(type_name) {
            return Err(FormatError::DuplicateType(type_name.to_string()));
        }
        handlers.insert(type_name.to_string(), constructor);
        Ok(())
    }

    pub fn unregister(&self, type_name: &str) -> Option<Constructor> {
        self.handlers
            .write()
            .expect("registry lock poisoned")
            .remove(type_name)
    }

    pub fn clear(&self) {
        self.handlers.write().expect("registry lock poisoned").clear();
    }

    pub fn get(&self, type_name: &str) -> Option<Constructor> {
        self.handlers
            .read()
            .expect("registry lock poisoned")
            .get(type_name)
            .cloned()
    }

    /// Wraps `lower` with the handler registered under `type_name`.
    pub fn stack(&self, lower: Box<dyn Format>, type_name: &str) -> Result<Box<dyn Format>> {
        let ctor = self
            .get(type_name)
            .ok_or_else(|| FormatError::UnknownType(type_name.to_string()))?;
        ctor(lower)
    }

    /// Registers pcap, ethernet, the ethernet-IP dispatcher, Linux cooked,
    /// IPv4, IPv6, UDP, and RTP, in that order.
    pub fn register_default(&self) -> Result<()> {
        self.register(
            "pcap",
            Arc::new(|lower| Ok(Box::new(pcap::Pcap::open(lower)?))),
        )?;
        self.register(
            "ethernet",
            Arc::new(|lower| Ok(Box::new(linklayer::Ethernet::open(lower, false)?))),
        )?;
        self.register(
            "ethernet_ip",
            Arc::new(|lower| Ok(Box::new(linklayer::EthernetIpDispatcher::open(lower, false)?))),
        )?;
        self.register(
            "linux_sll",
            Arc::new(|lower| Ok(Box::new(linklayer::LinuxCooked::open(lower)?))),
        )?;
        self.register("ipv4", Arc::new(|lower| Ok(Box::new(ipnet::Ipv4::open(lower)?))))?;
        self.register("ipv6", Arc::new(|lower| Ok(Box::new(ipnet::Ipv6::open(lower)?))))?;
        self.register("udp", Arc::new(|lower| Ok(Box::new(udp::Udp::open(lower)?))))?;
        self.register("rtp", Arc::new(|lower| Ok(Box::new(rtp::Rtp::open(lower)?))))?;
        Ok(())
    }
}

static GLOBAL: OnceLock<Registry> = OnceLock::new();

/// Process-wide registry, created on first use. Explicit construction via
/// [`Registry::new`] remains the default entry point; this exists only for
/// callers that intentionally want shared, opt-in global state.
pub fn global() -> &'static Registry {
    GLOBAL.get_or_init(|| {
        let registry = Registry::new();
        registry
            .register_default()
            .expect("register_default must not collide on an empty registry");
        registry
    })
}

/// Looks up `type_name` in `registry` (or the global registry if `None`)
/// and wraps `lower` with it.
pub fn stack_as(
    lower: Box<dyn Format>,
    type_name: &str,
    registry: Option<&Registry>,
) -> Result<Box<dyn Format>> {
    match registry {
        Some(r) => r.stack(lower, type_name),
        None => global().stack(lower, type_name),
    }
}
