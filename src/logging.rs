use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicUsize, Ordering};

use log::{error, info, warn, LevelFilter};
use log4rs_dynamic_filters::DynamicLevelFilter;

use crate::config::Config;

/// Name of the dynamic filter guarding HTTP-stack loggers in `log4rs.yaml`.
pub const TRANSPORT_FILTER: &str = "transport";

/// A unique identifier for a particular request to the election service.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub struct RequestId(pub usize);

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl RequestId {
    /// Atomically get the next ID. This wraps around back to zero if you somehow exceed a usize.
    pub fn next() -> RequestId {
        static REQUEST_ID_COUNTER: AtomicUsize = AtomicUsize::new(0);
        RequestId(REQUEST_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// Set up logging from the configured log4rs file.
pub fn init(config: &Config) -> anyhow::Result<()> {
    log4rs::init_file(
        config.log_config(),
        log4rs_dynamic_filters::default_deserializers(),
    )?;
    info!("Initialised logging from {}", config.log_config());
    Ok(())
}

/// Open or silence the HTTP stack's own logging.
pub fn set_transport_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Off
    };
    DynamicLevelFilter::set(TRANSPORT_FILTER, level);
}

/// Log an outgoing request.
pub(crate) fn log_request(id: RequestId, method: impl Display, path: &str) {
    info!("->req{id} {method} {path}");
}

/// Log a reply, at a level matching its status class.
pub(crate) fn log_response(id: RequestId, status: u16, path: &str) {
    let log_msg = format!("<-rsp{id} {status} {path}");
    match status {
        500.. => error!("{log_msg}"),
        400..=499 => warn!("{log_msg}"),
        _ => info!("{log_msg}"),
    }
}
