//! Session configuration: the explicit, constructed-once-per-endpoint
//! values spec.md S9 asks a re-architecture to pack up rather than leave
//! scattered across module-scope globals (the original's `rootpath`,
//! receive-timeout, recovery flag and cache pools).

use std::time::Duration;

/// How many consecutive drive letters the driver registers, and under
/// what condition (the `/r<mode>`/`/u<n>` install parameters, spec.md
/// S6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterMode {
    /// Always register the requested unit count.
    Always,
    /// Only register if a liveness probe (`check`) succeeds first.
    OnlyIfProbeSucceeds,
}

/// Driver-side configuration: one value per serial endpoint, replacing
/// the module-scope timeout/recovery/cache state of the original
/// `serremote.c` (spec.md S9).
#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub baud_rate: u32,
    /// Receive timeout; the `/t<tenths>` install parameter converted to
    /// a [`Duration`] (0 or missing maps to the 5 s default).
    pub timeout: Duration,
    pub register_mode: RegisterMode,
    /// Number of consecutive drive letters to register, 1..=7.
    pub unit_count: u8,
    /// Data-cache pool size (number of independent cache lines). The
    /// original keeps exactly one global `dcache`; generalized here to a
    /// small pool so more than one concurrently open file can each hold
    /// a write-back line (spec.md S3's "small fixed pool").
    pub cache_lines: usize,
    /// Bytes per cache line.
    pub cache_line_size: usize,
    /// Entries prefetched into the driver-side directory-enumeration
    /// slot on the first `files` call for a given enumeration (spec.md
    /// S4.3); `1` disables batching (every `nfiles` round-trips).
    pub dir_batch: usize,
    /// Number of repeated `/d` install tokens seen (spec.md S6's "`d` -
    /// increase debug level"); the driver's own debug-print internals
    /// this gates are explicitly out of scope (spec.md S1), so this
    /// field only records the count a caller asked for.
    pub debug_level: u8,
}

impl DriverConfig {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
    pub const DEFAULT_CACHE_LINE_SIZE: usize = 1024;

    pub fn new(baud_rate: u32) -> Self {
        DriverConfig {
            baud_rate,
            timeout: Self::DEFAULT_TIMEOUT,
            register_mode: RegisterMode::Always,
            unit_count: 1,
            cache_lines: 1,
            cache_line_size: Self::DEFAULT_CACHE_LINE_SIZE,
            dir_batch: 1,
            debug_level: 0,
        }
    }

    /// Parses the client OS's space/NUL-delimited install-argument
    /// string (spec.md S6 "Driver installation parameters"), mirroring
    /// `driver/serremote.c`'s `case 0x40` token scan: each token
    /// optionally prefixed by `/` or `-` selects `s<baud>`/`t<tenths>`/
    /// `r<mode>`/`u<n>`/`d`; a bare numeric token is a baud-rate
    /// shorthand (SPEC_FULL.md S4 point 2). An unrecognized baud value
    /// falls back to [`remote_drive_transport::DEFAULT_BAUD`], matching
    /// the original's `bdset < 0` fallback.
    pub fn parse_install_args(args: &str) -> Self {
        let mut config = DriverConfig::default();
        for token in args.split(|c: char| c == ' ' || c == '\0').filter(|t| !t.is_empty()) {
            if let Some(body) = token.strip_prefix('/').or_else(|| token.strip_prefix('-')) {
                let mut chars = body.chars();
                match chars.next().map(|c| c.to_ascii_lowercase()) {
                    Some('d') => config.debug_level = config.debug_level.saturating_add(1),
                    Some('s') => {
                        if let Ok(v) = chars.as_str().parse() {
                            config.baud_rate = v;
                        }
                    }
                    Some('t') => {
                        if let Ok(tenths) = chars.as_str().parse::<u64>() {
                            config.timeout = if tenths == 0 {
                                Self::DEFAULT_TIMEOUT
                            } else {
                                Duration::from_millis(tenths * 100)
                            };
                        }
                    }
                    Some('r') => {
                        if let Ok(mode) = chars.as_str().parse::<u8>() {
                            config.register_mode = if mode == 0 {
                                RegisterMode::Always
                            } else {
                                RegisterMode::OnlyIfProbeSucceeds
                            };
                        }
                    }
                    Some('u') => {
                        if let Ok(n) = chars.as_str().parse::<u8>() {
                            config.unit_count = n.clamp(1, 7);
                        }
                    }
                    _ => {}
                }
            } else if token.starts_with(|c: char| c.is_ascii_digit()) {
                if let Ok(v) = token.parse() {
                    config.baud_rate = v;
                }
            }
        }
        if !remote_drive_transport::BAUD_RATES.contains(&config.baud_rate) {
            config.baud_rate = remote_drive_transport::DEFAULT_BAUD;
        }
        config
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        DriverConfig::new(remote_drive_transport::DEFAULT_BAUD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_baud_timeout_and_register_mode_tokens() {
        let config = DriverConfig::parse_install_args("/s9600 /t30 /r1");
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.timeout, Duration::from_millis(3000));
        assert_eq!(config.register_mode, RegisterMode::OnlyIfProbeSucceeds);
    }

    #[test]
    fn bare_numeric_token_is_a_baud_shorthand() {
        let config = DriverConfig::parse_install_args("19200");
        assert_eq!(config.baud_rate, 19200);
    }

    #[test]
    fn unrecognized_baud_falls_back_to_default() {
        let config = DriverConfig::parse_install_args("/s31337");
        assert_eq!(config.baud_rate, remote_drive_transport::DEFAULT_BAUD);
    }

    #[test]
    fn zero_tenths_falls_back_to_default_timeout() {
        let config = DriverConfig::parse_install_args("/t0");
        assert_eq!(config.timeout, DriverConfig::DEFAULT_TIMEOUT);
    }

    #[test]
    fn repeated_d_tokens_accumulate_debug_level() {
        let config = DriverConfig::parse_install_args("-d -d -d");
        assert_eq!(config.debug_level, 3);
    }

    #[test]
    fn unit_count_is_clamped_to_seven() {
        let config = DriverConfig::parse_install_args("/u9");
        assert_eq!(config.unit_count, 7);
    }

    #[test]
    fn hyphen_prefixed_tokens_are_accepted_like_slash() {
        let config = DriverConfig::parse_install_args("-s4800");
        assert_eq!(config.baud_rate, 4800);
    }
}

/// Service-side configuration: one exported root directory per unit
/// index (spec.md S4.6 "Root mapping"), up to 8.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    roots: Vec<std::path::PathBuf>,
}

/// Root mapping rejected an out-of-range unit index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unit index {0} has no configured root (only {1} configured)")]
pub struct NoSuchUnit(pub u8, pub usize);

impl ServiceConfig {
    pub const MAX_UNITS: usize = 8;

    /// Builds a config from up to [`ServiceConfig::MAX_UNITS`] root
    /// directories, unit 0 first.
    pub fn new(roots: Vec<std::path::PathBuf>) -> Self {
        assert!(
            roots.len() <= Self::MAX_UNITS,
            "at most {} exported units are supported",
            Self::MAX_UNITS
        );
        ServiceConfig { roots }
    }

    pub fn root(&self, unit: u8) -> Result<&std::path::Path, NoSuchUnit> {
        self.roots
            .get(unit as usize)
            .map(|p| p.as_path())
            .ok_or(NoSuchUnit(unit, self.roots.len()))
    }

    pub fn unit_count(&self) -> usize {
        self.roots.len()
    }
}
