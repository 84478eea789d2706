// SPDX-FileCopyrightText: 2025-2026 TII (SSRC) and the Ghaf contributors
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use strum::{AsRefStr, Display, EnumString};

use crate::error::{Result, TransportError};
use crate::resolve::{resolve_hybrid, resolve_vsock};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, AsRefStr, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Scheme {
    Unix,
    Vsock,
    #[strum(serialize = "hvsock")]
    HybridVsock,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Address {
    Unix(PathBuf), // always rooted, "agent.sock" means "/agent.sock"
    Vsock { cid: u32, port: u32 },
    // Host-side UNIX socket of a hypervisor vsock proxy + guest port behind it
    HybridVsock { path: PathBuf, port: u32 },
}

impl Address {
    #[must_use]
    pub fn scheme(&self) -> Scheme {
        match self {
            Self::Unix(_) => Scheme::Unix,
            Self::Vsock { .. } => Scheme::Vsock,
            Self::HybridVsock { .. } => Scheme::HybridVsock,
        }
    }

    /// Encode into the private dial string convention.
    ///
    /// The RPC layer mangles any `scheme://` it does not know, so vsock and
    /// hybrid vsock use `scheme:payload` instead of URI form.
    #[must_use]
    pub fn dial_string(&self) -> DialString {
        match self {
            Self::Unix(path) => DialString {
                scheme: Scheme::Unix,
                text: unix_dial_text(path),
                hybrid_port: None,
            },
            Self::Vsock { cid, port } => DialString {
                scheme: Scheme::Vsock,
                text: format!("{}:{cid}:{port}", Scheme::Vsock),
                hybrid_port: None,
            },
            Self::HybridVsock { path, port } => DialString {
                scheme: Scheme::HybridVsock,
                text: format!("{}:{}", Scheme::HybridVsock, path.display()),
                hybrid_port: Some(*port),
            },
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unix(path) => write!(f, "unix://{}", path.display()),
            Self::Vsock { cid, port } => write!(f, "vsock://{cid}:{port}"),
            Self::HybridVsock { path, port } => write!(f, "hvsock://{}:{port}", path.display()),
        }
    }
}

fn unix_dial_text(path: &Path) -> String {
    let path = path.to_string_lossy();
    format!("unix:///{}", path.trim_start_matches('/'))
}

/// Anchor a socket path at `/`, the way the agent protocol resolves it
pub(crate) fn rooted(path: &str) -> PathBuf {
    Path::new("/").join(path.trim_start_matches('/'))
}

/// `scheme:` prefix as defined by RFC 3986: a letter, then letters, digits, `+`, `-` or `.`
fn looks_like_scheme(prefix: &str) -> bool {
    let mut chars = prefix.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Address in the form handed to the RPC layer's custom dialer.
///
/// For hybrid vsock the text is `hvsock:<path>` and the guest port travels
/// alongside in `hybrid_port`, so concurrent dials of different hybrid
/// addresses never share state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DialString {
    scheme: Scheme,
    text: String,
    hybrid_port: Option<u32>,
}

impl DialString {
    #[must_use]
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Port captured from the original `hvsock://` address, if any
    #[must_use]
    pub fn hybrid_port(&self) -> Option<u32> {
        self.hybrid_port
    }
}

impl fmt::Display for DialString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl AsRef<str> for DialString {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

/// Accept a dial string produced elsewhere. No hybrid port is captured, so a
/// `hvsock:` dial string must carry its own `:<port>` to be dialable.
impl FromStr for DialString {
    type Err = TransportError;

    fn from_str(text: &str) -> Result<Self> {
        let scheme = match text.split_once(':') {
            Some((scheme, _)) => Scheme::from_str(scheme).unwrap_or(Scheme::Unix),
            None => Scheme::Unix,
        };
        match scheme {
            Scheme::Vsock => {
                resolve_vsock(text)?;
            }
            Scheme::HybridVsock => {
                resolve_hybrid(text)?;
            }
            Scheme::Unix => {
                if text.is_empty() {
                    return Err(TransportError::invalid("Invalid unix dial string: empty"));
                }
            }
        }
        Ok(Self {
            scheme,
            text: text.to_owned(),
            hybrid_port: None,
        })
    }
}

impl FromStr for Address {
    type Err = TransportError;

    fn from_str(raw: &str) -> Result<Self> {
        parse(raw).map(|(_, address)| address)
    }
}

/// Digits only: `u32::from_str` would also take a leading `+`
pub(crate) fn parse_u32(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Parse a user supplied socket address.
///
/// Supported formats are:
///   - `unix://<unix socket path>`
///   - `vsock://<cid>:<port>`
///   - `<unix socket path>`
///   - `hvsock://<path>:<port>`, a host UNIX socket fronting the guest's
///     vsock, as provided by Firecracker-style hypervisors
///
/// # Errors
/// `InvalidArgument` on unknown scheme, missing component, or bad number
pub fn parse(raw: &str) -> Result<(DialString, Address)> {
    let address = match raw.split_once("://") {
        Some((scheme, rest)) => match Scheme::from_str(scheme) {
            Ok(Scheme::Unix) => parse_unix(raw, rest)?,
            Ok(Scheme::Vsock) => parse_vsock(raw, rest)?,
            Ok(Scheme::HybridVsock) => parse_hybrid(raw, rest)?,
            Err(_) => return Err(TransportError::invalid(format!("Invalid scheme: {raw}"))),
        },
        None => parse_bare(raw)?,
    };
    Ok((address.dial_string(), address))
}

// `unix://run/agent.sock` names `/run/agent.sock`: a host part is the first path segment
fn parse_unix(raw: &str, rest: &str) -> Result<Address> {
    let (authority, path) = rest.split_once('/').unwrap_or((rest, ""));
    if authority.contains(':') || (authority.is_empty() && path.trim_matches('/').is_empty()) {
        return Err(TransportError::invalid(format!(
            "Invalid unix scheme: {raw}"
        )));
    }
    let path = match (authority, path) {
        ("", path) => rooted(path),
        (host, "") => rooted(host),
        (host, path) => rooted(host).join(path.trim_start_matches('/')),
    };
    Ok(Address::Unix(path))
}

fn parse_bare(raw: &str) -> Result<Address> {
    if raw.is_empty() {
        return Err(TransportError::invalid("Invalid unix scheme: empty address"));
    }
    // `vsock:3:1024` or `localhost:80` is not a path; refuse to guess.
    // A colon further down (`./vm:1.sock`, `/run/vm:1.sock`) is fine.
    let first_segment = raw.split('/').next().unwrap_or_default();
    if let Some((prefix, _)) = first_segment.split_once(':') {
        let msg = if looks_like_scheme(prefix) {
            format!("Invalid scheme: {raw}")
        } else {
            format!("Invalid unix scheme: {raw}")
        };
        return Err(TransportError::invalid(msg));
    }
    Ok(Address::Unix(rooted(raw)))
}

fn parse_vsock(raw: &str, rest: &str) -> Result<Address> {
    let invalid = || TransportError::invalid(format!("Invalid vsock scheme: {raw}"));
    if rest.contains('/') {
        return Err(invalid());
    }
    let (cid, port) = rest.split_once(':').ok_or_else(invalid)?;
    if cid.is_empty() || port.is_empty() {
        return Err(invalid());
    }
    let cid = parse_u32(cid)
        .ok_or_else(|| TransportError::invalid(format!("Invalid vsock cid: {raw}")))?;
    let port = parse_u32(port)
        .ok_or_else(|| TransportError::invalid(format!("Invalid vsock port: {raw}")))?;
    Ok(Address::Vsock { cid, port })
}

fn parse_hybrid(raw: &str, rest: &str) -> Result<Address> {
    let invalid = || TransportError::invalid(format!("Invalid hybrid vsock scheme: {raw}"));
    let fields: Vec<&str> = rest.split(':').collect();
    let [path, port] = fields.as_slice() else {
        return Err(invalid());
    };
    if path.is_empty() {
        return Err(invalid());
    }
    let port = parse_u32(port)
        .ok_or_else(|| TransportError::invalid(format!("Invalid hybrid vsock port: {raw}")))?;
    Ok(Address::HybridVsock {
        path: PathBuf::from(*path),
        port,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::resolve_unix;

    fn assert_invalid(raw: &str) {
        match parse(raw) {
            Err(TransportError::InvalidArgument(_)) => {}
            other => panic!("{raw} should be rejected, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_unix() -> anyhow::Result<()> {
        let (dial, address) = parse("unix:///run/agent.sock")?;
        assert_eq!(address, Address::Unix("/run/agent.sock".into()));
        assert_eq!(dial.as_str(), "unix:///run/agent.sock");
        assert_eq!(dial.scheme(), Scheme::Unix);

        let (dial, address) = parse("/run/agent.sock")?;
        assert_eq!(address, Address::Unix("/run/agent.sock".into()));
        assert_eq!(dial.as_str(), "unix:///run/agent.sock");

        // Host part is the leading path segment, relative paths are rooted
        let (dial, address) = parse("unix://run/agent.sock")?;
        assert_eq!(address, Address::Unix("/run/agent.sock".into()));
        assert_eq!(dial.as_str(), "unix:///run/agent.sock");

        let (dial, address) = parse("unix://agent.sock")?;
        assert_eq!(address, Address::Unix("/agent.sock".into()));
        assert_eq!(dial.as_str(), "unix:///agent.sock");

        let (dial, address) = parse("agent.sock")?;
        assert_eq!(address, Address::Unix("/agent.sock".into()));
        assert_eq!(dial.as_str(), "unix:///agent.sock");

        let (dial, _) = parse("run/agent.sock")?;
        assert_eq!(dial.as_str(), "unix:///run/agent.sock");
        assert_eq!(resolve_unix(dial.as_str()), PathBuf::from("/run/agent.sock"));

        // Colons deeper in the path are not ports
        let (_, address) = parse("unix:///run/vm:1/agent.sock")?;
        assert_eq!(address, Address::Unix("/run/vm:1/agent.sock".into()));
        let (_, address) = parse("/run/vm:1/agent.sock")?;
        assert_eq!(address, Address::Unix("/run/vm:1/agent.sock".into()));
        let (dial, _) = parse("./vm:1.sock")?;
        assert_eq!(resolve_unix(dial.as_str()), PathBuf::from("/vm:1.sock"));
        Ok(())
    }

    #[test]
    fn test_parse_unix_rejects() {
        assert_invalid("");
        assert_invalid("unix://");
        assert_invalid("unix://localhost:80/agent.sock");
        assert_invalid("unix://agent.sock:80");
        assert_invalid("unix:///");
    }

    #[test]
    fn test_parse_bare_with_port_rejected() {
        for raw in ["localhost:80", "localhost:80/agent.sock", "agent.sock:80", "1host:80"] {
            assert_invalid(raw);
        }
        let err = parse("localhost:80").unwrap_err();
        assert_eq!(err.to_string(), "Invalid scheme: localhost:80");
    }

    #[test]
    fn test_scheme_is_case_insensitive() -> anyhow::Result<()> {
        let (dial, address) = parse("UNIX:///run/a.sock")?;
        assert_eq!(address, Address::Unix("/run/a.sock".into()));
        assert_eq!(dial.as_str(), "unix:///run/a.sock");

        let (dial, _) = parse("VSock://3:1024")?;
        assert_eq!(dial.as_str(), "vsock:3:1024");

        let (dial, _) = parse("HVSOCK:///run/kata.hvsock:1024")?;
        assert_eq!(dial.scheme(), Scheme::HybridVsock);
        assert_eq!(dial.as_str(), "hvsock:/run/kata.hvsock");
        Ok(())
    }

    #[test]
    fn test_parse_vsock() -> anyhow::Result<()> {
        let (dial, address) = parse("vsock://3:1024")?;
        assert_eq!(address, Address::Vsock { cid: 3, port: 1024 });
        assert_eq!(dial.as_str(), "vsock:3:1024");
        assert_eq!(dial.scheme(), Scheme::Vsock);
        Ok(())
    }

    #[test]
    fn test_parse_vsock_rejects() {
        for raw in [
            "vsock://:1024",
            "vsock://3:",
            "vsock://3",
            "vsock://3:1024/path",
            "vsock://x:1024",
            "vsock://3:y",
            "vsock://-1:1024",
            "vsock://+3:1024",
            "vsock://4294967296:1024",
            "vsock://3:4294967296",
            "vsock://3:1024:1",
        ] {
            assert_invalid(raw);
        }
    }

    #[test]
    fn test_parse_hybrid() -> anyhow::Result<()> {
        let (dial, address) = parse("hvsock:///run/fc/kata.hvsock:1024")?;
        assert_eq!(
            address,
            Address::HybridVsock {
                path: "/run/fc/kata.hvsock".into(),
                port: 1024
            }
        );
        assert_eq!(dial.as_str(), "hvsock:/run/fc/kata.hvsock");
        assert_eq!(dial.hybrid_port(), Some(1024));

        let (dial, _) = parse("hvsock://proxy:9999")?;
        assert_eq!(dial.as_str(), "hvsock:proxy");
        assert_eq!(dial.hybrid_port(), Some(9999));
        Ok(())
    }

    #[test]
    fn test_parse_hybrid_rejects() {
        assert_invalid("hvsock://");
        assert_invalid("hvsock://proxy");
        assert_invalid("hvsock://:1024");
        assert_invalid("hvsock://proxy:");
        assert_invalid("hvsock://proxy:port");
        assert_invalid("hvsock://a:b:1024");
    }

    #[test]
    fn test_parse_unknown_scheme() {
        assert_invalid("tcp://127.0.0.1:80");
        assert_invalid("http://localhost");
        // Dial strings are not addresses
        assert_invalid("vsock:3:1024");
        assert_invalid("hvsock:/run/kata.hvsock");
    }

    #[test]
    fn test_concurrent_hybrid_ports_are_independent() -> anyhow::Result<()> {
        let (first, _) = parse("hvsock:///run/a.hvsock:1024")?;
        let (second, _) = parse("hvsock:///run/b.hvsock:2048")?;
        assert_eq!(first.hybrid_port(), Some(1024));
        assert_eq!(second.hybrid_port(), Some(2048));
        Ok(())
    }

    #[test]
    fn test_vsock_round_trip() -> anyhow::Result<()> {
        for (cid, port) in [(0, 0), (2, 1024), (3, 65535), (u32::MAX, u32::MAX)] {
            let (dial, _) = parse(&format!("vsock://{cid}:{port}"))?;
            assert_eq!(resolve_vsock(dial.as_str())?, (cid, port));
        }
        Ok(())
    }

    #[test]
    fn test_round_trip_all_schemes() -> anyhow::Result<()> {
        for raw in ["unix:///run/agent.sock", "unix://run/agent.sock", "agent.sock"] {
            let (dial, address) = parse(raw)?;
            let Address::Unix(path) = address else {
                unreachable!()
            };
            assert_eq!(resolve_unix(dial.as_str()), path, "{raw}");
        }

        let (dial, address) = parse("hvsock:///run/kata.hvsock:1024")?;
        let (path, port) = resolve_hybrid(dial.as_str())?;
        assert_eq!(
            address,
            Address::HybridVsock {
                path,
                port: port.or(dial.hybrid_port()).unwrap_or_default(),
            }
        );

        let (dial, address) = parse("vsock://3:1024")?;
        let (cid, port) = resolve_vsock(dial.as_str())?;
        assert_eq!(address, Address::Vsock { cid, port });
        Ok(())
    }

    #[test]
    fn test_dial_string_from_str() -> anyhow::Result<()> {
        let dial: DialString = "vsock:3:1024".parse()?;
        assert_eq!(dial.scheme(), Scheme::Vsock);

        let dial: DialString = "hvsock:/run/kata.hvsock:1024".parse()?;
        assert_eq!(dial.scheme(), Scheme::HybridVsock);
        assert_eq!(dial.hybrid_port(), None);

        let dial: DialString = "unix:///run/agent.sock".parse()?;
        assert_eq!(dial.scheme(), Scheme::Unix);

        assert!("vsock:3".parse::<DialString>().is_err());
        assert!("".parse::<DialString>().is_err());
        Ok(())
    }

    #[test]
    fn test_display_reparses() -> anyhow::Result<()> {
        for raw in [
            "unix:///run/agent.sock",
            "vsock://3:1024",
            "hvsock:///run/kata.hvsock:1024",
        ] {
            let address: Address = raw.parse()?;
            assert_eq!(address.to_string(), raw);
        }
        Ok(())
    }
}
