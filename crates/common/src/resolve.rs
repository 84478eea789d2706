// SPDX-FileCopyrightText: 2025-2026 TII (SSRC) and the Ghaf contributors
// SPDX-License-Identifier: Apache-2.0

//! Recover dial parameters from a dial string produced by [`crate::address::parse`].

use std::path::PathBuf;

use crate::address::{parse_u32, rooted, Scheme};
use crate::error::{Result, TransportError};

/// `vsock:<cid>:<port>` -> `(cid, port)`
///
/// # Errors
/// `InvalidArgument` unless there are exactly three fields with matching scheme and numeric cid/port
pub fn resolve_vsock(dial: &str) -> Result<(u32, u32)> {
    let fields: Vec<&str> = dial.split(':').collect();
    let [scheme, cid, port] = fields.as_slice() else {
        return Err(TransportError::invalid(format!(
            "Invalid vsock address: {dial}"
        )));
    };
    if *scheme != Scheme::Vsock.as_ref() {
        return Err(TransportError::invalid(format!(
            "Invalid vsock URL scheme: {scheme}"
        )));
    }
    let cid = parse_u32(cid)
        .ok_or_else(|| TransportError::invalid(format!("Invalid vsock cid: {cid}")))?;
    let port = parse_u32(port)
        .ok_or_else(|| TransportError::invalid(format!("Invalid vsock port: {port}")))?;
    Ok((cid, port))
}

/// `hvsock:<path>[:<port>]` -> `(path, port)`
///
/// Port is `None` when the dial string carries none (or an unparsable one),
/// and the caller falls back to the port captured when the address was parsed.
///
/// # Errors
/// `InvalidArgument` if scheme or path is missing
pub fn resolve_hybrid(dial: &str) -> Result<(PathBuf, Option<u32>)> {
    let fields: Vec<&str> = dial.split(':').collect();
    if fields.len() < 2 {
        return Err(TransportError::invalid(format!(
            "Invalid hybrid vsock address: {dial}"
        )));
    }
    if fields[0] != Scheme::HybridVsock.as_ref() {
        return Err(TransportError::invalid(format!(
            "Invalid hybrid vsock URL scheme: {dial}"
        )));
    }
    if fields[1].is_empty() {
        return Err(TransportError::invalid(format!(
            "Invalid hybrid vsock path: {dial}"
        )));
    }
    let port = match fields.as_slice() {
        [_, _, port] => parse_u32(port),
        _ => None,
    };
    Ok((PathBuf::from(fields[1]), port))
}

/// `unix:///<path>` -> `/<path>`
///
/// Anything after the `unix:` prefix is anchored at `/`, matching how
/// [`crate::address::parse`] treats a host part. Text without the prefix is
/// taken as a path verbatim.
#[must_use]
pub fn resolve_unix(dial: &str) -> PathBuf {
    match dial.strip_prefix("unix:") {
        Some(path) => rooted(path),
        None => PathBuf::from(dial),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_vsock() -> anyhow::Result<()> {
        assert_eq!(resolve_vsock("vsock:3:1024")?, (3, 1024));
        assert_eq!(
            resolve_vsock("vsock:4294967295:4294967295")?,
            (u32::MAX, u32::MAX)
        );

        for bad in [
            "vsock:3",
            "vsock:3:1024:1",
            "unix:3:1024",
            "vsock:x:1024",
            "vsock:3:",
            "vsock:4294967296:1",
        ] {
            let err = resolve_vsock(bad).unwrap_err();
            assert!(
                matches!(err, TransportError::InvalidArgument(_)),
                "{bad} should be rejected, got {err:?}"
            );
        }
        Ok(())
    }

    #[test]
    fn test_resolve_vsock_messages() {
        let err = resolve_vsock("hvsock:3:1024").unwrap_err();
        assert_eq!(err.to_string(), "Invalid vsock URL scheme: hvsock");
        let err = resolve_vsock("vsock:3:http").unwrap_err();
        assert_eq!(err.to_string(), "Invalid vsock port: http");
    }

    #[test]
    fn test_resolve_hybrid() -> anyhow::Result<()> {
        let (path, port) = resolve_hybrid("hvsock:/run/kata.hvsock")?;
        assert_eq!(path, PathBuf::from("/run/kata.hvsock"));
        assert_eq!(port, None);

        let (path, port) = resolve_hybrid("hvsock:/run/kata.hvsock:1024")?;
        assert_eq!(path, PathBuf::from("/run/kata.hvsock"));
        assert_eq!(port, Some(1024));

        // Unparsable port is ignored, not fatal
        let (_, port) = resolve_hybrid("hvsock:/run/kata.hvsock:nope")?;
        assert_eq!(port, None);

        assert!(resolve_hybrid("hvsock").is_err());
        assert!(resolve_hybrid("hvsock:").is_err());
        assert!(resolve_hybrid("vsock:/run/kata.hvsock").is_err());
        Ok(())
    }

    #[test]
    fn test_resolve_unix() {
        assert_eq!(resolve_unix("unix:///run/a.sock"), PathBuf::from("/run/a.sock"));
        assert_eq!(resolve_unix("unix://run/a.sock"), PathBuf::from("/run/a.sock"));
        assert_eq!(resolve_unix("unix:/run/a.sock"), PathBuf::from("/run/a.sock"));
        assert_eq!(resolve_unix("/run/a.sock"), PathBuf::from("/run/a.sock"));
        // Only the prefix is stripped, a trailing "unix" stays
        assert_eq!(resolve_unix("unix:///run/agent.unix"), PathBuf::from("/run/agent.unix"));
    }
}
