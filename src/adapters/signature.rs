use {
    crate::domain::error::CoreError,
    hmac::{Hmac, Mac},
    sha2::Sha256,
};

type HmacSha256 = Hmac<Sha256>;

/// Parsed `Webhook-Signature` header: `t=<unix_ts>,v1=<hex digest>`.
/// Multiple `v1` entries are tolerated (secret rotation).
struct SignatureHeader {
    timestamp: i64,
    digests: Vec<Vec<u8>>,
}

fn parse_header(header: &str) -> Result<SignatureHeader, CoreError> {
    let mut timestamp = None;
    let mut digests = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => {
                timestamp = Some(value.parse::<i64>().map_err(|_| {
                    CoreError::SignatureRejected(format!("invalid timestamp: {value}"))
                })?);
            }
            "v1" => {
                let decoded = hex::decode(value).map_err(|_| {
                    CoreError::SignatureRejected("signature is not valid hex".into())
                })?;
                digests.push(decoded);
            }
            _ => {}
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| CoreError::SignatureRejected("header missing timestamp".into()))?;
    if digests.is_empty() {
        return Err(CoreError::SignatureRejected("header missing v1 digest".into()));
    }
    Ok(SignatureHeader { timestamp, digests })
}

/// Verify a timestamped HMAC-SHA256 signature over the exact raw request
/// bytes. The digest covers `"{timestamp}.{body}"`; comparison is
/// constant-time via `Mac::verify_slice`. Timestamps outside `tolerance`
/// seconds of `now` are rejected as replays.
pub fn verify(
    body: &[u8],
    header: &str,
    secret: &str,
    tolerance_secs: i64,
    now: i64,
) -> Result<(), CoreError> {
    let parsed = parse_header(header)?;

    if (now - parsed.timestamp).abs() > tolerance_secs {
        return Err(CoreError::SignatureRejected(format!(
            "timestamp {} outside tolerance window",
            parsed.timestamp
        )));
    }

    for digest in &parsed.digests {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|_| CoreError::SignatureRejected("invalid secret".into()))?;
        mac.update(parsed.timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(body);
        if mac.verify_slice(digest).is_ok() {
            return Ok(());
        }
    }

    Err(CoreError::SignatureRejected("digest mismatch".into()))
}
