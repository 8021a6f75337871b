//! Admin response wire codec.
//!
//! The one bit-exact contract of this layer: a 4-byte big-endian status
//! code; for non-success frames a 2-byte big-endian byte-length prefix
//! followed by the UTF-8 message; then `&`-joined, percent-encoded
//! `name=value` pairs. Encoding is pure: the same result encodes to the same
//! bytes every time.

use thiserror::Error;

/// Terminal status of an administrative operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationStatus {
    Success,
    Error,
    /// The mutation was applied but takes effect after a server restart.
    Restart,
}

impl OperationStatus {
    #[must_use]
    pub fn code(self) -> i32 {
        match self {
            OperationStatus::Success => 0,
            OperationStatus::Error => 1,
            OperationStatus::Restart => 2,
        }
    }

    #[must_use]
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(OperationStatus::Success),
            1 => Some(OperationStatus::Error),
            2 => Some(OperationStatus::Restart),
            _ => None,
        }
    }
}

/// Parameter names whose values must never reach diagnostic output.
///
/// Sensitive values still serialize normally in the structured response when
/// an authorized caller asked for them; only logs and `Debug` are filtered.
#[must_use]
pub fn is_sensitive_param(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    name.contains("pwd") || name.contains("password") || name.contains("passwd")
}

/// Errors from [`OperationResult::encode`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireEncodeError {
    #[error("message of {len} bytes exceeds the 2-byte length prefix")]
    MessageTooLong { len: usize },
}

/// Errors from [`decode_response`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireDecodeError {
    #[error("truncated response frame")]
    Truncated,
    #[error("unknown status code {0}")]
    UnknownStatus(i32),
    #[error("malformed parameter segment: {0}")]
    MalformedParam(String),
}

/// A structured operation result: status, optional localized message, and a
/// flat ordered parameter list.
#[derive(Clone, PartialEq, Eq)]
pub struct OperationResult {
    status: OperationStatus,
    message: Option<String>,
    params: Vec<(String, String)>,
}

impl OperationResult {
    #[must_use]
    pub fn success() -> Self {
        Self {
            status: OperationStatus::Success,
            message: None,
            params: Vec::new(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: OperationStatus::Error,
            message: Some(message.into()),
            params: Vec::new(),
        }
    }

    #[must_use]
    pub fn restart(message: impl Into<String>) -> Self {
        Self {
            status: OperationStatus::Restart,
            message: Some(message.into()),
            params: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    pub fn push_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.params.push((name.into(), value.into()));
    }

    #[must_use]
    pub fn status(&self) -> OperationStatus {
        self.status
    }

    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    #[must_use]
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Encode the result into its wire frame.
    ///
    /// # Errors
    ///
    /// `MessageTooLong` if the message does not fit the 2-byte length prefix.
    pub fn encode(&self) -> Result<Vec<u8>, WireEncodeError> {
        let mut out = Vec::with_capacity(16);
        out.extend_from_slice(&self.status.code().to_be_bytes());

        if self.status != OperationStatus::Success {
            let msg = self.message.as_deref().unwrap_or("");
            let len = u16::try_from(msg.len())
                .map_err(|_| WireEncodeError::MessageTooLong { len: msg.len() })?;
            out.extend_from_slice(&len.to_be_bytes());
            out.extend_from_slice(msg.as_bytes());
        }

        for (i, (name, value)) in self.params.iter().enumerate() {
            if i > 0 {
                out.push(b'&');
            }
            out.extend_from_slice(urlencoding::encode(name).as_bytes());
            out.push(b'=');
            out.extend_from_slice(urlencoding::encode(value).as_bytes());
        }
        Ok(out)
    }
}

impl std::fmt::Debug for OperationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let params: Vec<(&str, &str)> = self
            .params
            .iter()
            .map(|(n, v)| {
                if is_sensitive_param(n) {
                    (n.as_str(), "(sensitive)")
                } else {
                    (n.as_str(), v.as_str())
                }
            })
            .collect();
        f.debug_struct("OperationResult")
            .field("status", &self.status)
            .field("message", &self.message)
            .field("params", &params)
            .finish()
    }
}

/// Decode a wire frame back into an [`OperationResult`].
///
/// # Errors
///
/// `Truncated` on short frames, `UnknownStatus` for unassigned status codes,
/// `MalformedParam` when the parameter tail does not parse.
pub fn decode_response(bytes: &[u8]) -> Result<OperationResult, WireDecodeError> {
    let (code_bytes, rest) = bytes.split_at_checked(4).ok_or(WireDecodeError::Truncated)?;
    let code = i32::from_be_bytes([code_bytes[0], code_bytes[1], code_bytes[2], code_bytes[3]]);
    let status = OperationStatus::from_code(code).ok_or(WireDecodeError::UnknownStatus(code))?;

    let (message, rest) = if status == OperationStatus::Success {
        (None, rest)
    } else {
        let (len_bytes, rest) = rest.split_at_checked(2).ok_or(WireDecodeError::Truncated)?;
        let len = usize::from(u16::from_be_bytes([len_bytes[0], len_bytes[1]]));
        let (msg, rest) = rest.split_at_checked(len).ok_or(WireDecodeError::Truncated)?;
        let msg = std::str::from_utf8(msg)
            .map_err(|e| WireDecodeError::MalformedParam(e.to_string()))?;
        (Some(msg.to_owned()), rest)
    };

    let mut params = Vec::new();
    if !rest.is_empty() {
        let tail = std::str::from_utf8(rest)
            .map_err(|e| WireDecodeError::MalformedParam(e.to_string()))?;
        for pair in tail.split('&') {
            let (name, value) = pair
                .split_once('=')
                .ok_or_else(|| WireDecodeError::MalformedParam(pair.to_owned()))?;
            let name = urlencoding::decode(name)
                .map_err(|e| WireDecodeError::MalformedParam(e.to_string()))?;
            let value = urlencoding::decode(value)
                .map_err(|e| WireDecodeError::MalformedParam(e.to_string()))?;
            params.push((name.into_owned(), value.into_owned()));
        }
    }

    Ok(OperationResult {
        status,
        message,
        params,
    })
}
