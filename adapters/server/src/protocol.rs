//! Newline-delimited JSON messages exchanged with remote clients.

use roomba_core::{ControlMode, Direction, WorldSnapshot};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Longest request line accepted, newline excluded.
pub const MAX_FRAME_LEN: usize = 64 * 1024;

/// Outcome of reading one newline-delimited frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Frame {
    /// A complete line was copied into the caller's buffer.
    Line,
    /// The line exceeded [`MAX_FRAME_LEN`] and was discarded.
    Oversized,
}

/// Request decoded from one line sent by a client.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "cmd", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    /// Asks for the current world snapshot.
    GetState,
    /// Steps the robot once under manual control.
    Move {
        /// Direction of the step.
        direction: Direction,
    },
    /// Switches the authoritative controller.
    SetMode {
        /// Controller to activate.
        mode: ControlMode,
    },
    /// Asks whether an integer is prime.
    CheckPrime {
        /// Candidate, as a JSON string or number.
        #[serde(default, alias = "numero")]
        number: Option<Value>,
    },
    /// Closes the connection.
    Exit,
}

/// Payload written back for a request.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    /// World summary answering state commands.
    State(WorldSnapshot),
    /// Human readable verdict answering `CHECK_PRIME`.
    Verdict(String),
}

/// Failures raised while reading or writing protocol lines.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The line is not a recognised request.
    #[error("undecodable request: {0}")]
    Decode(#[source] serde_json::Error),
    /// A response could not be serialised.
    #[error("failed to encode response: {0}")]
    Encode(#[source] serde_json::Error),
    /// The underlying stream failed.
    #[error("connection i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Reads the next frame into `line`, returning `None` once the peer closed the stream.
///
/// Bytes are not required to be UTF-8. A frame longer than [`MAX_FRAME_LEN`] is
/// consumed up to its newline without being buffered.
pub async fn read_frame<R>(reader: &mut R, line: &mut Vec<u8>) -> std::io::Result<Option<Frame>>
where
    R: AsyncBufRead + Unpin,
{
    line.clear();
    let mut oversized = false;

    loop {
        let (used, complete) = {
            let available = reader.fill_buf().await?;
            if available.is_empty() {
                return Ok(match (oversized, line.is_empty()) {
                    (true, _) => Some(Frame::Oversized),
                    (false, true) => None,
                    (false, false) => Some(Frame::Line),
                });
            }

            let (chunk, used, complete) = match available.iter().position(|byte| *byte == b'\n') {
                Some(end) => (&available[..end], end + 1, true),
                None => (available, available.len(), false),
            };

            if !oversized {
                if line.len() + chunk.len() > MAX_FRAME_LEN {
                    oversized = true;
                    line.clear();
                } else {
                    line.extend_from_slice(chunk);
                }
            }
            (used, complete)
        };
        reader.consume(used);

        if complete {
            return Ok(Some(if oversized {
                Frame::Oversized
            } else {
                Frame::Line
            }));
        }
    }
}

/// Decodes a single request line.
pub fn decode(line: &[u8]) -> Result<Request, ProtocolError> {
    serde_json::from_slice(line).map_err(ProtocolError::Decode)
}

/// Encodes a response as one newline-terminated line.
pub fn encode(response: &Response) -> Result<String, ProtocolError> {
    let mut line = serde_json::to_string(response).map_err(ProtocolError::Encode)?;
    line.push('\n');
    Ok(line)
}

/// Builds the verdict sent for a `CHECK_PRIME` request.
#[must_use]
pub fn prime_verdict(number: Option<&Value>) -> String {
    match number.and_then(parse_integer) {
        Some(value) if is_prime(value) => format!("{value} is prime."),
        Some(value) => format!("{value} is not prime."),
        None => "Error: input is not an integer.".to_owned(),
    }
}

fn parse_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Deterministic trial division over `6k ± 1` candidates.
#[must_use]
pub fn is_prime(value: i64) -> bool {
    if value <= 1 {
        return false;
    }
    if value <= 3 {
        return true;
    }
    if value % 2 == 0 || value % 3 == 0 {
        return false;
    }

    let mut divisor: i64 = 5;
    while divisor.checked_mul(divisor).is_some_and(|square| square <= value) {
        if value % divisor == 0 || value % (divisor + 2) == 0 {
            return false;
        }
        divisor += 6;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_every_command() {
        assert_eq!(decode(br#"{"cmd":"GET_STATE"}"#).ok(), Some(Request::GetState));
        assert_eq!(
            decode(br#"{"cmd":"MOVE","direction":"LEFT"}"#).ok(),
            Some(Request::Move {
                direction: Direction::Left
            })
        );
        assert_eq!(
            decode(br#"{"cmd":"SET_MODE","mode":"manual"}"#).ok(),
            Some(Request::SetMode {
                mode: ControlMode::Manual
            })
        );
        assert_eq!(decode(br#"{"cmd":"EXIT"}"#).ok(), Some(Request::Exit));
    }

    #[test]
    fn legacy_prime_field_is_accepted() {
        let request = decode(br#"{"cmd":"CHECK_PRIME","numero":"17"}"#).expect("decode");
        let Request::CheckPrime { number } = request else {
            panic!("unexpected request {request:?}");
        };
        assert_eq!(prime_verdict(number.as_ref()), "17 is prime.");
    }

    #[test]
    fn unknown_or_malformed_lines_fail_to_decode() {
        assert!(decode(br#"{"cmd":"DANCE"}"#).is_err());
        assert!(decode(br#"{"cmd":"MOVE","direction":"NORTH"}"#).is_err());
        assert!(decode(b"not json").is_err());
        assert!(decode(b"").is_err());
    }

    #[test]
    fn invalid_utf8_fails_to_decode() {
        assert!(decode(b"\xff\xfe{\"cmd\":\"GET_STATE\"}").is_err());
        assert_eq!(decode(b" {\"cmd\":\"EXIT\"}\r").ok(), Some(Request::Exit));
    }

    #[tokio::test]
    async fn frames_split_on_newlines_and_skip_oversized_lines() {
        let mut input = b"\xff\xfe junk\n".to_vec();
        input.extend(std::iter::repeat(b'x').take(MAX_FRAME_LEN + 10));
        input.extend_from_slice(b"\n{\"cmd\":\"GET_STATE\"}\ntail");
        let mut reader = tokio::io::BufReader::with_capacity(1024, input.as_slice());
        let mut line = Vec::new();

        assert_eq!(read_frame(&mut reader, &mut line).await.ok(), Some(Some(Frame::Line)));
        assert_eq!(line, b"\xff\xfe junk");

        assert_eq!(
            read_frame(&mut reader, &mut line).await.ok(),
            Some(Some(Frame::Oversized))
        );
        assert!(line.is_empty());

        assert_eq!(read_frame(&mut reader, &mut line).await.ok(), Some(Some(Frame::Line)));
        assert_eq!(decode(&line).ok(), Some(Request::GetState));

        assert_eq!(read_frame(&mut reader, &mut line).await.ok(), Some(Some(Frame::Line)));
        assert_eq!(line, b"tail");

        assert_eq!(read_frame(&mut reader, &mut line).await.ok(), Some(None));
    }

    #[test]
    fn prime_verdicts() {
        assert_eq!(prime_verdict(Some(&Value::from("21"))), "21 is not prime.");
        assert_eq!(prime_verdict(Some(&Value::from(97))), "97 is prime.");
        assert_eq!(prime_verdict(Some(&Value::from("-7"))), "-7 is not prime.");
        assert_eq!(
            prime_verdict(Some(&Value::from("4.5"))),
            "Error: input is not an integer."
        );
        assert_eq!(prime_verdict(None), "Error: input is not an integer.");
    }

    #[test]
    fn primality_matches_known_values() {
        let primes: Vec<i64> = (0..50).filter(|value| is_prime(*value)).collect();
        assert_eq!(
            primes,
            vec![2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47]
        );
        assert!(is_prime(2_147_483_647));
        assert!(!is_prime(1_000_000_007 * 3));
        assert!(is_prime(1_000_000_007));
    }
}
